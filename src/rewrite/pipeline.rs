//! Response rewrite pipeline.
//!
//! ```text
//! bytes + content-type
//!     → charset.rs (decode with declared charset)
//!     → base.rs (inject <base>)
//!     → attrs.rs (href/src/action/poster/data-src)
//!     → css.rs (url(...))
//!     → meta_refresh.rs (refresh target)
//!     → hook.rs (fetch/XHR interception)
//!     → ensure <meta charset="utf-8">
//!     → UTF-8 text
//! ```

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use super::attrs::rewrite_attrs;
use super::base::{inject_base, insert_after_head};
use super::charset::{decode, resolve_charset};
use super::css::rewrite_css_urls;
use super::hook::inject_client_hook;
use super::meta_refresh::rewrite_meta_refresh;
use super::proxify::Proxifier;

static META_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<meta[^>]+charset=").expect("valid meta charset regex"));

/// Immutable input to the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct RewriteContext<'a> {
    /// Fully buffered upstream body.
    pub body: &'a [u8],
    /// Upstream `content-type` value.
    pub content_type: &'a str,
    /// Resolution base for every relative reference.
    pub target: &'a Url,
}

/// Whether a content type is routed through the pipeline.
pub fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html")
}

/// Run every pass over the document and return UTF-8 text.
pub fn rewrite_document(ctx: &RewriteContext<'_>, proxifier: &Proxifier) -> String {
    let charset = resolve_charset(ctx.content_type);
    let html = decode(ctx.body, &charset);

    let html = inject_base(&html, ctx.target.as_str());
    let html = rewrite_attrs(&html, ctx.target, proxifier);
    let html = rewrite_css_urls(&html, ctx.target, proxifier);
    let html = rewrite_meta_refresh(&html, ctx.target, proxifier);
    let origin = ctx.target.origin().ascii_serialization();
    let html = inject_client_hook(&html, &proxifier.prefix(), &origin);

    ensure_meta_charset(&html)
}

/// Add `<meta charset="utf-8">` after the head tag unless one is declared.
pub fn ensure_meta_charset(html: &str) -> String {
    if META_CHARSET_RE.is_match(html) {
        return html.to_string();
    }
    insert_after_head(html, "<meta charset=\"utf-8\">")
}
