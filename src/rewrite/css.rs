//! CSS `url(...)` rewriting.
//!
//! Runs over the whole document text, so `<style>` blocks and inline
//! `style=` attributes are both covered.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

use super::proxify::Proxifier;

static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:"([^'")]+)"|'([^'")]+)'|([^'")]+))\s*\)"#)
        .expect("valid css url regex")
});

/// Replace each `url(...)` token with `url("<proxified>")`.
pub fn rewrite_css_urls(html: &str, base: &Url, proxifier: &Proxifier) -> String {
    CSS_URL_RE
        .replace_all(html, |caps: &Captures| {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map_or("", |m| m.as_str());
            format!("url(\"{}\")", proxifier.proxify(value, base))
        })
        .into_owned()
}
