//! `<meta http-equiv="refresh">` rewriting.

use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

use super::proxify::Proxifier;

static REFRESH_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv=["']refresh["'][^>]*>"#).expect("valid refresh regex")
});

static REFRESH_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)content=["']\s*\d+\s*;\s*url=([^"']+)["']"#).expect("valid content regex")
});

/// Proxify the `url=` target of every meta refresh tag, leaving the delay and
/// the rest of the tag as they were.
pub fn rewrite_meta_refresh(html: &str, base: &Url, proxifier: &Proxifier) -> String {
    REFRESH_TAG_RE
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let Some(target) = REFRESH_CONTENT_RE.captures(tag).and_then(|c| c.get(1)) else {
                return tag.to_string();
            };
            format!(
                "{}{}{}",
                &tag[..target.start()],
                proxifier.proxify(target.as_str(), base),
                &tag[target.end()..]
            )
        })
        .into_owned()
}
