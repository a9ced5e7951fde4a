//! `<base>` injection and the shared head-insertion helper.

use regex::Regex;
use std::sync::LazyLock;

static BASE_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<base\s").expect("valid base regex"));

// `<head>` or `<head ...>`, but not `<header>`.
static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid head regex"));

/// Insert `<base href="...">` after the opening head tag.
///
/// Documents that already declare a base, or have no head tag, are returned
/// unchanged.
pub fn inject_base(html: &str, target_url: &str) -> String {
    if BASE_TAG_RE.is_match(html) {
        return html.to_string();
    }
    let tag = format!("<base href=\"{}\">", escape_attr(target_url));
    insert_after_head(html, &tag)
}

/// Insert `fragment` on a new line right after the first opening head tag.
pub(crate) fn insert_after_head(html: &str, fragment: &str) -> String {
    match HEAD_OPEN_RE.find(html) {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + fragment.len() + 1);
            out.push_str(&html[..m.end()]);
            out.push('\n');
            out.push_str(fragment);
            out.push_str(&html[m.end()..]);
            out
        }
        None => html.to_string(),
    }
}

/// Escape `& < > "` for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_injects_after_head() {
        let html = "<html><HEAD lang=\"en\"><title>t</title></head></html>";
        let out = inject_base(html, "https://a.test/x/");
        assert_eq!(
            out,
            "<html><HEAD lang=\"en\">\n<base href=\"https://a.test/x/\"><title>t</title></head></html>"
        );
    }

    #[test]
    fn test_existing_base_is_kept() {
        let html = "<html><head><BASE href=\"/other/\"></head></html>";
        assert_eq!(inject_base(html, "https://a.test/"), html);
    }

    #[test]
    fn test_header_element_is_not_a_head() {
        let html = "<body><header>x</header></body>";
        assert_eq!(inject_base(html, "https://a.test/"), html);
    }

    #[test]
    fn test_href_is_escaped() {
        let out = inject_base("<head>", "https://a.test/?a=1&b=\"><script>");
        assert!(out.contains("href=\"https://a.test/?a=1&amp;b=&quot;&gt;&lt;script&gt;\""));
    }
}
