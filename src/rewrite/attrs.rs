//! URL-bearing attribute rewriting.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;
use url::Url;

use super::proxify::Proxifier;

/// Attributes whose value is a fetchable URL.
pub const URL_ATTRIBUTES: [&str; 5] = ["href", "src", "action", "poster", "data-src"];

// One pass over all attribute names so a value is never proxified twice
// (`src` would otherwise also hit the tail of `data-src`). `srcset` never
// matches because `=` must follow the name.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names = URL_ATTRIBUTES.join("|");
    Regex::new(&format!(
        r#"(?i)({names})(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#
    ))
    .expect("valid attribute regex")
});

/// Replace every quoted `href`/`src`/`action`/`poster`/`data-src` value with
/// its proxified form. Unquoted values are left alone.
///
/// Assignments in inline scripts (`location.href="/next"`) are rewritten too.
/// A name glued to a word character or `-` (`xsrc`, `x-href`) is skipped.
pub fn rewrite_attrs(html: &str, base: &Url, proxifier: &Proxifier) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;

    for caps in ATTR_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if !at_name_boundary(html, whole.start()) {
            continue;
        }
        out.push_str(&html[last..whole.start()]);
        out.push_str(&rewrite_one(&caps, base, proxifier));
        last = whole.end();
    }

    out.push_str(&html[last..]);
    out
}

fn rewrite_one(caps: &Captures, base: &Url, proxifier: &Proxifier) -> String {
    let name = &caps[1];
    let eq = &caps[2];
    if let Some(v) = caps.get(3) {
        format!("{name}{eq}\"{}\"", proxify_value(v.as_str(), base, proxifier))
    } else {
        let v = caps.get(4).map_or("", |m| m.as_str());
        format!("{name}{eq}'{}'", proxify_value(v, base, proxifier))
    }
}

/// Whether the character before `at` cannot be part of an attribute name.
fn at_name_boundary(html: &str, at: usize) -> bool {
    !matches!(
        html[..at].chars().next_back(),
        Some(c) if c.is_alphanumeric() || c == '_' || c == '-'
    )
}

/// Proxify an attribute value as the browser would read it (`&amp;` is `&`).
///
/// Values that stay unproxified keep their original spelling.
fn proxify_value(raw: &str, base: &Url, proxifier: &Proxifier) -> String {
    let Cow::Owned(decoded) = decode_ampersands(raw) else {
        return proxifier.proxify(raw, base);
    };
    let out = proxifier.proxify(&decoded, base);
    if out.starts_with(&proxifier.prefix()) {
        out
    } else {
        proxifier.proxify(raw, base)
    }
}

fn decode_ampersands(raw: &str) -> Cow<'_, str> {
    if !raw.contains("&amp;") && !raw.contains("&#38;") && !raw.contains("&#x26;") {
        return Cow::Borrowed(raw);
    }
    Cow::Owned(
        raw.replace("&amp;", "&")
            .replace("&#38;", "&")
            .replace("&#x26;", "&"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(html: &str) -> String {
        let base = Url::parse("https://a.test/x/").unwrap();
        rewrite_attrs(html, &base, &Proxifier::default())
    }

    #[test]
    fn test_img_src() {
        assert_eq!(
            rewrite(r#"<img src="pic.png">"#),
            r#"<img src="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fpic.png">"#
        );
    }

    #[test]
    fn test_single_quotes_and_case() {
        assert_eq!(
            rewrite("<A HREF = '/top'>"),
            "<A HREF = '/api/proxy?u=https%3A%2F%2Fa.test%2Ftop'>"
        );
    }

    #[test]
    fn test_every_attribute_in_set() {
        let out = rewrite(
            r#"<form action="go"></form><video poster="p.jpg"></video><img data-src="lazy.png"><link href="s.css">"#,
        );
        assert!(out.contains(r#"action="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fgo""#));
        assert!(out.contains(r#"poster="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fp.jpg""#));
        assert!(out.contains(r#"data-src="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Flazy.png""#));
        assert!(out.contains(r#"href="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fs.css""#));
    }

    #[test]
    fn test_data_src_is_rewritten_once() {
        let out = rewrite(r#"<img data-src="a.png">"#);
        assert_eq!(out.matches("/api/proxy").count(), 1);
    }

    #[test]
    fn test_other_attributes_untouched() {
        let html = r#"<img srcset="a.png 1x" alt="src=&quot;x&quot;" class="x" src="b.png" width=3>"#;
        let out = rewrite(html);
        assert!(out.starts_with(r#"<img srcset="a.png 1x" alt="src=&quot;x&quot;" class="x" src="/api/proxy?u="#));
        assert!(out.ends_with(r#"b.png" width=3>"#));
    }

    #[test]
    fn test_non_web_schemes_and_empty_values() {
        let html = r##"<a href="javascript:void(0)"></a><a href="mailto:x@a.test"></a><a href=""></a>"##;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_entity_encoded_ampersands_reach_the_upstream_query() {
        assert_eq!(
            rewrite(r#"<a href="/s?a=1&amp;b=2">"#),
            r#"<a href="/api/proxy?u=https%3A%2F%2Fa.test%2Fs%3Fa%3D1%26b%3D2">"#
        );
        let js = r#"<a href="javascript:a&amp;&amp;b()">"#;
        assert_eq!(rewrite(js), js);
    }

    #[test]
    fn test_inline_script_assignments() {
        assert_eq!(
            rewrite(r#"<script>location.href="/next";img.src='a.png'</script>"#),
            "<script>location.href=\"/api/proxy?u=https%3A%2F%2Fa.test%2Fnext\";\
             img.src='/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fa.png'</script>"
        );
    }

    #[test]
    fn test_adjacent_attributes_without_whitespace() {
        let out = rewrite(r#"<img src="a"data-src="b">"#);
        assert_eq!(
            out,
            r#"<img src="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fa"data-src="/api/proxy?u=https%3A%2F%2Fa.test%2Fx%2Fb">"#
        );
    }

    #[test]
    fn test_names_glued_to_other_words_are_skipped() {
        let html = r#"<img xsrc="a.png" x-href="b" my_src='c'>"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn test_unterminated_markup_does_not_panic() {
        let html = r#"<a href="never closed <img src='x"#;
        assert_eq!(rewrite(html), html);
    }
}
