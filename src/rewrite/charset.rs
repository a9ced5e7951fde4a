//! Charset resolution and decoding of upstream documents.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

static CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)charset=([^;]+)").expect("valid charset regex"));

/// Extract the `charset=` parameter from a content-type value.
///
/// Returns `utf-8` when the parameter is absent.
pub fn resolve_charset(content_type: &str) -> String {
    CHARSET_RE
        .captures(content_type)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| "utf-8".to_string())
}

/// Decode `bytes` using the encoding named by `label`.
///
/// Unknown labels fall back to UTF-8. Malformed sequences are replaced.
pub fn decode(bytes: &[u8], label: &str) -> String {
    let encoding = Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
        tracing::warn!(charset = label, "Unknown charset, decoding as utf-8");
        UTF_8
    });

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(charset = actual.name(), "Lossy decode of upstream document");
    }
    text.into_owned()
}
