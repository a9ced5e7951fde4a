//! URL proxification.
//!
//! # Responsibilities
//! - Resolve a possibly-relative reference against the document base
//! - Leave non-web schemes (`data:`, `javascript:`, ...) untouched
//! - Encode the absolute target as `<endpoint>?u=<percent-encoded>`
//!
//! # Design Decisions
//! - Fail-soft: an unresolvable reference is returned as-is, never an error
//! - The encode set matches the browser's `encodeURIComponent`, so server-side
//!   and client-side proxification produce byte-identical URLs

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

/// Endpoint path used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "/api/proxy";

/// Prefixes that never route through the proxy. Matched case-sensitively.
pub const PASSTHROUGH_SCHEMES: [&str; 5] = ["data:", "about:", "javascript:", "mailto:", "tel:"];

/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds same-origin proxy URLs for a fixed endpoint path.
#[derive(Debug, Clone)]
pub struct Proxifier {
    endpoint: String,
}

impl Proxifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Prefix every proxy URL starts with, e.g. `/api/proxy?u=`.
    pub fn prefix(&self) -> String {
        format!("{}?u=", self.endpoint)
    }

    /// Rewrite `value` so that fetching it goes through the proxy.
    ///
    /// Empty values and non-web schemes come back trimmed but otherwise
    /// unchanged; values that fail to resolve against `base` come back
    /// exactly as given.
    pub fn proxify(&self, value: &str, base: &Url) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() || is_passthrough(trimmed) {
            return trimmed.to_string();
        }

        match base.join(trimmed) {
            Ok(absolute) => self.proxy_url(&absolute),
            Err(e) => {
                tracing::trace!(value = %trimmed, error = %e, "Leaving unresolvable reference as-is");
                value.to_string()
            }
        }
    }

    /// Encode an already-absolute URL as a proxy URL.
    pub fn proxy_url(&self, absolute: &Url) -> String {
        format!(
            "{}?u={}",
            self.endpoint,
            utf8_percent_encode(absolute.as_str(), COMPONENT)
        )
    }
}

impl Default for Proxifier {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

/// Whether `value` uses a scheme the proxy must never fetch.
pub fn is_passthrough(value: &str) -> bool {
    PASSTHROUGH_SCHEMES
        .iter()
        .any(|scheme| value.starts_with(scheme))
}
