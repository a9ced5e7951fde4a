//! Request parsing.
//!
//! # Responsibilities
//! - Extract the target and per-request overrides from the query string
//! - Read the request ID assigned by the request-id layer
//!
//! # Design Decisions
//! - `u` wins over `url`, `ck` over `cookie`; empty values count as absent
//! - Request ID added as early as possible for tracing

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::security::ForwardOptions;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Query parameters accepted by the proxy endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProxyQuery {
    pub u: Option<String>,
    pub url: Option<String>,
    pub ck: Option<String>,
    pub cookie: Option<String>,
    #[serde(rename = "ref")]
    pub referer: Option<String>,
}

impl ProxyQuery {
    /// The caller-supplied target, if any.
    pub fn target(&self) -> Option<&str> {
        first_non_empty(&self.u, &self.url)
    }

    /// Overrides forwarded to the outbound request.
    pub fn forward_options(&self) -> ForwardOptions {
        ForwardOptions {
            cookie: first_non_empty(&self.ck, &self.cookie).map(str::to_string),
            referer: self
                .referer
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(str::to_string),
        }
    }
}

fn first_non_empty<'a>(a: &'a Option<String>, b: &'a Option<String>) -> Option<&'a str> {
    a.as_deref()
        .filter(|v| !v.is_empty())
        .or_else(|| b.as_deref().filter(|v| !v.is_empty()))
}

/// Request ID set by the request-id layer, or `unknown`.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
