//! Header manipulation in both directions.
//!
//! # Responsibilities
//! - Build the outbound request headers for the target (browser-like)
//! - Filter upstream response headers before they reach the caller
//!
//! # Design Decisions
//! - The caller's own cookies are never forwarded; only an explicit cookie
//!   string from the query is sent
//! - No `accept-encoding` is sent, so bodies arrive uncompressed
//! - Framing-restriction headers are dropped so the page can be embedded

use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::UpstreamConfig;

/// Response headers that block cross-origin embedding.
pub const EMBEDDING_BLOCKLIST: [&str; 6] = [
    "content-security-policy",
    "x-frame-options",
    "cross-origin-embedder-policy",
    "cross-origin-opener-policy",
    "cross-origin-resource-policy",
    "content-security-policy-report-only",
];

/// Headers the handler sets itself or that no longer describe the body.
const HANDLER_OWNED: [&str; 10] = [
    "content-type",
    "cache-control",
    "access-control-allow-origin",
    "access-control-allow-methods",
    "access-control-allow-headers",
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
    "upgrade",
];

/// Per-request overrides taken from the query string.
#[derive(Debug, Clone, Default)]
pub struct ForwardOptions {
    /// Cookie string from `ck`/`cookie`.
    pub cookie: Option<String>,
    /// Referer override from `ref`.
    pub referer: Option<String>,
}

/// Build the headers sent to the target.
pub fn outbound_headers(
    incoming: &HeaderMap,
    target: &Url,
    options: &ForwardOptions,
    defaults: &UpstreamConfig,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    copy_or_default(&mut headers, incoming, header::USER_AGENT, &defaults.user_agent);
    copy_or_default(&mut headers, incoming, header::ACCEPT, &defaults.accept);
    copy_or_default(&mut headers, incoming, header::ACCEPT_LANGUAGE, &defaults.accept_language);

    let referer = options
        .referer
        .clone()
        .unwrap_or_else(|| format!("{}/", target.origin().ascii_serialization()));
    insert_str(&mut headers, header::REFERER, &referer);

    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));

    if let Some(cookie) = options.cookie.as_deref().filter(|c| !c.is_empty()) {
        insert_str(&mut headers, header::COOKIE, cookie);
    }
    if let Some(auth) = incoming.get(header::AUTHORIZATION) {
        headers.insert(header::AUTHORIZATION, auth.clone());
    }

    headers
}

/// Copy upstream response headers, minus the blocklist and handler-owned names.
pub fn forwardable_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for (name, value) in upstream {
        if is_forwardable(name) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Whether an upstream response header may be passed to the caller.
pub fn is_forwardable(name: &HeaderName) -> bool {
    let name = name.as_str();
    !EMBEDDING_BLOCKLIST.contains(&name) && !HANDLER_OWNED.contains(&name)
}

fn copy_or_default(out: &mut HeaderMap, incoming: &HeaderMap, name: HeaderName, default: &str) {
    match incoming.get(&name) {
        Some(value) => {
            out.insert(name, value.clone());
        }
        None => insert_str(out, name, default),
    }
}

fn insert_str(out: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            out.insert(name, v);
        }
        Err(_) => tracing::debug!(header = %name, "Dropping header with invalid value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://a.test/deep/page?q=1").unwrap()
    }

    #[test]
    fn test_defaults_when_caller_sends_nothing() {
        let defaults = UpstreamConfig::default();
        let headers = outbound_headers(&HeaderMap::new(), &target(), &ForwardOptions::default(), &defaults);

        assert_eq!(headers[header::USER_AGENT], defaults.user_agent.as_str());
        assert_eq!(headers[header::ACCEPT], defaults.accept.as_str());
        assert_eq!(headers[header::ACCEPT_LANGUAGE], defaults.accept_language.as_str());
        assert_eq!(headers[header::REFERER], "https://a.test/");
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert!(headers.get(header::COOKIE).is_none());
        assert!(headers.get(header::ACCEPT_ENCODING).is_none());
    }

    #[test]
    fn test_caller_headers_and_overrides() {
        let mut incoming = HeaderMap::new();
        incoming.insert(header::USER_AGENT, HeaderValue::from_static("tester/1.0"));
        incoming.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));
        incoming.insert(header::COOKIE, HeaderValue::from_static("mine=secret"));

        let options = ForwardOptions {
            cookie: Some("sid=abc".into()),
            referer: Some("https://r.test/".into()),
        };
        let headers = outbound_headers(&incoming, &target(), &options, &UpstreamConfig::default());

        assert_eq!(headers[header::USER_AGENT], "tester/1.0");
        assert_eq!(headers[header::AUTHORIZATION], "Bearer t");
        assert_eq!(headers[header::COOKIE], "sid=abc");
        assert_eq!(headers[header::REFERER], "https://r.test/");
    }

    #[test]
    fn test_response_filter() {
        let mut upstream = HeaderMap::new();
        upstream.insert("content-security-policy", HeaderValue::from_static("default-src 'self'"));
        upstream.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
        upstream.insert("cross-origin-opener-policy", HeaderValue::from_static("same-origin"));
        upstream.insert("content-type", HeaderValue::from_static("text/html"));
        upstream.insert("content-length", HeaderValue::from_static("10"));
        upstream.insert("cache-control", HeaderValue::from_static("max-age=60"));
        upstream.insert("etag", HeaderValue::from_static("\"v1\""));
        upstream.append("set-cookie", HeaderValue::from_static("a=1"));
        upstream.append("set-cookie", HeaderValue::from_static("b=2"));

        let out = forwardable_response_headers(&upstream);
        for name in EMBEDDING_BLOCKLIST {
            assert!(out.get(name).is_none(), "{name} should be dropped");
        }
        assert!(out.get("content-type").is_none());
        assert!(out.get("content-length").is_none());
        assert!(out.get("cache-control").is_none());
        assert_eq!(out["etag"], "\"v1\"");
        assert_eq!(out.get_all("set-cookie").iter().count(), 2);
    }
}
