//! Response assembly.
//!
//! # Responsibilities
//! - Attach the CORS and caching headers every response carries
//! - Build the rewritten-document and passthrough responses
//!
//! # Design Decisions
//! - Handler-owned headers are applied last so upstream values never win
//! - Rewritten documents are always declared as UTF-8

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};

/// Request headers the caller may send cross-origin.
pub const ALLOWED_REQUEST_HEADERS: &str = "Content-Type,Authorization,User-Agent,Referer,Cookie";

/// Methods advertised in CORS responses.
pub const ALLOWED_METHODS: &str = "GET,HEAD,OPTIONS";

/// Content type of every rewritten document.
pub const REWRITTEN_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Set the CORS and `Cache-Control: no-store` headers.
pub fn apply_common_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_REQUEST_HEADERS),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
}

/// Empty 204 answer to a CORS preflight.
pub fn preflight() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::NO_CONTENT;
    apply_common_headers(response.headers_mut());
    response
}

/// Build a proxied response from the upstream status, the already filtered
/// upstream headers, an explicit content type and the body.
pub fn proxied(
    status: StatusCode,
    forwarded: HeaderMap,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response {
    let mut response = Response::new(Body::from(body.into()));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    headers.extend(forwarded);
    match HeaderValue::from_str(content_type) {
        Ok(v) => {
            headers.insert(header::CONTENT_TYPE, v);
        }
        Err(_) => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            );
        }
    }
    apply_common_headers(headers);
    response
}
