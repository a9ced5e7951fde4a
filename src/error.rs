//! Error taxonomy for proxy requests.
//!
//! - Input errors (no target) map to 400.
//! - Policy violations and upstream failures map to 502 `fetch_failed`.
//!
//! Rewriting never produces an error; see `rewrite::proxify`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::response::apply_common_headers;

/// Error raised while handling a proxy request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("missing ?u=")]
    MissingTarget,

    #[error("{0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("protocol not allowed")]
    ProtocolNotAllowed,

    #[error("local address blocked")]
    LocalAddressBlocked,

    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingTarget => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingTarget => "missing_target",
            ProxyError::InvalidUrl(_) => "invalid_url",
            ProxyError::ProtocolNotAllowed => "protocol_not_allowed",
            ProxyError::LocalAddressBlocked => "local_address_blocked",
            ProxyError::Upstream(_) => "upstream",
        }
    }
}

/// JSON error body: `{ok:false, error, detail?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&ProxyError> for ErrorBody {
    fn from(err: &ProxyError) -> Self {
        match err {
            ProxyError::MissingTarget => Self {
                ok: false,
                error: err.to_string(),
                detail: None,
            },
            _ => Self {
                ok: false,
                error: "fetch_failed".to_string(),
                detail: Some(err.to_string()),
            },
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(ErrorBody::from(&self))).into_response();
        apply_common_headers(response.headers_mut());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_target_body() {
        let body = serde_json::to_value(ErrorBody::from(&ProxyError::MissingTarget)).unwrap();
        assert_eq!(body, serde_json::json!({"ok": false, "error": "missing ?u="}));
        assert_eq!(ProxyError::MissingTarget.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_policy_errors_are_fetch_failures() {
        let body = serde_json::to_value(ErrorBody::from(&ProxyError::LocalAddressBlocked)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"ok": false, "error": "fetch_failed", "detail": "local address blocked"})
        );
        assert_eq!(ProxyError::ProtocolNotAllowed.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::ProtocolNotAllowed.to_string(), "protocol not allowed");
    }

    #[test]
    fn test_error_response_carries_cors_headers() {
        let response = ProxyError::MissingTarget.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["cache-control"], "no-store");
    }
}
