//! Outbound fetch of the target URL.
//!
//! # Responsibilities
//! - Hold the shared HTTP client (connection pooling across requests)
//! - Follow redirects, buffer the whole response body
//! - Re-apply the target policy to every redirect hop
//!
//! # Design Decisions
//! - Exactly one attempt per request; no retries
//! - No timeout unless configured
//! - Cancellation is drop-based: when the caller disconnects, axum drops the
//!   handler future and the in-flight request with it

use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use reqwest::redirect;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::security::target::check_target;

/// A fully buffered upstream response.
#[derive(Debug)]
pub struct Fetched {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// URL after redirects.
    pub final_url: Url,
    pub body: Bytes,
}

impl Fetched {
    /// Upstream content type, `application/octet-stream` when absent.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
    }
}

/// Shared fetcher for target URLs.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(config: &UpstreamConfig, allow_private: bool) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder()
            .redirect(redirect_policy(config.max_redirects, allow_private))
            .no_proxy();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetch `target` with `headers` and buffer the body.
    pub async fn fetch(&self, target: &Url, headers: HeaderMap) -> Result<Fetched, ProxyError> {
        let response = self
            .client
            .get(target.clone())
            .headers(headers)
            .send()
            .await
            .map_err(refused_redirect)?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response.bytes().await?;

        tracing::debug!(
            url = %target,
            final_url = %final_url,
            status = %status,
            bytes = body.len(),
            "Upstream responded"
        );

        Ok(Fetched {
            status,
            headers,
            final_url,
            body,
        })
    }
}

// `previous()` already holds the URL that answered with the redirect.
fn redirect_policy(max_redirects: usize, allow_private: bool) -> redirect::Policy {
    redirect::Policy::custom(move |attempt| {
        if attempt.previous().len() > max_redirects {
            return attempt.error(format!("too many redirects (limit {max_redirects})"));
        }
        match check_target(attempt.url(), allow_private) {
            Ok(()) => attempt.follow(),
            Err(e) => {
                tracing::warn!(location = %attempt.url(), error = %e, "Refusing redirect");
                attempt.error(e)
            }
        }
    })
}

/// Surface a policy refusal raised inside the redirect policy as itself
/// rather than as a generic upstream error.
fn refused_redirect(err: reqwest::Error) -> ProxyError {
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
        match inner.downcast_ref::<ProxyError>() {
            Some(ProxyError::LocalAddressBlocked) => return ProxyError::LocalAddressBlocked,
            Some(ProxyError::ProtocolNotAllowed) => return ProxyError::ProtocolNotAllowed,
            _ => source = inner.source(),
        }
    }
    ProxyError::Upstream(err)
}
