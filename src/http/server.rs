//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create Axum Router for the proxy endpoint
//! - Wire up middleware (tracing, request ID)
//! - Validate the target, fetch it, and either rewrite or pass through
//! - Serve until the shutdown signal fires

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap, Method},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{ProxyConfig, UpstreamConfig};
use crate::error::ProxyError;
use crate::http::request::{request_id, ProxyQuery};
use crate::http::response::{self, REWRITTEN_CONTENT_TYPE};
use crate::lifecycle::shutdown::wait_for_shutdown;
use crate::observability::metrics;
use crate::rewrite::{is_html, rewrite_document, Proxifier, RewriteContext};
use crate::security::{forwardable_response_headers, outbound_headers, parse_target};
use crate::upstream::Fetcher;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Fetcher,
    pub proxifier: Arc<Proxifier>,
    pub upstream: Arc<UpstreamConfig>,
    pub allow_private_targets: bool,
}

impl AppState {
    pub fn from_config(config: &ProxyConfig) -> Result<Self, ProxyError> {
        let allow_private = config.security.allow_private_targets;
        Ok(Self {
            fetcher: Fetcher::new(&config.upstream, allow_private)?,
            proxifier: Arc::new(Proxifier::new(config.endpoint.path.clone())),
            upstream: Arc::new(config.upstream.clone()),
            allow_private_targets: allow_private,
        })
    }
}

/// HTTP server for the proxy endpoint.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ProxyError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(
                &config.endpoint.path,
                get(proxy_handler).options(preflight_handler),
            )
            .with_state(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for serving on a custom listener or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires or Ctrl+C is received.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            endpoint = %self.config.endpoint.path,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn preflight_handler(method: Method) -> Response {
    let start = Instant::now();
    let response = response::preflight();
    metrics::record_request(method.as_str(), response.status().as_u16(), "preflight", start);
    response
}

/// Main proxy handler (GET and HEAD).
/// Validates the target, fetches it and shapes the response.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<ProxyQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);
    // A query that does not deserialize (e.g. a repeated `u`) carries no
    // usable target.
    let query = match query {
        Ok(Query(q)) => q,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Unreadable query string");
            ProxyQuery::default()
        }
    };

    match forward(&state, &headers, &query, &request_id).await {
        Ok((response, kind)) => {
            metrics::record_request(method.as_str(), response.status().as_u16(), kind, start);
            response
        }
        Err(e) => {
            match &e {
                ProxyError::ProtocolNotAllowed | ProxyError::LocalAddressBlocked => {
                    metrics::record_blocked(e.kind());
                    tracing::warn!(request_id = %request_id, url = ?query.target(), error = %e, "Target refused");
                }
                ProxyError::MissingTarget => {
                    tracing::debug!(request_id = %request_id, "Request without target");
                }
                _ => {
                    tracing::error!(request_id = %request_id, url = ?query.target(), error = %e, "Fetch failed");
                }
            }
            metrics::record_request(method.as_str(), e.status().as_u16(), e.kind(), start);
            e.into_response()
        }
    }
}

async fn forward(
    state: &AppState,
    incoming: &HeaderMap,
    query: &ProxyQuery,
    request_id: &str,
) -> Result<(Response, &'static str), ProxyError> {
    let raw = query.target().ok_or(ProxyError::MissingTarget)?;
    let target = parse_target(raw, state.allow_private_targets)?;

    tracing::debug!(request_id = %request_id, url = %target, "Proxying request");

    let outbound = outbound_headers(incoming, &target, &query.forward_options(), &state.upstream);
    let fetched = state.fetcher.fetch(&target, outbound).await?;
    let forwarded = forwardable_response_headers(&fetched.headers);
    let content_type = fetched.content_type().to_string();

    if !is_html(&content_type) {
        return Ok((
            response::proxied(fetched.status, forwarded, &content_type, fetched.body),
            "passthrough",
        ));
    }

    // The rewritten body is plain UTF-8 whatever the upstream sent.
    let mut forwarded = forwarded;
    forwarded.remove(header::CONTENT_ENCODING);

    let ctx = RewriteContext {
        body: &fetched.body,
        content_type: &content_type,
        target: &target,
    };
    let html = rewrite_document(&ctx, &state.proxifier);
    metrics::record_rewrite();

    tracing::debug!(
        request_id = %request_id,
        final_url = %fetched.final_url,
        bytes_in = fetched.body.len(),
        bytes_out = html.len(),
        "Rewrote document"
    );

    Ok((
        response::proxied(fetched.status, forwarded, REWRITTEN_CONTENT_TYPE, html),
        "html",
    ))
}
