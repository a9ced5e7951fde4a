//! Embedding forward proxy.
//!
//! Fetches a target URL on behalf of a browser page, strips the headers that
//! block cross-origin embedding and, for HTML, rewrites references so that
//! follow-up requests come back through the proxy.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rewrite::{rewrite_document, Proxifier, RewriteContext};
