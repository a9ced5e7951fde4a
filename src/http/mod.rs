//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → request.rs (query parameters, request ID)
//!     → security + upstream (validate target, fetch)
//!     → rewrite (HTML only)
//!     → response.rs (headers, CORS, content type)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{ProxyQuery, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
