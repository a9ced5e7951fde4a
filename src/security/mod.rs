//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → target.rs (scheme + address policy on the target URL)
//!     → headers.rs (build outbound headers)
//!     → fetch
//!     → headers.rs (strip framing/embedding restrictions from the response)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a target that fails any check is never fetched
//! - No trust in client input: cookies come only from the explicit query value

pub mod headers;
pub mod target;

pub use headers::{forwardable_response_headers, outbound_headers, ForwardOptions, EMBEDDING_BLOCKLIST};
pub use target::parse_target;
