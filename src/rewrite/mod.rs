//! Response rewriting subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream HTML (bytes, content-type, target URL)
//!     → pipeline.rs (orchestration)
//!         → charset.rs, base.rs, attrs.rs, css.rs, meta_refresh.rs, hook.rs
//!     → UTF-8 document whose references point back at the proxy
//!
//! Every pass that touches a URL goes through proxify.rs.
//! ```
//!
//! # Design Decisions
//! - Text-level regex passes, not a DOM parse; malformed markup is tolerated
//! - All passes are pure functions; compiled patterns are the only statics
//! - A reference that cannot be resolved is left exactly as found

pub mod attrs;
pub mod base;
pub mod charset;
pub mod css;
pub mod hook;
pub mod meta_refresh;
pub mod pipeline;
pub mod proxify;

pub use pipeline::{is_html, rewrite_document, RewriteContext};
pub use proxify::{Proxifier, DEFAULT_ENDPOINT};
