//! HTTP request/response component types.
//!
//! # Data Flow
//! ```text
//! hyper Request<Incoming>
//!     → RawRequest (collected body, peer address)
//!     → request.rs (HttpRequest component: template clone + assign)
//!     → [dispatch fills the HttpResponse buffer]
//!     → response.rs (serialize into hyper Response)
//! ```
//!
//! # Design Decisions
//! - The request component is cloned from the prototype's template, then
//!   assigned the inbound data; the template's derived URL cache is cleared
//!   before every clone so no cycle inherits stale state
//! - Responses are buffered and flushed after dispatch completes

pub mod request;
pub mod response;

pub use request::{HttpRequest, RawRequest, ScriptBinding};
pub use response::HttpResponse;
