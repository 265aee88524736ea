//! Application instances and per-request isolation.
//!
//! # Data Flow
//! ```text
//! bootstrap (once)
//!     → prototype.rs (PrototypeApp: registry + config + routes +
//!       component templates)
//!
//! per request:
//!     → context.rs (clear template URL cache, clone the six mutable
//!       components, share registry/config/routes by Arc)
//!     → isolated.rs (IsolatedApp, bound to its connection)
//!     → dispatched, then discarded; the ambient slot reverts to the
//!       prototype on every exit path
//! ```
//!
//! # Design Decisions
//! - The prototype is never mutated while serving, except for the one
//!   sanctioned pre-clone touch: clearing the request template's cached URL
//! - Clone-per-request replaces fresh-construction-per-request; the
//!   expensive invariant state (registry, routes, config) is reused by
//!   reference
//! - The ambient "current application" is a worker-owned slot restored by
//!   an RAII guard, not a process-wide global

pub mod components;
pub mod context;
pub mod isolated;
pub mod prototype;

pub use components::{ErrorRenderer, Identity, Session, View};
pub use context::{Ambient, AmbientApp, AmbientGuard};
pub use isolated::{InstanceId, IsolatedApp};
pub use prototype::PrototypeApp;
