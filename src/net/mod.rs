//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, transport options, connection limits)
//!     → connection.rs (binding + lifecycle tracking)
//!     → Hand off to the HTTP codec
//! ```
//!
//! # Design Decisions
//! - Transport options from the profile's `server` table are applied
//!   verbatim at bind time (backlog, reuse-port, nodelay)
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked so shutdown can drain in-flight work

pub mod connection;
pub mod listener;

pub use connection::{ConnectionBinding, ConnectionTracker};
pub use listener::{Listener, ServerHandle};
