//! Worker lifecycle subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Stopped → Starting (bootstrap) → Running (accept + dispatch)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown broadcast → Stopping → Stopped
//!     SIGHUP → reload event → Reloading → Running
//!
//! Shutdown (shutdown.rs):
//!     broadcast received → stop accepting → drain in-flight → exit
//! ```
//!
//! # Design Decisions
//! - No requests are accepted before bootstrap completes
//! - Reload is explicitly rejected: configuration and code changes require
//!   a process restart, and the worker says so instead of pretending
//! - The in-flight request always completes; dispatch is synchronous and
//!   cannot be interrupted

pub mod shutdown;
pub mod signals;
pub mod state;

pub use shutdown::Shutdown;
pub use signals::ReloadEvent;
pub use state::WorkerState;
