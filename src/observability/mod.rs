//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems
//!     → logging.rs (structured tracing events → stdout)
//!
//! Dispatch, when xhprofDebug is set:
//!     → profiler.rs (tracer bracket around every dispatch)
//!     → run identifier + timing line on the diagnostic stream
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing`; level from RUST_LOG, falling back to
//!   the profile's debug flag
//! - The profiler is an injectable tracer, decoupled from the error
//!   boundary; debug-mode fault text bypasses both and goes straight to
//!   stderr

pub mod logging;
pub mod profiler;

pub use profiler::{DispatchProfiler, DispatchTracer};
