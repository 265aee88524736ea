//! Request dispatch.
//!
//! # Data Flow
//! ```text
//! IsolatedApp (from the context factory)
//!     → dispatch(): tracer begin → error boundary { kernel.run →
//!       after_run hook } → tracer finish
//!     → buffered response flushed by the worker
//! ```
//!
//! # Design Decisions
//! - Dispatch is synchronous and run-to-completion; there is no
//!   cancellation primitive
//! - The post-lifecycle hook runs on every outcome, and its own faults are
//!   contained
//! - The profiler tracer is decoupled from the error boundary: it observes
//!   dispatch, it cannot interfere with fault handling

pub mod boundary;

use std::cell::Cell;

use crate::app::IsolatedApp;
use crate::dispatch::boundary::{Containment, ErrorBoundary};
use crate::kernel::AppKernel;
use crate::observability::profiler::DispatchTracer;

/// Runs isolated instances through their request lifecycle.
pub struct Dispatcher {
    boundary: ErrorBoundary,
    dispatched: Cell<u64>,
}

impl Dispatcher {
    pub fn new(boundary: ErrorBoundary) -> Self {
        Self {
            boundary,
            dispatched: Cell::new(0),
        }
    }

    /// Run one request lifecycle to completion.
    pub fn dispatch(
        &self,
        app: &mut IsolatedApp,
        kernel: &dyn AppKernel,
        tracer: Option<&dyn DispatchTracer>,
    ) {
        self.dispatched.set(self.dispatched.get() + 1);

        if let Some(tracer) = tracer {
            tracer.begin(app.request());
        }

        match self.boundary.contain(app, kernel) {
            Containment::Completed => {
                tracing::debug!(
                    instance = %app.id(),
                    path = %app.request().path(),
                    status = app.response().status().as_u16(),
                    "Request completed"
                );
            }
            Containment::Faulted(fault) => {
                tracing::warn!(
                    instance = %app.id(),
                    path = %app.request().path(),
                    fault = %fault,
                    "Request fault contained"
                );
            }
        }

        if let Some(tracer) = tracer {
            tracer.finish(app);
        }
    }

    /// How many requests have entered dynamic dispatch. Static asset
    /// serving never moves this counter.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatched.get()
    }
}
