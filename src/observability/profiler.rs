//! Dispatch profiling tracer.
//!
//! Optional collaborator bracketing every dynamic dispatch, enabled by the
//! profile's `xhprofDebug` flag. Kept apart from the error boundary: it
//! observes dispatch but never participates in fault handling.

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::time::Instant;

use crate::app::IsolatedApp;
use crate::http::HttpRequest;

/// Observer invoked around each dispatch.
pub trait DispatchTracer {
    fn begin(&self, request: &HttpRequest);
    fn finish(&self, app: &IsolatedApp);
}

/// Wall-clock profiler writing one run line per dispatch to the diagnostic
/// stream.
pub struct DispatchProfiler {
    started: Cell<Option<Instant>>,
    sink: RefCell<Box<dyn Write>>,
}

impl DispatchProfiler {
    pub fn new() -> Self {
        Self::with_sink(Box::new(std::io::stderr()))
    }

    pub fn with_sink(sink: Box<dyn Write>) -> Self {
        Self {
            started: Cell::new(None),
            sink: RefCell::new(sink),
        }
    }
}

impl Default for DispatchProfiler {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTracer for DispatchProfiler {
    fn begin(&self, _request: &HttpRequest) {
        self.started.set(Some(Instant::now()));
    }

    fn finish(&self, app: &IsolatedApp) {
        let elapsed_us = self
            .started
            .take()
            .map(|t| t.elapsed().as_micros())
            .unwrap_or(0);
        let run_id = uuid::Uuid::new_v4().simple();

        let mut sink = self.sink.borrow_mut();
        let _ = writeln!(
            sink,
            "profile run {} {} {} {}us",
            run_id,
            app.request().method(),
            app.request().path(),
            elapsed_us
        );
    }
}
