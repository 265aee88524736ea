//! Error containment boundary.
//!
//! Wraps the kernel's lifecycle call so that no single request's fault can
//! take down the worker or corrupt the prototype. Faults are either dumped
//! to the diagnostic stream (debug mode) or rendered by the isolated
//! instance's own error handler (production mode).

use std::cell::RefCell;
use std::io::Write;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::app::IsolatedApp;
use crate::kernel::{AppKernel, DispatchError};

/// Outcome of one contained lifecycle run.
#[derive(Debug)]
pub enum Containment {
    Completed,
    Faulted(DispatchError),
}

/// The failure barrier around request execution.
pub struct ErrorBoundary {
    debug: bool,
    /// Where debug-mode fault text goes. Stderr in production; injectable
    /// so tests can observe the stream.
    diagnostics: RefCell<Box<dyn Write>>,
}

impl ErrorBoundary {
    pub fn new(debug: bool) -> Self {
        Self::with_diagnostics(debug, Box::new(std::io::stderr()))
    }

    pub fn with_diagnostics(debug: bool, diagnostics: Box<dyn Write>) -> Self {
        Self {
            debug,
            diagnostics: RefCell::new(diagnostics),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Run the lifecycle and the post-lifecycle hook, containing any fault.
    ///
    /// The hook runs first on the fault path: cleanup must happen even when
    /// the lifecycle failed. A fault inside the hook itself is logged and
    /// swallowed so the worker stays able to serve the next request.
    pub fn contain(&self, app: &mut IsolatedApp, kernel: &dyn AppKernel) -> Containment {
        let lifecycle = catch_unwind(AssertUnwindSafe(|| kernel.run(app)));

        let fault = match lifecycle {
            Ok(Ok(())) => {
                self.run_after_hook(app, kernel);
                return Containment::Completed;
            }
            Ok(Err(fault)) => fault,
            Err(payload) => DispatchError::Panic(panic_message(payload)),
        };

        self.run_after_hook(app, kernel);

        if self.debug {
            // Deliberately bypasses the application's own error rendering:
            // when that pipeline is broken, the developer still sees the
            // true fault.
            let mut diagnostics = self.diagnostics.borrow_mut();
            let _ = writeln!(diagnostics, "{}", fault);
            app.response_mut().clear_body();
        } else {
            app.render_fault(&fault);
        }

        Containment::Faulted(fault)
    }

    fn run_after_hook(&self, app: &mut IsolatedApp, kernel: &dyn AppKernel) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| kernel.after_run(app))) {
            tracing::warn!(
                instance = %app.id(),
                fault = %panic_message(payload),
                "Post-lifecycle hook fault contained"
            );
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
