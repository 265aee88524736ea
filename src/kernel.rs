//! The application kernel seam.
//!
//! The hosted application's routing, controllers, and persistence are
//! external collaborators; the worker only needs a way to run one request
//! lifecycle to completion against an isolated instance. That seam is the
//! [`AppKernel`] trait, installed once at worker construction.

use hyper::StatusCode;

use crate::app::IsolatedApp;

/// A fault raised while running the request lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("route not found: {0}")]
    RouteNotFound(String),
    #[error("application failure: {0}")]
    App(String),
    #[error("request lifecycle panicked: {0}")]
    Panic(String),
}

impl DispatchError {
    /// The status code a user-facing error page carries for this fault.
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::RouteNotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::App(_) | DispatchError::Panic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// The hosted application's request lifecycle.
///
/// `run` executes routing, business logic, and response emission against the
/// isolated instance, synchronously and to completion. `after_run` is the
/// post-lifecycle hook: it always runs, success or fault, and its own faults
/// are contained by the dispatch boundary.
pub trait AppKernel {
    fn run(&self, app: &mut IsolatedApp) -> Result<(), DispatchError>;

    fn after_run(&self, _app: &mut IsolatedApp) {}
}

/// Placeholder kernel mounted by the `appserver` binary.
///
/// Echoes the request back as a small HTML page. A real deployment replaces
/// this with the hosted application's kernel.
#[derive(Debug, Default)]
pub struct EchoKernel;

impl AppKernel for EchoKernel {
    fn run(&self, app: &mut IsolatedApp) -> Result<(), DispatchError> {
        let method = app.request().method().clone();
        let path = app.request().path().to_string();
        let script = app
            .request()
            .script()
            .map(|s| s.script_name.clone())
            .unwrap_or_default();
        let route = app
            .routes()
            .match_path(&path)
            .map(|rule| rule.route.clone());

        let view = app.view_mut();
        view.write(&format!("<h1>{} {}</h1>", method, path));
        view.write(&format!("<p>entry script: {}</p>", script));
        if let Some(route) = route {
            view.write(&format!("<p>route: {}</p>", route));
        }

        let page = app.view_mut().take_buffer();
        let response = app.response_mut();
        response.set_content_type("text/html; charset=UTF-8");
        response.write(page.as_bytes());
        Ok(())
    }
}
