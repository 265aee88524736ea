//! The worker event loop.
//!
//! # Data Flow
//! ```text
//! run(): Starting (bind + bootstrap) → Running
//!     accept loop ──▶ one task per connection (spawn_local, HTTP/1.1)
//!         per request: collect body → handle_message():
//!             static asset  → serve file, dispatcher untouched
//!             dynamic       → isolate from prototype → ambient guard →
//!                             dispatch inside the error boundary →
//!                             flush buffered response, discard instance
//!     shutdown broadcast → Stopping (drain in-flight) → Stopped
//!     reload event → Reloading (rejected with a warning) → Running
//! ```
//!
//! # Design Decisions
//! - The worker runs on a current-thread runtime; `handle_message` is
//!   synchronous, so request lifecycles never overlap even though the
//!   event loop multiplexes many connections
//! - The prototype lives behind a `RefCell` that is only borrowed inside
//!   synchronous sections; no borrow is ever held across an await
//! - Requests are rejected with 503 outside the Running state

use std::cell::{Cell, RefCell};
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{context, Ambient, AmbientApp, PrototypeApp};
use crate::assets::{self, Resolution};
use crate::bootstrap::{BootstrapError, Bootstrapper};
use crate::config::schema::ServerProfile;
use crate::dispatch::boundary::ErrorBoundary;
use crate::dispatch::Dispatcher;
use crate::http::{HttpResponse, RawRequest};
use crate::kernel::AppKernel;
use crate::lifecycle::signals::ReloadEvent;
use crate::lifecycle::state::WorkerState;
use crate::net::connection::{ConnectionBinding, ConnectionTracker};
use crate::net::listener::{ConnectionPermit, Listener, ListenerError};
use crate::observability::profiler::{DispatchProfiler, DispatchTracer};

/// Fatal worker fault. Only startup can produce one; request handling never
/// escapes its boundary.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
}

/// One persistent worker: prototype, dispatcher, and event loop.
pub struct Worker {
    inner: Rc<Inner>,
}

impl Clone for Worker {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

struct Inner {
    profile: ServerProfile,
    kernel: Box<dyn AppKernel>,
    tracer: Option<Box<dyn DispatchTracer>>,
    dispatcher: Dispatcher,
    bootstrapper: RefCell<Bootstrapper>,
    prototype: RefCell<Option<PrototypeApp>>,
    ambient: AmbientApp,
    state: Cell<WorkerState>,
    local_addr: Cell<Option<SocketAddr>>,
    tracker: ConnectionTracker,
}

impl Worker {
    pub fn new(profile: ServerProfile, kernel: Box<dyn AppKernel>) -> Self {
        let tracer: Option<Box<dyn DispatchTracer>> = if profile.xhprof_debug {
            Some(Box::new(DispatchProfiler::new()))
        } else {
            None
        };
        let dispatcher = Dispatcher::new(ErrorBoundary::new(profile.debug));

        Self {
            inner: Rc::new(Inner {
                profile,
                kernel,
                tracer,
                dispatcher,
                bootstrapper: RefCell::new(Bootstrapper::new()),
                prototype: RefCell::new(None),
                ambient: AmbientApp::new(),
                state: Cell::new(WorkerState::Stopped),
                local_addr: Cell::new(None),
                tracker: ConnectionTracker::new(),
            }),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.inner.state.get()
    }

    /// What the ambient "current application" slot points at.
    pub fn ambient(&self) -> Ambient {
        self.inner.ambient.current()
    }

    /// The address the listener is bound to, once Running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr.get()
    }

    /// How many requests have entered dynamic dispatch.
    pub fn dispatch_count(&self) -> u64 {
        self.inner.dispatcher.dispatch_count()
    }

    /// Run the worker until the shutdown broadcast fires.
    ///
    /// Must be called inside a `tokio::task::LocalSet` on a current-thread
    /// runtime; connection tasks are spawned locally so dispatch stays
    /// single-threaded.
    pub async fn run(
        &self,
        mut shutdown: broadcast::Receiver<()>,
        mut reload: UnboundedReceiver<ReloadEvent>,
    ) -> Result<(), WorkerError> {
        self.transition(WorkerState::Starting);
        let listener = match self.start() {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Worker start aborted");
                self.transition(WorkerState::Stopping);
                self.transition(WorkerState::Stopped);
                return Err(e);
            }
        };
        self.transition(WorkerState::Running);

        let mut reload_closed = false;
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                event = reload.recv(), if !reload_closed => match event {
                    Some(ReloadEvent) => self.on_reload(),
                    None => reload_closed = true,
                },
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => self.spawn_connection(stream, peer, permit),
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }

        self.transition(WorkerState::Stopping);
        if !self.inner.tracker.drain(Duration::from_secs(5)).await {
            tracing::warn!(
                active = self.inner.tracker.active_count(),
                "Drain deadline passed with connections still open"
            );
        }
        self.transition(WorkerState::Stopped);
        Ok(())
    }

    /// Bind the listener and bootstrap the prototype. Any fault here aborts
    /// the worker before it accepts a single request.
    fn start(&self) -> Result<Listener, WorkerError> {
        let listener = Listener::bind(&self.inner.profile)?;
        let handle = listener
            .handle()
            .map_err(|e| ListenerError::Bind(self.inner.profile.bind_address(), e))?;
        self.inner.local_addr.set(Some(handle.local_addr()));

        let prototype = self
            .inner
            .bootstrapper
            .borrow_mut()
            .bootstrap(&self.inner.profile, handle)?;
        *self.inner.prototype.borrow_mut() = Some(prototype);
        Ok(listener)
    }

    fn on_reload(&self) {
        self.transition(WorkerState::Reloading);
        tracing::warn!(
            "Reload requested, but hot reload is unsupported; restart the worker to pick up changes"
        );
        self.transition(WorkerState::Running);
    }

    fn transition(&self, next: WorkerState) {
        let current = self.inner.state.get();
        if !current.can_transition(next) {
            tracing::error!(%current, %next, "Illegal worker state transition");
        }
        tracing::info!(
            worker = self.inner.profile.server.name.as_deref().unwrap_or("worker"),
            from = %current,
            to = %next,
            "Worker state changed"
        );
        self.inner.state.set(next);
    }

    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr, permit: ConnectionPermit) {
        let worker = self.clone();
        tokio::task::spawn_local(async move {
            let _permit = permit;
            let _tracked = worker.inner.tracker.track();
            let binding = ConnectionBinding::new(peer);

            let service_worker = worker.clone();
            let service = service_fn(move |request: hyper::Request<Incoming>| {
                let worker = service_worker.clone();
                async move {
                    let response = worker.serve_request(request, binding).await;
                    Ok::<_, std::convert::Infallible>(response.into_hyper())
                }
            });

            if let Err(e) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::debug!(
                    connection = %binding.id(),
                    error = %e,
                    "Connection closed with protocol error"
                );
            }
        });
    }

    /// Read one request off the wire and hand it to the synchronous cycle.
    async fn serve_request(
        &self,
        request: hyper::Request<Incoming>,
        binding: ConnectionBinding,
    ) -> HttpResponse {
        let (parts, body) = request.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                tracing::warn!(connection = %binding.id(), error = %e, "Failed to read request body");
                let mut response = HttpResponse::default();
                response.set_status(StatusCode::BAD_REQUEST);
                response.set_connection_close();
                return response;
            }
        };

        self.handle_message(RawRequest::from_parts(parts, body, binding.peer()), binding)
    }

    /// One full request cycle, run to completion.
    ///
    /// Static assets short-circuit before any application machinery runs.
    /// Everything else is funnelled through the entry script: an isolated
    /// instance is cloned off the prototype, made ambient, dispatched inside
    /// the containment boundary, and discarded.
    pub fn handle_message(&self, raw: RawRequest, binding: ConnectionBinding) -> HttpResponse {
        if !self.inner.state.get().accepts_requests() {
            let mut response = HttpResponse::default();
            response.set_status(StatusCode::SERVICE_UNAVAILABLE);
            response.set_connection_close();
            return response;
        }

        let profile = &self.inner.profile;
        match assets::resolve(raw.uri.path(), &profile.root, &profile.index_file) {
            Resolution::Asset(file) => {
                tracing::debug!(path = %raw.uri.path(), bytes = file.len(), "Serving static asset");
                HttpResponse::serve_file(&file.mime, file.content)
            }
            Resolution::Dynamic(script) => {
                let mut slot = self.inner.prototype.borrow_mut();
                let Some(prototype) = slot.as_mut() else {
                    let mut response = HttpResponse::default();
                    response.set_status(StatusCode::SERVICE_UNAVAILABLE);
                    return response;
                };
                let mut app = context::isolate(prototype, raw, script, binding);
                drop(slot);

                let guard = self.inner.ambient.enter(app.id());
                self.inner.dispatcher.dispatch(
                    &mut app,
                    self.inner.kernel.as_ref(),
                    self.inner.tracer.as_deref(),
                );
                drop(guard);

                app.into_response()
            }
        }
    }
}
