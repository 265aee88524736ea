//! Request context factory and the ambient "current application" slot.
//!
//! # Responsibilities
//! - Manufacture an isolated instance from the prototype for each request:
//!   clone exactly the mutable, request-scoped components, share the
//!   request-invariant ones by `Arc`
//! - Clear the prototype request template's derived URL cache before the
//!   clone so no cycle inherits stale state
//! - Track which instance is ambient, restoring the prototype on every exit
//!   path via an RAII guard

use std::cell::Cell;
use std::rc::Rc;

use crate::app::isolated::{InstanceId, IsolatedApp};
use crate::app::prototype::PrototypeApp;
use crate::http::{RawRequest, ScriptBinding};
use crate::net::connection::ConnectionBinding;

/// Derive an isolated instance from the prototype.
///
/// The error handler, request, response, view, session, and identity are
/// independent copies; config, registry, and route table are shared by
/// reference. The instance is bound to the connection its response must
/// reach.
pub fn isolate(
    prototype: &mut PrototypeApp,
    raw: RawRequest,
    script: ScriptBinding,
    connection: ConnectionBinding,
) -> IsolatedApp {
    // The template must not carry derived URL state into the copy.
    prototype.request_template_mut().clear_cached_url();

    let mut request = prototype.request.clone();
    request.assign(raw, script);

    IsolatedApp::new(
        prototype.config().clone(),
        prototype.registry().clone(),
        prototype.routes().clone(),
        connection,
        request,
        prototype.response.clone(),
        prototype.session.clone(),
        prototype.identity.clone(),
        prototype.view.clone(),
        prototype.error_handler.clone(),
    )
}

/// What the ambient slot currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ambient {
    /// Between requests: the prototype.
    Prototype,
    /// During dispatch: the isolated instance serving the current request.
    Isolated(InstanceId),
}

/// Worker-owned "current application" slot.
///
/// Single-threaded by construction; the guard returned by [`enter`] restores
/// the prototype on drop, which covers success, handled faults, and unwinds
/// alike.
///
/// [`enter`]: AmbientApp::enter
#[derive(Debug, Clone)]
pub struct AmbientApp {
    slot: Rc<Cell<Ambient>>,
}

impl Default for AmbientApp {
    fn default() -> Self {
        Self {
            slot: Rc::new(Cell::new(Ambient::Prototype)),
        }
    }
}

impl AmbientApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Ambient {
        self.slot.get()
    }

    /// Mark an isolated instance current for the duration of the returned
    /// guard.
    pub fn enter(&self, id: InstanceId) -> AmbientGuard {
        self.slot.set(Ambient::Isolated(id));
        AmbientGuard {
            slot: Rc::clone(&self.slot),
        }
    }
}

/// Restores the prototype as the ambient application on drop.
#[derive(Debug)]
pub struct AmbientGuard {
    slot: Rc<Cell<Ambient>>,
}

impl Drop for AmbientGuard {
    fn drop(&mut self) {
        self.slot.set(Ambient::Prototype);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::Arc;

    use bytes::Bytes;
    use hyper::{HeaderMap, Method};

    use crate::app::components::{ErrorRenderer, Session};
    use crate::bootstrap::registry::ServiceRegistry;
    use crate::config::AppConfig;
    use crate::http::HttpRequest;
    use crate::net::listener::ServerHandle;
    use crate::routing::RouteTable;

    fn prototype() -> PrototypeApp {
        PrototypeApp::new(
            Arc::new(AppConfig::default()),
            Arc::new(ServiceRegistry::default()),
            Arc::new(RouteTable::default()),
            Path::new("/srv/web").to_path_buf(),
            BTreeMap::new(),
            ServerHandle::new("127.0.0.1:8080".parse().unwrap()),
            HttpRequest::template("/"),
            Session::new("JSESSIONID"),
            ErrorRenderer::default(),
        )
    }

    fn raw(path: &str) -> RawRequest {
        RawRequest {
            method: Method::GET,
            uri: path.parse().unwrap(),
            headers: {
                let mut h = HeaderMap::new();
                h.insert("host", "example.test".parse().unwrap());
                h
            },
            body: Bytes::new(),
            peer: "127.0.0.1:4000".parse().unwrap(),
        }
    }

    fn entry() -> ScriptBinding {
        ScriptBinding::entry(Path::new("/srv/web"), "index.php")
    }

    fn binding() -> ConnectionBinding {
        ConnectionBinding::new("127.0.0.1:4000".parse().unwrap())
    }

    #[test]
    fn isolated_components_are_independent_copies() {
        let mut prototype = prototype();
        let mut app = isolate(&mut prototype, raw("/a"), entry(), binding());

        app.session_mut().open(Some("tainted"));
        app.session_mut().set("user", serde_json::json!("mallory"));
        app.identity_mut().login("mallory");
        app.view_mut().write("partial markup");
        app.response_mut().write(b"partial body");

        // The prototype's templates are untouched.
        assert!(!prototype.session_template().is_open());
        assert!(prototype.session_template().is_empty());
        assert!(prototype.identity.is_guest());
        assert!(prototype.view.buffer().is_empty());
        assert!(prototype.response.body().is_empty());
    }

    #[test]
    fn consecutive_instances_do_not_share_state() {
        let mut prototype = prototype();

        let mut first = isolate(&mut prototype, raw("/a"), entry(), binding());
        first.session_mut().set("marker", serde_json::json!(1));
        let first_id = first.id();
        drop(first);

        let second = isolate(&mut prototype, raw("/b"), entry(), binding());
        assert_ne!(second.id(), first_id);
        assert!(second.session().get("marker").is_none());
    }

    #[test]
    fn template_url_cache_is_cleared_before_cloning() {
        let mut prototype = prototype();

        // Pollute the template with derived URL state, as a previous cycle
        // would have.
        prototype.request_template_mut().assign(raw("/stale"), entry());
        prototype.request_template_mut().url();
        assert!(prototype.request_template().has_cached_url());

        let app = isolate(&mut prototype, raw("/fresh"), entry(), binding());
        assert!(!prototype.request_template().has_cached_url());
        assert!(!app.request().has_cached_url());
        assert_eq!(app.request().path(), "/fresh");
    }

    #[test]
    fn registry_and_routes_are_shared_by_reference() {
        let mut prototype = prototype();
        let app = isolate(&mut prototype, raw("/a"), entry(), binding());

        // Same allocation, not a copy.
        assert_eq!(Arc::strong_count(prototype.registry()), 2);
        assert_eq!(Arc::strong_count(prototype.routes()), 2);
        drop(app);
        assert_eq!(Arc::strong_count(prototype.registry()), 1);
    }

    #[test]
    fn ambient_guard_restores_prototype() {
        let ambient = AmbientApp::new();
        assert_eq!(ambient.current(), Ambient::Prototype);

        let id = InstanceId::next();
        {
            let _guard = ambient.enter(id);
            assert_eq!(ambient.current(), Ambient::Isolated(id));
        }
        assert_eq!(ambient.current(), Ambient::Prototype);
    }

    #[test]
    fn ambient_guard_restores_on_unwind() {
        let ambient = AmbientApp::new();
        let id = InstanceId::next();

        let ambient_ref = ambient.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = ambient_ref.enter(id);
            panic!("lifecycle exploded");
        }));

        assert!(result.is_err());
        assert_eq!(ambient.current(), Ambient::Prototype);
    }
}
