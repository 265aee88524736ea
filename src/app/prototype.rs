//! The long-lived prototype application instance.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::components::{ErrorRenderer, Identity, Session, View};
use crate::bootstrap::registry::ServiceRegistry;
use crate::config::AppConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::net::listener::ServerHandle;
use crate::routing::RouteTable;

/// The single application instance a worker keeps alive between requests.
///
/// Built once at bootstrap; mutated only there. The one sanctioned per-cycle
/// touch is clearing the request template's derived URL cache immediately
/// before the context factory clones it.
#[derive(Debug)]
pub struct PrototypeApp {
    config: Arc<AppConfig>,
    registry: Arc<ServiceRegistry>,
    routes: Arc<RouteTable>,
    root: PathBuf,
    aliases: BTreeMap<String, String>,
    server: ServerHandle,

    // Request-scoped component templates, cloned per request.
    pub(crate) request: HttpRequest,
    pub(crate) response: HttpResponse,
    pub(crate) session: Session,
    pub(crate) identity: Identity,
    pub(crate) view: View,
    pub(crate) error_handler: ErrorRenderer,
}

impl PrototypeApp {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: Arc<AppConfig>,
        registry: Arc<ServiceRegistry>,
        routes: Arc<RouteTable>,
        root: PathBuf,
        aliases: BTreeMap<String, String>,
        server: ServerHandle,
        request: HttpRequest,
        session: Session,
        error_handler: ErrorRenderer,
    ) -> Self {
        Self {
            config,
            registry,
            routes,
            root,
            aliases,
            server,
            request,
            response: HttpResponse::default(),
            session,
            identity: Identity::default(),
            view: View::default(),
            error_handler,
        }
    }

    pub fn config(&self) -> &Arc<AppConfig> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    pub fn server(&self) -> ServerHandle {
        self.server
    }

    /// The request template, exposed for inspection in tests.
    pub fn request_template(&self) -> &HttpRequest {
        &self.request
    }

    pub(crate) fn request_template_mut(&mut self) -> &mut HttpRequest {
        &mut self.request
    }

    pub fn session_template(&self) -> &Session {
        &self.session
    }
}
