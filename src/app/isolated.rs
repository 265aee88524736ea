//! The short-lived isolated application instance.

use std::sync::Arc;

use uuid::Uuid;

use crate::app::components::{ErrorRenderer, Identity, Session, View};
use crate::bootstrap::registry::ServiceRegistry;
use crate::config::AppConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::kernel::DispatchError;
use crate::net::connection::ConnectionBinding;
use crate::routing::RouteTable;

/// Unique marker for one isolated instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn next() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "app-{}", self.0.simple())
    }
}

/// A logically independent application instance serving exactly one request.
///
/// Owns its own copies of the six request-scoped components; shares the
/// request-invariant state (config, registry, routes) with the prototype by
/// reference. Created by the context factory, discarded when the response
/// has been flushed.
#[derive(Debug)]
pub struct IsolatedApp {
    id: InstanceId,
    config: Arc<AppConfig>,
    registry: Arc<ServiceRegistry>,
    routes: Arc<RouteTable>,
    connection: ConnectionBinding,

    request: HttpRequest,
    response: HttpResponse,
    session: Session,
    identity: Identity,
    view: View,
    error_handler: ErrorRenderer,
}

impl IsolatedApp {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: Arc<AppConfig>,
        registry: Arc<ServiceRegistry>,
        routes: Arc<RouteTable>,
        connection: ConnectionBinding,
        request: HttpRequest,
        response: HttpResponse,
        session: Session,
        identity: Identity,
        view: View,
        error_handler: ErrorRenderer,
    ) -> Self {
        Self {
            id: InstanceId::next(),
            config,
            registry,
            routes,
            connection,
            request,
            response,
            session,
            identity,
            view,
            error_handler,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn connection(&self) -> ConnectionBinding {
        self.connection
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut HttpRequest {
        &mut self.request
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut HttpResponse {
        &mut self.response
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Render a contained fault through this instance's own error handler.
    pub fn render_fault(&mut self, fault: &DispatchError) {
        self.error_handler.render(fault, &mut self.response);
    }

    /// Take the buffered response for flushing; the instance is spent.
    pub fn into_response(self) -> HttpResponse {
        self.response
    }
}
