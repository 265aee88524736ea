//! Request-scoped application components.
//!
//! These are the mutable pieces the context factory clones for every
//! request: session, identity, view buffer, and error renderer. Each is a
//! plain value type; cloning the prototype's template yields a component
//! with no ties to any previous cycle.

use std::collections::BTreeMap;

use crate::http::HttpResponse;
use crate::kernel::DispatchError;

/// Session handle. Storage backends are external; within a request the
/// session is an in-memory key/value map keyed by the session cookie.
#[derive(Debug, Clone)]
pub struct Session {
    cookie_name: String,
    id: Option<String>,
    data: BTreeMap<String, serde_json::Value>,
    opened: bool,
}

impl Session {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: cookie_name.to_string(),
            id: None,
            data: BTreeMap::new(),
            opened: false,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Open the session with an id read from the request's cookie, or a
    /// fresh one when the client sent none.
    pub fn open(&mut self, cookie_value: Option<&str>) {
        self.id = Some(
            cookie_value
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string()),
        );
        self.opened = true;
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Identity/user context for the current request.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    user_id: Option<String>,
}

impl Identity {
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn login(&mut self, user_id: &str) {
        self.user_id = Some(user_id.to_string());
    }

    pub fn logout(&mut self) {
        self.user_id = None;
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// View rendering buffer.
#[derive(Debug, Clone, Default)]
pub struct View {
    title: Option<String>,
    buffer: String,
}

impl View {
    pub fn set_title(&mut self, title: &str) {
        self.title = Some(title.to_string());
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn write(&mut self, fragment: &str) {
        self.buffer.push_str(fragment);
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Drain the buffer for emission into the response.
    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// User-facing fault renderer, used in production mode.
///
/// Maps a dispatch fault to a status code and a templated page that never
/// exposes internal fault detail.
#[derive(Debug, Clone)]
pub struct ErrorRenderer {
    site_name: String,
}

impl ErrorRenderer {
    pub fn new(site_name: &str) -> Self {
        Self {
            site_name: site_name.to_string(),
        }
    }

    pub fn render(&self, fault: &DispatchError, response: &mut HttpResponse) {
        let status = fault.status();
        response.set_status(status);
        response.set_content_type("text/html; charset=UTF-8");
        response.clear_body();
        response.write(
            format!(
                "<html><head><title>{} — {}</title></head>\
                 <body><h1>{}</h1><p>The server was unable to complete your request.</p></body></html>",
                status.as_u16(),
                self.site_name,
                status.canonical_reason().unwrap_or("Error"),
            )
            .as_bytes(),
        );
    }
}

impl Default for ErrorRenderer {
    fn default() -> Self {
        Self::new("Application")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_open_reuses_cookie_id() {
        let mut session = Session::new("JSESSIONID");
        session.open(Some("abc123"));
        assert!(session.is_open());
        assert_eq!(session.id(), Some("abc123"));
    }

    #[test]
    fn session_open_generates_fresh_id() {
        let mut first = Session::new("JSESSIONID");
        let mut second = Session::new("JSESSIONID");
        first.open(None);
        second.open(None);
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn renderer_emits_status_page_without_fault_detail() {
        let renderer = ErrorRenderer::default();
        let mut response = HttpResponse::default();
        response.write(b"partial output from the failed lifecycle");

        let fault = DispatchError::App("db credentials rejected for user admin".into());
        renderer.render(&fault, &mut response);

        let body = String::from_utf8_lossy(response.body()).into_owned();
        assert_eq!(response.status().as_u16(), 500);
        assert!(body.contains("Internal Server Error"));
        assert!(!body.contains("db credentials"));
        assert!(!body.contains("partial output"));
    }

    #[test]
    fn renderer_maps_route_not_found_to_404() {
        let renderer = ErrorRenderer::default();
        let mut response = HttpResponse::default();
        renderer.render(&DispatchError::RouteNotFound("/x".into()), &mut response);
        assert_eq!(response.status().as_u16(), 404);
    }
}
