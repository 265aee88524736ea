//! Response component.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{HeaderMap, StatusCode};

/// The response component of an application instance.
///
/// A buffered status/headers/body triple. Dispatch writes into the buffer;
/// the worker flushes it to the connection once the cycle completes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl HttpResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: hyper::header::HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn set_content_type(&mut self, mime: &str) {
        if let Ok(value) = HeaderValue::from_str(mime) {
            self.headers.insert(CONTENT_TYPE, value);
        }
    }

    /// Ask the transport to close the connection after this response.
    pub fn set_connection_close(&mut self) {
        self.headers.insert(CONNECTION, HeaderValue::from_static("close"));
    }

    /// Append bytes to the body buffer.
    pub fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn clear_body(&mut self) {
        self.body.clear();
    }

    /// Serve a file verbatim: content type from its MIME, exact byte length,
    /// and connection close, mirroring direct static output.
    pub fn serve_file(mime: &str, content: Vec<u8>) -> Self {
        let mut response = Self::default();
        response.set_content_type(mime);
        if let Ok(value) = HeaderValue::from_str(&content.len().to_string()) {
            response.headers.insert(CONTENT_LENGTH, value);
        }
        response.set_connection_close();
        response.body = content;
        response
    }

    /// Flush the buffer into a hyper response.
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);
        if let Some(headers) = builder.headers_mut() {
            *headers = self.headers;
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| hyper::Response::new(Full::new(Bytes::new())))
    }
}
