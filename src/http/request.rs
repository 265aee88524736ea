//! Request component.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use hyper::http::request::Parts;
use hyper::{HeaderMap, Method, Uri};
use url::Url;

/// Raw inbound request data read off the wire, before it is bound to an
/// application instance.
#[derive(Debug)]
pub struct RawRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub peer: SocketAddr,
}

impl RawRequest {
    pub fn from_parts(parts: Parts, body: Bytes, peer: SocketAddr) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            peer,
        }
    }
}

/// Identity of the entry script a dynamic request executes as.
///
/// Every dynamic request targets the single configured entry script,
/// regardless of the original URI; routing below that point is the hosted
/// application's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBinding {
    /// Absolute path of the entry script on disk.
    pub script_filename: PathBuf,
    /// The document root the script runs under.
    pub document_root: PathBuf,
    /// URI-space name of the script, e.g. `/index.php`.
    pub script_name: String,
}

impl ScriptBinding {
    pub fn entry(root: &Path, index_file: &str) -> Self {
        Self {
            script_filename: root.join(index_file),
            document_root: root.to_path_buf(),
            script_name: format!("/{}", index_file),
        }
    }
}

/// The request component of an application instance.
///
/// The prototype holds a template with default values; the context factory
/// clones it and assigns the inbound data per request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    script: Option<ScriptBinding>,
    /// Base URL the application is served under.
    base_url: String,
    /// Derived absolute URL, parsed lazily and cached. Cleared on the
    /// template before every clone.
    cached_url: Option<Url>,
}

impl HttpRequest {
    /// A template request carrying only defaults.
    pub fn template(base_url: &str) -> Self {
        Self {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            remote_addr: None,
            script: None,
            base_url: base_url.to_string(),
            cached_url: None,
        }
    }

    /// Bind inbound wire data and the entry-script identity to this request.
    pub fn assign(&mut self, raw: RawRequest, script: ScriptBinding) {
        self.method = raw.method;
        self.uri = raw.uri;
        self.headers = raw.headers;
        self.body = raw.body;
        self.remote_addr = Some(raw.peer);
        self.script = Some(script);
        self.cached_url = None;
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn script(&self) -> Option<&ScriptBinding> {
        self.script.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The request's absolute URL, derived from the Host header and cached.
    pub fn url(&mut self) -> Option<&Url> {
        if self.cached_url.is_none() {
            let host = self.header("host").unwrap_or("localhost");
            let text = format!(
                "http://{}{}",
                host,
                self.uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/")
            );
            self.cached_url = Url::parse(&text).ok();
        }
        self.cached_url.as_ref()
    }

    /// Drop any derived URL state so a clone starts from a clean parse.
    pub fn clear_cached_url(&mut self) {
        self.cached_url = None;
    }

    /// Whether derived URL state is currently cached.
    pub fn has_cached_url(&self) -> bool {
        self.cached_url.is_some()
    }

    /// Session cookie value, if the request carries one under `name`.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then_some(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(uri: &str, host: &str) -> RawRequest {
        RawRequest {
            method: Method::GET,
            uri: uri.parse().unwrap(),
            headers: {
                let mut h = HeaderMap::new();
                h.insert("host", host.parse().unwrap());
                h
            },
            body: Bytes::new(),
            peer: "127.0.0.1:4000".parse().unwrap(),
        }
    }

    #[test]
    fn url_is_derived_and_cached() {
        let mut request = HttpRequest::template("/");
        request.assign(
            raw("/post/index?page=2", "example.test"),
            ScriptBinding::entry(Path::new("/srv/web"), "index.php"),
        );

        let url = request.url().unwrap().clone();
        assert_eq!(url.host_str(), Some("example.test"));
        assert_eq!(url.path(), "/post/index");
        assert!(request.has_cached_url());

        request.clear_cached_url();
        assert!(!request.has_cached_url());
    }

    #[test]
    fn assign_resets_derived_state() {
        let mut request = HttpRequest::template("/");
        request.assign(
            raw("/a", "one.test"),
            ScriptBinding::entry(Path::new("/srv/web"), "index.php"),
        );
        request.url();

        request.assign(
            raw("/b", "two.test"),
            ScriptBinding::entry(Path::new("/srv/web"), "index.php"),
        );
        assert!(!request.has_cached_url());
        assert_eq!(request.url().unwrap().host_str(), Some("two.test"));
    }

    #[test]
    fn cookie_lookup() {
        let mut request = HttpRequest::template("/");
        let mut r = raw("/", "example.test");
        r.headers.insert(
            "cookie",
            "theme=dark; JSESSIONID=abc123; lang=en".parse().unwrap(),
        );
        request.assign(r, ScriptBinding::entry(Path::new("/srv"), "index.php"));

        assert_eq!(request.cookie("JSESSIONID"), Some("abc123"));
        assert_eq!(request.cookie("missing"), None);
    }
}
