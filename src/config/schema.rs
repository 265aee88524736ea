//! Configuration schema definitions.
//!
//! This module defines the worker profile structure. All types derive Serde
//! traits for deserialization from the TOML profiles file. Keys use
//! camelCase on the wire (`configFile`, `persistClasses`, ...).

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level profiles file.
///
/// ```toml
/// [http.site]
/// host = "127.0.0.1"
/// port = 8080
/// root = "/srv/site/web"
/// configFile = ["config/web.toml", "config/local.toml"]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProfilesFile {
    /// Named HTTP worker profiles.
    pub http: BTreeMap<String, ServerProfile>,
}

/// One named worker profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerProfile {
    /// Listen host.
    pub host: String,

    /// Listen port. Port 0 binds an ephemeral port.
    pub port: u16,

    /// Document root. Static assets are served from here; the entry script
    /// lives directly under it.
    pub root: PathBuf,

    /// Entry script file name under `root`. Every dynamic request is routed
    /// through this single script; its extension marks files that must never
    /// be served statically.
    pub index_file: String,

    /// Transport tuning options applied verbatim to the listener.
    pub server: TransportOptions,

    /// Ordered configuration sources. Later files override earlier keys at
    /// the leaf level.
    pub config_file: Vec<PathBuf>,

    /// One-time process-initialization files (env format), loaded once at
    /// bootstrap. A missing file aborts worker start.
    pub bootstrap_file: Vec<PathBuf>,

    /// Passed through to the application config untouched.
    pub bootstrap_refresh: Option<bool>,

    /// Service ids exempt from the per-bootstrap registry reset. Merged into
    /// the process-persistent override list, duplicates removed.
    pub persist_classes: Vec<String>,

    /// Debug mode: dispatch faults go to the diagnostic stream and the
    /// client receives an empty body. Not safe for production.
    pub debug: bool,

    /// Enables the dispatch profiler, which writes a run identifier to the
    /// diagnostic stream after each dispatch.
    pub xhprof_debug: bool,
}

impl Default for ServerProfile {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            root: PathBuf::from("."),
            index_file: "index.php".to_string(),
            server: TransportOptions::default(),
            config_file: Vec::new(),
            bootstrap_file: Vec::new(),
            bootstrap_refresh: None,
            persist_classes: Vec::new(),
            debug: false,
            xhprof_debug: false,
        }
    }
}

impl ServerProfile {
    /// The extension that marks executable scripts, derived from the entry
    /// script's file name. Files with this extension are never served
    /// statically.
    pub fn script_extension(&self) -> Option<&str> {
        std::path::Path::new(&self.index_file)
            .extension()
            .and_then(|e| e.to_str())
    }

    /// The address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Listener tuning options, applied verbatim at bind time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportOptions {
    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,

    /// Accept backlog passed to listen(2).
    pub backlog: Option<i32>,

    /// SO_REUSEPORT, so several worker processes can share one port.
    pub reuse_port: bool,

    /// TCP_NODELAY on accepted connections.
    pub nodelay: bool,

    /// Optional worker name used in logs.
    pub name: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            max_connections: 10_000,
            backlog: None,
            reuse_port: false,
            nodelay: true,
            name: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_camel_case_keys() {
        let profile: ServerProfile = toml::from_str(
            r#"
            host = "127.0.0.1"
            port = 9000
            root = "/srv/web"
            indexFile = "app.php"
            configFile = ["a.toml", "b.toml"]
            bootstrapFile = ["boot.env"]
            bootstrapRefresh = true
            persistClasses = ["session", "view"]
            debug = true
            xhprofDebug = true

            [server]
            maxConnections = 128
            reusePort = true
            "#,
        )
        .unwrap();

        assert_eq!(profile.port, 9000);
        assert_eq!(profile.index_file, "app.php");
        assert_eq!(profile.config_file.len(), 2);
        assert_eq!(profile.bootstrap_refresh, Some(true));
        assert_eq!(profile.persist_classes, vec!["session", "view"]);
        assert!(profile.debug);
        assert!(profile.xhprof_debug);
        assert_eq!(profile.server.max_connections, 128);
        assert!(profile.server.reuse_port);
    }

    #[test]
    fn script_extension_follows_index_file() {
        let mut profile = ServerProfile::default();
        assert_eq!(profile.script_extension(), Some("php"));

        profile.index_file = "entry.cgi".into();
        assert_eq!(profile.script_extension(), Some("cgi"));

        profile.index_file = "noext".into();
        assert_eq!(profile.script_extension(), None);
    }
}
