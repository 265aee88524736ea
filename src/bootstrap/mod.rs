//! One-time worker bootstrap.
//!
//! # Data Flow
//! ```text
//! worker start event
//!     → bootstrap files (env format, one-time process init; missing = fatal)
//!     → configFile sources (deep-merged in order)
//!     → registry.rs (rebuild, persistent overrides merged + deduped)
//!     → derived defaults (asset path, base URL, aliases)
//!     → PrototypeApp (primed with root path and server handle)
//! ```
//!
//! # Design Decisions
//! - Any bootstrap fault aborts worker start; none of it is recoverable
//!   per-request
//! - The persistent-service list lives on the bootstrapper, so it survives
//!   re-bootstraps within one process and merges idempotently
//! - Defaults are derived only for keys the merged config leaves unset

pub mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app::components::{ErrorRenderer, Session};
use crate::app::PrototypeApp;
use crate::bootstrap::registry::ServiceRegistry;
use crate::config::schema::ServerProfile;
use crate::config::{loader, AppConfig, ConfigError};
use crate::http::HttpRequest;
use crate::net::listener::ServerHandle;
use crate::routing::RouteTable;

/// Fatal startup fault. The worker must not begin serving.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("bootstrap file {0}: {1}")]
    BootstrapFile(PathBuf, dotenvy::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Builds the prototype application instance, exactly once per worker start.
#[derive(Debug, Default)]
pub struct Bootstrapper {
    /// Process-persistent service overrides, merged across bootstraps.
    persist_classes: Vec<String>,
}

impl Bootstrapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn persist_classes(&self) -> &[String] {
        &self.persist_classes
    }

    pub fn bootstrap(
        &mut self,
        profile: &ServerProfile,
        server: ServerHandle,
    ) -> Result<PrototypeApp, BootstrapError> {
        tracing::info!(
            root = %profile.root.display(),
            config_sources = profile.config_file.len(),
            "Bootstrap starting"
        );

        // One-time process initialization hooks.
        for file in &profile.bootstrap_file {
            dotenvy::from_path(file)
                .map_err(|e| BootstrapError::BootstrapFile(file.clone(), e))?;
        }

        let mut config = AppConfig::from_table(loader::merge_sources(&profile.config_file)?);

        if let Some(refresh) = profile.bootstrap_refresh {
            config.set("bootstrapRefresh", toml::Value::Boolean(refresh));
        }

        // Merge persistent overrides, dropping duplicates but keeping
        // first-seen order.
        for class in &profile.persist_classes {
            if !self.persist_classes.contains(class) {
                self.persist_classes.push(class.clone());
            }
        }
        let registry = ServiceRegistry::rebuild(&config, &self.persist_classes);

        if !config.contains("components.assetManager.basePath") {
            config.set(
                "components.assetManager.basePath",
                AppConfig::default_asset_path(&profile.root).into(),
            );
        }

        let mut aliases = BTreeMap::new();
        aliases.insert(
            "@webroot".to_string(),
            profile.root.to_string_lossy().into_owned(),
        );
        aliases.insert("@web".to_string(), "/".to_string());

        let routes = RouteTable::from_config(&config);
        let session = Session::new(
            registry
                .definition_str("session", "cookieName")
                .unwrap_or("JSESSIONID"),
        );
        let error_handler =
            ErrorRenderer::new(config.get_str("name").unwrap_or("Application"));
        let request = HttpRequest::template(
            config.get_str("components.request.baseUrl").unwrap_or("/"),
        );

        tracing::info!(
            services = registry.len(),
            persistent = registry.persistent().len(),
            routes = routes.len(),
            "Bootstrap complete, prototype primed"
        );

        Ok(PrototypeApp::new(
            Arc::new(config),
            Arc::new(registry),
            Arc::new(routes),
            profile.root.clone(),
            aliases,
            server,
            request,
            session,
            error_handler,
        ))
    }
}
