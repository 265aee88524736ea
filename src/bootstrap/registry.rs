//! Service registry.
//!
//! Maps abstract service ids to construction rules (TOML definition
//! tables). Rebuilt from scratch at every bootstrap so no rule leaks across
//! worker restarts; shared read-only across all requests within a worker.

use std::collections::BTreeMap;

use crate::config::AppConfig;

/// Service-construction rule table.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    definitions: BTreeMap<String, toml::Value>,
    persistent: Vec<String>,
}

/// The services every application carries, with their default rules.
fn core_definitions() -> BTreeMap<String, toml::Value> {
    let mut definitions = BTreeMap::new();
    let table = |entries: &[(&str, &str)]| {
        let mut t = toml::Table::new();
        for (k, v) in entries {
            t.insert((*k).to_string(), toml::Value::String((*v).to_string()));
        }
        toml::Value::Table(t)
    };

    definitions.insert("errorHandler".to_string(), table(&[]));
    definitions.insert("request".to_string(), table(&[]));
    definitions.insert("response".to_string(), table(&[]));
    definitions.insert(
        "session".to_string(),
        table(&[("cookieName", "JSESSIONID")]),
    );
    definitions.insert("user".to_string(), table(&[]));
    definitions.insert("view".to_string(), table(&[]));
    definitions
}

impl ServiceRegistry {
    /// Rebuild the registry: core definitions, overlaid with the merged
    /// config's `container.definitions`, tagged with the resolved
    /// process-persistent service list.
    pub fn rebuild(config: &AppConfig, persistent: &[String]) -> Self {
        let mut definitions = core_definitions();
        if let Some(table) = config
            .get("container.definitions")
            .and_then(|v| v.as_table())
        {
            for (id, definition) in table {
                definitions.insert(id.clone(), definition.clone());
            }
        }

        Self {
            definitions,
            persistent: persistent.to_vec(),
        }
    }

    pub fn definition(&self, id: &str) -> Option<&toml::Value> {
        self.definitions.get(id)
    }

    /// A string field of one service's definition, e.g.
    /// `definition_str("session", "cookieName")`.
    pub fn definition_str(&self, id: &str, key: &str) -> Option<&str> {
        self.definitions
            .get(id)?
            .as_table()?
            .get(key)?
            .as_str()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn is_persistent(&self, id: &str) -> bool {
        self.persistent.iter().any(|p| p == id)
    }

    /// The resolved persistent overrides, in first-seen order.
    pub fn persistent(&self) -> &[String] {
        &self.persistent
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
