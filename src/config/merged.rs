//! Merged application configuration.
//!
//! The read-only view over the deep-merged configFile sources, plus the
//! defaults the bootstrap derives for unset keys. Immutable for the life of
//! the worker.

use std::path::Path;

/// Merged application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    table: toml::Table,
}

impl AppConfig {
    pub fn from_table(table: toml::Table) -> Self {
        Self { table }
    }

    /// Look up a value by dotted path, e.g. `components.session.cookieName`.
    pub fn get(&self, path: &str) -> Option<&toml::Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.table.get(first)?;
        for segment in segments {
            current = current.as_table()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|v| v.as_str())
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(|v| v.as_bool())
    }

    /// Set a value by dotted path, creating intermediate tables. Only the
    /// bootstrap uses this, before the config is frozen behind an `Arc`.
    pub fn set(&mut self, path: &str, value: toml::Value) {
        let mut segments: Vec<&str> = path.split('.').collect();
        let leaf = segments.pop().expect("dotted path is never empty");
        let mut current = &mut self.table;
        for segment in segments {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| toml::Value::Table(toml::Table::new()));
            // A scalar in the way gets replaced; the derived default wins.
            if !entry.is_table() {
                *entry = toml::Value::Table(toml::Table::new());
            }
            current = entry.as_table_mut().expect("just ensured a table");
        }
        current.insert(leaf.to_string(), value);
    }

    /// Whether a dotted path is present.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Derive the default asset output path for a document root.
    pub fn default_asset_path(root: &Path) -> String {
        root.join("assets").to_string_lossy().into_owned()
    }

    pub fn as_table(&self) -> &toml::Table {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_get_and_set() {
        let mut config = AppConfig::default();
        config.set("components.assetManager.basePath", "/srv/web/assets".into());
        config.set("bootstrapRefresh", toml::Value::Boolean(true));

        assert_eq!(
            config.get_str("components.assetManager.basePath"),
            Some("/srv/web/assets")
        );
        assert_eq!(config.get_bool("bootstrapRefresh"), Some(true));
        assert!(!config.contains("components.session"));
    }

    #[test]
    fn set_does_not_clobber_sibling_keys() {
        let mut config = AppConfig::from_table(
            toml::from_str(
                r#"
                [components.session]
                cookieName = "JSESSIONID"
                "#,
            )
            .unwrap(),
        );
        config.set("components.view.title", "site".into());

        assert_eq!(
            config.get_str("components.session.cookieName"),
            Some("JSESSIONID")
        );
        assert_eq!(config.get_str("components.view.title"), Some("site"));
    }
}
