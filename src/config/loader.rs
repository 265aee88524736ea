//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{ProfilesFile, ServerProfile};
use crate::config::validation::{validate_profile, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::path::PathBuf, std::io::Error),
    Parse(std::path::PathBuf, toml::de::Error),
    UnknownProfile(String),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "IO error reading {}: {}", path.display(), e),
            ConfigError::Parse(path, e) => write!(f, "Parse error in {}: {}", path.display(), e),
            ConfigError::UnknownProfile(name) => write!(f, "Unknown profile: {}", name),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load the profiles file from a TOML file.
pub fn load_profiles(path: &Path) -> Result<ProfilesFile, ConfigError> {
    let content =
        fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Select and validate one named profile.
pub fn select_profile(profiles: &ProfilesFile, name: &str) -> Result<ServerProfile, ConfigError> {
    let profile = profiles
        .http
        .get(name)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))?;

    validate_profile(&profile).map_err(ConfigError::Validation)?;

    Ok(profile)
}

/// Parse and merge an ordered list of configuration sources.
///
/// Later sources override earlier keys at the leaf level: tables merge
/// recursively, scalars and arrays replace wholesale. A missing or
/// unparsable source is an error, not a skip.
pub fn merge_sources(paths: &[std::path::PathBuf]) -> Result<toml::Table, ConfigError> {
    let mut merged = toml::Table::new();
    for path in paths {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let layer: toml::Table =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.clone(), e))?;
        merge_table(&mut merged, layer);
    }
    Ok(merged)
}

fn merge_table(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_table(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(s: &str) -> toml::Table {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn later_source_overrides_leaf_keys() {
        let mut base = table(
            r#"
            [components.session]
            cookieName = "JSESSIONID"
            timeout = 1440
            "#,
        );
        merge_table(
            &mut base,
            table(
                r#"
                [components.session]
                cookieName = "SID"
                "#,
            ),
        );

        let session = base["components"]["session"].as_table().unwrap();
        assert_eq!(session["cookieName"].as_str(), Some("SID"));
        // untouched sibling leaf survives the merge
        assert_eq!(session["timeout"].as_integer(), Some(1440));
    }

    #[test]
    fn arrays_replace_wholesale() {
        let mut base = table(r#"tags = ["a", "b"]"#);
        merge_table(&mut base, table(r#"tags = ["c"]"#));
        let tags = base["tags"].as_array().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].as_str(), Some("c"));
    }

    #[test]
    fn missing_source_is_an_error() {
        let err = merge_sources(&[std::path::PathBuf::from("/nonexistent/app.toml")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_, _)));
    }

    #[test]
    fn unknown_profile_is_reported_by_name() {
        let profiles = ProfilesFile::default();
        let err = select_profile(&profiles, "site").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile(ref n) if n == "site"));
    }
}
