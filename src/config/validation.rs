//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the document root and listed source files actually exist
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the profile plus the filesystem
//! - Runs before the worker is allowed to start

use crate::config::schema::ServerProfile;

/// A single semantic validation failure.
#[derive(Debug)]
pub enum ValidationError {
    EmptyHost,
    RootNotADirectory(std::path::PathBuf),
    EmptyIndexFile,
    MissingConfigSource(std::path::PathBuf),
    MissingBootstrapFile(std::path::PathBuf),
    ZeroMaxConnections,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyHost => write!(f, "host must not be empty"),
            ValidationError::RootNotADirectory(p) => {
                write!(f, "root {} is not a directory", p.display())
            }
            ValidationError::EmptyIndexFile => write!(f, "indexFile must not be empty"),
            ValidationError::MissingConfigSource(p) => {
                write!(f, "configFile source {} does not exist", p.display())
            }
            ValidationError::MissingBootstrapFile(p) => {
                write!(f, "bootstrapFile {} does not exist", p.display())
            }
            ValidationError::ZeroMaxConnections => {
                write!(f, "server.maxConnections must be greater than zero")
            }
        }
    }
}

/// Validate a profile, collecting every failure.
pub fn validate_profile(profile: &ServerProfile) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if profile.host.is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if !profile.root.is_dir() {
        errors.push(ValidationError::RootNotADirectory(profile.root.clone()));
    }
    if profile.index_file.is_empty() {
        errors.push(ValidationError::EmptyIndexFile);
    }
    for source in &profile.config_file {
        if !source.is_file() {
            errors.push(ValidationError::MissingConfigSource(source.clone()));
        }
    }
    for file in &profile.bootstrap_file {
        if !file.is_file() {
            errors.push(ValidationError::MissingBootstrapFile(file.clone()));
        }
    }
    if profile.server.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let mut profile = ServerProfile {
            host: String::new(),
            root: std::path::PathBuf::from("/nonexistent/webroot"),
            index_file: String::new(),
            ..ServerProfile::default()
        };
        profile.server.max_connections = 0;
        profile.config_file.push("/nonexistent/app.toml".into());

        let errors = validate_profile(&profile).unwrap_err();
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn accepts_a_minimal_valid_profile() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ServerProfile {
            host: "127.0.0.1".into(),
            root: dir.path().to_path_buf(),
            ..ServerProfile::default()
        };
        assert!(validate_profile(&profile).is_ok());
    }
}
