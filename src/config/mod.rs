//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! profiles file (TOML, one table per named worker profile)
//!     → loader.rs (parse & select profile)
//!     → validation.rs (semantic checks)
//!     → ServerProfile (validated, immutable)
//!
//! At bootstrap, the profile's ordered configFile list:
//!     → loader.rs (parse each source, deep-merge leaf-by-leaf)
//!     → merged.rs (AppConfig: read-only view + derived defaults)
//!     → shared via Arc for the worker's lifetime
//! ```
//!
//! # Design Decisions
//! - A profile is immutable once loaded; picking up changes requires a
//!   process restart
//! - All profile fields have defaults to allow minimal configs
//! - Later configFile sources override earlier keys at the leaf level;
//!   tables merge recursively, scalars and arrays replace
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod merged;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use merged::AppConfig;
pub use schema::{ServerProfile, TransportOptions};
