//! Error types for the lock engine

use thiserror::Error;

/// Result type for lock engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur around lock evaluation
///
/// Evaluation itself never fails; these errors come from predicate
/// argument handling, configuration loading and the command line tool.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument for predicate {name}: {reason}")]
    InvalidPredicateArgument { name: String, reason: String },

    #[error("Predicate {name} failed: {reason}")]
    PredicateFailed { name: String, reason: String },

    #[error("Unknown permission group: {0}")]
    UnknownGroup(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an argument error for the named predicate
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPredicateArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
