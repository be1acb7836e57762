//! Error types for loading declarative command trees.

use cmdtree_core::CommandError;
use thiserror::Error;

/// Errors that can occur while reading or building a declaration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A type name with no entry in the [`TypeRegistry`](crate::TypeRegistry).
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// A declaration whose shape cannot be turned into an option.
    #[error("invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// The command tree rejected a declaration (duplicate alias, misplaced
    /// wildcard argument, bad subcommand name).
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Convenience alias for results with [`ConfigError`].
pub type Result<T> = std::result::Result<T, ConfigError>;
