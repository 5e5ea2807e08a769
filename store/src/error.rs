//! Error types for definition store operations.
//!
//! Provides a unified error type covering I/O, serialization and input
//! validation failures.

use thiserror::Error;

/// Errors that can occur while loading or writing definition sets.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Input that parses but cannot be used (unknown extension, empty set).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// All configured loader sources failed.
    #[error("no definition sources available")]
    NoSourcesAvailable,
}

/// Convenience alias for results with [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
