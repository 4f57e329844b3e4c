//! Error types for the configuration layer.

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML or does not match the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be rendered back to TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The handle has no backing file.
    #[error("configuration has no backing file")]
    NoBackingFile,
}
