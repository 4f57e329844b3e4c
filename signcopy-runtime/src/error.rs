//! Error types for the runtime.

use signcopy_config::ConfigError;
use signcopy_library::LibraryError;
use thiserror::Error;

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("library error: {0}")]
    Library(#[from] LibraryError),
}
