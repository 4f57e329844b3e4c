//! Error types for the library store.

use crate::names::NameRule;
use signcopy_types::{Capability, ContentViolation, Notice};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for library operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Errors that can occur in library operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    /// Entry name rejected.
    #[error("invalid name '{name}': {rule}")]
    InvalidName { name: String, rule: NameRule },

    /// Record breaks a content rule.
    #[error("invalid content: {0}")]
    InvalidContent(#[from] ContentViolation),

    /// An entry with this name exists and overwriting is disabled.
    #[error("entry '{0}' already exists")]
    AlreadyExists(String),

    /// The owner's library is full.
    #[error("library is full ({limit} entries)")]
    LimitReached { limit: usize },

    /// No entry with this name.
    #[error("entry '{0}' not found")]
    NotFound(String),

    /// Actor lacks the capability for this operation.
    #[error("missing capability '{}'", .0.node())]
    PermissionDenied(Capability),

    /// Actor is rate-limited.
    #[error("library actions are on cooldown")]
    OnCooldown,

    /// The document cannot accept writes (e.g. a migration could not be
    /// backed up, or the file was written by a newer version).
    #[error("library document is read-only: {0}")]
    ReadOnly(String),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backup copy could not be made.
    #[error("backup of {path:?} failed: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored document has a shape no migration understands.
    #[error("migration error: {0}")]
    Migration(String),
}

impl LibraryError {
    /// Returns true for rejections caused by the caller's input.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::InvalidContent(_))
    }

    /// The notice shown to the actor for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            Self::InvalidName { name, rule } => Notice::LibraryInvalidName {
                name: name.clone(),
                reason: rule.to_string(),
            },
            Self::InvalidContent(violation) => Notice::LibraryInvalidContent {
                reason: violation.to_string(),
            },
            Self::AlreadyExists(name) => Notice::LibraryAlreadyExists { name: name.clone() },
            Self::LimitReached { limit } => Notice::LibraryFull { limit: *limit },
            Self::NotFound(name) => Notice::LibraryNotFound { name: name.clone() },
            Self::PermissionDenied(capability) => Notice::PermissionDenied {
                capability: *capability,
            },
            Self::OnCooldown => Notice::OnCooldown {
                action: signcopy_types::Action::Library,
            },
            Self::ReadOnly(_)
            | Self::Io(_)
            | Self::Serialization(_)
            | Self::Backup { .. }
            | Self::Migration(_) => Notice::LibraryUnavailable,
        }
    }
}
