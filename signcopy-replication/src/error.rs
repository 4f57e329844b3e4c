//! Error types for replication.

use signcopy_types::{Action, Capability, Notice, Side, SignVariant};
use thiserror::Error;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// A carrier's fingerprint exists but cannot be turned back into content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("tag '{key}' has the wrong type (expected {expected})")]
    WrongType { key: String, expected: &'static str },

    #[error("{side} side holds {count} lines")]
    TooManyLines { side: Side, count: usize },

    #[error("unknown sign variant '{0}'")]
    UnknownVariant(String),
}

/// Why a copy, paste, or carrier load was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    #[error("expected a {expected} sign, found {found}")]
    VariantMismatch {
        expected: SignVariant,
        found: SignVariant,
    },

    #[error("carrier content unreadable: {0}")]
    Unreadable(#[from] CodecError),

    #[error("missing capability '{}'", .0.node())]
    PermissionDenied(Capability),

    #[error("'{}' is on cooldown", .0.as_str())]
    OnCooldown(Action),

    #[error("sign type '{0}' is not allowed")]
    TypeNotAllowed(String),
}

impl ReplicationError {
    /// The notice shown to the actor for this refusal.
    pub fn notice(&self) -> Notice {
        match self {
            Self::VariantMismatch { expected, .. } => Notice::VariantMismatch {
                expected: *expected,
            },
            Self::Unreadable(_) => Notice::ContentUnreadable,
            Self::PermissionDenied(capability) => Notice::PermissionDenied {
                capability: *capability,
            },
            Self::OnCooldown(action) => Notice::OnCooldown { action: *action },
            Self::TypeNotAllowed(type_name) => Notice::TypeNotAllowed {
                type_name: type_name.clone(),
            },
        }
    }
}
