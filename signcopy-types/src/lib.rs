//! Core type definitions for SignCopy.
//!
//! This crate defines the types shared by every other crate:
//! - The sign content record (lines, colours, glow, variant)
//! - Actor identities and block locations
//! - The narrow collaborator interfaces the core consumes from its host
//!   (notifications, permissions, cooldowns, sign-type allow-list)
//!
//! Nothing here performs I/O.

mod collab;
mod content;
mod ids;

pub use collab::{
    Action, AllowAllPermissions, AllowAnyType, Capability, CooldownGate, Notice, Notifier,
    NoCooldowns, PermissionOracle, VariantAllowList,
};
pub use content::{
    ContentViolation, MAX_TOTAL_LINES, SIGN_LINES, Side, SignColor, SignContent, SignVariant,
};
pub use ids::{ActorId, BlockLocation};

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid location: {0}")]
    InvalidLocation(String),

    #[error("unknown sign colour: {0}")]
    UnknownColor(String),

    #[error("unknown sign variant: {0}")]
    UnknownVariant(String),
}
