//! Collaborator interfaces supplied by the host.
//!
//! The core never formats user-facing text, checks a permission plugin, or
//! tracks cooldowns itself. It calls these traits and the host decides.
//! Each trait has a permissive default adapter, chosen once at startup when
//! the host has no backing system for it.

use crate::content::SignVariant;
use crate::ids::{ActorId, BlockLocation};
use serde::{Deserialize, Serialize};

/// Capability an actor may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Copy,
    Paste,
    CopyColor,
    CopyGlow,
    LibrarySave,
    LibraryDelete,
    LibraryUse,
    TemplateManage,
}

impl Capability {
    /// Returns the dotted permission node this capability maps to.
    pub fn node(&self) -> &'static str {
        match self {
            Self::Copy => "signcopy.copy",
            Self::Paste => "signcopy.paste",
            Self::CopyColor => "signcopy.copy.color",
            Self::CopyGlow => "signcopy.copy.glow",
            Self::LibrarySave => "signcopy.library.save",
            Self::LibraryDelete => "signcopy.library.delete",
            Self::LibraryUse => "signcopy.library.use",
            Self::TemplateManage => "signcopy.templates.manage",
        }
    }
}

/// Rate-limited action names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Copy,
    Paste,
    Library,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Paste => "paste",
            Self::Library => "library",
        }
    }
}

/// Outcome reported to the actor that triggered an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Copied { variant: SignVariant },
    CarrierReset,
    CarrierLoaded { name: String },
    PasteComplete { location: BlockLocation },
    VariantMismatch { expected: SignVariant },
    ContentUnreadable,
    TypeNotAllowed { type_name: String },
    PermissionDenied { capability: Capability },
    OnCooldown { action: Action },
    LibrarySaved { name: String },
    LibraryDeleted { name: String },
    LibraryNotFound { name: String },
    LibraryAlreadyExists { name: String },
    LibraryFull { limit: usize },
    LibraryInvalidName { name: String, reason: String },
    LibraryInvalidContent { reason: String },
    LibraryUnavailable,
}

/// Delivers outcomes to actors.
pub trait Notifier: Send + Sync {
    fn notify(&self, actor: &ActorId, notice: Notice);
}

/// Answers capability questions for an actor.
pub trait PermissionOracle: Send + Sync {
    fn has_capability(&self, actor: &ActorId, capability: Capability) -> bool;
}

/// Adapter used when no permission system is installed: everything is granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPermissions;

impl PermissionOracle for AllowAllPermissions {
    fn has_capability(&self, _actor: &ActorId, _capability: Capability) -> bool {
        true
    }
}

/// Per-actor rate limiting.
pub trait CooldownGate: Send + Sync {
    fn can_proceed(&self, actor: &ActorId, action: Action) -> bool;
    fn record_use(&self, actor: &ActorId, action: Action);
}

/// Adapter that never rate-limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCooldowns;

impl CooldownGate for NoCooldowns {
    fn can_proceed(&self, _actor: &ActorId, _action: Action) -> bool {
        true
    }

    fn record_use(&self, _actor: &ActorId, _action: Action) {}
}

/// Decides which host sign types may be copied from or pasted onto.
pub trait VariantAllowList: Send + Sync {
    fn is_allowed(&self, type_name: &str) -> bool;
}

/// Adapter that accepts every sign type.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAnyType;

impl VariantAllowList for AllowAnyType {
    fn is_allowed(&self, _type_name: &str) -> bool {
        true
    }
}
