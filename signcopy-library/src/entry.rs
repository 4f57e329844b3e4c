//! On-disk entry format and namespaces.

use serde::{Deserialize, Serialize};
use signcopy_types::{ActorId, SignColor, SignContent, SignVariant};
use std::fmt;

/// A persistence partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// One actor's personal library.
    Owner(ActorId),
    /// The shared template library.
    Templates,
}

impl Namespace {
    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner(_))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner(owner) => write!(f, "players/{owner}"),
            Self::Templates => f.write_str("templates"),
        }
    }
}

/// One library entry as written to disk.
///
/// Colours and variant are kept as strings so a file edited by hand with an
/// unknown token still loads; they are parsed leniently on the way in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSign {
    #[serde(default)]
    pub front: Vec<String>,
    #[serde(default)]
    pub back: Vec<String>,
    #[serde(default = "fallback_color")]
    pub front_color: String,
    #[serde(default = "fallback_color")]
    pub back_color: String,
    /// Written for older readers; always `front_glowing || back_glowing`.
    #[serde(default)]
    pub glowing: bool,
    #[serde(default)]
    pub front_glowing: bool,
    #[serde(default)]
    pub back_glowing: bool,
    #[serde(default = "default_sign_type")]
    pub sign_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore: Option<Vec<String>>,
}

fn fallback_color() -> String {
    SignColor::FALLBACK.as_str().to_string()
}

fn default_sign_type() -> String {
    SignVariant::default().as_str().to_string()
}

impl From<&SignContent> for StoredSign {
    fn from(content: &SignContent) -> Self {
        Self {
            front: content.front.clone(),
            back: content.back.clone(),
            front_color: content.front_color.as_str().to_string(),
            back_color: content.back_color.as_str().to_string(),
            glowing: content.any_glowing(),
            front_glowing: content.front_glowing,
            back_glowing: content.back_glowing,
            sign_type: content.variant.as_str().to_string(),
            lore: content.lore.clone(),
        }
    }
}

impl From<StoredSign> for SignContent {
    fn from(stored: StoredSign) -> Self {
        SignContent {
            front: stored.front,
            back: stored.back,
            front_color: SignColor::parse_lenient(&stored.front_color),
            back_color: SignColor::parse_lenient(&stored.back_color),
            front_glowing: stored.front_glowing,
            back_glowing: stored.back_glowing,
            variant: stored.sign_type.parse().unwrap_or_default(),
            lore: stored.lore,
        }
    }
}
