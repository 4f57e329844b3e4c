//! Host-facing surfaces the state machine reads and mutates.

use crate::codec::{self, TagMap};
use signcopy_types::{BlockLocation, SIGN_LINES, Side, SignColor, SignContent, SignVariant};

/// The front-side lines exposed by the host's text-edit callback.
pub type FrontLines = [String; SIGN_LINES];

/// A sign block in the world.
pub trait SignHandle {
    fn location(&self) -> BlockLocation;

    /// Host type name, e.g. `OAK_WALL_SIGN`.
    fn type_name(&self) -> String;

    fn variant(&self) -> SignVariant {
        SignVariant::from_type_name(&self.type_name())
    }

    /// Reads the sign's current content. The variant is derived from the
    /// block type by the caller.
    fn read_content(&self) -> SignContent;

    fn set_color(&mut self, side: Side, color: SignColor);

    fn set_lines(&mut self, side: Side, lines: &[String]);

    fn set_glowing(&mut self, side: Side, glowing: bool);
}

/// Looks up fully materialised signs. Only called from the main thread.
pub trait SignWorld: Send + Sync {
    /// Runs `apply` against the sign at `location`. Returns false when no
    /// sign exists there any more.
    fn with_sign(
        &self,
        location: &BlockLocation,
        apply: &mut dyn FnMut(&mut dyn SignHandle),
    ) -> bool;
}

/// The host's single serialized execution context.
pub trait MainThread: Send + Sync {
    /// Runs `task` on the main thread during the next tick.
    fn run_next_tick(&self, task: Box<dyn FnOnce() + Send + 'static>);
}

/// An item that carries copied content between a copy and a paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierItem {
    /// Host item type name, e.g. `OAK_SIGN` or `CRIMSON_HANGING_SIGN`.
    pub type_name: String,
    pub tags: TagMap,
    /// User-visible annotation lines.
    pub lore: Vec<String>,
}

impl CarrierItem {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn variant(&self) -> SignVariant {
        SignVariant::from_type_name(&self.type_name)
    }

    /// Returns true if the carrier holds a fingerprint.
    pub fn has_fingerprint(&self) -> bool {
        codec::has_fingerprint(&self.tags)
    }
}
