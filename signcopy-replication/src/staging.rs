//! TTL-bounded staging of pasted text between placement and text edit.

use crate::clock::{Clock, SystemClock};
use parking_lot::RwLock;
use signcopy_types::{ActorId, BlockLocation};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long a staged paste waits for its text-edit callback.
pub const DEFAULT_STAGING_TTL: Duration = Duration::from_millis(300_000);

/// The part of a paste that cannot be applied at placement time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedText {
    /// Actor that placed the sign; receives the completion notice.
    pub actor: ActorId,
    /// Front lines with trailing formats already propagated.
    pub front: Vec<String>,
    /// Back lines with trailing formats already propagated.
    pub back: Vec<String>,
    pub front_glowing: bool,
    pub back_glowing: bool,
}

#[derive(Debug, Clone)]
struct StagingEntry {
    text: StagedText,
    created_at_ms: u64,
}

/// Concurrent map from sign location to staged text.
///
/// The fragment and its insertion time live in the same map slot, so every
/// operation (including expiry) adds or removes both together.
pub struct StagingCache {
    entries: RwLock<HashMap<BlockLocation, StagingEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl StagingCache {
    /// Creates a cache on the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stages `text` at `location`, returning whatever was staged there before.
    pub fn put(&self, location: BlockLocation, text: StagedText) -> Option<StagedText> {
        let entry = self.entry(text);
        self.entries
            .write()
            .insert(location, entry)
            .map(|previous| previous.text)
    }

    /// Stages `text` only if nothing is staged at `location`. Returns the
    /// existing text when there is one.
    pub fn put_if_absent(&self, location: BlockLocation, text: StagedText) -> Option<StagedText> {
        let entry = self.entry(text);
        match self.entries.write().entry(location) {
            Entry::Occupied(existing) => Some(existing.get().text.clone()),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                None
            }
        }
    }

    /// Returns a copy of the staged text without removing it.
    pub fn get(&self, location: &BlockLocation) -> Option<StagedText> {
        self.entries
            .read()
            .get(location)
            .map(|entry| entry.text.clone())
    }

    /// Removes and returns the staged text.
    pub fn remove(&self, location: &BlockLocation) -> Option<StagedText> {
        self.entries.write().remove(location).map(|entry| entry.text)
    }

    pub fn contains(&self, location: &BlockLocation) -> bool {
        self.entries.read().contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Evicts every entry older than the TTL. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let ttl_ms = self.ttl.as_millis() as u64;
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|location, entry| {
            let expired = now.saturating_sub(entry.created_at_ms) > ttl_ms;
            if expired {
                debug!(location = %location, "Evicting orphaned staged paste");
            }
            !expired
        });
        before - entries.len()
    }

    fn entry(&self, text: StagedText) -> StagingEntry {
        StagingEntry {
            text,
            created_at_ms: self.clock.now_millis(),
        }
    }
}

impl Default for StagingCache {
    fn default() -> Self {
        Self::new(DEFAULT_STAGING_TTL)
    }
}
