//! Sign replication for SignCopy.
//!
//! Moves a sign's content from a source sign onto a carrier item and from
//! the carrier onto a newly placed sign. The host exposes different
//! capabilities at different moments, so a paste happens in three steps:
//!
//! 1. **Copy**: the source content is encoded into the carrier's tag map.
//! 2. **Place**: colours are applied at once; text and glow are parked in
//!    the [`StagingCache`] under the new sign's location.
//! 3. **Edit**: the host's text-edit callback pops the staged text, writes
//!    the front lines, and schedules back lines and glow for the next tick
//!    on the main thread.
//!
//! Staged entries that never reach step 3 are evicted by TTL.

pub mod codec;
mod clock;
mod error;
mod format;
mod host;
mod machine;
mod staging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{TagMap, TagValue};
pub use error::{CodecError, ReplicationError, ReplicationResult};
pub use format::{FORMAT_CHAR, propagate_trailing_format, trailing_format};
pub use host::{CarrierItem, FrontLines, MainThread, SignHandle, SignWorld};
pub use machine::{
    Collaborators, CopyOutcome, FinalizeOutcome, PlaceOutcome, ReplicationMachine, describe,
};
pub use staging::{DEFAULT_STAGING_TTL, StagedText, StagingCache};
