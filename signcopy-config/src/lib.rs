//! Configuration access layer for SignCopy.
//!
//! Settings live in a TOML file. They are parsed into an immutable
//! [`Settings`] snapshot that readers share through an `Arc`; a reload or
//! update builds a new snapshot and swaps it in under a write lock, so no
//! reader ever observes a half-applied configuration.
//!
//! Invalid configuration never stops the system: parse failures fall back
//! to defaults and out-of-range fields are reset individually, with every
//! problem logged.

mod error;
mod handle;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use handle::ConfigHandle;
pub use settings::{
    CURRENT_CONFIG_VERSION, Capacity, ConfigIssue, Cooldowns, Features, Limits, Settings,
    StagingSettings, StorageSettings,
};
