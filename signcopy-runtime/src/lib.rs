//! Assembles the SignCopy core for a host.
//!
//! [`SignCopyRuntime::start`] loads `config.toml`, opens the libraries,
//! injects the host's collaborators (or the default adapters) into the
//! replication machine and library service, and spawns two workers:
//! staging cleanup and library auto-save. [`SignCopyRuntime::shutdown`]
//! stops them and flushes synchronously.

mod adapters;
mod error;
mod runtime;
mod telemetry;
mod workers;

pub use adapters::{ConfigAllowList, ConfigCooldowns};
pub use error::{RuntimeError, RuntimeResult};
pub use runtime::{HostBindings, RuntimeOptions, SignCopyRuntime};
pub use telemetry::init_tracing;
pub use workers::{spawn_auto_save, spawn_staging_cleanup};
