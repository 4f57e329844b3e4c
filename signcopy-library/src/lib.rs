//! Persistent sign libraries for SignCopy.
//!
//! Two JSON documents live in the data directory:
//! - `players.json`: one section per owner, each a set of named entries
//! - `templates.json`: one shared set of named entries
//!
//! Both carry a `config-version` field and are migrated on load, with a
//! timestamped backup taken first. Writes go to memory immediately and to
//! disk on [`LibraryStore::flush`], which deletes and template changes
//! trigger themselves.

mod document;
mod entry;
mod error;
mod migrate;
mod names;
mod service;
mod store;

pub use document::{DocumentFile, DocumentKind, Loaded, MAX_BACKUPS};
pub use entry::{Namespace, StoredSign};
pub use error::{LibraryError, LibraryResult};
pub use migrate::{CURRENT_VERSION, MigrationReport, VERSION_KEY, migrate, version_of};
pub use names::{NameRule, check_name};
pub use service::LibraryService;
pub use store::{LibraryStore, SaveOutcome, Shelf};
