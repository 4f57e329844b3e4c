//! A versioned JSON document on disk: loading, migration, backups, recovery,
//! and atomic writes.

use crate::error::{LibraryError, LibraryResult};
use crate::migrate::{self, CURRENT_VERSION, VERSION_KEY};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// How many backups are kept per document.
pub const MAX_BACKUPS: usize = 3;

const BACKUP_DIR: &str = "backups";
const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S%3f";

/// Which document a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Players,
    Templates,
}

impl DocumentKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Players => "players.json",
            Self::Templates => "templates.json",
        }
    }

    /// The namespace root under which entries live.
    pub fn root_key(&self) -> &'static str {
        match self {
            Self::Players => "players",
            Self::Templates => "templates",
        }
    }

    fn stem(&self) -> &'static str {
        self.root_key()
    }
}

/// Outcome of opening a document.
#[derive(Debug)]
pub struct Loaded {
    pub value: Value,
    /// Set when the document must not be written back. Carries the reason.
    pub read_only: Option<String>,
}

/// One document file plus its backup directory.
#[derive(Debug, Clone)]
pub struct DocumentFile {
    kind: DocumentKind,
    path: PathBuf,
    backup_dir: PathBuf,
}

impl DocumentFile {
    pub fn new(data_dir: &Path, kind: DocumentKind) -> Self {
        Self {
            kind,
            path: data_dir.join(kind.file_name()),
            backup_dir: data_dir.join(BACKUP_DIR),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An empty document at the current version.
    pub fn empty(&self) -> Value {
        let mut root = Map::new();
        root.insert(VERSION_KEY.to_string(), Value::from(CURRENT_VERSION));
        root.insert(self.kind.root_key().to_string(), Value::Object(Map::new()));
        Value::Object(root)
    }

    /// Loads the document, migrating and recovering as needed.
    ///
    /// - Missing file: an empty document.
    /// - Unreadable or corrupt file: the newest usable backup, else empty.
    ///   The corrupt file is moved aside either way.
    /// - Older version: backed up, migrated, and written back. If the
    ///   backup fails the migrated value is served read-only and the file
    ///   is left as it was, so the next load retries.
    /// - Newer version: served read-only.
    pub fn load(&self) -> LibraryResult<Loaded> {
        if !self.path.exists() {
            debug!(path = ?self.path, "No library document yet");
            return Ok(Loaded {
                value: self.empty(),
                read_only: None,
            });
        }

        let mut value = match read_json(&self.path) {
            Ok(value) => value,
            Err(e) => {
                error!(path = ?self.path, "Library document is unreadable: {}", e);
                return self.recover();
            }
        };

        let stored = migrate::version_of(&value);
        if stored > CURRENT_VERSION {
            warn!(
                path = ?self.path,
                stored,
                supported = CURRENT_VERSION,
                "Library document was written by a newer version; opening read-only"
            );
            return Ok(Loaded {
                value,
                read_only: Some(format!("document version {stored} is newer than {CURRENT_VERSION}")),
            });
        }
        if stored == CURRENT_VERSION {
            return Ok(Loaded {
                value,
                read_only: None,
            });
        }

        if let Err(e) = self.backup() {
            error!(
                path = ?self.path,
                "Skipping library migration because the backup failed: {}", e
            );
            migrate::migrate(self.kind, &mut value)?;
            return Ok(Loaded {
                value,
                read_only: Some(format!("migration from v{stored} pending: {e}")),
            });
        }

        let report = migrate::migrate(self.kind, &mut value)?;
        self.write(&value)?;
        info!(
            path = ?self.path,
            from = report.from,
            to = report.to,
            "Migrated library document"
        );
        Ok(Loaded {
            value,
            read_only: None,
        })
    }

    /// Writes `value` atomically: a temp file in the same directory is
    /// synced and renamed over the target.
    pub fn write(&self, value: &Value) -> LibraryResult<()> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&dir)?;
        let bytes = serde_json::to_vec_pretty(value)?;
        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        temp.write_all(&bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Called after a failed write. The atomic rename normally leaves the
    /// previous file intact; if it no longer reads as a document it is moved
    /// aside and the newest usable backup is put in its place. Returns true
    /// when the file was replaced.
    pub fn repair(&self) -> LibraryResult<bool> {
        if !self.path.exists() || read_json(&self.path).is_ok() {
            return Ok(false);
        }
        self.recover()?;
        Ok(true)
    }

    /// Copies the current file into the backup directory under a
    /// timestamped name, then prunes old backups.
    pub fn backup(&self) -> LibraryResult<PathBuf> {
        let wrap = |source| LibraryError::Backup {
            path: self.path.clone(),
            source,
        };
        fs::create_dir_all(&self.backup_dir).map_err(wrap)?;

        let stamp = chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let prefix = format!("{}-{stamp}-", self.kind.stem());
        // Continue past the highest sequence used this millisecond, even if
        // lower ones were already pruned.
        let seq = self
            .backups()
            .map_err(wrap)?
            .iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                stem.strip_prefix(&prefix)?.parse::<u32>().ok()
            })
            .max()
            .map_or(0, |highest| highest + 1);
        let target = self.backup_dir.join(format!("{prefix}{seq:03}.json"));

        fs::copy(&self.path, &target).map_err(wrap)?;
        debug!(backup = ?target, "Backed up library document");
        self.prune_backups().map_err(wrap)?;
        Ok(target)
    }

    /// Returns this document's backups, oldest first.
    pub fn backups(&self) -> std::io::Result<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{}-", self.kind.stem());
        let mut found: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".json"))
            })
            .collect();
        // Names embed a fixed-width timestamp and sequence, so lexical order is age order.
        found.sort();
        Ok(found)
    }

    fn prune_backups(&self) -> std::io::Result<()> {
        let backups = self.backups()?;
        let excess = backups.len().saturating_sub(MAX_BACKUPS);
        for old in &backups[..excess] {
            fs::remove_file(old)?;
            debug!(backup = ?old, "Pruned old library backup");
        }
        Ok(())
    }

    /// Restores from the newest backup that parses and migrates. The corrupt
    /// file is moved aside first.
    fn recover(&self) -> LibraryResult<Loaded> {
        let aside = self.quarantine()?;
        warn!(path = ?self.path, moved_to = ?aside, "Moved corrupt library document aside");

        let backups = self.backups().unwrap_or_default();
        for backup in backups.iter().rev() {
            let mut value = match read_json(backup) {
                Ok(value) => value,
                Err(e) => {
                    warn!(backup = ?backup, "Backup is unreadable too: {}", e);
                    continue;
                }
            };
            if migrate::version_of(&value) > CURRENT_VERSION {
                continue;
            }
            if let Err(e) = migrate::migrate(self.kind, &mut value) {
                warn!(backup = ?backup, "Backup cannot be migrated: {}", e);
                continue;
            }
            self.write(&value)?;
            info!(path = ?self.path, backup = ?backup, "Restored library document from backup");
            return Ok(Loaded {
                value,
                read_only: None,
            });
        }

        warn!(path = ?self.path, "No usable backup; starting with an empty library");
        Ok(Loaded {
            value: self.empty(),
            read_only: None,
        })
    }

    fn quarantine(&self) -> LibraryResult<PathBuf> {
        let stamp = chrono::Utc::now().format(TIMESTAMP_FORMAT);
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".corrupt-{stamp}"));
        let aside = PathBuf::from(name);
        fs::rename(&self.path, &aside)?;
        Ok(aside)
    }
}

fn read_json(path: &Path) -> LibraryResult<Value> {
    let bytes = fs::read(path)?;
    let value: Value = serde_json::from_slice(&bytes)?;
    if !value.is_object() {
        return Err(LibraryError::Migration(
            "document root is not an object".to_string(),
        ));
    }
    Ok(value)
}
