//! The library store: personal libraries per owner plus shared templates.

use crate::document::{DocumentFile, DocumentKind};
use crate::entry::{Namespace, StoredSign};
use crate::error::{LibraryError, LibraryResult};
use crate::names::check_name;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use signcopy_config::{Capacity, ConfigHandle};
use signcopy_types::{ActorId, SignContent};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Named entries within one namespace.
pub type Shelf = BTreeMap<String, SignContent>;

type OwnerShelves = BTreeMap<ActorId, Shelf>;

/// Whether a save created a new entry or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Replaced,
}

/// In-memory shape of a document's namespace root.
trait Contents: Default + Clone {
    fn from_root(root: &Value) -> Self;
    fn to_root(&self) -> LibraryResult<Value>;
}

impl Contents for Shelf {
    fn from_root(root: &Value) -> Self {
        read_shelf(root)
    }

    fn to_root(&self) -> LibraryResult<Value> {
        write_shelf(self)
    }
}

impl Contents for OwnerShelves {
    fn from_root(root: &Value) -> Self {
        let Some(owners) = root.as_object() else {
            return Self::new();
        };
        owners
            .iter()
            .filter_map(|(key, section)| match key.parse::<ActorId>() {
                Ok(owner) => Some((owner, read_shelf(section))),
                Err(e) => {
                    warn!(owner = %key, "Skipping library section with invalid owner id: {}", e);
                    None
                }
            })
            .filter(|(_, shelf)| !shelf.is_empty())
            .collect()
    }

    fn to_root(&self) -> LibraryResult<Value> {
        let mut owners = Map::new();
        for (owner, shelf) in self.iter().filter(|(_, s)| !s.is_empty()) {
            owners.insert(owner.to_string(), write_shelf(shelf)?);
        }
        Ok(Value::Object(owners))
    }
}

fn read_shelf(section: &Value) -> Shelf {
    let Some(entries) = section.as_object() else {
        return Shelf::new();
    };
    entries
        .iter()
        .filter_map(
            |(name, entry)| match serde_json::from_value::<StoredSign>(entry.clone()) {
                Ok(stored) => Some((name.clone(), SignContent::from(stored))),
                Err(e) => {
                    warn!(name = %name, "Skipping malformed library entry: {}", e);
                    None
                }
            },
        )
        .collect()
}

fn write_shelf(shelf: &Shelf) -> LibraryResult<Value> {
    let mut entries = Map::new();
    for (name, content) in shelf {
        entries.insert(name.clone(), serde_json::to_value(StoredSign::from(content))?);
    }
    Ok(Value::Object(entries))
}

struct State<T> {
    contents: T,
    dirty: bool,
    read_only: Option<String>,
}

/// One loaded document with its write discipline.
///
/// Mutations happen under `state`; a flush snapshots the contents under the
/// same lock and writes outside it. `flush_lock` keeps flushes in order so
/// an older snapshot never lands after a newer one.
struct Document<T> {
    file: DocumentFile,
    state: Mutex<State<T>>,
    flush_lock: Mutex<()>,
}

impl<T: Contents> Document<T> {
    fn open(file: DocumentFile) -> LibraryResult<Self> {
        let loaded = file.load()?;
        let contents = loaded
            .value
            .get(file.kind().root_key())
            .map(T::from_root)
            .unwrap_or_default();
        Ok(Self {
            file,
            state: Mutex::new(State {
                contents,
                dirty: false,
                read_only: loaded.read_only,
            }),
            flush_lock: Mutex::new(()),
        })
    }

    fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.lock().contents)
    }

    /// Applies `f` in memory. With `persist` the document is written before
    /// returning, and a failed write rolls the change back.
    fn apply<R>(
        &self,
        persist: bool,
        f: impl FnOnce(&mut T) -> LibraryResult<R>,
    ) -> LibraryResult<R> {
        if persist {
            self.commit(f)
        } else {
            self.mutate(f)
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut T) -> LibraryResult<R>) -> LibraryResult<R> {
        let mut state = self.state.lock();
        if let Some(reason) = &state.read_only {
            return Err(LibraryError::ReadOnly(reason.clone()));
        }
        let out = f(&mut state.contents)?;
        state.dirty = true;
        Ok(out)
    }

    fn commit<R>(&self, f: impl FnOnce(&mut T) -> LibraryResult<R>) -> LibraryResult<R> {
        let _ordered = self.flush_lock.lock();
        let mut state = self.state.lock();
        if let Some(reason) = &state.read_only {
            return Err(LibraryError::ReadOnly(reason.clone()));
        }
        let before = state.contents.clone();
        let out = f(&mut state.contents)?;

        match self
            .document(&state.contents)
            .and_then(|doc| self.file.write(&doc))
        {
            Ok(()) => {
                state.dirty = false;
                debug!(path = ?self.file.path(), "Flushed library document");
                Ok(out)
            }
            Err(e) => {
                state.contents = before;
                error!(
                    path = ?self.file.path(),
                    "Failed to write library document; change rolled back: {}", e
                );
                if self.repair_file() {
                    // The file was replaced from a backup and no longer matches memory.
                    state.dirty = true;
                }
                Err(e)
            }
        }
    }

    fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    fn read_only_reason(&self) -> Option<String> {
        self.state.lock().read_only.clone()
    }

    /// Writes the document if it has unsaved changes. Returns whether a
    /// write happened.
    fn flush(&self) -> LibraryResult<bool> {
        let _ordered = self.flush_lock.lock();
        let doc = {
            let mut state = self.state.lock();
            if !state.dirty || state.read_only.is_some() {
                return Ok(false);
            }
            let doc = self.document(&state.contents)?;
            state.dirty = false;
            doc
        };

        if let Err(e) = self.file.write(&doc) {
            self.state.lock().dirty = true;
            error!(path = ?self.file.path(), "Failed to write library document: {}", e);
            self.repair_file();
            return Err(e);
        }
        debug!(path = ?self.file.path(), "Flushed library document");
        Ok(true)
    }

    fn document(&self, contents: &T) -> LibraryResult<Value> {
        let mut doc = self.file.empty();
        if let Value::Object(map) = &mut doc {
            map.insert(self.file.kind().root_key().to_string(), contents.to_root()?);
        }
        Ok(doc)
    }

    /// Best-effort recovery of the file after a failed write.
    fn repair_file(&self) -> bool {
        match self.file.repair() {
            Ok(replaced) => replaced,
            Err(e) => {
                error!(path = ?self.file.path(), "Library document recovery failed: {}", e);
                false
            }
        }
    }
}

/// Owner-scoped and shared sign libraries backed by two JSON documents.
pub struct LibraryStore {
    config: Arc<ConfigHandle>,
    players: Document<OwnerShelves>,
    templates: Document<Shelf>,
}

impl LibraryStore {
    /// Opens (or creates) the libraries under `data_dir`.
    pub fn open(data_dir: impl AsRef<Path>, config: Arc<ConfigHandle>) -> LibraryResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let store = Self {
            config,
            players: Document::open(DocumentFile::new(data_dir, DocumentKind::Players))?,
            templates: Document::open(DocumentFile::new(data_dir, DocumentKind::Templates))?,
        };
        info!(
            dir = ?data_dir,
            owners = store.owners().len(),
            templates = store.count(&Namespace::Templates),
            "Opened sign libraries"
        );
        Ok(store)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Saves `content` under `name`.
    ///
    /// Template saves are written at once; owner saves only when
    /// `storage.save-immediately` is set, otherwise on the next flush. When
    /// an immediate write fails the entry is not kept.
    pub fn save(
        &self,
        namespace: &Namespace,
        name: &str,
        content: &SignContent,
    ) -> LibraryResult<SaveOutcome> {
        let settings = self.config.snapshot();
        check_name(name, settings.limits.max_name_length, &settings.reserved_names).map_err(
            |rule| LibraryError::InvalidName {
                name: name.to_string(),
                rule,
            },
        )?;
        content.validate(settings.limits.max_line_length)?;

        let overwrite = settings.features.allow_overwrite;
        let persist = !namespace.is_owner() || settings.storage.save_immediately;
        let outcome = match namespace {
            Namespace::Owner(owner) => {
                let capacity = settings.limits.capacity();
                self.players.apply(persist, |owners| {
                    let shelf = owners.entry(*owner).or_default();
                    let result = put(shelf, name, content, overwrite, capacity);
                    if shelf.is_empty() {
                        owners.remove(owner);
                    }
                    result
                })?
            }
            Namespace::Templates => self.templates.apply(persist, |shelf| {
                put(shelf, name, content, overwrite, Capacity::Unlimited)
            })?,
        };
        debug!(namespace = %namespace, name, ?outcome, "Saved library entry");
        Ok(outcome)
    }

    /// Deletes `name` and writes the document immediately. When the write
    /// fails the entry is kept.
    pub fn delete(&self, namespace: &Namespace, name: &str) -> LibraryResult<()> {
        match namespace {
            Namespace::Owner(owner) => self.players.apply(true, |owners| {
                let shelf = owners
                    .get_mut(owner)
                    .ok_or_else(|| LibraryError::NotFound(name.to_string()))?;
                shelf
                    .remove(name)
                    .ok_or_else(|| LibraryError::NotFound(name.to_string()))?;
                if shelf.is_empty() {
                    owners.remove(owner);
                }
                Ok(())
            })?,
            Namespace::Templates => self.templates.apply(true, |shelf| {
                shelf
                    .remove(name)
                    .map(|_| ())
                    .ok_or_else(|| LibraryError::NotFound(name.to_string()))
            })?,
        }
        debug!(namespace = %namespace, name, "Deleted library entry");
        Ok(())
    }

    /// Renames an entry. The new name is validated like a save; an existing
    /// entry under `to` is never replaced.
    pub fn rename(&self, namespace: &Namespace, from: &str, to: &str) -> LibraryResult<()> {
        let settings = self.config.snapshot();
        check_name(to, settings.limits.max_name_length, &settings.reserved_names).map_err(
            |rule| LibraryError::InvalidName {
                name: to.to_string(),
                rule,
            },
        )?;

        let move_entry = |shelf: &mut Shelf| -> LibraryResult<()> {
            if !shelf.contains_key(from) {
                return Err(LibraryError::NotFound(from.to_string()));
            }
            if shelf.contains_key(to) {
                return Err(LibraryError::AlreadyExists(to.to_string()));
            }
            if let Some(content) = shelf.remove(from) {
                shelf.insert(to.to_string(), content);
            }
            Ok(())
        };
        let persist = !namespace.is_owner() || settings.storage.save_immediately;
        match namespace {
            Namespace::Owner(owner) => {
                self.players
                    .apply(persist, |owners| match owners.get_mut(owner) {
                        Some(shelf) => move_entry(shelf),
                        None => Err(LibraryError::NotFound(from.to_string())),
                    })
            }
            Namespace::Templates => self.templates.apply(persist, move_entry),
        }
    }

    /// Writes every document with unsaved changes. Both documents are
    /// attempted; the first error is returned.
    pub fn flush(&self) -> LibraryResult<()> {
        let players = self.players.flush();
        let templates = self.templates.flush();
        players.and(templates).map(|_| ())
    }

    // ── Reads ────────────────────────────────────────────────────

    pub fn get(&self, namespace: &Namespace, name: &str) -> Option<SignContent> {
        self.with_shelf(namespace, |shelf| shelf.and_then(|s| s.get(name).cloned()))
    }

    /// Returns every entry in `namespace`, keyed by name.
    pub fn list_all(&self, namespace: &Namespace) -> Shelf {
        self.with_shelf(namespace, |shelf| shelf.cloned().unwrap_or_default())
    }

    pub fn count(&self, namespace: &Namespace) -> usize {
        self.with_shelf(namespace, |shelf| shelf.map_or(0, BTreeMap::len))
    }

    /// Entry names in `namespace`, sorted.
    pub fn names(&self, namespace: &Namespace) -> Vec<String> {
        self.with_shelf(namespace, |shelf| {
            shelf
                .map(|s| s.keys().cloned().collect())
                .unwrap_or_default()
        })
    }

    /// Owners with at least one entry.
    pub fn owners(&self) -> Vec<ActorId> {
        self.players.read(|owners| owners.keys().copied().collect())
    }

    /// Returns true if any document has changes not yet on disk.
    pub fn is_dirty(&self) -> bool {
        self.players.is_dirty() || self.templates.is_dirty()
    }

    /// Why `namespace` refuses writes, if it does.
    pub fn read_only_reason(&self, namespace: &Namespace) -> Option<String> {
        match namespace {
            Namespace::Owner(_) => self.players.read_only_reason(),
            Namespace::Templates => self.templates.read_only_reason(),
        }
    }

    fn with_shelf<R>(&self, namespace: &Namespace, f: impl FnOnce(Option<&Shelf>) -> R) -> R {
        match namespace {
            Namespace::Owner(owner) => self.players.read(|owners| f(owners.get(owner))),
            Namespace::Templates => self.templates.read(|shelf| f(Some(shelf))),
        }
    }
}

impl Drop for LibraryStore {
    fn drop(&mut self) {
        if self.is_dirty() {
            if let Err(e) = self.flush() {
                error!("Failed to flush sign libraries on drop: {}", e);
            }
        }
    }
}

fn put(
    shelf: &mut Shelf,
    name: &str,
    content: &SignContent,
    overwrite: bool,
    capacity: Capacity,
) -> LibraryResult<SaveOutcome> {
    if shelf.contains_key(name) {
        if !overwrite {
            return Err(LibraryError::AlreadyExists(name.to_string()));
        }
        shelf.insert(name.to_string(), content.clone());
        return Ok(SaveOutcome::Replaced);
    }
    if let Capacity::Limited(limit) = capacity {
        if capacity.is_full(shelf.len()) {
            return Err(LibraryError::LimitReached { limit });
        }
    }
    shelf.insert(name.to_string(), content.clone());
    Ok(SaveOutcome::Created)
}
