//! Permission- and cooldown-gated library operations that report to the actor.

use crate::entry::Namespace;
use crate::error::{LibraryError, LibraryResult};
use crate::store::{LibraryStore, SaveOutcome, Shelf};
use signcopy_replication::{CarrierItem, Collaborators, ReplicationMachine};
use signcopy_types::{Action, ActorId, Capability, Notice, SignContent};
use std::sync::Arc;
use tracing::debug;

/// Front door to the [`LibraryStore`] for actor-initiated commands.
pub struct LibraryService {
    store: Arc<LibraryStore>,
    collab: Collaborators,
}

impl LibraryService {
    pub fn new(store: Arc<LibraryStore>, collab: Collaborators) -> Self {
        Self { store, collab }
    }

    pub fn store(&self) -> &Arc<LibraryStore> {
        &self.store
    }

    /// Saves `content` as `name` on behalf of `actor`.
    pub fn save(
        &self,
        actor: &ActorId,
        namespace: &Namespace,
        name: &str,
        content: &SignContent,
    ) -> LibraryResult<SaveOutcome> {
        let capability = match namespace {
            Namespace::Owner(_) => Capability::LibrarySave,
            Namespace::Templates => Capability::TemplateManage,
        };
        let result = self
            .admit(actor, capability)
            .and_then(|()| self.store.save(namespace, name, content));
        self.report(actor, &result, || Notice::LibrarySaved {
            name: name.to_string(),
        });
        result
    }

    /// Deletes `name` on behalf of `actor`.
    pub fn delete(&self, actor: &ActorId, namespace: &Namespace, name: &str) -> LibraryResult<()> {
        let capability = match namespace {
            Namespace::Owner(_) => Capability::LibraryDelete,
            Namespace::Templates => Capability::TemplateManage,
        };
        let result = self
            .admit(actor, capability)
            .and_then(|()| self.store.delete(namespace, name));
        self.report(actor, &result, || Notice::LibraryDeleted {
            name: name.to_string(),
        });
        result
    }

    /// Writes a stored entry onto `carrier`. The library cooldown applies as
    /// for saves; the machine checks the `LibraryUse` capability and the
    /// variant rule and sends its own notice.
    pub fn load_onto_carrier(
        &self,
        actor: &ActorId,
        namespace: &Namespace,
        name: &str,
        machine: &ReplicationMachine,
        carrier: &mut CarrierItem,
    ) -> bool {
        let found = if self.collab.cooldowns.can_proceed(actor, Action::Library) {
            self.store
                .get(namespace, name)
                .ok_or_else(|| LibraryError::NotFound(name.to_string()))
        } else {
            Err(LibraryError::OnCooldown)
        };
        let content = match found {
            Ok(content) => content,
            Err(e) => {
                debug!(actor = %actor, "Library load refused: {}", e);
                self.collab.notifier.notify(actor, e.notice());
                return false;
            }
        };
        let loaded = machine
            .load_onto_carrier(actor, name, &content, carrier)
            .is_ok();
        if loaded {
            self.collab.cooldowns.record_use(actor, Action::Library);
        }
        loaded
    }

    /// Every entry in `namespace`.
    pub fn list(&self, namespace: &Namespace) -> Shelf {
        self.store.list_all(namespace)
    }

    fn admit(&self, actor: &ActorId, capability: Capability) -> LibraryResult<()> {
        if !self.collab.permissions.has_capability(actor, capability) {
            return Err(LibraryError::PermissionDenied(capability));
        }
        if !self.collab.cooldowns.can_proceed(actor, Action::Library) {
            return Err(LibraryError::OnCooldown);
        }
        Ok(())
    }

    fn report<T>(
        &self,
        actor: &ActorId,
        result: &LibraryResult<T>,
        success: impl FnOnce() -> Notice,
    ) {
        match result {
            Ok(_) => {
                self.collab.cooldowns.record_use(actor, Action::Library);
                self.collab.notifier.notify(actor, success());
            }
            Err(e) => {
                debug!(actor = %actor, "Library request refused: {}", e);
                self.collab.notifier.notify(actor, e.notice());
            }
        }
    }
}
