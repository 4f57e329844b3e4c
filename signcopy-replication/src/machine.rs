//! The copy → place → edit state machine.

use crate::codec;
use crate::error::{ReplicationError, ReplicationResult};
use crate::format::propagate_trailing_format;
use crate::host::{CarrierItem, FrontLines, MainThread, SignHandle, SignWorld};
use crate::staging::{StagedText, StagingCache};
use signcopy_config::ConfigHandle;
use signcopy_types::{
    Action, ActorId, BlockLocation, Capability, CooldownGate, Notice, Notifier, PermissionOracle,
    Side, SignColor, SignContent, VariantAllowList,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Host collaborators consulted by the state machine and the library service.
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub permissions: Arc<dyn PermissionOracle>,
    pub cooldowns: Arc<dyn CooldownGate>,
    pub allow_list: Arc<dyn VariantAllowList>,
}

/// Result of a copy onto a carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The carrier now holds this content.
    Copied(SignContent),
    /// Nothing was changed.
    Rejected(ReplicationError),
}

/// Result of placing a carrier. The host acts on `Cancelled` by cancelling
/// the placement; every other variant lets it proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceOutcome {
    /// The carrier held no copied content.
    Plain,
    /// The carrier's content could not be decoded; placed as a blank sign.
    Unreadable(ReplicationError),
    /// Colours applied; text and glow wait for the edit callback.
    Staged,
    /// The placement must not happen. Nothing was mutated.
    Cancelled(ReplicationError),
}

/// Result of the host's text-edit callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// No paste was staged at this location.
    NothingStaged,
    /// Front lines written; back lines and glow scheduled for the next tick.
    Applied,
}

/// Drives a paste through copy, placement, and text edit.
///
/// Each trigger performs at most one staging-cache operation, so concurrent
/// flows at different locations never interfere.
pub struct ReplicationMachine {
    config: Arc<ConfigHandle>,
    staging: Arc<StagingCache>,
    world: Arc<dyn SignWorld>,
    main_thread: Arc<dyn MainThread>,
    collab: Collaborators,
}

impl ReplicationMachine {
    pub fn new(
        config: Arc<ConfigHandle>,
        staging: Arc<StagingCache>,
        world: Arc<dyn SignWorld>,
        main_thread: Arc<dyn MainThread>,
        collab: Collaborators,
    ) -> Self {
        Self {
            config,
            staging,
            world,
            main_thread,
            collab,
        }
    }

    pub fn staging(&self) -> &Arc<StagingCache> {
        &self.staging
    }

    // ── Idle → Captured ──────────────────────────────────────────

    /// Copies `source` onto `carrier`.
    pub fn on_copy(
        &self,
        actor: &ActorId,
        source: &dyn SignHandle,
        carrier: &mut CarrierItem,
    ) -> CopyOutcome {
        match self.capture(actor, source, carrier) {
            Ok(content) => {
                self.collab.notifier.notify(
                    actor,
                    Notice::Copied {
                        variant: content.variant,
                    },
                );
                CopyOutcome::Copied(content)
            }
            Err(e) => {
                self.reject(actor, &e);
                CopyOutcome::Rejected(e)
            }
        }
    }

    fn capture(
        &self,
        actor: &ActorId,
        source: &dyn SignHandle,
        carrier: &mut CarrierItem,
    ) -> ReplicationResult<SignContent> {
        self.check_type(&source.type_name())?;
        self.check_capability(actor, Capability::Copy)?;
        self.check_cooldown(actor, Action::Copy)?;

        let variant = source.variant();
        if carrier.variant() != variant {
            return Err(ReplicationError::VariantMismatch {
                expected: variant,
                found: carrier.variant(),
            });
        }

        let settings = self.config.snapshot();
        let mut content = source
            .read_content()
            .sanitized(settings.limits.max_line_length);
        content.variant = variant;

        let copy_colors = settings.features.copy_colors
            && self.collab.permissions.has_capability(actor, Capability::CopyColor);
        let copy_glow = settings.features.copy_glow
            && self.collab.permissions.has_capability(actor, Capability::CopyGlow);
        for side in Side::BOTH {
            if !copy_colors {
                content.set_color(side, SignColor::FALLBACK);
            }
            if !copy_glow {
                content.set_glowing(side, false);
            }
        }

        let lore = describe(&content);
        content.lore = Some(lore.clone());
        codec::write(&mut carrier.tags, &content);
        carrier.lore = lore;

        self.collab.cooldowns.record_use(actor, Action::Copy);
        debug!(actor = %actor, source = %source.location(), "Captured sign onto carrier");
        Ok(content)
    }

    // ── Captured → Staged ────────────────────────────────────────

    /// Handles `carrier` being placed as `placed`.
    pub fn on_place(
        &self,
        actor: &ActorId,
        carrier: &CarrierItem,
        placed: &mut dyn SignHandle,
    ) -> PlaceOutcome {
        let content = match codec::decode(&carrier.tags) {
            Ok(Some(content)) => content,
            Ok(None) => return PlaceOutcome::Plain,
            Err(e) => {
                let e = ReplicationError::from(e);
                self.reject(actor, &e);
                return PlaceOutcome::Unreadable(e);
            }
        };

        match self.stage(actor, &content, placed) {
            Ok(()) => PlaceOutcome::Staged,
            Err(e) => {
                self.reject(actor, &e);
                PlaceOutcome::Cancelled(e)
            }
        }
    }

    fn stage(
        &self,
        actor: &ActorId,
        content: &SignContent,
        placed: &mut dyn SignHandle,
    ) -> ReplicationResult<()> {
        self.check_type(&placed.type_name())?;
        self.check_capability(actor, Capability::Paste)?;
        self.check_cooldown(actor, Action::Paste)?;

        let found = placed.variant();
        if found != content.variant {
            return Err(ReplicationError::VariantMismatch {
                expected: content.variant,
                found,
            });
        }

        for side in Side::BOTH {
            placed.set_color(side, content.color(side));
        }

        let location = placed.location();
        let staged = StagedText {
            actor: *actor,
            front: propagate_trailing_format(&content.front),
            back: propagate_trailing_format(&content.back),
            front_glowing: content.front_glowing,
            back_glowing: content.back_glowing,
        };
        if self.staging.put(location.clone(), staged).is_some() {
            debug!(location = %location, "Replaced an earlier staged paste");
        }

        self.collab.cooldowns.record_use(actor, Action::Paste);
        debug!(actor = %actor, location = %location, "Staged paste");
        Ok(())
    }

    // ── Staged → Idle ────────────────────────────────────────────

    /// Handles the host's text-edit callback for a sign at `location`.
    ///
    /// Writes staged front lines into `front` immediately and schedules the
    /// back lines and glow for the next main-thread tick. Does nothing if no
    /// paste was staged here.
    pub fn on_text_edit(
        &self,
        location: &BlockLocation,
        front: &mut FrontLines,
    ) -> FinalizeOutcome {
        let Some(staged) = self.staging.remove(location) else {
            return FinalizeOutcome::NothingStaged;
        };

        for (index, slot) in front.iter_mut().enumerate() {
            *slot = staged.front.get(index).cloned().unwrap_or_default();
        }

        let world = Arc::clone(&self.world);
        let notifier = Arc::clone(&self.collab.notifier);
        let location = location.clone();
        self.main_thread.run_next_tick(Box::new(move || {
            let applied = world.with_sign(&location, &mut |sign: &mut dyn SignHandle| {
                sign.set_lines(Side::Back, &staged.back);
                sign.set_glowing(Side::Front, staged.front_glowing);
                sign.set_glowing(Side::Back, staged.back_glowing);
            });
            if applied {
                notifier.notify(&staged.actor, Notice::PasteComplete { location });
            } else {
                warn!(location = %location, "Sign vanished before its back side could be pasted");
            }
        }));

        FinalizeOutcome::Applied
    }

    // ── Carrier management ───────────────────────────────────────

    /// Removes copied content and annotation from `carrier`.
    pub fn reset_carrier(&self, actor: &ActorId, carrier: &mut CarrierItem) {
        codec::clear(&mut carrier.tags);
        carrier.lore.clear();
        self.collab.notifier.notify(actor, Notice::CarrierReset);
    }

    /// Writes stored `content` (e.g. from the library) onto `carrier`.
    pub fn load_onto_carrier(
        &self,
        actor: &ActorId,
        name: &str,
        content: &SignContent,
        carrier: &mut CarrierItem,
    ) -> ReplicationResult<()> {
        let result = self.load(actor, content, carrier);
        match &result {
            Ok(()) => self.collab.notifier.notify(
                actor,
                Notice::CarrierLoaded {
                    name: name.to_string(),
                },
            ),
            Err(e) => self.reject(actor, e),
        }
        result
    }

    fn load(
        &self,
        actor: &ActorId,
        content: &SignContent,
        carrier: &mut CarrierItem,
    ) -> ReplicationResult<()> {
        self.check_capability(actor, Capability::LibraryUse)?;
        if carrier.variant() != content.variant {
            return Err(ReplicationError::VariantMismatch {
                expected: content.variant,
                found: carrier.variant(),
            });
        }
        let mut content = content.clone().sanitized(self.config.max_line_length());
        let lore = describe(&content);
        content.lore = Some(lore.clone());
        codec::write(&mut carrier.tags, &content);
        carrier.lore = lore;
        Ok(())
    }

    // ── Gates ────────────────────────────────────────────────────

    fn check_type(&self, type_name: &str) -> ReplicationResult<()> {
        if self.collab.allow_list.is_allowed(type_name) {
            Ok(())
        } else {
            Err(ReplicationError::TypeNotAllowed(type_name.to_string()))
        }
    }

    fn check_capability(&self, actor: &ActorId, capability: Capability) -> ReplicationResult<()> {
        if self.collab.permissions.has_capability(actor, capability) {
            Ok(())
        } else {
            Err(ReplicationError::PermissionDenied(capability))
        }
    }

    fn check_cooldown(&self, actor: &ActorId, action: Action) -> ReplicationResult<()> {
        if self.collab.cooldowns.can_proceed(actor, action) {
            Ok(())
        } else {
            Err(ReplicationError::OnCooldown(action))
        }
    }

    fn reject(&self, actor: &ActorId, error: &ReplicationError) {
        debug!(actor = %actor, "Replication refused: {}", error);
        self.collab.notifier.notify(actor, error.notice());
    }
}

/// Builds the carrier annotation for `content`: a header per side that
/// carries text, followed by that side's lines.
pub fn describe(content: &SignContent) -> Vec<String> {
    let mut lore = Vec::new();
    for side in Side::BOTH {
        let lines = content.lines(side);
        if lines.iter().all(|line| line.is_empty()) {
            continue;
        }
        lore.push(match side {
            Side::Front => "Front:".to_string(),
            Side::Back => "Back:".to_string(),
        });
        lore.extend(lines.iter().cloned());
    }
    lore
}
