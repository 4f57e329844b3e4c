//! Collaborator adapters used when the host brings no system of its own.

use parking_lot::Mutex;
use signcopy_config::ConfigHandle;
use signcopy_types::{Action, ActorId, CooldownGate, VariantAllowList};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// Per-actor cooldowns with durations read from the live configuration,
/// so a reload takes effect on the next check.
pub struct ConfigCooldowns {
    config: Arc<ConfigHandle>,
    last_use: Mutex<HashMap<(ActorId, Action), Instant>>,
}

impl ConfigCooldowns {
    pub fn new(config: Arc<ConfigHandle>) -> Self {
        Self {
            config,
            last_use: Mutex::new(HashMap::new()),
        }
    }

    /// Number of actor and action pairs still tracked.
    pub fn tracked(&self) -> usize {
        self.last_use.lock().len()
    }
}

impl CooldownGate for ConfigCooldowns {
    fn can_proceed(&self, actor: &ActorId, action: Action) -> bool {
        let cooldown = self.config.cooldown(action);
        if cooldown.is_zero() {
            return true;
        }
        match self.last_use.lock().get(&(*actor, action)) {
            Some(at) => at.elapsed() >= cooldown,
            None => true,
        }
    }

    fn record_use(&self, actor: &ActorId, action: Action) {
        let settings = self.config.snapshot();
        if settings.cooldowns.for_action(action).is_zero() {
            return;
        }
        let now = Instant::now();
        let mut last_use = self.last_use.lock();
        // Entries whose cooldown has run out no longer block anything.
        last_use.retain(|(_, kind), at| {
            now.duration_since(*at) < settings.cooldowns.for_action(*kind)
        });
        last_use.insert((*actor, action), now);
    }
}

/// Allow-list backed by `allowed-sign-types`; an empty list allows every type.
pub struct ConfigAllowList {
    config: Arc<ConfigHandle>,
}

impl ConfigAllowList {
    pub fn new(config: Arc<ConfigHandle>) -> Self {
        Self { config }
    }
}

impl VariantAllowList for ConfigAllowList {
    fn is_allowed(&self, type_name: &str) -> bool {
        self.config.snapshot().is_sign_type_allowed(type_name)
    }
}
