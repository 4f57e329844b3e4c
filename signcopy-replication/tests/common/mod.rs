//! In-memory stand-ins for the host used by replication tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use signcopy_config::{ConfigHandle, Settings};
use signcopy_replication::{
    Collaborators, MainThread, ManualClock, ReplicationMachine, SignHandle, SignWorld,
    StagingCache,
};
use signcopy_types::{
    Action, ActorId, AllowAnyType, BlockLocation, Capability, CooldownGate, NoCooldowns, Notice,
    Notifier, PermissionOracle, SIGN_LINES, Side, SignColor, SignContent, VariantAllowList,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

// ── Signs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeSign {
    pub location: BlockLocation,
    pub type_name: String,
    pub content: SignContent,
}

impl FakeSign {
    pub fn new(type_name: &str, location: BlockLocation) -> Self {
        Self {
            location,
            type_name: type_name.to_string(),
            content: SignContent::default()
                .with_lines(Side::Front, vec![String::new(); SIGN_LINES])
                .with_lines(Side::Back, vec![String::new(); SIGN_LINES]),
        }
    }

    pub fn with_content(mut self, content: SignContent) -> Self {
        self.content = content;
        self
    }
}

impl SignHandle for FakeSign {
    fn location(&self) -> BlockLocation {
        self.location.clone()
    }

    fn type_name(&self) -> String {
        self.type_name.clone()
    }

    fn read_content(&self) -> SignContent {
        self.content.clone()
    }

    fn set_color(&mut self, side: Side, color: SignColor) {
        self.content.set_color(side, color);
    }

    fn set_lines(&mut self, side: Side, lines: &[String]) {
        self.content.set_lines(side, lines.to_vec());
    }

    fn set_glowing(&mut self, side: Side, glowing: bool) {
        self.content.set_glowing(side, glowing);
    }
}

#[derive(Default)]
pub struct FakeWorld {
    signs: Mutex<HashMap<BlockLocation, FakeSign>>,
}

impl FakeWorld {
    pub fn insert(&self, sign: FakeSign) {
        self.signs.lock().insert(sign.location.clone(), sign);
    }

    pub fn remove(&self, location: &BlockLocation) -> Option<FakeSign> {
        self.signs.lock().remove(location)
    }

    pub fn get(&self, location: &BlockLocation) -> Option<FakeSign> {
        self.signs.lock().get(location).cloned()
    }
}

impl SignWorld for FakeWorld {
    fn with_sign(
        &self,
        location: &BlockLocation,
        apply: &mut dyn FnMut(&mut dyn SignHandle),
    ) -> bool {
        match self.signs.lock().get_mut(location) {
            Some(sign) => {
                apply(sign);
                true
            }
            None => false,
        }
    }
}

// ── Scheduling ───────────────────────────────────────────────────

/// Queues tasks until the test advances a tick.
#[derive(Default)]
pub struct QueuedMainThread {
    tasks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl QueuedMainThread {
    pub fn pending(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Runs everything queued so far.
    pub fn tick(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            task();
        }
    }
}

impl MainThread for QueuedMainThread {
    fn run_next_tick(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        self.tasks.lock().push(task);
    }
}

// ── Collaborators ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(ActorId, Notice)>>,
}

impl RecordingNotifier {
    pub fn notices_for(&self, actor: &ActorId) -> Vec<Notice> {
        self.notices
            .lock()
            .iter()
            .filter(|(a, _)| a == actor)
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn last_for(&self, actor: &ActorId) -> Option<Notice> {
        self.notices_for(actor).pop()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, actor: &ActorId, notice: Notice) {
        self.notices.lock().push((*actor, notice));
    }
}

/// Grants everything except the listed capabilities.
#[derive(Default)]
pub struct DenyList {
    denied: Mutex<HashSet<Capability>>,
}

impl DenyList {
    pub fn deny(&self, capability: Capability) {
        self.denied.lock().insert(capability);
    }
}

impl PermissionOracle for DenyList {
    fn has_capability(&self, _actor: &ActorId, capability: Capability) -> bool {
        !self.denied.lock().contains(&capability)
    }
}

/// Blocks listed actions and records every use.
#[derive(Default)]
pub struct ScriptedCooldowns {
    blocked: Mutex<HashSet<Action>>,
    uses: Mutex<Vec<Action>>,
}

impl ScriptedCooldowns {
    pub fn block(&self, action: Action) {
        self.blocked.lock().insert(action);
    }

    pub fn uses(&self) -> Vec<Action> {
        self.uses.lock().clone()
    }
}

impl CooldownGate for ScriptedCooldowns {
    fn can_proceed(&self, _actor: &ActorId, action: Action) -> bool {
        !self.blocked.lock().contains(&action)
    }

    fn record_use(&self, _actor: &ActorId, action: Action) {
        self.uses.lock().push(action);
    }
}

pub struct OnlyTypes(pub Vec<&'static str>);

impl VariantAllowList for OnlyTypes {
    fn is_allowed(&self, type_name: &str) -> bool {
        self.0.contains(&type_name)
    }
}

// ── Harness ──────────────────────────────────────────────────────

pub struct Harness {
    pub machine: ReplicationMachine,
    pub config: Arc<ConfigHandle>,
    pub staging: Arc<StagingCache>,
    pub clock: Arc<ManualClock>,
    pub world: Arc<FakeWorld>,
    pub main_thread: Arc<QueuedMainThread>,
    pub notifier: Arc<RecordingNotifier>,
    pub permissions: Arc<DenyList>,
    pub cooldowns: Arc<ScriptedCooldowns>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self::build(settings, Arc::new(AllowAnyType))
    }

    pub fn with_allow_list(allow_list: Arc<dyn VariantAllowList>) -> Self {
        Self::build(Settings::default(), allow_list)
    }

    fn build(settings: Settings, allow_list: Arc<dyn VariantAllowList>) -> Self {
        let config = Arc::new(ConfigHandle::with_settings(settings));
        let clock = Arc::new(ManualClock::new(1_000_000));
        let staging = Arc::new(StagingCache::with_clock(
            Duration::from_millis(300_000),
            clock.clone(),
        ));
        let world = Arc::new(FakeWorld::default());
        let main_thread = Arc::new(QueuedMainThread::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let permissions = Arc::new(DenyList::default());
        let cooldowns = Arc::new(ScriptedCooldowns::default());

        let machine = ReplicationMachine::new(
            Arc::clone(&config),
            Arc::clone(&staging),
            world.clone(),
            main_thread.clone(),
            Collaborators {
                notifier: notifier.clone(),
                permissions: permissions.clone(),
                cooldowns: cooldowns.clone(),
                allow_list,
            },
        );

        Self {
            machine,
            config,
            staging,
            clock,
            world,
            main_thread,
            notifier,
            permissions,
            cooldowns,
        }
    }
}

/// A collaborator set with no restrictions, for tests that only need wiring.
pub fn open_collaborators(notifier: Arc<RecordingNotifier>) -> Collaborators {
    Collaborators {
        notifier,
        permissions: Arc::new(signcopy_types::AllowAllPermissions),
        cooldowns: Arc::new(NoCooldowns),
        allow_list: Arc::new(AllowAnyType),
    }
}

pub fn loc(x: i32) -> BlockLocation {
    BlockLocation::new("world", x, 64, 0)
}

pub fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
