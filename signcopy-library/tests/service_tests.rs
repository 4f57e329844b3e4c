use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use signcopy_config::{ConfigHandle, Settings};
use signcopy_library::{LibraryError, LibraryService, LibraryStore, Namespace};
use signcopy_replication::{
    CarrierItem, Collaborators, MainThread, ReplicationMachine, SignHandle, SignWorld,
    StagingCache,
};
use signcopy_types::{
    Action, ActorId, AllowAnyType, BlockLocation, Capability, CooldownGate, Notice, Notifier,
    PermissionOracle, Side, SignContent, SignVariant,
};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Default)]
struct Recorder(Mutex<Vec<Notice>>);

impl Notifier for Recorder {
    fn notify(&self, _actor: &ActorId, notice: Notice) {
        self.0.lock().push(notice);
    }
}

impl Recorder {
    fn last(&self) -> Option<Notice> {
        self.0.lock().last().cloned()
    }
}

#[derive(Default)]
struct Denied(Mutex<HashSet<Capability>>);

impl PermissionOracle for Denied {
    fn has_capability(&self, _actor: &ActorId, capability: Capability) -> bool {
        !self.0.lock().contains(&capability)
    }
}

#[derive(Default)]
struct OneShotCooldown(Mutex<HashSet<ActorId>>);

impl CooldownGate for OneShotCooldown {
    fn can_proceed(&self, actor: &ActorId, _action: Action) -> bool {
        !self.0.lock().contains(actor)
    }

    fn record_use(&self, actor: &ActorId, _action: Action) {
        self.0.lock().insert(*actor);
    }
}

struct NoSigns;

impl SignWorld for NoSigns {
    fn with_sign(&self, _: &BlockLocation, _: &mut dyn FnMut(&mut dyn SignHandle)) -> bool {
        false
    }
}

struct Inline;

impl MainThread for Inline {
    fn run_next_tick(&self, task: Box<dyn FnOnce() + Send + 'static>) {
        task();
    }
}

struct Fixture {
    _dir: TempDir,
    service: LibraryService,
    machine: ReplicationMachine,
    notices: Arc<Recorder>,
    denied: Arc<Denied>,
}

fn fixture(cooldowns: Arc<dyn CooldownGate>) -> Fixture {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(ConfigHandle::with_settings(Settings::default()));
    let store = Arc::new(LibraryStore::open(dir.path(), Arc::clone(&config)).unwrap());
    let notices = Arc::new(Recorder::default());
    let denied = Arc::new(Denied::default());
    let collab = Collaborators {
        notifier: notices.clone(),
        permissions: denied.clone(),
        cooldowns,
        allow_list: Arc::new(AllowAnyType),
    };
    let machine = ReplicationMachine::new(
        config,
        Arc::new(StagingCache::default()),
        Arc::new(NoSigns),
        Arc::new(Inline),
        collab.clone(),
    );
    Fixture {
        _dir: dir,
        service: LibraryService::new(store, collab),
        machine,
        notices,
        denied,
    }
}

fn open_fixture() -> Fixture {
    fixture(Arc::new(signcopy_types::NoCooldowns))
}

fn record() -> SignContent {
    SignContent::new(SignVariant::Hanging).with_lines(Side::Front, ["Menu"])
}

#[test]
fn save_reports_success() {
    let f = open_fixture();
    let actor = ActorId::new();

    f.service
        .save(&actor, &Namespace::Owner(actor), "menu", &record())
        .unwrap();

    assert_eq!(
        f.notices.last(),
        Some(Notice::LibrarySaved {
            name: "menu".to_string()
        })
    );
    assert_eq!(f.service.list(&Namespace::Owner(actor)).len(), 1);
}

#[test]
fn save_reports_validation_failure() {
    let f = open_fixture();
    let actor = ActorId::new();

    let err = f
        .service
        .save(&actor, &Namespace::Owner(actor), "bad name!", &record())
        .unwrap_err();

    assert!(err.is_validation_failure());
    assert!(matches!(
        f.notices.last(),
        Some(Notice::LibraryInvalidName { name, .. }) if name == "bad name!"
    ));
}

#[test]
fn templates_need_manage_capability() {
    let f = open_fixture();
    let actor = ActorId::new();
    f.denied.0.lock().insert(Capability::TemplateManage);

    let err = f
        .service
        .save(&actor, &Namespace::Templates, "t", &record())
        .unwrap_err();

    assert!(matches!(
        err,
        LibraryError::PermissionDenied(Capability::TemplateManage)
    ));
    assert_eq!(f.service.store().count(&Namespace::Templates), 0);
    assert_eq!(
        f.notices.last(),
        Some(Notice::PermissionDenied {
            capability: Capability::TemplateManage
        })
    );
}

#[test]
fn cooldown_applies_after_a_successful_action() {
    let f = fixture(Arc::new(OneShotCooldown::default()));
    let actor = ActorId::new();
    let ns = Namespace::Owner(actor);

    f.service.save(&actor, &ns, "first", &record()).unwrap();
    let err = f.service.save(&actor, &ns, "second", &record()).unwrap_err();

    assert!(matches!(err, LibraryError::OnCooldown));
    assert_eq!(
        f.notices.last(),
        Some(Notice::OnCooldown {
            action: Action::Library
        })
    );
}

#[test]
fn delete_reports_missing_entry() {
    let f = open_fixture();
    let actor = ActorId::new();

    let err = f
        .service
        .delete(&actor, &Namespace::Owner(actor), "ghost")
        .unwrap_err();

    assert!(matches!(err, LibraryError::NotFound(_)));
    assert_eq!(
        f.notices.last(),
        Some(Notice::LibraryNotFound {
            name: "ghost".to_string()
        })
    );
}

#[test]
fn stored_entry_loads_onto_matching_carrier() {
    let f = open_fixture();
    let actor = ActorId::new();
    let ns = Namespace::Owner(actor);
    f.service.save(&actor, &ns, "menu", &record()).unwrap();
    let mut carrier = CarrierItem::new("OAK_HANGING_SIGN");

    let loaded = f
        .service
        .load_onto_carrier(&actor, &ns, "menu", &f.machine, &mut carrier);

    assert!(loaded);
    assert!(carrier.has_fingerprint());
    assert_eq!(
        f.notices.last(),
        Some(Notice::CarrierLoaded {
            name: "menu".to_string()
        })
    );
}

#[test]
fn loading_needs_library_use_and_an_existing_entry() {
    let f = open_fixture();
    let actor = ActorId::new();
    let ns = Namespace::Owner(actor);
    let mut carrier = CarrierItem::new("OAK_HANGING_SIGN");

    assert!(
        !f.service
            .load_onto_carrier(&actor, &ns, "nothing", &f.machine, &mut carrier)
    );
    assert_eq!(
        f.notices.last(),
        Some(Notice::LibraryNotFound {
            name: "nothing".to_string()
        })
    );

    f.service.save(&actor, &ns, "menu", &record()).unwrap();
    f.denied.0.lock().insert(Capability::LibraryUse);
    assert!(
        !f.service
            .load_onto_carrier(&actor, &ns, "menu", &f.machine, &mut carrier)
    );
    assert!(!carrier.has_fingerprint());
}

#[test]
fn loading_is_subject_to_the_library_cooldown() {
    let f = fixture(Arc::new(OneShotCooldown::default()));
    let actor = ActorId::new();
    let ns = Namespace::Owner(actor);
    f.service.store().save(&ns, "menu", &record()).unwrap();
    let mut first = CarrierItem::new("OAK_HANGING_SIGN");
    let mut second = CarrierItem::new("OAK_HANGING_SIGN");

    assert!(
        f.service
            .load_onto_carrier(&actor, &ns, "menu", &f.machine, &mut first)
    );
    assert!(
        !f.service
            .load_onto_carrier(&actor, &ns, "menu", &f.machine, &mut second)
    );

    assert!(!second.has_fingerprint());
    assert_eq!(
        f.notices.last(),
        Some(Notice::OnCooldown {
            action: Action::Library
        })
    );
}
