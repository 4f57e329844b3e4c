//! Startup wiring and shutdown.

use crate::adapters::{ConfigAllowList, ConfigCooldowns};
use crate::error::RuntimeResult;
use crate::workers::{spawn_auto_save, spawn_staging_cleanup};
use anyhow::Context;
use signcopy_config::{ConfigHandle, ConfigIssue};
use signcopy_library::{LibraryService, LibraryStore};
use signcopy_replication::{
    Clock, Collaborators, MainThread, ReplicationMachine, SignWorld, StagingCache, SystemClock,
};
use signcopy_types::{
    AllowAllPermissions, CooldownGate, Notifier, PermissionOracle, VariantAllowList,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Where the runtime keeps its files.
#[derive(Clone)]
pub struct RuntimeOptions {
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
    /// Clock for staging TTLs.
    pub clock: Arc<dyn Clock>,
}

impl RuntimeOptions {
    /// Libraries and `config.toml` both under `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            config_path: data_dir.join("config.toml"),
            data_dir,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// What the host provides. Optional collaborators fall back to the
/// built-in adapters once, at startup.
pub struct HostBindings {
    pub world: Arc<dyn SignWorld>,
    pub main_thread: Arc<dyn MainThread>,
    pub notifier: Arc<dyn Notifier>,
    pub permissions: Option<Arc<dyn PermissionOracle>>,
    pub cooldowns: Option<Arc<dyn CooldownGate>>,
    pub allow_list: Option<Arc<dyn VariantAllowList>>,
}

impl HostBindings {
    pub fn new(
        world: Arc<dyn SignWorld>,
        main_thread: Arc<dyn MainThread>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            world,
            main_thread,
            notifier,
            permissions: None,
            cooldowns: None,
            allow_list: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionOracle>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_cooldowns(mut self, cooldowns: Arc<dyn CooldownGate>) -> Self {
        self.cooldowns = Some(cooldowns);
        self
    }

    pub fn with_allow_list(mut self, allow_list: Arc<dyn VariantAllowList>) -> Self {
        self.allow_list = Some(allow_list);
        self
    }
}

/// A running SignCopy core: configuration, staging, replication, libraries,
/// and the background workers that maintain them.
pub struct SignCopyRuntime {
    config: Arc<ConfigHandle>,
    staging: Arc<StagingCache>,
    machine: Arc<ReplicationMachine>,
    library: Arc<LibraryStore>,
    service: LibraryService,
    stop: watch::Sender<bool>,
    workers: Vec<JoinHandle<()>>,
}

impl SignCopyRuntime {
    /// Loads configuration and libraries, wires every component, and spawns
    /// the background workers. Must be called from within a tokio runtime.
    pub fn start(options: RuntimeOptions, host: HostBindings) -> anyhow::Result<Self> {
        tokio::runtime::Handle::try_current()
            .context("SignCopy must be started inside a tokio runtime")?;

        let config = Arc::new(ConfigHandle::load(options.config_path.clone()));
        let settings = config.snapshot();

        let staging = Arc::new(StagingCache::with_clock(
            settings.staging_ttl(),
            Arc::clone(&options.clock),
        ));
        let library = Arc::new(
            LibraryStore::open(&options.data_dir, Arc::clone(&config)).with_context(|| {
                format!("failed to open sign libraries in {:?}", options.data_dir)
            })?,
        );

        let permissions = host.permissions.unwrap_or_else(|| {
            info!("No permission system installed; granting every capability");
            Arc::new(AllowAllPermissions) as Arc<dyn PermissionOracle>
        });
        let cooldowns = host.cooldowns.unwrap_or_else(|| {
            Arc::new(ConfigCooldowns::new(Arc::clone(&config))) as Arc<dyn CooldownGate>
        });
        let allow_list = host.allow_list.unwrap_or_else(|| {
            Arc::new(ConfigAllowList::new(Arc::clone(&config))) as Arc<dyn VariantAllowList>
        });
        let collab = Collaborators {
            notifier: host.notifier,
            permissions,
            cooldowns,
            allow_list,
        };

        let machine = Arc::new(ReplicationMachine::new(
            Arc::clone(&config),
            Arc::clone(&staging),
            host.world,
            host.main_thread,
            collab.clone(),
        ));
        let service = LibraryService::new(Arc::clone(&library), collab);

        let (stop, stop_rx) = watch::channel(false);
        let mut workers = vec![spawn_staging_cleanup(
            Arc::clone(&staging),
            settings.staging_cleanup_interval(),
            stop_rx.clone(),
        )];
        match settings.auto_save_interval() {
            Some(every) => workers.push(spawn_auto_save(Arc::clone(&library), every, stop_rx)),
            None => info!("Library auto-save disabled"),
        }

        info!(
            data_dir = ?options.data_dir,
            staging_ttl_ms = settings.staging.ttl_ms,
            "SignCopy started"
        );
        Ok(Self {
            config,
            staging,
            machine,
            library,
            service,
            stop,
            workers,
        })
    }

    pub fn config(&self) -> &Arc<ConfigHandle> {
        &self.config
    }

    pub fn staging(&self) -> &Arc<StagingCache> {
        &self.staging
    }

    pub fn machine(&self) -> &Arc<ReplicationMachine> {
        &self.machine
    }

    pub fn library(&self) -> &Arc<LibraryStore> {
        &self.library
    }

    pub fn service(&self) -> &LibraryService {
        &self.service
    }

    /// Re-reads `config.toml`. Limits, toggles, and cooldowns apply to the
    /// next operation; the staging TTL and worker intervals keep their
    /// startup values.
    pub fn reload_config(&self) -> RuntimeResult<Vec<ConfigIssue>> {
        Ok(self.config.reload()?)
    }

    /// Stops the workers and writes every pending library change before
    /// returning.
    pub fn shutdown(self) -> RuntimeResult<()> {
        self.stop_workers();
        self.library.flush()?;
        info!("SignCopy stopped");
        Ok(())
    }

    fn stop_workers(&self) {
        // Receivers also stop when the sender is dropped, so a send error
        // only means they are already gone.
        let _ = self.stop.send(true);
        for worker in self.workers.iter().filter(|w| !w.is_finished()) {
            worker.abort();
        }
    }
}

impl Drop for SignCopyRuntime {
    fn drop(&mut self) {
        self.stop_workers();
    }
}
