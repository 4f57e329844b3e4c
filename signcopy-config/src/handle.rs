//! Shared, reloadable access to the current [`Settings`] snapshot.

use crate::error::{ConfigError, ConfigResult};
use crate::settings::{Capacity, ConfigIssue, Settings};
use parking_lot::RwLock;
use signcopy_types::Action;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Read/write-locked accessor over the active configuration.
///
/// Readers clone an `Arc<Settings>` under a short read lock and work on that
/// snapshot; writers build a complete replacement before taking the write
/// lock, so the lock is only ever held for a pointer swap.
#[derive(Debug)]
pub struct ConfigHandle {
    path: Option<PathBuf>,
    current: RwLock<Arc<Settings>>,
}

impl ConfigHandle {
    /// Loads settings from `path`, writing defaults if the file does not exist.
    ///
    /// Never fails: an unreadable or invalid file is logged and defaults are
    /// used instead.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = if path.exists() {
            match read_settings(&path) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(
                        "Failed to load configuration {:?}: {}. Falling back to defaults.",
                        path, e
                    );
                    Settings::default()
                }
            }
        } else {
            info!("No configuration found at {:?}, writing defaults", path);
            let defaults = Settings::default();
            if let Err(e) = write_settings(&path, &defaults) {
                warn!("Failed to write default configuration {:?}: {}", path, e);
            }
            defaults
        };

        Self {
            path: Some(path),
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Creates a handle over explicit settings with no backing file.
    pub fn with_settings(settings: Settings) -> Self {
        let (settings, issues) = settings.validated();
        log_issues(None, &issues);
        Self {
            path: None,
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Returns the backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&*self.current.read())
    }

    /// Re-reads the backing file and swaps in the new snapshot.
    ///
    /// On a parse or IO failure the previous snapshot stays active and the
    /// error is returned. Fields reset during validation are returned as
    /// issues.
    pub fn reload(&self) -> ConfigResult<Vec<ConfigIssue>> {
        let path = self.path.as_deref().ok_or(ConfigError::NoBackingFile)?;
        let text = std::fs::read_to_string(path)?;
        let parsed = Settings::from_toml(&text).inspect_err(|e| {
            warn!(
                "Configuration reload from {:?} failed: {}. Keeping previous settings.",
                path, e
            );
        })?;
        let (settings, issues) = parsed.validated();
        log_issues(Some(path), &issues);
        *self.current.write() = Arc::new(settings);
        info!("Reloaded configuration from {:?}", path);
        Ok(issues)
    }

    /// Applies `change` to a copy of the current settings, validates it,
    /// swaps it in, and persists it when a backing file exists.
    pub fn update<F>(&self, change: F) -> ConfigResult<Vec<ConfigIssue>>
    where
        F: FnOnce(&mut Settings),
    {
        let mut next = (*self.snapshot()).clone();
        change(&mut next);
        let (next, issues) = next.validated();
        log_issues(self.path.as_deref(), &issues);

        if let Some(path) = &self.path {
            write_settings(path, &next)?;
        }
        *self.current.write() = Arc::new(next);
        Ok(issues)
    }

    // ── Typed getters ────────────────────────────────────────────

    pub fn capacity(&self) -> Capacity {
        self.current.read().limits.capacity()
    }

    pub fn max_line_length(&self) -> usize {
        self.current.read().limits.max_line_length
    }

    pub fn max_name_length(&self) -> usize {
        self.current.read().limits.max_name_length
    }

    pub fn cooldown(&self, action: Action) -> Duration {
        self.current.read().cooldowns.for_action(action)
    }

    pub fn staging_ttl(&self) -> Duration {
        self.current.read().staging_ttl()
    }

    pub fn auto_save_interval(&self) -> Option<Duration> {
        self.current.read().auto_save_interval()
    }

    pub fn copy_colors(&self) -> bool {
        self.current.read().features.copy_colors
    }

    pub fn copy_glow(&self) -> bool {
        self.current.read().features.copy_glow
    }

    pub fn allow_overwrite(&self) -> bool {
        self.current.read().features.allow_overwrite
    }

    pub fn save_immediately(&self) -> bool {
        self.current.read().storage.save_immediately
    }
}

fn read_settings(path: &Path) -> ConfigResult<Settings> {
    let text = std::fs::read_to_string(path)?;
    let (settings, issues) = Settings::from_toml(&text)?.validated();
    log_issues(Some(path), &issues);
    Ok(settings)
}

fn write_settings(path: &Path, settings: &Settings) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, settings.to_toml()?)?;
    Ok(())
}

fn log_issues(path: Option<&Path>, issues: &[ConfigIssue]) {
    for issue in issues {
        warn!(
            path = ?path,
            field = issue.field,
            "Invalid configuration value reset to default: {}",
            issue.message
        );
    }
}
