//! Settings schema, defaults, and range validation.

use serde::{Deserialize, Serialize};
use signcopy_types::Action;
use std::fmt;
use std::time::Duration;

/// Schema version written by this build.
pub const CURRENT_CONFIG_VERSION: u32 = 2;

const MAX_SIGN_LINE_LENGTH: usize = 384;
const MAX_NAME_LENGTH: usize = 64;
const MIN_AUTO_SAVE_SECONDS: u64 = 10;
const MIN_STAGING_TTL_MS: u64 = 1_000;

/// Capacity of an owner's personal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Unlimited,
    Limited(usize),
}

impl Capacity {
    /// Returns true if `current` entries already fill the library.
    pub fn is_full(&self, current: usize) -> bool {
        match self {
            Self::Unlimited => false,
            Self::Limited(max) => current >= *max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Limits {
    /// `-1` disables the limit.
    pub max_saved_signs: i64,
    pub max_line_length: usize,
    pub max_name_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_saved_signs: 27,
            max_line_length: 90,
            max_name_length: 32,
        }
    }
}

impl Limits {
    pub fn capacity(&self) -> Capacity {
        if self.max_saved_signs < 0 {
            Capacity::Unlimited
        } else {
            Capacity::Limited(self.max_saved_signs as usize)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Cooldowns {
    pub copy_seconds: u64,
    pub paste_seconds: u64,
    pub library_seconds: u64,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            copy_seconds: 1,
            paste_seconds: 0,
            library_seconds: 2,
        }
    }
}

impl Cooldowns {
    pub fn for_action(&self, action: Action) -> Duration {
        Duration::from_secs(match action {
            Action::Copy => self.copy_seconds,
            Action::Paste => self.paste_seconds,
            Action::Library => self.library_seconds,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Features {
    pub copy_colors: bool,
    pub copy_glow: bool,
    pub allow_overwrite: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            copy_colors: true,
            copy_glow: true,
            allow_overwrite: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageSettings {
    /// `0` disables periodic saving.
    pub auto_save_interval_seconds: u64,
    /// Flush owner-library saves immediately instead of waiting for auto-save.
    pub save_immediately: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            auto_save_interval_seconds: 300,
            save_immediately: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StagingSettings {
    pub ttl_ms: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for StagingSettings {
    fn default() -> Self {
        Self {
            ttl_ms: 300_000,
            cleanup_interval_seconds: 300,
        }
    }
}

/// A complete configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    pub config_version: u32,
    /// Library names that may never be used (compared case-insensitively).
    pub reserved_names: Vec<String>,
    /// Host sign types that may be copied from or pasted onto. Empty allows all.
    pub allowed_sign_types: Vec<String>,
    pub limits: Limits,
    pub cooldowns: Cooldowns,
    pub features: Features,
    pub storage: StorageSettings,
    pub staging: StagingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_version: CURRENT_CONFIG_VERSION,
            reserved_names: vec![
                "list".to_string(),
                "help".to_string(),
                "templates".to_string(),
                "players".to_string(),
            ],
            allowed_sign_types: Vec::new(),
            limits: Limits::default(),
            cooldowns: Cooldowns::default(),
            features: Features::default(),
            storage: StorageSettings::default(),
            staging: StagingSettings::default(),
        }
    }
}

/// A field that failed validation and was reset to its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl Settings {
    /// Parses TOML text into settings without range validation.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Renders settings as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Resets every out-of-range field to its default and reports what changed.
    #[must_use]
    pub fn validated(mut self) -> (Self, Vec<ConfigIssue>) {
        let defaults = Settings::default();
        let mut issues = Vec::new();
        let mut reset = |field: &'static str, message: String| {
            issues.push(ConfigIssue { field, message });
        };

        if self.limits.max_saved_signs < -1 {
            reset(
                "limits.max-saved-signs",
                format!("{} is below -1", self.limits.max_saved_signs),
            );
            self.limits.max_saved_signs = defaults.limits.max_saved_signs;
        }
        if self.limits.max_line_length == 0 || self.limits.max_line_length > MAX_SIGN_LINE_LENGTH
        {
            reset(
                "limits.max-line-length",
                format!(
                    "{} is outside 1..={MAX_SIGN_LINE_LENGTH}",
                    self.limits.max_line_length
                ),
            );
            self.limits.max_line_length = defaults.limits.max_line_length;
        }
        if self.limits.max_name_length == 0 || self.limits.max_name_length > MAX_NAME_LENGTH {
            reset(
                "limits.max-name-length",
                format!(
                    "{} is outside 1..={MAX_NAME_LENGTH}",
                    self.limits.max_name_length
                ),
            );
            self.limits.max_name_length = defaults.limits.max_name_length;
        }
        let auto_save = self.storage.auto_save_interval_seconds;
        if auto_save != 0 && auto_save < MIN_AUTO_SAVE_SECONDS {
            reset(
                "storage.auto-save-interval-seconds",
                format!("{auto_save} is below {MIN_AUTO_SAVE_SECONDS} (use 0 to disable)"),
            );
            self.storage.auto_save_interval_seconds = defaults.storage.auto_save_interval_seconds;
        }
        if self.staging.ttl_ms < MIN_STAGING_TTL_MS {
            reset(
                "staging.ttl-ms",
                format!("{} is below {MIN_STAGING_TTL_MS}", self.staging.ttl_ms),
            );
            self.staging.ttl_ms = defaults.staging.ttl_ms;
        }
        if self.staging.cleanup_interval_seconds == 0 {
            reset("staging.cleanup-interval-seconds", "must be positive".to_string());
            self.staging.cleanup_interval_seconds = defaults.staging.cleanup_interval_seconds;
        }
        if self.config_version > CURRENT_CONFIG_VERSION {
            reset(
                "config-version",
                format!(
                    "{} is newer than supported version {CURRENT_CONFIG_VERSION}",
                    self.config_version
                ),
            );
            self.config_version = CURRENT_CONFIG_VERSION;
        }
        if self.reserved_names.iter().any(|n| n.trim().is_empty()) {
            reset("reserved-names", "blank entries removed".to_string());
            self.reserved_names.retain(|n| !n.trim().is_empty());
        }

        (self, issues)
    }

    /// Case-insensitive reserved-name check.
    pub fn is_reserved_name(&self, name: &str) -> bool {
        self.reserved_names
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(name))
    }

    /// Returns true if the host sign type may take part in a copy or paste.
    pub fn is_sign_type_allowed(&self, type_name: &str) -> bool {
        self.allowed_sign_types.is_empty()
            || self
                .allowed_sign_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(type_name))
    }

    pub fn staging_ttl(&self) -> Duration {
        Duration::from_millis(self.staging.ttl_ms)
    }

    pub fn staging_cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.staging.cleanup_interval_seconds)
    }

    /// `None` when periodic saving is disabled.
    pub fn auto_save_interval(&self) -> Option<Duration> {
        match self.storage.auto_save_interval_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
