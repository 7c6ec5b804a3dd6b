//! Application configuration model (`config.toml`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::preference::model::PackageManager;

/// Root of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
    pub update: UpdateConfig,
    pub defaults: DefaultsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            update: UpdateConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Settings for the update lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// URL of the release manifest. No endpoint means no update is ever found.
    pub endpoint: Option<String>,
    /// Seconds between background checks; 0 disables the periodic checker.
    pub check_interval_secs: u64,
    /// Seconds to wait for `update-available` before a check counts as "none".
    pub check_timeout_secs: u64,
    /// Overrides the version compared against the manifest.
    pub current_version: Option<String>,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            check_interval_secs: 300,
            check_timeout_secs: 30,
            current_version: None,
        }
    }
}

impl UpdateConfig {
    pub fn check_interval(&self) -> Option<Duration> {
        (self.check_interval_secs > 0).then(|| Duration::from_secs(self.check_interval_secs))
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs.max(1))
    }
}

/// Values used until (or unless) hydration from the backend succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub package_manager: PackageManager,
    pub monitoring_enabled: bool,
}
