//! Persisted schema of `preferences.toml`.

use pmswitch_core::config::DefaultsConfig;
use pmswitch_core::preference::{PackageManager, PreferenceKind, PreferenceValue};
use serde::{Deserialize, Serialize};

/// Current schema version written to `preferences.toml`.
pub const PREFERENCES_VERSION: &str = "1.0.0";

/// On-disk representation of the user's preferences.
///
/// Missing fields fall back to the defaults so hand-edited files with only
/// one key still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesDto {
    #[serde(default = "default_version")]
    pub schema_version: String,
    #[serde(default)]
    pub package_manager: PackageManager,
    #[serde(default)]
    pub monitoring_enabled: bool,
}

fn default_version() -> String {
    PREFERENCES_VERSION.to_string()
}

impl PreferencesDto {
    pub fn from_defaults(defaults: &DefaultsConfig) -> Self {
        Self {
            schema_version: default_version(),
            package_manager: defaults.package_manager,
            monitoring_enabled: defaults.monitoring_enabled,
        }
    }

    pub fn get(&self, kind: PreferenceKind) -> PreferenceValue {
        match kind {
            PreferenceKind::ToolChoice => PreferenceValue::ToolChoice(self.package_manager),
            PreferenceKind::MonitorEnabled => PreferenceValue::MonitorEnabled(self.monitoring_enabled),
        }
    }

    pub fn apply(&mut self, value: PreferenceValue) {
        match value {
            PreferenceValue::ToolChoice(pm) => self.package_manager = pm,
            PreferenceValue::MonitorEnabled(enabled) => self.monitoring_enabled = enabled,
        }
    }
}
