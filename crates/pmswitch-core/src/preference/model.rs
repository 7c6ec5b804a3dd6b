//! Preference domain models.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// A package manager the user can pick as their preferred tool.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

/// The closed set of preferences the synchronizer manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PreferenceKind {
    /// Which package manager commands are rewritten to.
    ToolChoice,
    /// Whether the background monitor is running.
    MonitorEnabled,
}

impl PreferenceKind {
    pub const ALL: [PreferenceKind; 2] = [PreferenceKind::ToolChoice, PreferenceKind::MonitorEnabled];
}

/// A preference value, tagged with the kind it belongs to.
///
/// The variant determines the kind, so a value can never be stored under a
/// kind whose domain it does not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "kebab-case")]
pub enum PreferenceValue {
    ToolChoice(PackageManager),
    MonitorEnabled(bool),
}

impl PreferenceValue {
    /// Returns the kind this value belongs to.
    pub fn kind(&self) -> PreferenceKind {
        match self {
            Self::ToolChoice(_) => PreferenceKind::ToolChoice,
            Self::MonitorEnabled(_) => PreferenceKind::MonitorEnabled,
        }
    }

    pub fn as_tool_choice(&self) -> Option<PackageManager> {
        match self {
            Self::ToolChoice(pm) => Some(*pm),
            _ => None,
        }
    }

    pub fn as_monitor_enabled(&self) -> Option<bool> {
        match self {
            Self::MonitorEnabled(enabled) => Some(*enabled),
            _ => None,
        }
    }
}

impl std::fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ToolChoice(pm) => write!(f, "{}={}", self.kind(), pm),
            Self::MonitorEnabled(enabled) => write!(f, "{}={}", self.kind(), enabled),
        }
    }
}
