//! Update lifecycle domain models.

use serde::{Deserialize, Serialize};

/// Download progress as shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub content_length: u64,
    /// Always within `0..=100`; zero while the content length is unknown.
    pub percentage: u8,
}

impl DownloadProgress {
    /// Builds a progress record, rounding the percentage to the nearest integer.
    pub fn new(downloaded: u64, content_length: u64) -> Self {
        Self {
            downloaded,
            content_length,
            percentage: Self::percentage_of(downloaded, content_length),
        }
    }

    /// `round(downloaded * 100 / content_length)`, or 0 if the length is 0.
    pub fn percentage_of(downloaded: u64, content_length: u64) -> u8 {
        if content_length == 0 {
            return 0;
        }
        let numerator = u128::from(downloaded) * 100;
        let total = u128::from(content_length);
        let rounded = (2 * numerator + total) / (2 * total);
        rounded.min(100) as u8
    }

    /// True once the whole payload is known to be downloaded.
    pub fn is_complete(&self) -> bool {
        self.content_length > 0 && self.downloaded >= self.content_length
    }
}

/// Discrete state of the update lifecycle.
///
/// Phases from `Available` through `Finished` carry the version being
/// offered, so an available version exists exactly in those phases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum UpdatePhase {
    #[default]
    Idle,
    CheckRequested,
    Available {
        version: String,
    },
    Downloading {
        version: String,
    },
    Installing {
        version: String,
    },
    Finished {
        version: String,
    },
    Dismissed,
}

impl UpdatePhase {
    /// Short name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckRequested => "check-requested",
            Self::Available { .. } => "available",
            Self::Downloading { .. } => "downloading",
            Self::Installing { .. } => "installing",
            Self::Finished { .. } => "finished",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn available_version(&self) -> Option<&str> {
        match self {
            Self::Available { version }
            | Self::Downloading { version }
            | Self::Installing { version }
            | Self::Finished { version } => Some(version),
            _ => None,
        }
    }

    /// Download or installation is running.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Downloading { .. } | Self::Installing { .. })
    }

    /// No further transitions happen in this session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Dismissed)
    }
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.available_version() {
            Some(version) => write!(f, "{} ({})", self.name(), version),
            None => f.write_str(self.name()),
        }
    }
}

/// Read-only view of the update session handed to the view layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSnapshot {
    pub phase: UpdatePhase,
    pub progress: Option<DownloadProgress>,
    /// Message of the last failed install, cleared on the next attempt.
    pub last_error: Option<String>,
    /// RFC 3339 timestamp of the last issued check.
    pub last_checked_at: Option<String>,
}

impl UpdateSnapshot {
    pub fn available_version(&self) -> Option<&str> {
        self.phase.available_version()
    }
}
