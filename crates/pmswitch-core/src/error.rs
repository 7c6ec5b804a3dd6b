//! Error types for the package manager switcher.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every layer of the switcher.
///
/// Variants carry plain strings so the error can be cloned into snapshots
/// and serialized across an IPC boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PmsError {
    /// The backend rejected a command or could not be reached.
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An event arrived with a payload of unexpected shape.
    #[error("Malformed '{event}' payload: {message}")]
    MalformedEvent { event: String, message: String },

    /// A user action was requested in a phase that does not allow it.
    #[error("Invalid transition: cannot {action} while {phase}")]
    InvalidTransition { action: String, phase: String },

    /// Registering or releasing an event subscription failed.
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Checking for, downloading or staging an update failed.
    #[error("Update error: {0}")]
    Update(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PmsError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a MalformedEvent error
    pub fn malformed_event(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedEvent {
            event: event.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidTransition error
    pub fn invalid_transition(action: impl Into<String>, phase: impl Into<String>) -> Self {
        Self::InvalidTransition {
            action: action.into(),
            phase: phase.into(),
        }
    }

    /// Creates a Subscription error
    pub fn subscription(message: impl Into<String>) -> Self {
        Self::Subscription(message.into())
    }

    /// Creates an Update error
    pub fn update(message: impl Into<String>) -> Self {
        Self::Update(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a backend error
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// Check if this is a malformed event payload
    pub fn is_malformed_event(&self) -> bool {
        matches!(self, Self::MalformedEvent { .. })
    }

    /// Check if this is an invalid state transition
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }

    /// Check if this is a subscription error
    pub fn is_subscription(&self) -> bool {
        matches!(self, Self::Subscription(_))
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for PmsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for PmsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PmsError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for PmsError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for PmsError {
    fn from(err: reqwest::Error) -> Self {
        Self::Update(format!("HTTP request failed: {}", err))
    }
}

impl From<semver::Error> for PmsError {
    fn from(err: semver::Error) -> Self {
        Self::Update(format!("Invalid version: {}", err))
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for PmsError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Conversion from String (for error messages)
impl From<String> for PmsError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, PmsError>`.
pub type Result<T> = std::result::Result<T, PmsError>;
