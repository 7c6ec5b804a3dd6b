//! Backend command seam for preference persistence.

use async_trait::async_trait;

use crate::error::Result;
use crate::preference::model::{PreferenceKind, PreferenceValue};

/// Request/response command interface of the authoritative backend.
///
/// Every call is a suspension point: the caller resumes exactly once with
/// the backend's reply. Both preferences go through the same generic
/// `get_preference` / `set_preference` pair.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
    /// Establishes the backend session.
    async fn init(&self) -> Result<()>;

    /// Reads the authoritative value of a preference.
    async fn get_preference(&self, kind: PreferenceKind) -> Result<PreferenceValue>;

    /// Persists a preference value (a reconciliation request).
    async fn set_preference(&self, value: PreferenceValue) -> Result<()>;

    /// Requests process termination.
    async fn quit(&self) -> Result<()>;
}
