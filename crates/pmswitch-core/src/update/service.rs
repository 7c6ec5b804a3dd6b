//! Updater command seam.

use async_trait::async_trait;

use crate::error::Result;

/// The two imperative commands offered by the external updater service.
///
/// Results of a check are not returned here; they arrive through the event
/// feed as `update-available`.
#[async_trait]
pub trait UpdaterService: Send + Sync {
    /// Asks the updater to look for a newer version.
    async fn check_for_updates(&self) -> Result<()>;

    /// Downloads and installs the available version.
    ///
    /// Progress and completion are reported through the event feed. The
    /// application may be restarted as a side effect.
    async fn install_update(&self) -> Result<()>;
}
