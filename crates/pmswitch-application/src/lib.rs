//! Coordination layer: optimistic preference sync, the update lifecycle
//! state machine, and the session controller that owns both.

pub mod session;
pub mod settings;
pub mod subscription;
pub mod update;

#[cfg(test)]
mod test_support;

pub use session::SessionController;
pub use settings::{SettingsSnapshot, SettingsSynchronizer};
pub use subscription::SubscriptionSet;
pub use update::UpdateCoordinator;
