//! Settings synchronization services.

mod synchronizer;

pub use synchronizer::{InFlight, SettingsSnapshot, SettingsSynchronizer};
