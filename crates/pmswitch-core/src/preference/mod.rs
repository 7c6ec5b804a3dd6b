//! User preferences and the backend seam that persists them.

pub mod backend;
pub mod model;

pub use backend::SettingsBackend;
pub use model::{PackageManager, PreferenceKind, PreferenceValue};
