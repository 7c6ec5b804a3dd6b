pub mod config;
pub mod error;
pub mod event;
pub mod preference;
pub mod update;

// Re-export common error type
pub use error::{PmsError, Result};
