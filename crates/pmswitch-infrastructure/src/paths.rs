//! Unified path management for pm-switcher files.
//!
//! ```text
//! ~/.config/pm-switcher/         # Config directory
//! ├── config.toml                # Application configuration
//! └── preferences.toml           # Persisted user preferences
//!
//! ~/.local/share/pm-switcher/    # Data directory
//! ├── logs/                      # Rolling log files
//! │   └── pmswitch.log.YYYY-MM-DD
//! └── updates/                   # Downloaded update payloads
//! ```
//!
//! A root override places both trees under one directory (`<root>/` and
//! `<root>/data/`), which is what tests and portable installs use.

use std::path::PathBuf;

use pmswitch_core::PmsError;

const APP_DIR: &str = "pm-switcher";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config directory could not be determined.
    ConfigDirNotFound,
    /// The platform data directory could not be determined.
    DataDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
            PathError::DataDirNotFound => write!(f, "Cannot find data directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for PmsError {
    fn from(err: PathError) -> Self {
        PmsError::config(err.to_string())
    }
}

/// Resolves every file location the switcher reads or writes.
#[derive(Debug, Clone, Default)]
pub struct PmsPaths {
    root: Option<PathBuf>,
}

impl PmsPaths {
    /// Creates a resolver; `root` overrides the platform directories.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        match &self.root {
            Some(root) => Ok(root.clone()),
            None => dirs::config_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::ConfigDirNotFound),
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf, PathError> {
        match &self.root {
            Some(root) => Ok(root.join("data")),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or(PathError::DataDirNotFound),
        }
    }

    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("config.toml"))
    }

    pub fn preferences_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join("preferences.toml"))
    }

    pub fn logs_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("logs"))
    }

    /// Directory where downloaded update payloads are staged.
    pub fn update_staging_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.data_dir()?.join("updates"))
    }
}
