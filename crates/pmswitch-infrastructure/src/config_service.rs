//! Configuration service implementation.
//!
//! Loads `AppConfig` from `config.toml` and caches it. A missing file is
//! created with the defaults so users have something to edit.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use pmswitch_core::config::AppConfig;
use pmswitch_core::Result;

use crate::paths::PmsPaths;
use crate::storage::AtomicTomlFile;

/// Configuration service that loads and caches the application configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    file: Arc<AtomicTomlFile<AppConfig>>,
    /// Cached configuration; `None` until first access or after invalidation.
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Creates a service for the platform config file.
    pub fn new(paths: &PmsPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    /// Creates a service reading an explicit file.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            file: Arc::new(AtomicTomlFile::new(path)),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A file that cannot be parsed is reported and replaced by the defaults
    /// for this process; it is not overwritten.
    pub fn get_config(&self) -> AppConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|p| p.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "[Config] Failed to load {}: {}, using defaults",
                    self.path().display(),
                    e
                );
                AppConfig::default()
            }
        };

        {
            let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|p| p.into_inner());
        *write_lock = None;
    }

    fn load_config(&self) -> Result<AppConfig> {
        if let Some(config) = self.file.load()? {
            return Ok(config);
        }

        let default_config = AppConfig::default();
        match self.file.save(&default_config) {
            Ok(()) => tracing::info!("[Config] Created {}", self.path().display()),
            Err(e) => tracing::warn!("[Config] Failed to write default config: {}", e),
        }
        Ok(default_config)
    }
}
