//! File-backed `SettingsBackend`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use pmswitch_core::config::DefaultsConfig;
use pmswitch_core::preference::{PreferenceKind, PreferenceValue, SettingsBackend};
use pmswitch_core::Result;
use tokio::sync::Notify;

use crate::dto::PreferencesDto;
use crate::paths::PmsPaths;
use crate::storage::AtomicTomlFile;

/// Persists preferences in `preferences.toml` and signals quit requests to
/// the host through a [`Notify`].
pub struct LocalSettingsBackend {
    file: AtomicTomlFile<PreferencesDto>,
    defaults: DefaultsConfig,
    /// Last value read from or written to disk. Also serializes writes.
    cache: Mutex<Option<PreferencesDto>>,
    quit_signal: Arc<Notify>,
}

impl LocalSettingsBackend {
    pub fn new(paths: &PmsPaths, defaults: DefaultsConfig) -> Result<Self> {
        Ok(Self::with_file(
            AtomicTomlFile::new(paths.preferences_file()?),
            defaults,
        ))
    }

    pub fn with_file(file: AtomicTomlFile<PreferencesDto>, defaults: DefaultsConfig) -> Self {
        Self {
            file,
            defaults,
            cache: Mutex::new(None),
            quit_signal: Arc::new(Notify::new()),
        }
    }

    /// Notified once per `quit` command.
    pub fn quit_signal(&self) -> Arc<Notify> {
        self.quit_signal.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PreferencesDto>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current(&self, cache: &mut Option<PreferencesDto>) -> Result<PreferencesDto> {
        if let Some(cached) = cache.as_ref() {
            return Ok(cached.clone());
        }
        let loaded = self
            .file
            .load()?
            .unwrap_or_else(|| PreferencesDto::from_defaults(&self.defaults));
        *cache = Some(loaded.clone());
        Ok(loaded)
    }
}

fn command_name(kind: PreferenceKind, write: bool) -> &'static str {
    match (kind, write) {
        (PreferenceKind::ToolChoice, false) => "get_preferred_package_manager",
        (PreferenceKind::ToolChoice, true) => "set_preferred_package_manager",
        (PreferenceKind::MonitorEnabled, false) => "get_monitoring_state",
        (PreferenceKind::MonitorEnabled, true) => "set_monitoring_state",
    }
}

#[async_trait]
impl SettingsBackend for LocalSettingsBackend {
    async fn init(&self) -> Result<()> {
        let mut cache = self.lock();
        match self.file.load()? {
            Some(existing) => *cache = Some(existing),
            None => {
                let initial = PreferencesDto::from_defaults(&self.defaults);
                self.file.save(&initial)?;
                tracing::info!("[Settings] Created {}", self.file.path().display());
                *cache = Some(initial);
            }
        }
        Ok(())
    }

    async fn get_preference(&self, kind: PreferenceKind) -> Result<PreferenceValue> {
        let mut cache = self.lock();
        let value = self.current(&mut cache)?.get(kind);
        tracing::debug!("[Settings] {} -> {}", command_name(kind, false), value);
        Ok(value)
    }

    async fn set_preference(&self, value: PreferenceValue) -> Result<()> {
        let mut cache = self.lock();
        let mut next = self.current(&mut cache)?;
        next.apply(value);
        self.file.save(&next)?;
        *cache = Some(next);
        tracing::debug!(
            "[Settings] {}({})",
            command_name(value.kind(), true),
            value
        );
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        tracing::info!("[Settings] Quit requested");
        self.quit_signal.notify_one();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmswitch_core::preference::PackageManager;
    use std::fs;
    use tempfile::TempDir;

    fn backend(temp_dir: &TempDir, defaults: DefaultsConfig) -> LocalSettingsBackend {
        LocalSettingsBackend::new(&PmsPaths::new(Some(temp_dir.path().to_path_buf())), defaults)
            .unwrap()
    }

    #[tokio::test]
    async fn test_init_creates_file_from_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let defaults = DefaultsConfig {
            package_manager: PackageManager::Yarn,
            monitoring_enabled: true,
        };
        let backend = backend(&temp_dir, defaults);

        backend.init().await.unwrap();

        let content = fs::read_to_string(temp_dir.path().join("preferences.toml")).unwrap();
        assert!(content.contains("package_manager = \"yarn\""));
        assert_eq!(
            backend.get_preference(PreferenceKind::MonitorEnabled).await.unwrap(),
            PreferenceValue::MonitorEnabled(true)
        );
    }

    #[tokio::test]
    async fn test_set_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let first = backend(&temp_dir, DefaultsConfig::default());
        first.init().await.unwrap();
        first
            .set_preference(PreferenceValue::ToolChoice(PackageManager::Bun))
            .await
            .unwrap();

        let second = backend(&temp_dir, DefaultsConfig::default());
        assert_eq!(
            second.get_preference(PreferenceKind::ToolChoice).await.unwrap(),
            PreferenceValue::ToolChoice(PackageManager::Bun)
        );
        assert_eq!(
            second.get_preference(PreferenceKind::MonitorEnabled).await.unwrap(),
            PreferenceValue::MonitorEnabled(false)
        );
    }

    #[tokio::test]
    async fn test_init_keeps_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("preferences.toml"),
            "package_manager = \"pnpm\"\nmonitoring_enabled = true\n",
        )
        .unwrap();
        let backend = backend(&temp_dir, DefaultsConfig::default());

        backend.init().await.unwrap();

        assert_eq!(
            backend.get_preference(PreferenceKind::ToolChoice).await.unwrap(),
            PreferenceValue::ToolChoice(PackageManager::Pnpm)
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_reads() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("preferences.toml"), "package_manager = 7").unwrap();
        let backend = backend(&temp_dir, DefaultsConfig::default());

        assert!(backend.init().await.is_err());
        assert!(backend.get_preference(PreferenceKind::ToolChoice).await.is_err());
    }

    #[tokio::test]
    async fn test_quit_notifies_host() {
        let temp_dir = TempDir::new().unwrap();
        let backend = backend(&temp_dir, DefaultsConfig::default());
        let signal = backend.quit_signal();

        backend.quit().await.unwrap();

        // notify_one stores a permit, so a waiter arriving later still wakes.
        signal.notified().await;
    }
}
