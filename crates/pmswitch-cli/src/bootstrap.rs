//! Composition root: wires the adapters into one `SessionController`.

use std::sync::Arc;

use anyhow::{Context, Result};
use pmswitch_application::SessionController;
use pmswitch_core::config::AppConfig;
use pmswitch_infrastructure::{EventBus, HttpUpdater, LocalSettingsBackend, PmsPaths};
use tokio::sync::Notify;

/// How long a one-shot command waits for an announcement once the check
/// command has replied. The HTTP updater announces before replying.
const ONE_SHOT_CHECK_TIMEOUT_SECS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// Single command; no background checks.
    OneShot,
    /// Long-running session with the startup and periodic checks.
    Interactive,
}

pub struct AppBootstrap {
    pub controller: SessionController,
    /// Fired when the backend receives the quit command.
    pub quit_signal: Arc<Notify>,
}

impl AppBootstrap {
    pub fn build(paths: &PmsPaths, config: &AppConfig, mode: HostMode) -> Result<Self> {
        let mut config = config.clone();
        if mode == HostMode::OneShot {
            config.update.check_timeout_secs = config
                .update
                .check_timeout_secs
                .min(ONE_SHOT_CHECK_TIMEOUT_SECS);
        }

        let backend = Arc::new(
            LocalSettingsBackend::new(paths, config.defaults.clone())
                .context("Failed to set up the preferences backend")?,
        );
        let quit_signal = backend.quit_signal();

        let bus = EventBus::new();
        let staging_dir = paths
            .update_staging_dir()
            .context("Failed to resolve the update staging directory")?;
        let updater = Arc::new(
            HttpUpdater::new(&config.update, env!("CARGO_PKG_VERSION"), staging_dir, bus.clone())
                .context("Failed to set up the updater")?,
        );

        let controller = SessionController::new(backend, updater, Arc::new(bus), &config)
            .with_background_checks(mode == HostMode::Interactive);

        tracing::info!("[Bootstrap] Session ready ({:?})", mode);
        Ok(Self {
            controller,
            quit_signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmswitch_core::preference::{PackageManager, PreferenceValue};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_one_shot_session_persists_preferences() {
        let home = TempDir::new().unwrap();
        let paths = PmsPaths::new(Some(home.path().to_path_buf()));
        let mut config = AppConfig::default();
        config.defaults.package_manager = PackageManager::Pnpm;

        let app = AppBootstrap::build(&paths, &config, HostMode::OneShot).unwrap();
        app.controller.start().await;
        assert_eq!(
            app.controller.settings().snapshot().tool_choice,
            PackageManager::Pnpm
        );
        app.controller
            .settings()
            .set_preference(PreferenceValue::MonitorEnabled(true))
            .await;
        app.controller.shutdown();

        let reopened = AppBootstrap::build(&paths, &AppConfig::default(), HostMode::OneShot).unwrap();
        reopened.controller.start().await;
        let snapshot = reopened.controller.settings().snapshot();
        assert_eq!(snapshot.tool_choice, PackageManager::Pnpm);
        assert!(snapshot.monitor_enabled);
    }

    #[tokio::test]
    async fn test_quit_fires_host_signal() {
        let home = TempDir::new().unwrap();
        let paths = PmsPaths::new(Some(home.path().to_path_buf()));
        let app = AppBootstrap::build(&paths, &AppConfig::default(), HostMode::OneShot).unwrap();

        app.controller.start().await;
        app.controller.quit().await;

        app.quit_signal.notified().await;
        assert!(!app.controller.is_running());
    }

    #[test]
    fn test_invalid_current_version_is_rejected() {
        let home = TempDir::new().unwrap();
        let paths = PmsPaths::new(Some(home.path().to_path_buf()));
        let mut config = AppConfig::default();
        config.update.current_version = Some("not-a-version".to_string());

        assert!(AppBootstrap::build(&paths, &config, HostMode::Interactive).is_err());
    }
}
