//! Session controller: startup, ownership and teardown of the coordinators.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pmswitch_core::config::AppConfig;
use pmswitch_core::event::EventFeed;
use pmswitch_core::preference::SettingsBackend;
use pmswitch_core::update::UpdaterService;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::settings::SettingsSynchronizer;
use crate::subscription::SubscriptionSet;
use crate::update::UpdateCoordinator;

/// Owns the settings synchronizer and the update coordinator for the
/// lifetime of the process.
///
/// The view receives `Arc` handles through [`settings`](Self::settings) and
/// [`updates`](Self::updates) and only reads their snapshots or calls their
/// intent methods; nothing else creates a second instance.
pub struct SessionController {
    backend: Arc<dyn SettingsBackend>,
    feed: Arc<dyn EventFeed>,
    settings: Arc<SettingsSynchronizer>,
    updates: Arc<UpdateCoordinator>,
    check_interval: Option<Duration>,
    background_checks: bool,
    subscriptions: Mutex<SubscriptionSet>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
    started: AtomicBool,
    shut_down: AtomicBool,
}

impl SessionController {
    pub fn new(
        backend: Arc<dyn SettingsBackend>,
        updater: Arc<dyn UpdaterService>,
        feed: Arc<dyn EventFeed>,
        config: &AppConfig,
    ) -> Self {
        let settings = Arc::new(SettingsSynchronizer::new(backend.clone(), &config.defaults));
        let updates = Arc::new(UpdateCoordinator::new(
            updater,
            config.update.check_timeout(),
        ));
        Self {
            backend,
            feed,
            settings,
            updates,
            check_interval: config.update.check_interval(),
            background_checks: true,
            subscriptions: Mutex::new(SubscriptionSet::new()),
            tasks: Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Disables the startup check and the periodic checker.
    ///
    /// Used by one-shot hosts that drive checks themselves.
    pub fn with_background_checks(mut self, enabled: bool) -> Self {
        self.background_checks = enabled;
        self
    }

    pub fn settings(&self) -> Arc<SettingsSynchronizer> {
        self.settings.clone()
    }

    pub fn updates(&self) -> Arc<UpdateCoordinator> {
        self.updates.clone()
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_subscriptions(&self) -> MutexGuard<'_, SubscriptionSet> {
        self.subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Initializes the backend session and hydrates both components.
    ///
    /// Returns once the view can be considered ready. Update checks run in
    /// the background. Calling `start` more than once is a no-op.
    pub async fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("[Session] start() called twice, ignoring");
            return;
        }

        if let Err(e) = self.backend.init().await {
            tracing::error!("[Session] Failed to initialize backend: {}", e);
        }

        self.settings.hydrate().await;

        let subscriptions = self.updates.subscribe_to(self.feed.as_ref());
        tracing::info!("[Session] Listening to {} updater event(s)", subscriptions.len());
        self.lock_subscriptions().extend(subscriptions);

        if self.background_checks {
            self.spawn_update_checks();
        }

        tracing::info!("[Session] Started");
    }

    fn spawn_update_checks(&self) {
        let updates = self.updates.clone();
        let cancel = self.cancel.clone();
        let interval = self.check_interval;

        let handle = tokio::spawn(async move {
            updates.check_for_updates().await;

            let Some(interval) = interval else {
                return;
            };
            tracing::debug!("[Session] Periodic update check every {:?}", interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => updates.check_for_updates().await,
                }
            }
        });
        self.lock_tasks().push(handle);
    }

    /// Stops background checks and releases every event subscription.
    ///
    /// Runs at most once; in-flight commands are left to complete on their own.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        self.cancel.cancel();
        self.lock_tasks().clear();

        let failures = self.lock_subscriptions().release_all();
        if failures > 0 {
            tracing::warn!("[Session] {} subscription(s) failed to release", failures);
        }
        tracing::info!("[Session] Shut down");
    }

    /// Shuts the session down and asks the backend to terminate the process.
    pub async fn quit(&self) {
        self.shutdown();
        if let Err(e) = self.backend.quit().await {
            tracing::error!("[Session] Failed to quit: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.shut_down.load(Ordering::SeqCst)
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
