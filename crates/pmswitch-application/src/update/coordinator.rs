//! Update lifecycle state machine.
//!
//! `UpdateCoordinator` drives `Idle → CheckRequested → Available →
//! Downloading → Installing → Finished` from updater events and two user
//! actions (accept, dismiss). Commands run outside the state lock; each check
//! and install carries a generation number so a late reply from an operation
//! that is no longer current is ignored.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use pmswitch_core::event::{EventFeed, EventHandler};
use pmswitch_core::update::{
    DownloadProgress, UpdateEvent, UpdateEventKind, UpdatePhase, UpdateSnapshot, UpdaterService,
};
use pmswitch_core::PmsError;
use serde_json::Value;
use tokio::sync::watch;

use crate::subscription::SubscriptionSet;

#[derive(Debug, Default)]
struct UpdateSession {
    phase: UpdatePhase,
    progress: Option<DownloadProgress>,
    last_error: Option<String>,
    last_checked_at: Option<String>,
    check_generation: u64,
    check_outstanding: bool,
    install_generation: u64,
}

impl UpdateSession {
    fn snapshot(&self) -> UpdateSnapshot {
        UpdateSnapshot {
            phase: self.phase.clone(),
            progress: self.progress,
            last_error: self.last_error.clone(),
            last_checked_at: self.last_checked_at.clone(),
        }
    }
}

/// Owns the process-lifetime update session.
pub struct UpdateCoordinator {
    updater: Arc<dyn UpdaterService>,
    session: Mutex<UpdateSession>,
    snapshot_tx: watch::Sender<UpdateSnapshot>,
    check_timeout: Duration,
}

impl UpdateCoordinator {
    /// Creates a coordinator in `Idle`.
    ///
    /// `check_timeout` bounds how long `CheckRequested` waits for an
    /// `update-available` event before returning to `Idle`.
    pub fn new(updater: Arc<dyn UpdaterService>, check_timeout: Duration) -> Self {
        let (snapshot_tx, _) = watch::channel(UpdateSnapshot::default());
        Self {
            updater,
            session: Mutex::new(UpdateSession::default()),
            snapshot_tx,
            check_timeout,
        }
    }

    fn lock(&self) -> MutexGuard<'_, UpdateSession> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, session: &UpdateSession) {
        self.snapshot_tx.send_replace(session.snapshot());
    }

    pub fn snapshot(&self) -> UpdateSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn phase(&self) -> UpdatePhase {
        self.lock().phase.clone()
    }

    /// Asks the updater for a new version.
    ///
    /// Only meaningful in `Idle` and `Available`. While a check is already
    /// outstanding this is a no-op; in any other phase it is rejected with a
    /// warning. Returns once the check has been answered, has failed, or the
    /// timeout has elapsed.
    pub async fn check_for_updates(&self) {
        let generation = {
            let mut session = self.lock();
            match &session.phase {
                UpdatePhase::Idle | UpdatePhase::Available { .. } => {}
                UpdatePhase::CheckRequested => {
                    tracing::debug!("[Updater] Check already outstanding");
                    return;
                }
                other => {
                    let err = PmsError::invalid_transition("check for updates", other.name());
                    tracing::warn!("[Updater] {}", err);
                    return;
                }
            }
            if session.check_outstanding {
                tracing::debug!("[Updater] Check already outstanding");
                return;
            }
            session.check_generation += 1;
            session.check_outstanding = true;
            session.last_checked_at = Some(chrono::Utc::now().to_rfc3339());
            if session.phase == UpdatePhase::Idle {
                session.phase = UpdatePhase::CheckRequested;
            }
            self.publish(&session);
            session.check_generation
        };

        tracing::info!("[Updater] Checking for updates (generation {})", generation);
        let mut rx = self.snapshot_tx.subscribe();
        let result = self.updater.check_for_updates().await;

        {
            let mut session = self.lock();
            if session.check_generation == generation {
                session.check_outstanding = false;
            }
        }

        if let Err(e) = result {
            tracing::warn!("[Updater] Failed to check for updates: {}", e);
            self.expire_check(generation);
            return;
        }

        let timed_out = tokio::time::timeout(
            self.check_timeout,
            rx.wait_for(|snapshot| snapshot.phase != UpdatePhase::CheckRequested),
        )
        .await
        .is_err();

        if timed_out {
            tracing::info!("[Updater] No update announced");
            self.expire_check(generation);
        }
    }

    /// Returns `CheckRequested` to `Idle` if `generation` is still current.
    fn expire_check(&self, generation: u64) {
        let mut session = self.lock();
        if session.phase == UpdatePhase::CheckRequested && session.check_generation == generation {
            session.phase = UpdatePhase::Idle;
            self.publish(&session);
        }
    }

    /// Accepts the offered update and issues the install command.
    ///
    /// Valid only in `Available`. If the install command fails while the
    /// download is still current, the session returns to `Available` with
    /// the error recorded so the user can retry or dismiss.
    pub async fn accept_update(&self) {
        let (generation, version) = {
            let mut session = self.lock();
            let version = match &session.phase {
                UpdatePhase::Available { version } => version.clone(),
                other => {
                    let err = PmsError::invalid_transition("accept update", other.name());
                    tracing::warn!("[Updater] {}", err);
                    return;
                }
            };
            session.install_generation += 1;
            session.phase = UpdatePhase::Downloading {
                version: version.clone(),
            };
            session.progress = Some(DownloadProgress::default());
            session.last_error = None;
            self.publish(&session);
            (session.install_generation, version)
        };

        tracing::info!("[Updater] Installing version {}", version);
        match self.updater.install_update().await {
            Ok(()) => {
                tracing::info!("[Updater] Install command completed for {}", version);
            }
            Err(e) => {
                let mut session = self.lock();
                if session.install_generation == generation && session.phase.is_busy() {
                    tracing::error!("[Updater] Failed to install {}: {}", version, e);
                    session.phase = UpdatePhase::Available { version };
                    session.progress = None;
                    session.last_error = Some(e.to_string());
                    self.publish(&session);
                } else {
                    tracing::debug!(
                        "[Updater] Ignoring late install failure ({}), phase is {}",
                        e,
                        session.phase
                    );
                }
            }
        }
    }

    /// Declines the offered update for the rest of this session.
    pub fn dismiss(&self) {
        let mut session = self.lock();
        let version = match &session.phase {
            UpdatePhase::Available { version } => version.clone(),
            other => {
                let err = PmsError::invalid_transition("dismiss", other.name());
                tracing::warn!("[Updater] {}", err);
                return;
            }
        };
        tracing::info!("[Updater] Update {} dismissed", version);
        session.phase = UpdatePhase::Dismissed;
        session.progress = None;
        session.last_error = None;
        self.publish(&session);
    }

    /// Applies a normalized updater event.
    ///
    /// Events that do not apply to the current phase are ignored. Progress
    /// overwrites the previous value (last event wins).
    pub fn handle_event(&self, event: UpdateEvent) {
        let mut session = self.lock();
        let current = session.phase.clone();
        let next = match (current, event) {
            (
                UpdatePhase::Idle | UpdatePhase::CheckRequested | UpdatePhase::Available { .. },
                UpdateEvent::Available { version },
            ) => {
                tracing::info!("[Updater] Update available: {}", version);
                Some(UpdatePhase::Available { version })
            }
            (
                UpdatePhase::Downloading { version } | UpdatePhase::Installing { version },
                UpdateEvent::Progress {
                    downloaded,
                    content_length,
                },
            ) => {
                let progress = DownloadProgress::new(downloaded, content_length);
                tracing::debug!(
                    "[Updater] Progress {}/{} ({}%)",
                    downloaded,
                    content_length,
                    progress.percentage
                );
                session.progress = Some(progress);
                if progress.is_complete() {
                    Some(UpdatePhase::Installing { version })
                } else {
                    Some(session.phase.clone())
                }
            }
            (
                UpdatePhase::Downloading { version } | UpdatePhase::Installing { version },
                UpdateEvent::Finished,
            ) => {
                tracing::info!("[Updater] Update {} finished", version);
                Some(UpdatePhase::Finished { version })
            }
            (phase, event) => {
                tracing::debug!(
                    "[Updater] Ignoring {} while {}",
                    event.kind(),
                    phase.name()
                );
                None
            }
        };

        if let Some(phase) = next {
            session.phase = phase;
            self.publish(&session);
        }
    }

    /// Normalizes a raw payload and applies it; malformed payloads are
    /// logged and dropped.
    pub fn handle_raw_event(&self, kind: UpdateEventKind, payload: &Value) {
        match UpdateEvent::from_payload(kind, payload) {
            Ok(event) => self.handle_event(event),
            Err(e) => tracing::warn!("[Updater] Dropping event: {}", e),
        }
    }

    /// Registers handlers for the three updater events on `feed`.
    ///
    /// Handlers hold a weak reference, so the feed never keeps the
    /// coordinator alive. A kind that cannot be subscribed is logged and
    /// skipped.
    pub fn subscribe_to(self: &Arc<Self>, feed: &dyn EventFeed) -> SubscriptionSet {
        let mut subscriptions = SubscriptionSet::new();
        for kind in UpdateEventKind::ALL {
            let coordinator: Weak<Self> = Arc::downgrade(self);
            let handler: EventHandler = Arc::new(move |payload: Value| {
                if let Some(coordinator) = coordinator.upgrade() {
                    coordinator.handle_raw_event(kind, &payload);
                }
            });
            match feed.listen(kind.as_str(), handler) {
                Ok(handle) => subscriptions.push(handle),
                Err(e) => tracing::error!("[Updater] Failed to listen to {}: {}", kind, e),
            }
        }
        subscriptions
    }
}
