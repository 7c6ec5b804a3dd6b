//! Optimistic preference synchronization.
//!
//! `SettingsSynchronizer` shows a new preference value immediately and then
//! reconciles it with the backend. Every request carries a sequence number and
//! the confirmed baseline captured when it was dispatched, so a slow reply can
//! never clobber a value the user has changed since.

use std::sync::{Arc, Mutex, MutexGuard};

use pmswitch_core::config::DefaultsConfig;
use pmswitch_core::preference::{PackageManager, PreferenceKind, PreferenceValue, SettingsBackend};
use serde::Serialize;
use tokio::sync::watch;

/// Which preferences currently have a reconciliation request outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InFlight {
    pub tool_choice: bool,
    pub monitor_enabled: bool,
}

/// Read-only view of the preferences as the user should see them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    pub tool_choice: PackageManager,
    pub monitor_enabled: bool,
    pub in_flight: InFlight,
}

#[derive(Debug, Clone, Copy)]
struct PreferenceSlot {
    /// Last value acknowledged by the backend.
    confirmed: PreferenceValue,
    /// Value shown to the user.
    pending: PreferenceValue,
    /// Sequence number of the newest intent.
    issued: u64,
    /// Sequence number of the request that produced `confirmed` (0 = hydration).
    confirmed_seq: u64,
    /// `pending` was restored by a rollback rather than set by the user.
    rolled_back: bool,
    outstanding: usize,
}

impl PreferenceSlot {
    fn new(value: PreferenceValue) -> Self {
        Self {
            confirmed: value,
            pending: value,
            issued: 0,
            confirmed_seq: 0,
            rolled_back: false,
            outstanding: 0,
        }
    }
}

/// What a request needs to settle itself once the backend replies.
#[derive(Debug, Clone, Copy)]
struct RequestTicket {
    seq: u64,
    baseline: PreferenceValue,
    baseline_seq: u64,
}

#[derive(Debug)]
struct Slots {
    tool_choice: PreferenceSlot,
    monitor_enabled: PreferenceSlot,
}

impl Slots {
    fn get(&self, kind: PreferenceKind) -> &PreferenceSlot {
        match kind {
            PreferenceKind::ToolChoice => &self.tool_choice,
            PreferenceKind::MonitorEnabled => &self.monitor_enabled,
        }
    }

    fn get_mut(&mut self, kind: PreferenceKind) -> &mut PreferenceSlot {
        match kind {
            PreferenceKind::ToolChoice => &mut self.tool_choice,
            PreferenceKind::MonitorEnabled => &mut self.monitor_enabled,
        }
    }

    fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            tool_choice: self.tool_choice.pending.as_tool_choice().unwrap_or_default(),
            monitor_enabled: self
                .monitor_enabled
                .pending
                .as_monitor_enabled()
                .unwrap_or_default(),
            in_flight: InFlight {
                tool_choice: self.tool_choice.outstanding > 0,
                monitor_enabled: self.monitor_enabled.outstanding > 0,
            },
        }
    }
}

/// Holds the user's preferences and keeps them consistent with the backend.
pub struct SettingsSynchronizer {
    backend: Arc<dyn SettingsBackend>,
    slots: Mutex<Slots>,
    snapshot_tx: watch::Sender<SettingsSnapshot>,
}

impl SettingsSynchronizer {
    /// Creates a synchronizer seeded with the configured safe defaults.
    pub fn new(backend: Arc<dyn SettingsBackend>, defaults: &DefaultsConfig) -> Self {
        let slots = Slots {
            tool_choice: PreferenceSlot::new(PreferenceValue::ToolChoice(defaults.package_manager)),
            monitor_enabled: PreferenceSlot::new(PreferenceValue::MonitorEnabled(
                defaults.monitoring_enabled,
            )),
        };
        let (snapshot_tx, _) = watch::channel(slots.snapshot());
        Self {
            backend,
            slots: Mutex::new(slots),
            snapshot_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, slots: &Slots) {
        self.snapshot_tx.send_replace(slots.snapshot());
    }

    /// Current snapshot of the pending values.
    pub fn snapshot(&self) -> SettingsSnapshot {
        *self.snapshot_tx.borrow()
    }

    /// Receiver notified on every change of the snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SettingsSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Value currently shown for `kind`.
    pub fn pending(&self, kind: PreferenceKind) -> PreferenceValue {
        self.lock().get(kind).pending
    }

    /// Last value acknowledged by the backend for `kind`.
    pub fn confirmed(&self, kind: PreferenceKind) -> PreferenceValue {
        self.lock().get(kind).confirmed
    }

    /// Loads both preferences from the backend.
    ///
    /// A kind that cannot be read keeps its current value. A kind the user
    /// already changed keeps its pending value; only the baseline moves.
    pub async fn hydrate(&self) {
        for kind in PreferenceKind::ALL {
            match self.backend.get_preference(kind).await {
                Ok(value) if value.kind() == kind => {
                    let mut slots = self.lock();
                    let slot = slots.get_mut(kind);
                    if slot.confirmed_seq == 0 {
                        slot.confirmed = value;
                    }
                    if slot.issued == 0 {
                        slot.pending = value;
                    }
                    tracing::info!("[Settings] Hydrated {}", value);
                    self.publish(&slots);
                }
                Ok(value) => {
                    tracing::warn!(
                        "[Settings] Backend answered {} with a {} value, keeping default",
                        kind,
                        value.kind()
                    );
                }
                Err(e) => {
                    tracing::warn!("[Settings] Failed to load {}, keeping default: {}", kind, e);
                }
            }
        }
    }

    /// Sets a preference optimistically and reconciles it with the backend.
    ///
    /// The pending value changes before the first suspension point, so readers
    /// observe it immediately. Backend failures are logged and compensated,
    /// never returned.
    pub async fn set_preference(&self, value: PreferenceValue) {
        let kind = value.kind();
        let ticket = {
            let mut slots = self.lock();
            let slot = slots.get_mut(kind);
            slot.issued += 1;
            slot.outstanding += 1;
            slot.pending = value;
            slot.rolled_back = false;
            let ticket = RequestTicket {
                seq: slot.issued,
                baseline: slot.confirmed,
                baseline_seq: slot.confirmed_seq,
            };
            self.publish(&slots);
            ticket
        };

        tracing::debug!("[Settings] Dispatching {} (seq {})", value, ticket.seq);
        let result = self.backend.set_preference(value).await;

        let mut slots = self.lock();
        let slot = slots.get_mut(kind);
        slot.outstanding = slot.outstanding.saturating_sub(1);

        match result {
            Ok(()) => {
                if ticket.seq > slot.confirmed_seq {
                    slot.confirmed = value;
                    slot.confirmed_seq = ticket.seq;
                    // A newer intent failed and was rolled back; follow the new truth.
                    if slot.rolled_back {
                        slot.pending = value;
                    }
                    tracing::debug!("[Settings] Confirmed {} (seq {})", value, ticket.seq);
                } else {
                    tracing::debug!(
                        "[Settings] Ignoring stale acknowledgement of {} (seq {} <= {})",
                        value,
                        ticket.seq,
                        slot.confirmed_seq
                    );
                }
            }
            Err(e) if ticket.seq == slot.issued => {
                // Roll back to the baseline captured at dispatch, unless an
                // earlier request has since been acknowledged.
                let restore = if slot.confirmed_seq > ticket.baseline_seq {
                    slot.confirmed
                } else {
                    ticket.baseline
                };
                slot.pending = restore;
                slot.rolled_back = true;
                tracing::warn!(
                    "[Settings] Failed to set {}: {}; reverted to {}",
                    value,
                    e,
                    restore
                );
            }
            Err(e) => {
                tracing::warn!(
                    "[Settings] Failed to set {}: {}; superseded by seq {}, rollback suppressed",
                    value,
                    e,
                    slot.issued
                );
            }
        }

        self.publish(&slots);
    }
}
