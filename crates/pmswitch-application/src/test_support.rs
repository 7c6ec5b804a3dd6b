//! Hand-written backends for exercising the coordinators in tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pmswitch_core::event::{EventFeed, EventHandler, Subscription};
use pmswitch_core::preference::{PackageManager, PreferenceKind, PreferenceValue, SettingsBackend};
use pmswitch_core::update::UpdaterService;
use pmswitch_core::{PmsError, Result};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

pub type Reply = oneshot::Sender<Result<()>>;

// ============================================================================
// Settings backend
// ============================================================================

pub struct MockSettingsBackend {
    tool_choice: Mutex<PackageManager>,
    monitor_enabled: Mutex<bool>,
    fail_reads: bool,
    gate: Option<mpsc::UnboundedSender<(PreferenceValue, Reply)>>,
    writes: Mutex<Vec<PreferenceValue>>,
    pub init_calls: AtomicUsize,
    pub quit_calls: AtomicUsize,
}

impl MockSettingsBackend {
    fn build(
        tool_choice: PackageManager,
        monitor_enabled: bool,
        fail_reads: bool,
        gate: Option<mpsc::UnboundedSender<(PreferenceValue, Reply)>>,
    ) -> Self {
        Self {
            tool_choice: Mutex::new(tool_choice),
            monitor_enabled: Mutex::new(monitor_enabled),
            fail_reads,
            gate,
            writes: Mutex::new(Vec::new()),
            init_calls: AtomicUsize::new(0),
            quit_calls: AtomicUsize::new(0),
        }
    }

    /// Backend that answers every write immediately with success.
    pub fn with_values(tool_choice: PackageManager, monitor_enabled: bool) -> Arc<Self> {
        Arc::new(Self::build(tool_choice, monitor_enabled, false, None))
    }

    /// Backend whose reads always fail.
    pub fn failing_reads() -> Arc<Self> {
        Arc::new(Self::build(PackageManager::Npm, false, true, None))
    }

    /// Backend that hands every write to the test, which decides when and
    /// how it completes.
    pub fn gated() -> (Arc<Self>, mpsc::UnboundedReceiver<(PreferenceValue, Reply)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self::build(PackageManager::Npm, false, false, Some(tx))),
            rx,
        )
    }

    pub fn writes(&self) -> Vec<PreferenceValue> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl SettingsBackend for MockSettingsBackend {
    async fn init(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_preference(&self, kind: PreferenceKind) -> Result<PreferenceValue> {
        if self.fail_reads {
            return Err(PmsError::backend("backend unreachable"));
        }
        Ok(match kind {
            PreferenceKind::ToolChoice => {
                PreferenceValue::ToolChoice(*self.tool_choice.lock().unwrap())
            }
            PreferenceKind::MonitorEnabled => {
                PreferenceValue::MonitorEnabled(*self.monitor_enabled.lock().unwrap())
            }
        })
    }

    async fn set_preference(&self, value: PreferenceValue) -> Result<()> {
        self.writes.lock().unwrap().push(value);

        if let Some(gate) = &self.gate {
            let (reply_tx, reply_rx) = oneshot::channel();
            gate.send((value, reply_tx))
                .map_err(|_| PmsError::backend("test dropped the request channel"))?;
            return reply_rx
                .await
                .unwrap_or_else(|_| Err(PmsError::backend("test dropped the reply")));
        }

        match value {
            PreferenceValue::ToolChoice(pm) => *self.tool_choice.lock().unwrap() = pm,
            PreferenceValue::MonitorEnabled(enabled) => {
                *self.monitor_enabled.lock().unwrap() = enabled
            }
        }
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        self.quit_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Updater service
// ============================================================================

type Hook = Arc<dyn Fn() + Send + Sync>;

pub struct MockUpdater {
    pub check_calls: AtomicUsize,
    pub install_calls: AtomicUsize,
    check_result: Mutex<Result<()>>,
    install_gate: Option<mpsc::UnboundedSender<Reply>>,
    on_check: Mutex<Option<Hook>>,
}

impl MockUpdater {
    fn build(install_gate: Option<mpsc::UnboundedSender<Reply>>) -> Self {
        Self {
            check_calls: AtomicUsize::new(0),
            install_calls: AtomicUsize::new(0),
            check_result: Mutex::new(Ok(())),
            install_gate,
            on_check: Mutex::new(None),
        }
    }

    /// Updater whose commands succeed immediately.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None))
    }

    /// Updater that hands every install command to the test.
    pub fn gated() -> (Arc<Self>, mpsc::UnboundedReceiver<Reply>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::build(Some(tx))), rx)
    }

    pub fn fail_checks(&self, error: PmsError) {
        *self.check_result.lock().unwrap() = Err(error);
    }

    /// Runs `hook` inside every check command, before it replies.
    pub fn on_check(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.on_check.lock().unwrap() = Some(Arc::new(hook));
    }

    pub fn checks(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn installs(&self) -> usize {
        self.install_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdaterService for MockUpdater {
    async fn check_for_updates(&self) -> Result<()> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        let hook = self.on_check.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
        self.check_result.lock().unwrap().clone()
    }

    async fn install_update(&self) -> Result<()> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.install_gate {
            let (reply_tx, reply_rx) = oneshot::channel();
            gate.send(reply_tx)
                .map_err(|_| PmsError::update("test dropped the install channel"))?;
            return reply_rx
                .await
                .unwrap_or_else(|_| Err(PmsError::update("test dropped the reply")));
        }
        Ok(())
    }
}

// ============================================================================
// Event feed
// ============================================================================

type Listeners = Arc<Mutex<Vec<(u64, String, EventHandler)>>>;

#[derive(Default)]
pub struct MockFeed {
    listeners: Listeners,
    next_id: AtomicUsize,
    failing_unlisten: Mutex<HashSet<String>>,
    failing_listen: Mutex<HashSet<String>>,
}

impl MockFeed {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_unlisten_for(&self, event: &str) {
        self.failing_unlisten.lock().unwrap().insert(event.to_string());
    }

    pub fn fail_listen_for(&self, event: &str) {
        self.failing_listen.lock().unwrap().insert(event.to_string());
    }

    pub fn emit(&self, event: &str, payload: Value) {
        let handlers: Vec<EventHandler> = self
            .listeners
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, name, _)| name == event)
            .map(|(_, _, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(payload.clone());
        }
    }

    pub fn active(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl EventFeed for MockFeed {
    fn listen(&self, event: &str, handler: EventHandler) -> Result<Box<dyn Subscription>> {
        if self.failing_listen.lock().unwrap().contains(event) {
            return Err(PmsError::subscription(format!("cannot listen to {}", event)));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        self.listeners
            .lock()
            .unwrap()
            .push((id, event.to_string(), handler));
        Ok(Box::new(MockSubscription {
            id,
            event: event.to_string(),
            listeners: self.listeners.clone(),
            fail: self.failing_unlisten.lock().unwrap().contains(event),
            released: false,
        }))
    }
}

pub struct MockSubscription {
    id: u64,
    event: String,
    listeners: Listeners,
    fail: bool,
    released: bool,
}

impl Subscription for MockSubscription {
    fn event(&self) -> &str {
        &self.event
    }

    fn unlisten(&mut self) -> Result<()> {
        if self.fail {
            return Err(PmsError::subscription(format!(
                "listener for {} is gone",
                self.event
            )));
        }
        if !self.released {
            self.released = true;
            self.listeners
                .lock()
                .unwrap()
                .retain(|(id, _, _)| *id != self.id);
        }
        Ok(())
    }
}
