//! In-process event bus implementing `EventFeed`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use pmswitch_core::event::{EventFeed, EventHandler, Subscription};
use pmswitch_core::{PmsError, Result};
use serde_json::Value;

struct Listener {
    id: u64,
    event: String,
    handler: EventHandler,
}

#[derive(Default)]
struct BusInner {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl BusInner {
    fn lock(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Delivers named events to registered handlers.
///
/// Clones share one listener registry. Handlers run synchronously on the
/// emitting task, outside the registry lock, so a handler may itself listen
/// or unlisten.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatches `payload` to every listener of `event`; returns how many
    /// handlers ran.
    pub fn emit(&self, event: &str, payload: Value) -> usize {
        let handlers: Vec<EventHandler> = self
            .inner
            .lock()
            .iter()
            .filter(|listener| listener.event == event)
            .map(|listener| listener.handler.clone())
            .collect();

        tracing::trace!("[EventBus] {} -> {} listener(s)", event, handlers.len());
        for handler in &handlers {
            handler(payload.clone());
        }
        handlers.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .lock()
            .iter()
            .filter(|listener| listener.event == event)
            .count()
    }
}

impl EventFeed for EventBus {
    fn listen(&self, event: &str, handler: EventHandler) -> Result<Box<dyn Subscription>> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock().push(Listener {
            id,
            event: event.to_string(),
            handler,
        });
        Ok(Box::new(BusSubscription {
            id,
            event: event.to_string(),
            bus: Arc::downgrade(&self.inner),
            released: false,
        }))
    }
}

/// Registration handle returned by [`EventBus::listen`].
pub struct BusSubscription {
    id: u64,
    event: String,
    bus: Weak<BusInner>,
    released: bool,
}

impl Subscription for BusSubscription {
    fn event(&self) -> &str {
        &self.event
    }

    fn unlisten(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        let bus = self.bus.upgrade().ok_or_else(|| {
            PmsError::subscription(format!("event bus dropped before releasing '{}'", self.event))
        })?;
        bus.lock().retain(|listener| listener.id != self.id);
        self.released = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let handler: EventHandler = {
            let count = count.clone();
            Arc::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, handler)
    }

    #[test]
    fn test_emit_reaches_only_matching_listeners() {
        let bus = EventBus::new();
        let (available, on_available) = counter();
        let (finished, on_finished) = counter();
        let _a = bus.listen("update-available", on_available).unwrap();
        let _f = bus.listen("update-finished", on_finished).unwrap();

        assert_eq!(bus.emit("update-available", json!("1.0.0")), 1);
        assert_eq!(bus.emit("update-progress", json!({})), 0);

        assert_eq!(available.load(Ordering::SeqCst), 1);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_payload_is_delivered() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(None));
        let handler: EventHandler = {
            let seen = seen.clone();
            Arc::new(move |payload| *seen.lock().unwrap() = Some(payload))
        };
        let _s = bus.listen("update-progress", handler).unwrap();

        bus.emit("update-progress", json!({"downloaded": 5, "contentLength": 10}));

        assert_eq!(
            *seen.lock().unwrap(),
            Some(json!({"downloaded": 5, "contentLength": 10}))
        );
    }

    #[test]
    fn test_unlisten_is_idempotent() {
        let bus = EventBus::new();
        let (count, handler) = counter();
        let mut sub = bus.listen("update-finished", handler).unwrap();

        sub.unlisten().unwrap();
        sub.unlisten().unwrap();

        assert_eq!(bus.listener_count("update-finished"), 0);
        bus.emit("update-finished", Value::Null);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unlisten_after_bus_dropped_fails() {
        let bus = EventBus::new();
        let (_count, handler) = counter();
        let mut sub = bus.listen("update-available", handler).unwrap();
        drop(bus);

        let err = sub.unlisten().unwrap_err();
        assert!(err.is_subscription());
    }

    #[test]
    fn test_handler_may_unlisten_during_emit() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Box<dyn Subscription>>>> = Arc::new(Mutex::new(None));
        let handler: EventHandler = {
            let slot = slot.clone();
            Arc::new(move |_| {
                if let Some(mut sub) = slot.lock().unwrap().take() {
                    sub.unlisten().unwrap();
                }
            })
        };
        *slot.lock().unwrap() = Some(bus.listen("update-finished", handler).unwrap());

        assert_eq!(bus.emit("update-finished", Value::Null), 1);
        assert_eq!(bus.listener_count("update-finished"), 0);
    }
}
