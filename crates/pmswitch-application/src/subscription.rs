//! Scoped release of event subscriptions.

use pmswitch_core::event::Subscription;

/// Owns a group of subscriptions and releases them together.
///
/// Release is isolated per handle: an error from one subscription is logged
/// and the remaining handles are still released. Each handle is released at
/// most once; the set is empty afterwards and releasing again does nothing.
#[derive(Default)]
pub struct SubscriptionSet {
    handles: Vec<Box<dyn Subscription>>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: Box<dyn Subscription>) {
        self.handles.push(handle);
    }

    /// Moves every handle of `other` into this set.
    pub fn extend(&mut self, mut other: SubscriptionSet) {
        self.handles.append(&mut other.handles);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Releases every handle, returning how many failed to release.
    pub fn release_all(&mut self) -> usize {
        let mut failures = 0;
        for mut handle in self.handles.drain(..) {
            if let Err(e) = handle.unlisten() {
                failures += 1;
                tracing::warn!(
                    "[Subscriptions] Failed to release '{}' listener: {}",
                    handle.event(),
                    e
                );
            }
        }
        failures
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.release_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockFeed;
    use pmswitch_core::event::{EventFeed, EventHandler};
    use std::sync::Arc;

    fn noop() -> EventHandler {
        Arc::new(|_| {})
    }

    #[test]
    fn test_failure_in_one_handle_does_not_block_others() {
        let feed = MockFeed::new();
        feed.fail_unlisten_for("update-progress");

        let mut set = SubscriptionSet::new();
        for event in ["update-available", "update-progress", "update-finished"] {
            set.push(feed.listen(event, noop()).unwrap());
        }
        assert_eq!(feed.active(), 3);

        assert_eq!(set.release_all(), 1);
        // Only the failing listener is left registered.
        assert_eq!(feed.active(), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_release_is_idempotent() {
        let feed = MockFeed::new();
        let mut set = SubscriptionSet::new();
        set.push(feed.listen("update-finished", noop()).unwrap());

        assert_eq!(set.release_all(), 0);
        assert_eq!(set.release_all(), 0);
        assert_eq!(feed.active(), 0);
    }

    #[test]
    fn test_drop_releases_remaining_handles() {
        let feed = MockFeed::new();
        {
            let mut set = SubscriptionSet::new();
            set.push(feed.listen("update-available", noop()).unwrap());
            assert_eq!(feed.active(), 1);
        }
        assert_eq!(feed.active(), 0);
    }
}
