//! Push-notification seam: listen to named events, release subscriptions.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

/// Callback invoked with the raw JSON payload of each delivered event.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// A source of backend-pushed events.
///
/// Registration is not a suspension point; the handler runs whenever an
/// event of the requested name is delivered, independently of any command
/// in flight.
pub trait EventFeed: Send + Sync {
    /// Registers `handler` for events named `event`.
    fn listen(&self, event: &str, handler: EventHandler) -> Result<Box<dyn Subscription>>;
}

/// A cancellable registration returned by [`EventFeed::listen`].
pub trait Subscription: Send {
    /// Name of the event this subscription listens to.
    fn event(&self) -> &str;

    /// Releases the registration.
    ///
    /// Must be idempotent: calling it again after a successful release is a
    /// no-op that returns `Ok(())`.
    fn unlisten(&mut self) -> Result<()>;
}
