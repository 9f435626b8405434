//! Change notifications for guest storage.
//!
//! Every local cart or wishlist mutation emits a [`StorageEvent`] so other
//! views can re-read storage without polling. Events carry no payload.

use tokio::sync::broadcast;

/// Buffered events per subscriber before older ones are dropped.
const EVENT_CAPACITY: usize = 64;

/// A local storage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageEvent {
    /// The guest cart was modified.
    CartChanged,
    /// The guest wishlist was modified.
    WishlistChanged,
}

impl StorageEvent {
    /// Event name as dispatched to browser listeners.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CartChanged => "cart-changed",
            Self::WishlistChanged => "wishlist-changed",
        }
    }
}

/// Fan-out channel for [`StorageEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl EventBus {
    /// Create a new event bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Emit an event to all current subscribers.
    pub fn emit(&self, event: StorageEvent) {
        // No subscribers is not an error
        let _ = self.sender.send(event);
        tracing::trace!(event = event.as_str(), "Storage event emitted");
    }

    /// Subscribe to future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
