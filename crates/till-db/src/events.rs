//! # Event Delivery
//!
//! Fire-and-forget publication of [`DrawerEvent`]s to in-process
//! subscribers (UI refresh, audit listeners).
//!
//! ## Delivery Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Service operation                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN ── read-modify-write ── COMMIT                                  │
//! │       │                          │                                      │
//! │       │ (on failure: rollback,   ▼                                      │
//! │       │  nothing published)   publish(event)   ← only after commit     │
//! │       ▼                          │                                      │
//! │     error                        ▼                                      │
//! │                         subscribers (best effort, at most once)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A publish failure is never an operation failure: events are
//! notifications, not part of the consistency boundary.

use tokio::sync::broadcast;
use tracing::trace;

use till_core::DrawerEvent;

/// Publish-only capability injected into the drawer services.
///
/// Implementations must not block and must not fail the caller.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DrawerEvent);
}

// =============================================================================
// Broadcast Publisher
// =============================================================================

/// Publisher backed by a tokio broadcast channel.
///
/// Lagging subscribers lose old events rather than blocking writers,
/// which matches the at-most-once, best-effort contract.
pub struct BroadcastPublisher {
    tx: broadcast::Sender<DrawerEvent>,
}

impl BroadcastPublisher {
    /// Creates a publisher with room for `capacity` in-flight events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        BroadcastPublisher { tx }
    }

    /// Opens a new subscription receiving all events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DrawerEvent> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        BroadcastPublisher::new(64)
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, event: DrawerEvent) {
        // send only errors when there are no subscribers; that is a
        // normal state for a library consumer that never subscribed.
        if self.tx.send(event).is_err() {
            trace!("drawer event dropped: no subscribers");
        }
    }
}

// =============================================================================
// Null Publisher
// =============================================================================

/// Publisher that discards everything. For tests and headless embedding.
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: DrawerEvent) {}
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::Money;

    #[test]
    fn test_subscriber_receives_published_event() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher.publish(DrawerEvent::new(
            "Cash Sale",
            Money::from_cents(5000),
            "Cash sale transaction",
        ));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.label, "Cash Sale");
        assert_eq!(event.amount, Money::from_cents(5000));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = BroadcastPublisher::new(8);
        publisher.publish(DrawerEvent::new("Close", Money::zero(), "eod"));
    }
}
