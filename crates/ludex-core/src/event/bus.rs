//! In-process event bus.
//!
//! A single process-wide named-channel notifier that decouples the resource
//! caches from one another and from the mutating UI surfaces. Delivery is
//! synchronous and in registration order; there is no queuing, no
//! persistence, and no cross-process delivery.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};

use uuid::Uuid;

use super::change::ChangeEvent;

type Handler = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;
type Registry = Mutex<HashMap<String, Vec<(Uuid, Handler)>>>;

/// Process-wide publish/subscribe channel for [`ChangeEvent`]s.
///
/// Cloning an `EventBus` yields another handle to the same channel. Publish
/// snapshots the currently registered handlers, so a handler registered
/// while a publish is in flight does not receive that publish, and a
/// re-entrant publish from inside a handler cannot deadlock.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Registry>,
}

impl EventBus {
    /// Creates a new, empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` on `topic` and returns its subscription handle.
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(&self, topic: impl Into<String>, handler: F) -> Subscription
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let topic = topic.into();
        let id = Uuid::new_v4();

        let mut registry = self.lock_registry();
        registry
            .entry(topic.clone())
            .or_default()
            .push((id, Arc::new(handler)));

        Subscription {
            registry: Arc::downgrade(&self.registry),
            topic,
            id,
        }
    }

    /// Publishes the event on its own topic (see [`ChangeEvent::topic`]).
    pub fn publish(&self, event: &ChangeEvent) {
        self.publish_on(&event.topic(), event);
    }

    /// Synchronously invokes every handler currently registered on `topic`,
    /// in registration order.
    ///
    /// A panicking handler is logged and skipped; delivery continues to the
    /// remaining handlers.
    pub fn publish_on(&self, topic: &str, event: &ChangeEvent) {
        let handlers: Vec<Handler> = {
            let registry = self.lock_registry();
            match registry.get(topic) {
                Some(entries) => entries.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in handlers {
            if panic::catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::warn!(topic, "event handler panicked; continuing delivery");
            }
        }
    }

    /// Number of handlers currently registered on `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock_registry().get(topic).map_or(0, Vec::len)
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<(Uuid, Handler)>>> {
        // A poisoned registry only ever means a handler panicked while the
        // lock was not held, so the map itself is still consistent.
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// The capability to remove a registered handler.
///
/// Unsubscribes on drop. Holding the subscription is what keeps the handler
/// alive.
pub struct Subscription {
    registry: Weak<Registry>,
    topic: String,
    id: Uuid,
}

impl Subscription {
    /// Removes the handler now instead of at drop time.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    fn remove(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(entries) = registry.get_mut(&self.topic) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                registry.remove(&self.topic);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
