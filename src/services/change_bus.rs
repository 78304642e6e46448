//! Observer registry for run change notifications.
//!
//! Publishing hands only the run id to every listener registered at that
//! moment, synchronously and in registration order. There is no buffering
//! and no replay for late subscribers.

use std::sync::{Arc, Mutex};

use tracing::debug;

type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`ChangeBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

/// Explicit publish/subscribe point owned by whoever composes the engine.
#[derive(Clone, Default)]
pub struct ChangeBus {
    registry: Arc<Mutex<Registry>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener until it is unsubscribed.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(|p| p.into_inner());
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.listeners.push((id, Arc::new(listener)));
        debug!(subscription = id.0, "Change listener registered");
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.lock().unwrap_or_else(|p| p.into_inner());
        let before = registry.listeners.len();
        registry.listeners.retain(|(existing, _)| *existing != id);
        before != registry.listeners.len()
    }

    /// Notify every current listener that `run_id` changed.
    ///
    /// Returns the number of listeners invoked. Listeners run outside the
    /// registry lock, so they may subscribe or unsubscribe themselves.
    pub fn publish(&self, run_id: &str) -> usize {
        let listeners: Vec<Listener> = {
            let registry = self.registry.lock().unwrap_or_else(|p| p.into_inner());
            registry
                .listeners
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect()
        };

        if listeners.is_empty() {
            debug!(run_id, "Run change published with no listeners");
        }

        for listener in &listeners {
            listener(run_id);
        }

        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .listeners
            .len()
    }
}
