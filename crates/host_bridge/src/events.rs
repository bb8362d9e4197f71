use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use serde_json::Value;
use shared::protocol::HostEvent;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::BridgeError;

pub trait EventChannel: Send + Sync {
    /// Registers a listener for `mod-found` and `scan-completed`. Events are
    /// delivered in emission order until the subscription is dropped.
    fn subscribe(&self) -> Result<Subscription, BridgeError>;
}

/// Live registration on an [`EventChannel`]. Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    events: mpsc::UnboundedReceiver<HostEvent>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(
        id: u64,
        events: mpsc::UnboundedReceiver<HostEvent>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            id,
            events,
            release: Some(Box::new(release)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next event, or `None` once the channel side has gone away.
    pub async fn next(&mut self) -> Option<HostEvent> {
        self.events.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, mpsc::UnboundedSender<HostEvent>>,
}

/// In-process event channel. Every subscriber receives every event, in
/// order, with no capacity limit.
#[derive(Clone, Default)]
pub struct LocalEventChannel {
    registry: Arc<Mutex<Registry>>,
}

impl LocalEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many listeners the event reached.
    pub fn emit(&self, event: HostEvent) -> usize {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry
            .listeners
            .retain(|_, listener| listener.send(event.clone()).is_ok());
        registry.listeners.len()
    }

    /// Decodes a raw named event and emits it. Unknown names and payloads
    /// that fail to decode are skipped and reach no listener.
    pub fn emit_named(&self, name: &str, payload: Value) -> usize {
        match HostEvent::decode(name, payload) {
            Ok(Some(event)) => self.emit(event),
            Ok(None) => {
                debug!(event = name, "ignoring unknown host event");
                0
            }
            Err(error) => {
                warn!(%error, "dropping undecodable host event");
                0
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

impl EventChannel for LocalEventChannel {
    fn subscribe(&self) -> Result<Subscription, BridgeError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.next_id += 1;
            let id = registry.next_id;
            registry.listeners.insert(id, tx);
            id
        };
        let registry: Weak<Mutex<Registry>> = Arc::downgrade(&self.registry);
        Ok(Subscription::new(id, rx, move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
            }
        }))
    }
}

pub struct MissingEventChannel;

impl EventChannel for MissingEventChannel {
    fn subscribe(&self) -> Result<Subscription, BridgeError> {
        Err(BridgeError::Unavailable {
            capability: "event channel",
        })
    }
}

#[cfg(test)]
#[path = "tests/events_tests.rs"]
mod tests;
