//! Named event channels.
//!
//! A small publish/subscribe capability embedded in the engine for
//! observability hooks. Each event name owns a tokio broadcast channel that is
//! created lazily on first subscription; emitting to a name nobody listens on
//! is a no-op.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 64;

pub struct Events {
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    capacity: usize,
}

impl Events {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` bounds how many unread events a slow subscriber may lag behind
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to `name`; only events emitted after this call are received
    pub fn subscribe(&self, name: &str) -> broadcast::Receiver<Value> {
        let mut channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels
            .entry(name.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Emit `payload` on `name`, returning how many subscribers received it
    pub fn emit(&self, name: &str, payload: Value) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        match channels.get(name) {
            Some(tx) => tx.send(payload).unwrap_or(0),
            None => 0,
        }
    }

    pub fn listener_count(&self, name: &str) -> usize {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        channels.get(name).map_or(0, |tx| tx.receiver_count())
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let channels = self.channels.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Events")
            .field("names", &channels.keys().collect::<Vec<_>>())
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let events = Events::new();
        let mut a = events.subscribe("notification");
        let mut b = events.subscribe("notification");

        assert_eq!(events.emit("notification", json!({"n": 1})), 2);
        assert_eq!(a.recv().await.unwrap(), json!({"n": 1}));
        assert_eq!(b.recv().await.unwrap(), json!({"n": 1}));
    }

    #[test]
    fn test_emit_without_listeners() {
        let events = Events::new();
        assert_eq!(events.emit("nobody", json!(null)), 0);
        assert_eq!(events.listener_count("nobody"), 0);
    }

    #[test]
    fn test_names_are_isolated() {
        let events = Events::new();
        let mut other = events.subscribe("other");
        assert_eq!(events.emit("target", json!(1)), 0);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_dropped_receiver_is_not_counted() {
        let events = Events::new();
        let rx = events.subscribe("x");
        assert_eq!(events.listener_count("x"), 1);
        drop(rx);
        assert_eq!(events.listener_count("x"), 0);
        assert_eq!(events.emit("x", json!(1)), 0);
    }
}
