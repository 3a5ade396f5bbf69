//! Host-facing player events
//!
//! The adapter composes an emitter instead of inheriting one from the host
//! framework. Hosts subscribe with plain closures and receive every event
//! by reference.

use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Events emitted toward the host.
///
/// Serialized names match the host protocol. `QualityChange` and
/// `PlaybackRateChange` are declared for protocol completeness but never
/// fired: the remote player exposes neither quality switching nor rate
/// control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlayerEvent {
    /// Metadata (duration) is known
    Loaded,
    /// The player accepts commands
    Ready,
    /// Playback state changed. `None` carries no state and exists so the
    /// host shows its player chrome as soon as the adapter is connected.
    StateChange { state: Option<PlaybackState> },
    /// Never fired; see enum docs
    QualityChange { quality: String },
    /// Never fired; see enum docs
    PlaybackRateChange { rate: f64 },
}

/// Identifier handed back by [`EventEmitter::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

/// Subscribe/unsubscribe/emit registry for [`PlayerEvent`]s
pub struct EventEmitter {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener; returns the id needed to unsubscribe
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&PlayerEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    /// Remove a listener; true if it was still registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener registered right now.
    ///
    /// The registry snapshot is taken before any listener runs, so a
    /// listener may subscribe or unsubscribe from inside the callback.
    pub fn emit(&self, event: &PlayerEvent) {
        let snapshot: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in snapshot {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_emit() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&hits);
        emitter.subscribe(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&PlayerEvent::Loaded);
        emitter.emit(&PlayerEvent::Ready);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let emitter = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counted = Arc::clone(&hits);
        let id = emitter.subscribe(move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(&PlayerEvent::Ready);
        assert!(emitter.unsubscribe(id));
        emitter.emit(&PlayerEvent::Ready);

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        // Second removal reports nothing left to remove
        assert!(!emitter.unsubscribe(id));
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let emitter = Arc::new(EventEmitter::new());

        let reentrant = Arc::clone(&emitter);
        emitter.subscribe(move |_| {
            reentrant.subscribe(|_| {});
        });

        emitter.emit(&PlayerEvent::Loaded);
        assert_eq!(emitter.listener_count(), 2);
    }

    #[test]
    fn test_event_wire_names() {
        let json = serde_json::to_value(&PlayerEvent::Loaded).unwrap();
        assert_eq!(json["event"], "loaded");

        let json = serde_json::to_value(&PlayerEvent::Ready).unwrap();
        assert_eq!(json["event"], "ready");

        let json = serde_json::to_value(&PlayerEvent::StateChange {
            state: Some(PlaybackState::Playing),
        })
        .unwrap();
        assert_eq!(json["event"], "stateChange");
        assert_eq!(json["state"], "playing");

        let json = serde_json::to_value(&PlayerEvent::StateChange { state: None }).unwrap();
        assert_eq!(json["event"], "stateChange");
        assert!(json["state"].is_null());
    }
}
