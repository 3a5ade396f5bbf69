//! Remote player bridge
//!
//! The embedded page is driven through a shared postMessage bridging script.
//! This module is the seam around that protocol: the capability set and
//! event stream, the transport that loads the script and opens connections,
//! and the load-once gate coordinating the script across instances.

use crate::types::ElementId;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tokio::sync::{mpsc, OnceCell};

/// Operations a remote player may support.
///
/// Support varies between player builds, so nothing is assumed: every
/// conditional action probes the connection first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    Play,
    Pause,
    SetCurrentTime,
    SetVolume,
    GetVolume,
    Mute,
    Unmute,
    GetMuted,
}

impl Capability {
    /// Protocol method name probed on the remote player
    pub fn method_name(&self) -> &'static str {
        match self {
            Capability::Play => "play",
            Capability::Pause => "pause",
            Capability::SetCurrentTime => "setCurrentTime",
            Capability::SetVolume => "setVolume",
            Capability::GetVolume => "getVolume",
            Capability::Mute => "mute",
            Capability::Unmute => "unmute",
            Capability::GetMuted => "getMuted",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.method_name())
    }
}

/// Events the remote player pushes over the bridge.
///
/// Serialized names match the protocol wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum BridgeEvent {
    /// The remote player accepts commands
    Ready,
    /// Position and duration report, in seconds
    TimeUpdate { seconds: f64, duration: f64 },
    /// Buffered fraction report, 0-1
    Progress { percent: f64 },
    Play,
    Pause,
    Ended,
}

/// Command and query surface of one remote player connection
#[async_trait]
pub trait PlayerBridge: Send + Sync {
    /// Probe whether the remote player supports a method
    fn supports(&self, capability: Capability) -> bool;

    async fn play(&self) -> Result<()>;
    async fn pause(&self) -> Result<()>;
    async fn set_current_time(&self, seconds: f64) -> Result<()>;
    async fn set_volume(&self, level: f64) -> Result<()>;
    async fn mute(&self) -> Result<()>;
    async fn unmute(&self) -> Result<()>;

    /// Current volume level, 0-100
    async fn volume(&self) -> Result<f64>;
    /// Current mute flag
    async fn muted(&self) -> Result<bool>;
}

/// An established connection: the command surface plus the event stream
pub struct BridgeHandle {
    pub controls: Arc<dyn PlayerBridge>,
    pub events: mpsc::UnboundedReceiver<BridgeEvent>,
}

/// Loads the shared bridging script and opens connections into frames
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Load the shared bridging script.
    ///
    /// Called through [`ScriptGate`], so a process performs at most one
    /// successful load.
    async fn load_script(&self) -> Result<()>;

    /// Open a connection to the player inside the identified frame.
    ///
    /// The returned event stream must deliver [`BridgeEvent::Ready`] once
    /// the remote player announces itself; the adapter drops everything
    /// that arrives before that.
    async fn connect(&self, frame: &ElementId) -> Result<BridgeHandle>;
}

/// Load-once coordination for the shared bridging script.
///
/// A successful load is remembered for the life of the gate; a failed load
/// leaves the gate open so a later instance retries. Instances default to
/// the process-wide gate; hosts embedding into several documents can inject
/// one gate per document.
#[derive(Clone)]
pub struct ScriptGate {
    loaded: Arc<OnceCell<()>>,
}

impl ScriptGate {
    pub fn new() -> Self {
        Self {
            loaded: Arc::new(OnceCell::new()),
        }
    }

    /// The process-wide default gate
    pub fn global() -> Self {
        static GLOBAL: OnceLock<ScriptGate> = OnceLock::new();
        GLOBAL.get_or_init(ScriptGate::new).clone()
    }

    /// Load the script through the transport unless already loaded.
    ///
    /// Concurrent callers coordinate: one performs the load while the rest
    /// await its outcome.
    pub async fn ensure(&self, transport: &dyn BridgeTransport) -> Result<()> {
        self.loaded
            .get_or_try_init(|| transport.load_script())
            .await?;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

impl Default for ScriptGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingTransport {
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    impl CountingTransport {
        fn new() -> Self {
            Self {
                loads: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl BridgeTransport for CountingTransport {
        async fn load_script(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::bridge("script unreachable"));
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn connect(&self, _frame: &ElementId) -> Result<BridgeHandle> {
            Err(Error::bridge("connect is not part of this test"))
        }
    }

    #[test]
    fn test_capability_method_names() {
        assert_eq!(Capability::Play.method_name(), "play");
        assert_eq!(Capability::Pause.method_name(), "pause");
        assert_eq!(Capability::SetCurrentTime.method_name(), "setCurrentTime");
        assert_eq!(Capability::SetVolume.method_name(), "setVolume");
        assert_eq!(Capability::GetVolume.method_name(), "getVolume");
        assert_eq!(Capability::Mute.method_name(), "mute");
        assert_eq!(Capability::Unmute.method_name(), "unmute");
        assert_eq!(Capability::GetMuted.method_name(), "getMuted");
    }

    #[test]
    fn test_bridge_event_wire_names() {
        let json = serde_json::to_value(&BridgeEvent::Ready).unwrap();
        assert_eq!(json["event"], "ready");

        let json = serde_json::to_value(&BridgeEvent::TimeUpdate {
            seconds: 1.5,
            duration: 95.0,
        })
        .unwrap();
        assert_eq!(json["event"], "timeupdate");
        assert_eq!(json["seconds"], 1.5);
        assert_eq!(json["duration"], 95.0);

        let json = serde_json::to_value(&BridgeEvent::Progress { percent: 0.25 }).unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["percent"], 0.25);
    }

    #[tokio::test]
    async fn test_gate_loads_once() {
        let gate = ScriptGate::new();
        let transport = CountingTransport::new();

        assert!(!gate.is_loaded());
        gate.ensure(&transport).await.unwrap();
        gate.ensure(&transport).await.unwrap();

        assert!(gate.is_loaded());
        assert_eq!(transport.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gate_retries_after_failure() {
        let gate = ScriptGate::new();
        let transport = CountingTransport::new();

        transport.fail.store(true, Ordering::SeqCst);
        assert!(gate.ensure(&transport).await.is_err());
        assert!(!gate.is_loaded());

        transport.fail.store(false, Ordering::SeqCst);
        gate.ensure(&transport).await.unwrap();
        assert!(gate.is_loaded());
        assert_eq!(transport.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cloned_gates_share_state() {
        let gate = ScriptGate::new();
        let clone = gate.clone();
        let transport = CountingTransport::new();

        gate.ensure(&transport).await.unwrap();
        assert!(clone.is_loaded());

        clone.ensure(&transport).await.unwrap();
        assert_eq!(transport.loads.load(Ordering::SeqCst), 1);
    }
}
