//! Core types for the MEDIAL embed adapter

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Process-wide instance counter. Every adapter instance draws the next
/// ordinal so its DOM element id stays unique for the life of the process.
/// Starts at zero, never reset.
static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(0);

/// Stable DOM element identifier for one embedded player
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Allocate the id for the next adapter instance
    pub fn next() -> Self {
        let ordinal = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        Self(format!("medial-player-{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One playable source handed over by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoSource {
    /// Opaque URL; may or may not be a MEDIAL share link
    pub url: String,
    /// Media-type tag the host attached to the source
    pub mime: String,
}

impl VideoSource {
    pub fn new(url: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime: mime.into(),
        }
    }
}

/// Playback states reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Ended,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::Ended => write!(f, "ended"),
        }
    }
}

/// Deferred-creation state machine for one adapter instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// Placeholder only; no iframe activity yet
    Uncreated,
    /// Placeholder was visible; iframe is being mounted
    Creating,
    /// Frame loaded; waiting for the bridging script and remote readiness
    BridgeLoading,
    /// Remote player is ready and the duration probe has completed
    Connected,
}

impl LifecycleState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, target),
            // From Uncreated
            (Uncreated, Creating) |
            // From Creating (a failed mount falls back to Uncreated)
            (Creating, BridgeLoading) | (Creating, Uncreated) |
            // From BridgeLoading; Connected is terminal
            (BridgeLoading, Connected)
        )
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Uncreated => write!(f, "uncreated"),
            LifecycleState::Creating => write!(f, "creating"),
            LifecycleState::BridgeLoading => write!(f, "bridge-loading"),
            LifecycleState::Connected => write!(f, "connected"),
        }
    }
}

/// Iframe dimensions in logical units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerSize {
    pub width: u32,
    pub height: u32,
}

impl PlayerSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for PlayerSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Last known remote playback state.
///
/// Only as fresh as the last received bridge event or completed poll;
/// callers must tolerate staleness. `None` means never observed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Content duration in seconds
    pub duration: Option<f64>,
    /// Playback position in seconds
    pub position: Option<f64>,
    /// Volume level, 0-100
    pub volume: Option<f64>,
    /// Mute flag
    pub muted: Option<bool>,
    /// Buffered fraction, 0-1, as reported by the remote
    pub buffered: Option<f64>,
}

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerOptions {
    /// Stretch the iframe to the wrapper's full client height on resize
    /// instead of the 16:9 formula
    pub fit: bool,
    /// Interval between mute/volume refresh polls
    pub poll_interval: Duration,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            fit: false,
            poll_interval: Duration::from_millis(1500),
        }
    }
}

/// Translatable strings consumed by the adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Localization {
    /// Label shown in the placeholder while the player loads
    pub loading: String,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            loading: "Video player loading...".to_string(),
        }
    }
}

/// Captions track descriptor in the host's label/value shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionsTrack {
    /// Human-readable label
    pub label: String,
    /// Track identifier
    pub value: String,
}

impl CaptionsTrack {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}
