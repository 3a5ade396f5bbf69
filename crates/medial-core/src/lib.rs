//! Medial Core - Embed adapter for MEDIAL self-hosted video
//!
//! This crate provides the adapter layer between a host presentation
//! framework and a MEDIAL video embedded inside an iframe:
//! - Share-link detection and embed URL construction
//! - Visibility-gated, at-most-once iframe creation
//! - Capability-guarded playback facade over a postMessage bridge
//! - Remote event reconciliation and polled volume/mute state
//!
//! The DOM environment and the cross-frame messaging library stay outside
//! the crate, behind the [`EmbedSurface`] and [`BridgeTransport`] seams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Medial Core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │     Link     │  │    Layout    │  │    Event     │           │
//! │  │   Resolver   │  │     Math     │  │   Emitter    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         └─────────────────┼─────────────────┘                   │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │   Medial    │                              │
//! │                    │   Player    │                              │
//! │                    └──────┬──────┘                              │
//! │                           │                                     │
//! │  ┌──────────────┐  ┌──────┴──────┐  ┌──────────────┐            │
//! │  │    Embed     │  │   Player    │  │    Script    │            │
//! │  │   Surface    │  │   Bridge    │  │     Gate     │            │
//! │  └──────────────┘  └─────────────┘  └──────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod link;
pub mod layout;
pub mod events;
pub mod bridge;
pub mod surface;
pub mod player;

pub use bridge::{BridgeEvent, BridgeHandle, BridgeTransport, Capability, PlayerBridge, ScriptGate};
pub use error::{Error, Result};
pub use events::{EventEmitter, PlayerEvent, SubscriptionId};
pub use link::{embed_url, is_share_link, video_id, VideoId};
pub use player::MedialPlayer;
pub use surface::{EmbedSurface, FrameRequest, FRAME_PERMISSIONS};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the adapter library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Medial Core initialized");
}
