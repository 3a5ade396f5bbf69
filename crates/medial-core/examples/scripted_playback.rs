//! Scripted playback example
//!
//! Walks a [`MedialPlayer`] through its full lifecycle against an
//! in-memory page surface and a scripted remote player: share-link
//! resolution, deferred creation, the duration probe, playback control
//! and resize reconciliation.
//!
//! Run with: cargo run -p medial-core --example scripted_playback

use anyhow::Result;
use async_trait::async_trait;
use medial_core::{
    embed_url, is_share_link, video_id, BridgeEvent, BridgeHandle, BridgeTransport, Capability,
    ElementId, EmbedSurface, FrameRequest, LifecycleState, Localization, MedialPlayer,
    PlayerBridge, PlayerOptions, PlayerSize, VideoSource,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

const SHARE_LINK: &str = "https://media.example.ac.uk/Player/oT9122Fc";

/// Page surface that narrates every DOM operation to stdout.
struct ConsoleSurface {
    client: Mutex<PlayerSize>,
}

impl ConsoleSurface {
    fn new() -> Self {
        Self {
            client: Mutex::new(PlayerSize::new(320, 451)),
        }
    }

    fn set_client(&self, size: PlayerSize) {
        if let Ok(mut client) = self.client.lock() {
            *client = size;
        }
    }
}

#[async_trait]
impl EmbedSurface for ConsoleSurface {
    fn append_placeholder(&self, id: &ElementId, loading_label: &str) -> medial_core::Result<()> {
        println!("  [surface] append placeholder #{id} (\"{loading_label}\")");
        Ok(())
    }

    fn placeholder_visible(&self) -> bool {
        true
    }

    fn wrapper_visible(&self) -> bool {
        true
    }

    fn wrapper_width(&self) -> u32 {
        320
    }

    async fn mount_frame(&self, frame: &FrameRequest) -> medial_core::Result<()> {
        println!(
            "  [surface] mount iframe #{} at {} (allow=\"{}\")",
            frame.id, frame.size, frame.allow
        );
        Ok(())
    }

    fn fill_container(&self) {
        println!("  [surface] stretch wrapper to fill container");
    }

    fn client_size(&self) -> PlayerSize {
        self.client
            .lock()
            .map(|client| *client)
            .unwrap_or_else(|_| PlayerSize::new(0, 0))
    }

    fn resize_frame(&self, id: &ElementId, size: PlayerSize) {
        println!("  [surface] resize iframe #{id} to {size}");
    }
}

/// Remote player that answers the probe and echoes seeks, like the
/// real embed does over postMessage.
struct ScriptedBridge {
    plays: AtomicUsize,
    events: Mutex<Option<mpsc::UnboundedSender<BridgeEvent>>>,
}

impl ScriptedBridge {
    fn new() -> Self {
        Self {
            plays: AtomicUsize::new(0),
            events: Mutex::new(None),
        }
    }

    fn send(&self, event: BridgeEvent) {
        if let Ok(sender) = self.events.lock() {
            if let Some(tx) = sender.as_ref() {
                let _ = tx.send(event);
            }
        }
    }
}

#[async_trait]
impl PlayerBridge for ScriptedBridge {
    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    async fn play(&self) -> medial_core::Result<()> {
        println!("  [remote] play");
        if self.plays.fetch_add(1, Ordering::SeqCst) == 0 {
            // First play is the duration probe; answer with a timeupdate.
            self.send(BridgeEvent::TimeUpdate {
                seconds: 0.5,
                duration: 212.0,
            });
        } else {
            self.send(BridgeEvent::Play);
            self.send(BridgeEvent::TimeUpdate {
                seconds: 1.0,
                duration: 212.0,
            });
        }
        Ok(())
    }

    async fn pause(&self) -> medial_core::Result<()> {
        println!("  [remote] pause");
        self.send(BridgeEvent::Pause);
        Ok(())
    }

    async fn set_current_time(&self, seconds: f64) -> medial_core::Result<()> {
        println!("  [remote] setCurrentTime {seconds}");
        self.send(BridgeEvent::TimeUpdate {
            seconds,
            duration: 212.0,
        });
        Ok(())
    }

    async fn set_volume(&self, level: f64) -> medial_core::Result<()> {
        println!("  [remote] setVolume {level}");
        Ok(())
    }

    async fn mute(&self) -> medial_core::Result<()> {
        println!("  [remote] mute");
        Ok(())
    }

    async fn unmute(&self) -> medial_core::Result<()> {
        println!("  [remote] unmute");
        Ok(())
    }

    async fn volume(&self) -> medial_core::Result<f64> {
        Ok(75.0)
    }

    async fn muted(&self) -> medial_core::Result<bool> {
        Ok(false)
    }
}

struct ScriptedTransport {
    bridge: Arc<ScriptedBridge>,
}

#[async_trait]
impl BridgeTransport for ScriptedTransport {
    async fn load_script(&self) -> medial_core::Result<()> {
        println!("  [transport] load player script");
        Ok(())
    }

    async fn connect(&self, frame: &ElementId) -> medial_core::Result<BridgeHandle> {
        println!("  [transport] connect to iframe #{frame}");
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut sender) = self.bridge.events.lock() {
            *sender = Some(tx.clone());
        }
        // The embed announces itself once the page script is wired up.
        let _ = tx.send(BridgeEvent::Ready);
        Ok(BridgeHandle {
            controls: Arc::clone(&self.bridge) as Arc<dyn PlayerBridge>,
            events: rx,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Medial Core - Scripted Playback Example");
    println!("========================================\n");

    // 1. Resolve the share link into the embed wire format
    println!("1. Resolving the share link...");
    println!("   Share link:  {SHARE_LINK}");
    println!("   Recognized:  {}", is_share_link(SHARE_LINK));
    if let Some(id) = video_id(SHARE_LINK) {
        println!("   Video id:    {id}");
    }
    println!("   Embed URL:   {}\n", embed_url(SHARE_LINK)?);

    // 2. Build the player against the scripted page
    println!("2. Creating the player...");
    let surface = Arc::new(ConsoleSurface::new());
    let bridge = Arc::new(ScriptedBridge::new());
    let transport = Arc::new(ScriptedTransport {
        bridge: Arc::clone(&bridge),
    });

    let player = MedialPlayer::new(
        vec![VideoSource::new(SHARE_LINK, "video/medial")],
        PlayerOptions::default(),
        Localization::default(),
        Arc::clone(&surface) as Arc<dyn EmbedSurface>,
        transport as Arc<dyn BridgeTransport>,
    )?;

    player.events().subscribe(|event| {
        let wire = serde_json::to_string(event).unwrap_or_default();
        println!("  [event] {wire}");
    });

    // 3. Attach to the page; creation and the duration probe run through
    println!("\n3. Attaching to the page...");
    player.append_to().await?;
    for _ in 0..200 {
        if player.lifecycle().await == LifecycleState::Connected {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    sleep(Duration::from_millis(50)).await;
    println!("   Lifecycle: {}", player.lifecycle().await);

    // 4. Inspect the primed snapshot
    println!("\n4. Snapshot after connection:");
    println!("   Duration:  {:?}", player.duration().await);
    println!("   Position:  {:?}", player.current_time().await);
    println!("   Volume:    {:?}", player.volume().await);
    println!("   Muted:     {:?}", player.is_muted().await);
    println!("   Rates:     {:?}", player.playback_rates().await);

    // 5. Drive playback through the facade
    println!("\n5. Playing...");
    player.play().await;
    sleep(Duration::from_millis(50)).await;

    println!("\n6. Seeking to 42s...");
    player.seek(42.0).await;
    sleep(Duration::from_millis(50)).await;
    println!("   Position:  {:?}", player.current_time().await);

    // 7. The host container changed size; reconcile the iframe
    println!("\n7. Resizing...");
    surface.set_client(PlayerSize::new(640, 480));
    player.notify_resize().await;
    sleep(Duration::from_millis(50)).await;

    println!("\nExample complete!");
    Ok(())
}
