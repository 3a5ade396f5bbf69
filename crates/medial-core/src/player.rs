//! MEDIAL player adapter - main orchestrator
//!
//! Coordinates:
//! - Share-link resolution into the embed URL
//! - Visibility-gated, at-most-once frame creation
//! - Bridging script load and remote connection
//! - Capability-guarded playback facade
//! - Remote event reconciliation and the mute/volume poll

use crate::{
    bridge::{BridgeEvent, BridgeHandle, BridgeTransport, Capability, PlayerBridge, ScriptGate},
    events::{EventEmitter, PlayerEvent},
    layout, link,
    surface::{EmbedSurface, FrameRequest},
    types::*,
    Error, Result,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Adapter instance controlling one embedded MEDIAL player
pub struct MedialPlayer {
    shared: Arc<Shared>,
}

struct Shared {
    /// Stable DOM element id for the placeholder and the frame
    id: ElementId,
    /// Sources as handed over by the host
    sources: Vec<VideoSource>,
    /// Resolved embed URL
    embed: Url,
    /// Adapter configuration
    options: PlayerOptions,
    /// Translatable strings
    l10n: Localization,
    /// DOM seam
    surface: Arc<dyn EmbedSurface>,
    /// Script and connection seam
    transport: Arc<dyn BridgeTransport>,
    /// Load-once gate for the shared bridging script
    script_gate: ScriptGate,
    /// Host-facing event registry
    emitter: EventEmitter,
    /// Deferred-creation state machine
    lifecycle: RwLock<LifecycleState>,
    /// Remote connection; absent until the duration probe completes
    bridge: RwLock<Option<Arc<dyn PlayerBridge>>>,
    /// Last known remote playback state
    snapshot: RwLock<PlaybackSnapshot>,
    /// Play was requested before the connection existed
    pending_play: AtomicBool,
    /// Background tasks, aborted on drop
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl MedialPlayer {
    /// True if this adapter can play the given sources.
    ///
    /// Only the first source is considered, and only its URL shape.
    pub fn can_handle(sources: &[VideoSource]) -> bool {
        sources
            .first()
            .map(|source| link::is_share_link(&source.url))
            .unwrap_or(false)
    }

    /// Create an adapter for the given sources.
    ///
    /// The embed URL is resolved eagerly: an empty source list or a first
    /// source that is not a share link is rejected here instead of at mount
    /// time. Uses the process-wide script gate.
    pub fn new(
        sources: Vec<VideoSource>,
        options: PlayerOptions,
        l10n: Localization,
        surface: Arc<dyn EmbedSurface>,
        transport: Arc<dyn BridgeTransport>,
    ) -> Result<Self> {
        Self::with_script_gate(
            sources,
            options,
            l10n,
            surface,
            transport,
            ScriptGate::global(),
        )
    }

    /// Like [`MedialPlayer::new`] with an explicit script gate, for hosts
    /// embedding into more than one document
    pub fn with_script_gate(
        sources: Vec<VideoSource>,
        options: PlayerOptions,
        l10n: Localization,
        surface: Arc<dyn EmbedSurface>,
        transport: Arc<dyn BridgeTransport>,
        script_gate: ScriptGate,
    ) -> Result<Self> {
        let first = sources.first().ok_or(Error::MissingSource)?;
        let embed = link::embed_url(&first.url)?;
        let id = ElementId::next();

        info!(id = %id, embed = %embed, "MEDIAL player created");

        Ok(Self {
            shared: Arc::new(Shared {
                id,
                sources,
                embed,
                options,
                l10n,
                surface,
                transport,
                script_gate,
                emitter: EventEmitter::new(),
                lifecycle: RwLock::new(LifecycleState::Uncreated),
                bridge: RwLock::new(None),
                snapshot: RwLock::new(PlaybackSnapshot::default()),
                pending_play: AtomicBool::new(false),
                tasks: StdMutex::new(Vec::new()),
            }),
        })
    }

    /// Stable DOM element id of this instance
    pub fn id(&self) -> &ElementId {
        &self.shared.id
    }

    /// Sources handed over at construction
    pub fn sources(&self) -> &[VideoSource] {
        &self.shared.sources
    }

    /// Resolved embed URL the frame navigates to
    pub fn embed_url(&self) -> &Url {
        &self.shared.embed
    }

    /// Host-facing event registry
    pub fn events(&self) -> &EventEmitter {
        &self.shared.emitter
    }

    /// Current lifecycle state
    pub async fn lifecycle(&self) -> LifecycleState {
        *self.shared.lifecycle.read().await
    }

    /// Insert the loading placeholder and attempt creation.
    ///
    /// Creation stays deferred while the placeholder is not visible; later
    /// visibility and resize notifications retry it.
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn append_to(&self) -> Result<()> {
        self.shared
            .surface
            .append_placeholder(&self.shared.id, &self.shared.l10n.loading)?;
        Arc::clone(&self.shared).try_create().await;
        Ok(())
    }

    /// Notify the adapter that the host made it visible
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn notify_visible(&self) {
        Arc::clone(&self.shared).try_create().await;
    }

    /// Notify the adapter that the host resized its container.
    ///
    /// No-op while the wrapper is hidden. Re-triggers creation when no
    /// connection exists yet; otherwise recomputes the frame size from the
    /// wrapper's client size.
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn notify_resize(&self) {
        let shared = &self.shared;

        if !shared.surface.wrapper_visible() {
            return;
        }

        // A resize may be the first moment the player is actually visible.
        if shared.bridge.read().await.is_none() {
            Arc::clone(shared).try_create().await;
            return;
        }

        shared.surface.fill_container();
        let client = shared.surface.client_size();
        if let Some(size) = layout::resize_size(client, shared.options.fit) {
            debug!(id = %shared.id, size = %size, "Resizing frame");
            shared.surface.resize_frame(&shared.id, size);
        }
    }

    // -- playback facade -----------------------------------------------

    /// Start playback.
    ///
    /// Before the connection exists this queues one deferred play that
    /// fires when the player connects; queueing twice still plays once.
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn play(&self) {
        let bridge = self.shared.bridge.read().await.clone();
        match bridge {
            None => {
                self.shared.pending_play.store(true, Ordering::SeqCst);
                debug!(id = %self.shared.id, "Play requested before connection; deferred");
            }
            Some(controls) => self.shared.play_if_supported(&controls).await,
        }
    }

    /// Pause playback. Always cancels a pending deferred play.
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn pause(&self) {
        self.shared.pending_play.store(false, Ordering::SeqCst);
        if let Some(controls) = self.shared.bridge_if(Capability::Pause).await {
            if let Err(err) = controls.pause().await {
                warn!(id = %self.shared.id, error = %err, "Pause failed");
            }
        }
    }

    /// Seek to a position in seconds.
    ///
    /// Pauses before moving the clock; seeking backwards while playing
    /// desynchronizes the remote clock otherwise.
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn seek(&self, time: f64) {
        if let Some(controls) = self.shared.bridge_if(Capability::SetCurrentTime).await {
            if let Err(err) = controls.pause().await {
                debug!(id = %self.shared.id, error = %err, "Seek pause failed");
            }
            if let Err(err) = controls.set_current_time(time).await {
                warn!(id = %self.shared.id, error = %err, "Seek failed");
            }
        }
    }

    /// Mute the remote player
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn mute(&self) {
        if let Some(controls) = self.shared.bridge_if(Capability::Mute).await {
            if let Err(err) = controls.mute().await {
                warn!(id = %self.shared.id, error = %err, "Mute failed");
            }
        }
    }

    /// Unmute the remote player
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn unmute(&self) {
        if let Some(controls) = self.shared.bridge_if(Capability::Unmute).await {
            if let Err(err) = controls.unmute().await {
                warn!(id = %self.shared.id, error = %err, "Unmute failed");
            }
        }
    }

    /// Set the volume level, 0-100
    #[instrument(skip(self), fields(id = %self.shared.id))]
    pub async fn set_volume(&self, level: f64) {
        if let Some(controls) = self.shared.bridge_if(Capability::SetVolume).await {
            if let Err(err) = controls.set_volume(level).await {
                warn!(id = %self.shared.id, error = %err, "Volume change failed");
            }
        }
    }

    /// Last known playback position in seconds
    pub async fn current_time(&self) -> Option<f64> {
        self.shared.snapshot.read().await.position
    }

    /// Last known content duration in seconds
    pub async fn duration(&self) -> Option<f64> {
        self.shared.snapshot.read().await.duration
    }

    /// Last known buffered fraction, 0-1
    pub async fn buffered(&self) -> Option<f64> {
        self.shared.snapshot.read().await.buffered
    }

    /// Last polled mute flag
    pub async fn is_muted(&self) -> Option<bool> {
        self.shared.snapshot.read().await.muted
    }

    /// Last polled volume level, 0-100
    pub async fn volume(&self) -> Option<f64> {
        self.shared.snapshot.read().await.volume
    }

    /// Force an immediate refresh of the polled mute/volume snapshot
    pub async fn refresh_remote_state(&self) {
        if let Some(controls) = self.shared.bridge.read().await.clone() {
            self.shared.refresh_remote_state(&controls).await;
        }
    }

    /// Supported playback rates.
    ///
    /// The protocol has no rate control, so the only rate is 1.0 - and
    /// only once a connection exists.
    pub async fn playback_rates(&self) -> Option<Vec<f64>> {
        if self.shared.bridge.read().await.is_some() {
            Some(vec![1.0])
        } else {
            None
        }
    }

    /// Current playback rate; always 1.0 once connected
    pub async fn playback_rate(&self) -> Option<f64> {
        if self.shared.bridge.read().await.is_some() {
            Some(1.0)
        } else {
            None
        }
    }

    /// The protocol has no rate control; accepted and ignored
    pub fn set_playback_rate(&self, _rate: f64) {}

    /// Captions are selected on the embed page itself, never over the bridge
    pub fn captions_track(&self) -> Option<CaptionsTrack> {
        None
    }

    /// The protocol has no captions calls; accepted and ignored
    pub fn set_captions_track(&self, _track: Option<CaptionsTrack>) {}

    /// The bridge reports no quality ladder
    pub fn qualities(&self) -> Option<Vec<String>> {
        None
    }

    /// The bridge reports no quality ladder
    pub fn quality(&self) -> Option<String> {
        None
    }

    /// The protocol has no quality switching; accepted and ignored
    pub fn set_quality(&self, _quality: &str) {}

    /// Some devices require a user gesture before playback can start;
    /// the host reads this flag and renders a play overlay
    pub fn press_to_play(&self) -> bool {
        true
    }
}

impl Drop for MedialPlayer {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.shared.tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

impl Shared {
    /// Test-and-set creation gate.
    ///
    /// Only the first caller that finds the instance Uncreated with a
    /// visible placeholder proceeds; everyone else returns immediately.
    /// The mount chain runs in a task so callers never block on it.
    async fn try_create(self: Arc<Self>) {
        {
            let mut lifecycle = self.lifecycle.write().await;
            if *lifecycle != LifecycleState::Uncreated {
                return;
            }
            if !self.surface.placeholder_visible() {
                debug!(id = %self.id, "Placeholder not visible; deferring creation");
                return;
            }
            info!(
                id = %self.id,
                from = %*lifecycle,
                to = %LifecycleState::Creating,
                "Lifecycle transition"
            );
            *lifecycle = LifecycleState::Creating;
        }

        let size = layout::creation_size(self.surface.wrapper_width());
        let shared = Arc::clone(&self);
        let task = tokio::spawn(async move {
            shared.materialize(size).await;
        });
        self.push_task(task);
    }

    /// Mount the frame, load the shared script, open the connection.
    ///
    /// A failed mount reverts to Uncreated so later notifications retry.
    /// Script or connection failures leave the instance in BridgeLoading;
    /// the facade keeps degrading silently.
    async fn materialize(self: Arc<Self>, size: PlayerSize) {
        let frame = FrameRequest::new(self.id.clone(), self.embed.clone(), size);

        if let Err(err) = self.surface.mount_frame(&frame).await {
            warn!(id = %self.id, error = %err, "Frame mount failed; reverting");
            if let Err(err) = self.advance_lifecycle(LifecycleState::Uncreated).await {
                warn!(id = %self.id, error = %err, "Lifecycle revert failed");
            }
            return;
        }

        if let Err(err) = self.advance_lifecycle(LifecycleState::BridgeLoading).await {
            warn!(id = %self.id, error = %err, "Lifecycle advance failed");
            return;
        }

        if let Err(err) = self.script_gate.ensure(self.transport.as_ref()).await {
            warn!(id = %self.id, error = %err, "Bridging script failed to load");
            return;
        }

        match self.transport.connect(&self.id).await {
            Ok(BridgeHandle { controls, events }) => {
                let shared = Arc::clone(&self);
                let task = tokio::spawn(async move {
                    shared.drive_bridge(controls, events).await;
                });
                self.push_task(task);
            }
            Err(err) => {
                warn!(id = %self.id, error = %err, "Bridge connection failed");
            }
        }
    }

    /// Consume the bridge event stream for the life of the connection.
    ///
    /// Events before `ready` are dropped. The first timeupdate after ready
    /// exists only to reveal the duration; playback state events are
    /// honored from then on.
    async fn drive_bridge(
        self: Arc<Self>,
        controls: Arc<dyn PlayerBridge>,
        mut events: mpsc::UnboundedReceiver<BridgeEvent>,
    ) {
        let mut ready = false;
        let mut duration_known = false;

        while let Some(event) = events.recv().await {
            match event {
                BridgeEvent::Ready => {
                    if !ready {
                        ready = true;
                        self.start_duration_probe(&controls).await;
                    }
                }
                _ if !ready => {
                    debug!(id = %self.id, event = ?event, "Dropping pre-ready bridge event");
                }
                BridgeEvent::TimeUpdate { seconds, duration } => {
                    if duration_known {
                        let mut snapshot = self.snapshot.write().await;
                        snapshot.position = Some(seconds);
                        snapshot.duration = Some(duration);
                    } else {
                        duration_known = true;
                        Arc::clone(&self)
                            .finish_duration_probe(&controls, seconds, duration)
                            .await;
                    }
                }
                BridgeEvent::Progress { percent } => {
                    self.snapshot.write().await.buffered = Some(percent);
                }
                BridgeEvent::Play if duration_known => {
                    self.emit_state(Some(PlaybackState::Playing));
                }
                BridgeEvent::Pause if duration_known => {
                    self.emit_state(Some(PlaybackState::Paused));
                }
                BridgeEvent::Ended if duration_known => {
                    self.emit_state(Some(PlaybackState::Ended));
                }
                _ => {}
            }
        }

        debug!(id = %self.id, "Bridge event stream closed");
    }

    /// The remote player only reveals its duration once playback starts,
    /// so start muted; the first timeupdate rolls everything back.
    async fn start_duration_probe(&self, controls: &Arc<dyn PlayerBridge>) {
        info!(id = %self.id, "Remote player ready; probing for duration");
        if let Err(err) = controls.mute().await {
            debug!(id = %self.id, error = %err, "Probe mute failed");
        }
        if let Err(err) = controls.play().await {
            debug!(id = %self.id, error = %err, "Probe play failed");
        }
    }

    /// Roll the duration probe back and declare the instance connected.
    ///
    /// Order matters for the host: the connection handle is stored before
    /// `loaded`/`ready` fire, the deferred play runs between `ready` and
    /// the bare state change that makes the host show its chrome.
    async fn finish_duration_probe(
        self: Arc<Self>,
        controls: &Arc<dyn PlayerBridge>,
        seconds: f64,
        duration: f64,
    ) {
        if let Err(err) = controls.set_current_time(0.0).await {
            debug!(id = %self.id, error = %err, "Probe rewind failed");
        }
        if let Err(err) = controls.pause().await {
            debug!(id = %self.id, error = %err, "Probe pause failed");
        }
        if let Err(err) = controls.unmute().await {
            debug!(id = %self.id, error = %err, "Probe unmute failed");
        }

        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.duration = Some(duration);
            snapshot.position = Some(seconds);
        }
        self.refresh_remote_state(controls).await;

        *self.bridge.write().await = Some(Arc::clone(controls));
        if let Err(err) = self.advance_lifecycle(LifecycleState::Connected).await {
            warn!(id = %self.id, error = %err, "Lifecycle advance failed");
        }

        info!(id = %self.id, duration = duration, "Remote player connected");
        self.emitter.emit(&PlayerEvent::Loaded);
        self.emitter.emit(&PlayerEvent::Ready);

        if self.pending_play.swap(false, Ordering::SeqCst) {
            self.play_if_supported(controls).await;
        }

        // Payload-less state change; the host shows its chrome on it.
        self.emit_state(None);

        let shared = Arc::clone(&self);
        let poll_controls = Arc::clone(controls);
        let task = tokio::spawn(async move {
            shared.poll_remote(poll_controls).await;
        });
        self.push_task(task);
    }

    /// Refresh cached mute/volume forever; the remote does not push these
    async fn poll_remote(self: Arc<Self>, controls: Arc<dyn PlayerBridge>) {
        // tokio::time::interval rejects a zero period.
        let period = self.options.poll_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_remote_state(&controls).await;
        }
    }

    /// One poll round: capability-guarded volume/mute queries. A failed
    /// query keeps the previous cached value until the next round.
    async fn refresh_remote_state(&self, controls: &Arc<dyn PlayerBridge>) {
        if controls.supports(Capability::GetMuted) {
            match controls.muted().await {
                Ok(muted) => self.snapshot.write().await.muted = Some(muted),
                Err(err) => debug!(id = %self.id, error = %err, "Mute query failed"),
            }
        }
        if controls.supports(Capability::GetVolume) {
            match controls.volume().await {
                Ok(volume) => self.snapshot.write().await.volume = Some(volume),
                Err(err) => debug!(id = %self.id, error = %err, "Volume query failed"),
            }
        }
    }

    async fn play_if_supported(&self, controls: &Arc<dyn PlayerBridge>) {
        if !controls.supports(Capability::Play) {
            debug!(id = %self.id, "Remote player does not support play");
            return;
        }
        if let Err(err) = controls.play().await {
            warn!(id = %self.id, error = %err, "Play failed");
        }
    }

    /// Connection handle if it exists and reports the capability
    async fn bridge_if(&self, capability: Capability) -> Option<Arc<dyn PlayerBridge>> {
        let bridge = self.bridge.read().await.clone()?;
        if bridge.supports(capability) {
            Some(bridge)
        } else {
            debug!(
                id = %self.id,
                capability = %capability,
                "Capability not supported; ignoring"
            );
            None
        }
    }

    async fn advance_lifecycle(&self, to: LifecycleState) -> Result<()> {
        let mut lifecycle = self.lifecycle.write().await;
        let from = *lifecycle;
        if !from.can_transition_to(to) {
            return Err(Error::InvalidLifecycleTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        *lifecycle = to;
        info!(id = %self.id, from = %from, to = %to, "Lifecycle transition");
        Ok(())
    }

    fn emit_state(&self, state: Option<PlaybackState>) {
        self.emitter.emit(&PlayerEvent::StateChange { state });
    }

    fn push_task(&self, task: JoinHandle<()>) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_handle_share_links() {
        let sources = vec![VideoSource::new(
            "https://media.example.ac.uk/Player/oT9122Fc",
            "video/medial",
        )];
        assert!(MedialPlayer::can_handle(&sources));
    }

    #[test]
    fn test_can_handle_rejects_other_urls() {
        let sources = vec![VideoSource::new(
            "https://media.example.ac.uk/Watch/oT9122Fc",
            "video/medial",
        )];
        assert!(!MedialPlayer::can_handle(&sources));
        assert!(!MedialPlayer::can_handle(&[]));
    }

    #[test]
    fn test_can_handle_checks_first_source_only() {
        let sources = vec![
            VideoSource::new("https://cdn.example.com/clip.mp4", "video/mp4"),
            VideoSource::new("https://media.example.ac.uk/Player/oT9122Fc", "video/medial"),
        ];
        assert!(!MedialPlayer::can_handle(&sources));
    }
}
