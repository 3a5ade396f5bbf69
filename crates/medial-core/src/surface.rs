//! Embedding surface
//!
//! Seam to the DOM-like environment the adapter renders into.
//! Implementations own the actual elements; the adapter only issues
//! placements, measurements and size updates, all addressed by the
//! instance's [`ElementId`].

use crate::types::{ElementId, PlayerSize};
use crate::Result;
use async_trait::async_trait;
use url::Url;

/// Permission policy granted to the embedded frame
pub const FRAME_PERMISSIONS: &str = "accelerometer; fullscreen";

/// Everything needed to mount the player frame
#[derive(Debug, Clone)]
pub struct FrameRequest {
    /// Element id of the frame (and of the placeholder it replaces)
    pub id: ElementId,
    /// Embed URL the frame navigates to
    pub src: Url,
    /// Initial frame size
    pub size: PlayerSize,
    /// Permission policy for the frame
    pub allow: String,
}

impl FrameRequest {
    pub fn new(id: ElementId, src: Url, size: PlayerSize) -> Self {
        Self {
            id,
            src,
            size,
            allow: FRAME_PERMISSIONS.to_string(),
        }
    }
}

/// DOM seam the adapter drives, one surface per instance.
///
/// Visibility and measurement calls are synchronous reads of current
/// layout. [`EmbedSurface::mount_frame`] resolves once the frame's
/// document has finished loading.
#[async_trait]
pub trait EmbedSurface: Send + Sync {
    /// Insert the loading placeholder into the host container
    fn append_placeholder(&self, id: &ElementId, loading_label: &str) -> Result<()>;

    /// Whether the placeholder is currently visible
    fn placeholder_visible(&self) -> bool;

    /// Whether the wrapper element is currently visible
    fn wrapper_visible(&self) -> bool;

    /// Current wrapper width in logical units
    fn wrapper_width(&self) -> u32;

    /// Replace the placeholder with the player frame
    async fn mount_frame(&self, frame: &FrameRequest) -> Result<()>;

    /// Stretch the wrapper to fill its container
    fn fill_container(&self);

    /// Wrapper client size after layout
    fn client_size(&self) -> PlayerSize;

    /// Apply a new size to the mounted frame
    fn resize_frame(&self, id: &ElementId, size: PlayerSize);
}
