//! Iframe sizing for the embedded player
//!
//! The remote page renders a 16:9 video with a control bar underneath, so
//! computed heights carry a small fixed pad on top of the aspect ratio.
//! All math is in integer logical units.

use crate::types::PlayerSize;

/// Frames narrower than this render an unusable control bar
pub const MIN_FRAME_WIDTH: u32 = 200;

/// Control bar allowance added to the 16:9 height
pub const FRAME_HEIGHT_PAD: u32 = 8;

/// 16:9 height for a given width, plus the control bar pad
pub fn aspect_height(width: u32) -> u32 {
    width * 9 / 16 + FRAME_HEIGHT_PAD
}

/// Initial frame size for a wrapper measured at `wrapper_width`.
///
/// Width is floored at [`MIN_FRAME_WIDTH`]. The floor applies at creation
/// only, never on later resizes.
pub fn creation_size(wrapper_width: u32) -> PlayerSize {
    let width = wrapper_width.max(MIN_FRAME_WIDTH);
    PlayerSize::new(width, aspect_height(width))
}

/// Target frame size for a resize against the wrapper's client size.
///
/// `fit` stretches to the full client height instead of the 16:9 formula.
/// Returns `None` when the computed height is not positive (a collapsed
/// wrapper reports zero); the caller leaves the frame untouched.
pub fn resize_size(client: PlayerSize, fit: bool) -> Option<PlayerSize> {
    let height = if fit {
        client.height
    } else {
        aspect_height(client.width)
    };
    (height > 0).then(|| PlayerSize::new(client.width, height))
}
