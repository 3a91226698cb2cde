//! Overlay indicator geometry.

use crate::geometry::Rect;

/// Placement of one overlay indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorFrame {
    /// The indicator's frame in view coordinates.
    pub rect: Rect,
    /// Rotation in radians applied around the frame's center.
    pub rotation: f64,
}

impl IndicatorFrame {
    /// An axis-aligned indicator at `rect`.
    pub const fn axis_aligned(rect: Rect) -> Self {
        Self {
            rect,
            rotation: 0.0,
        }
    }
}

/// The two overlay indicators, always updated together.
///
/// The focus indicator frames the area expected (or found) to contain a
/// code; the thumbnail indicator shows the captured code image once the
/// transition completes. A transition applies a whole `OverlayState` at
/// once, so the pair is never observed half-updated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayState {
    /// The focus indicator.
    pub focus: IndicatorFrame,
    /// The captured-code thumbnail indicator.
    pub thumbnail: IndicatorFrame,
}
