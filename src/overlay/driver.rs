//! The overlay driver.
//!
//! Computes the indicator layout for each phase of a scan cycle and owns
//! the [`OverlayState`] between transitions. All mutation happens on the
//! presentation context.

use super::{IndicatorFrame, OverlayState};
use crate::geometry::{Point, Quad, Rect, Size};

/// Focus indicator side as a fraction of the view width.
pub const FOCUS_SIDE_RATIO: f64 = 0.618;

/// Focus indicator origin as a fraction of the view dimensions.
pub const FOCUS_ORIGIN_RATIO: f64 = 0.191;

/// Drives the focus and thumbnail indicators through a scan cycle.
#[derive(Debug)]
pub struct OverlayDriver {
    state: OverlayState,
}

impl OverlayDriver {
    /// Creates a driver with the resting layout for `view_bounds`.
    pub fn new(view_bounds: Rect) -> Self {
        Self {
            state: Self::initial_layout(view_bounds),
        }
    }

    /// The resting layout: the focus indicator square framing the likely
    /// code area, the thumbnail collapsed to nothing.
    pub fn initial_layout(view_bounds: Rect) -> OverlayState {
        let side = view_bounds.size.width * FOCUS_SIDE_RATIO;
        let origin = Point::new(
            view_bounds.origin.x + view_bounds.size.width * FOCUS_ORIGIN_RATIO,
            view_bounds.origin.y + view_bounds.size.height * FOCUS_ORIGIN_RATIO,
        );
        OverlayState {
            focus: IndicatorFrame::axis_aligned(Rect {
                origin,
                size: Size::square(side),
            }),
            thumbnail: IndicatorFrame::axis_aligned(Rect::zero()),
        }
    }

    /// The target layout for a detected code.
    ///
    /// The focus indicator becomes a square of the padded bounding side,
    /// centered on the polygon bounds' center and rotated by the computed
    /// angle; the thumbnail indicator takes the polygon bounds themselves.
    pub fn detection_target(quad: &Quad, padding: f64) -> OverlayState {
        let bounds = quad.bounds();
        let center = bounds.center();
        let side = quad.bounding_side(padding);
        OverlayState {
            focus: IndicatorFrame {
                rect: Rect::centered_at(center, Size::square(side)),
                rotation: quad.rotation_angle(),
            },
            thumbnail: IndicatorFrame::axis_aligned(Rect::centered_at(center, bounds.size)),
        }
    }

    /// Adopts the detection target as the current state and returns it for
    /// the presenter to animate to.
    pub fn begin_transition(&mut self, quad: &Quad, padding: f64) -> OverlayState {
        let target = Self::detection_target(quad, padding);
        tracing::debug!(
            rotation = target.focus.rotation,
            side = target.focus.rect.size.width,
            "overlay transition"
        );
        self.state = target;
        target
    }

    /// The current overlay state.
    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    /// The focus indicator's current frame, used for the restricted
    /// detection rectangle.
    pub fn focus_rect(&self) -> Rect {
        self.state.focus.rect
    }
}
