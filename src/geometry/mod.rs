//! Geometry engine.
//!
//! Pure functions turning a detected code's four corner points into the
//! rotation angle, padded bounding square, and crop region the overlay
//! driver presents. Nothing here touches the capture pipeline.

mod crop;
mod quad;
mod rect;

pub use crop::crop_to_quad;
pub use quad::Quad;
pub use rect::{Point, Rect, Size};
