//! Detection batches delivered by the metadata sink.

use super::NativeSymbology;
use crate::geometry::Quad;

/// One recognized object inside a detection batch.
///
/// Corners and payload are optional because the platform can deliver
/// partially-decoded objects; the state machine silently ignores those.
#[derive(Debug, Clone)]
pub struct MetadataObject {
    /// The symbology the platform recognized.
    pub symbology: NativeSymbology,
    /// Decoded text, when the platform managed to decode it.
    pub payload: Option<String>,
    /// The code's four corner points, when available.
    pub corners: Option<Quad>,
}

impl MetadataObject {
    /// Convenience constructor for a fully-decoded QR object.
    pub fn qr(payload: impl Into<String>, corners: Quad) -> Self {
        Self {
            symbology: NativeSymbology::Qr,
            payload: Some(payload.into()),
            corners: Some(corners),
        }
    }
}

/// A batch of recognized objects, delivered in detection order.
pub type MetadataBatch = Vec<MetadataObject>;

/// A code accepted by the state machine: decoded text plus its
/// view-space quadrilateral. Created once per armed cycle and consumed by
/// the presentation step.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The decoded text reported to the host on success.
    pub code: String,
    /// The code's corner points in view coordinates.
    pub corners: Quad,
}
