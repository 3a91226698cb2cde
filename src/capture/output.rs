//! Session output sinks.
//!
//! [`MetadataOutput`] delivers decoded-code batches and [`VideoDataOutput`]
//! delivers raw frames. Each forwards onto its own serial queue; whether a
//! delivery is *consumed* is decided by the detection state machine, so the
//! two sinks can never be live at the same time.

use super::{Frame, PixelFormat};
use crate::detection::{MetadataBatch, NativeSymbology};
use crate::dispatch::QueueHandle;
use crate::geometry::Rect;
use std::sync::{Arc, Mutex, PoisonError};

type MetadataHandler = Arc<dyn Fn(MetadataBatch) + Send + Sync>;
type FrameHandler = Arc<dyn Fn(Frame) + Send + Sync>;

/// The code-metadata sink attached to the capture session.
pub struct MetadataOutput {
    symbologies: Mutex<Vec<NativeSymbology>>,
    rect_of_interest: Mutex<Option<Rect>>,
    handler: Mutex<Option<(QueueHandle, MetadataHandler)>>,
}

impl MetadataOutput {
    /// Creates an output with no symbology filter and no handler.
    pub fn new() -> Self {
        Self {
            symbologies: Mutex::new(Vec::new()),
            rect_of_interest: Mutex::new(None),
            handler: Mutex::new(None),
        }
    }

    /// Replaces the accepted symbology list.
    pub fn set_symbologies(&self, symbologies: Vec<NativeSymbology>) {
        *lock(&self.symbologies) = symbologies;
    }

    /// The currently accepted symbologies.
    pub fn symbologies(&self) -> Vec<NativeSymbology> {
        lock(&self.symbologies).clone()
    }

    /// Restricts detection to a rectangle in the output's own normalized,
    /// axis-rotated coordinate convention (see [`focus_rect_of_interest`]).
    pub fn set_rect_of_interest(&self, rect: Rect) {
        *lock(&self.rect_of_interest) = Some(rect);
    }

    /// The configured restriction rectangle, if any.
    pub fn rect_of_interest(&self) -> Option<Rect> {
        *lock(&self.rect_of_interest)
    }

    /// Installs the delivery callback and the queue it runs on.
    pub fn set_handler(&self, queue: QueueHandle, handler: MetadataHandler) {
        *lock(&self.handler) = Some((queue, handler));
    }

    /// Delivers a detection batch from the platform.
    ///
    /// Objects outside the configured symbology list are dropped, and a
    /// batch that only contained foreign types is not delivered at all; an
    /// originally empty batch goes through so the scanner can report the
    /// read failure.
    pub fn deliver(&self, batch: MetadataBatch) {
        let symbologies = lock(&self.symbologies).clone();
        let was_empty = batch.is_empty();
        let filtered: MetadataBatch = if symbologies.is_empty() {
            batch
        } else {
            batch
                .into_iter()
                .filter(|object| symbologies.contains(&object.symbology))
                .collect()
        };
        if !was_empty && filtered.is_empty() {
            tracing::trace!("metadata batch dropped: no configured symbologies present");
            return;
        }

        let handler = lock(&self.handler).clone();
        if let Some((queue, callback)) = handler {
            queue.dispatch(move || (*callback)(filtered));
        }
    }
}

impl Default for MetadataOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataOutput")
            .field("symbologies", &lock(&self.symbologies).len())
            .field("rect_of_interest", &*lock(&self.rect_of_interest))
            .finish()
    }
}

/// The raw-frame sink attached to the capture session.
pub struct VideoDataOutput {
    pixel_format: PixelFormat,
    handler: Mutex<Option<(QueueHandle, FrameHandler)>>,
}

impl VideoDataOutput {
    /// Creates an output requesting frames in `pixel_format`.
    pub fn new(pixel_format: PixelFormat) -> Self {
        Self {
            pixel_format,
            handler: Mutex::new(None),
        }
    }

    /// The pixel format requested from the platform.
    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }

    /// Installs the delivery callback and the queue it runs on.
    pub fn set_handler(&self, queue: QueueHandle, handler: FrameHandler) {
        *lock(&self.handler) = Some((queue, handler));
    }

    /// Delivers a raw frame from the platform.
    pub fn deliver(&self, frame: Frame) {
        let handler = lock(&self.handler).clone();
        if let Some((queue, callback)) = handler {
            queue.dispatch(move || (*callback)(frame));
        }
    }
}

impl std::fmt::Debug for VideoDataOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDataOutput")
            .field("pixel_format", &self.pixel_format)
            .finish()
    }
}

/// Maps the focus indicator's layout rectangle into the metadata output's
/// restriction convention.
///
/// Both rectangles are in view coordinates; the result is normalized against
/// `bounds` and rotated into the output's convention, which swaps the axes
/// and inverts y relative to view layout. The mapping is platform-derived
/// and intentionally not symmetric.
pub fn focus_rect_of_interest(focus: Rect, bounds: Rect) -> Rect {
    let width = focus.size.width / bounds.size.width;
    let height = focus.size.height / bounds.size.height;
    let x = focus.origin.x / bounds.size.width;
    let y = focus.origin.y / bounds.size.height;
    Rect::new(y, 1.0 - x - width, height, width)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
