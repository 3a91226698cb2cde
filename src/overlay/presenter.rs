//! Presentation collaborator.
//!
//! The host's view hierarchy and animation engine sit behind the
//! [`Presenter`] trait: layer attachment, whole-state animation with a
//! completion callback, the metadata-to-view coordinate transform, and the
//! hop onto the UI context. [`MockPresenter`] queues animations and
//! completes them on command, which is how tests prove the success callback
//! waits for the transition.

use super::OverlayState;
use crate::detection::MetadataObject;
use crate::geometry::Rect;
use image::RgbaImage;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// The presentation API consumed by the scanner.
///
/// Implementations own the UI context: `dispatch` must run jobs on it, and
/// `animate` must fire its completion there exactly once.
pub trait Presenter: Send + Sync {
    /// The scanner view's bounds in its own coordinate space.
    fn view_bounds(&self) -> Rect;

    /// Pixel-density factor mapping view coordinates into captured-frame
    /// pixels.
    fn display_scale(&self) -> f64 {
        1.0
    }

    /// Attaches the preview and indicator layers in their initial state.
    /// `focus_image` replaces the built-in focus artwork when present.
    fn attach_layers(&self, initial: &OverlayState, focus_image: Option<&RgbaImage>);

    /// Detaches every layer the presenter attached.
    fn detach_layers(&self);

    /// Applies an overlay state immediately, without animating.
    fn apply(&self, state: &OverlayState);

    /// Runs one eased, time-bounded transition to `target`, then invokes
    /// `completion` once on the UI context.
    fn animate(&self, duration: Duration, target: OverlayState, completion: Box<dyn FnOnce() + Send>);

    /// Shows the captured code image in the thumbnail indicator.
    fn set_thumbnail_image(&self, image: RgbaImage);

    /// Maps a delivered metadata object into view coordinates.
    ///
    /// Returns `None` when the object cannot be mapped (e.g. no preview
    /// layer); the detection is then silently dropped.
    fn transform_metadata(&self, object: &MetadataObject) -> Option<MetadataObject>;

    /// Runs `job` on the UI context.
    fn dispatch(&self, job: Box<dyn FnOnce() + Send>);
}

/// A queued animation inside [`MockPresenter`].
struct PendingAnimation {
    duration: Duration,
    target: OverlayState,
    completion: Box<dyn FnOnce() + Send>,
}

#[derive(Default)]
struct MockPresenterState {
    attached: bool,
    custom_focus_image: bool,
    applied: Option<OverlayState>,
    thumbnail_image: Option<RgbaImage>,
    pending: Vec<PendingAnimation>,
    completed: usize,
    fail_transforms: bool,
}

/// In-memory presenter for tests and demos.
///
/// `dispatch` runs jobs inline (the caller's thread stands in for the UI
/// context) and `animate` queues transitions until
/// [`complete_next_animation`](MockPresenter::complete_next_animation) is
/// called, modeling the platform's bounded-duration animation without a
/// clock.
pub struct MockPresenter {
    bounds: Rect,
    state: Mutex<MockPresenterState>,
}

impl MockPresenter {
    /// Creates a presenter for a view with the given bounds.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            state: Mutex::new(MockPresenterState::default()),
        }
    }

    /// Makes every subsequent metadata transform fail.
    pub fn fail_transforms(&self) {
        self.lock().fail_transforms = true;
    }

    /// Number of animations queued and not yet completed.
    pub fn pending_animations(&self) -> usize {
        self.lock().pending.len()
    }

    /// Number of animations whose completion has run.
    pub fn completed_animations(&self) -> usize {
        self.lock().completed
    }

    /// Finishes the oldest queued animation: applies its target state, then
    /// runs its completion. Returns `false` when nothing was pending.
    pub fn complete_next_animation(&self) -> bool {
        let animation = {
            let mut state = self.lock();
            if state.pending.is_empty() {
                return false;
            }
            let animation = state.pending.remove(0);
            state.applied = Some(animation.target);
            state.completed += 1;
            animation
        };
        tracing::debug!(duration_ms = animation.duration.as_millis() as u64, "mock animation completed");
        (animation.completion)();
        true
    }

    /// Whether layers are currently attached.
    pub fn attached(&self) -> bool {
        self.lock().attached
    }

    /// Whether a custom focus image was supplied at attach time.
    pub fn has_custom_focus_image(&self) -> bool {
        self.lock().custom_focus_image
    }

    /// The most recently applied overlay state.
    pub fn last_applied(&self) -> Option<OverlayState> {
        self.lock().applied
    }

    /// The thumbnail image, if one was assigned.
    pub fn thumbnail_image(&self) -> Option<RgbaImage> {
        self.lock().thumbnail_image.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockPresenterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Presenter for MockPresenter {
    fn view_bounds(&self) -> Rect {
        self.bounds
    }

    fn attach_layers(&self, initial: &OverlayState, focus_image: Option<&RgbaImage>) {
        let mut state = self.lock();
        state.attached = true;
        state.custom_focus_image = focus_image.is_some();
        state.applied = Some(*initial);
    }

    fn detach_layers(&self) {
        self.lock().attached = false;
    }

    fn apply(&self, state: &OverlayState) {
        self.lock().applied = Some(*state);
    }

    fn animate(
        &self,
        duration: Duration,
        target: OverlayState,
        completion: Box<dyn FnOnce() + Send>,
    ) {
        self.lock().pending.push(PendingAnimation {
            duration,
            target,
            completion,
        });
    }

    fn set_thumbnail_image(&self, image: RgbaImage) {
        self.lock().thumbnail_image = Some(image);
    }

    fn transform_metadata(&self, object: &MetadataObject) -> Option<MetadataObject> {
        if self.lock().fail_transforms {
            None
        } else {
            Some(object.clone())
        }
    }

    fn dispatch(&self, job: Box<dyn FnOnce() + Send>) {
        job();
    }
}

impl std::fmt::Debug for MockPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MockPresenter")
            .field("bounds", &self.bounds)
            .field("attached", &state.attached)
            .field("pending", &state.pending.len())
            .field("completed", &state.completed)
            .finish()
    }
}
