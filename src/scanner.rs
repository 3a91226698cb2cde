//! The scanner: capture coordination from `configure` to the success
//! callback.
//!
//! A [`Scanner`] owns the capture session, the detection state machine, the
//! overlay driver, and the result channel, and moves work between three
//! contexts: the metadata/session queue, the video-data queue, and the
//! presentation context owned by the [`Presenter`]. Asynchronous
//! continuations hold only [`Weak`] handles, so a torn-down scanner drops
//! pending work instead of touching freed state — except that an animation
//! completion already handed to the presenter still runs, and is absorbed
//! by the dead handle.

use crate::capture::{
    focus_rect_of_interest, AuthorizationStatus, CaptureBackend, CaptureSession, Frame,
    MetadataOutput, PixelFormat, ResolvedConfig, RunningState, ScanConfiguration,
    SessionTopology, VideoDataOutput,
};
use crate::detection::{native_symbologies_for, BatchOutcome, DetectionMachine, MetadataBatch};
use crate::dispatch::SerialQueue;
use crate::error::ScanError;
use crate::geometry::crop_to_quad;
use crate::overlay::{OverlayDriver, Presenter};
use crate::report::{CompletionHandler, ResultChannel, ScanDelegate};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// An embeddable camera code scanner.
///
/// Construct it with the host's capture backend and presenter, `configure`
/// it, then `start_running`. The first qualifying detection drives the
/// focus-indicator transition and reports the decoded text through the
/// configured delegate and/or completion handler.
pub struct Scanner {
    inner: Arc<Inner>,
}

struct Inner {
    weak_self: Weak<Inner>,
    backend: Arc<Mutex<Box<dyn CaptureBackend>>>,
    presenter: Arc<dyn Presenter>,
    session: Mutex<CaptureSession>,
    machine: Mutex<DetectionMachine>,
    driver: Mutex<OverlayDriver>,
    config: Mutex<ResolvedConfig>,
    reporter: ResultChannel,
    metadata_queue: SerialQueue,
    video_queue: SerialQueue,
}

impl Scanner {
    /// Creates a scanner over the host's capture backend and presenter.
    pub fn new(backend: impl CaptureBackend + 'static, presenter: Arc<dyn Presenter>) -> Self {
        let view_bounds = presenter.view_bounds();
        let inner = Arc::new_cyclic(|weak| Inner {
            weak_self: weak.clone(),
            backend: Arc::new(Mutex::new(Box::new(backend))),
            presenter,
            session: Mutex::new(CaptureSession::new()),
            machine: Mutex::new(DetectionMachine::new()),
            driver: Mutex::new(OverlayDriver::new(view_bounds)),
            config: Mutex::new(ResolvedConfig::default()),
            reporter: ResultChannel::new(),
            metadata_queue: SerialQueue::spawn("scanview-metadata"),
            video_queue: SerialQueue::spawn("scanview-video-data"),
        });
        Self { inner }
    }

    /// Applies configuration and sets up the capture session.
    ///
    /// Only fields `configuration` carries override the current settings.
    /// A session setup failure is reported through the result channel and
    /// aborts the remaining capture setup, but the presentation layers are
    /// attached regardless, so the host still sees the overlay.
    pub fn configure(
        &self,
        delegate: Option<Arc<dyn ScanDelegate>>,
        configuration: ScanConfiguration,
        completion: Option<CompletionHandler>,
    ) {
        let inner = &self.inner;
        inner.reporter.set_delegate(delegate);
        if let Some(completion) = completion {
            inner.reporter.set_completion(Some(completion));
        }

        match configuration.validate() {
            Ok(()) => lock(&inner.config).merge(&configuration),
            Err(error) => {
                tracing::warn!(%error, "configuration rejected");
                inner.reporter.failure(&ScanError::Unknown);
            }
        }

        if let Err(error) = inner.setup_session() {
            tracing::warn!(%error, "session setup failed");
            inner.reporter.failure(&error);
        }

        // Presentation still goes up when capture setup failed.
        let (initial, focus_image, restrict) = {
            let driver = lock(&inner.driver);
            let config = lock(&inner.config);
            (
                *driver.state(),
                config.focus_image.clone(),
                config.restrict_to_focus,
            )
        };
        inner
            .presenter
            .attach_layers(&initial, focus_image.as_ref());

        if restrict {
            let focus = lock(&inner.driver).focus_rect();
            let rect = focus_rect_of_interest(focus, inner.presenter.view_bounds());
            let session = lock(&inner.session);
            if let Some(topology) = session.topology() {
                topology.metadata_output.set_rect_of_interest(rect);
            }
        }
    }

    /// Arms the scanner and starts the capture session.
    ///
    /// No-op when the camera is not authorized, when nothing is configured,
    /// or when the session is already starting or running.
    pub fn start_running(&self) {
        let inner = &self.inner;
        let status = lock(&inner.backend).authorization_status();
        if status != AuthorizationStatus::Authorized {
            tracing::debug!(%status, "start ignored: not authorized");
            return;
        }
        {
            let mut session = lock(&inner.session);
            if session.is_running() {
                return;
            }
            if session.topology().is_none() {
                tracing::debug!("start ignored: session not configured");
                return;
            }
            session.set_running_state(RunningState::Starting);
        }
        lock(&inner.machine).rearm();
        inner.reporter.rearm();
        inner.start_session_async();
    }

    /// Stops the capture session. No-op when not running.
    pub fn stop_running(&self) {
        self.inner.stop_running(RunningState::Stopped);
    }

    /// Toggles the torch, reporting the outcome through the result channel.
    pub fn set_torch_active(&self, on: bool) {
        let result = lock(&self.inner.backend).set_torch(on);
        match result {
            Ok(is_on) => self.inner.reporter.torch_changed(is_on),
            Err(error) => self.inner.reporter.failure(&error),
        }
    }

    /// Current session lifecycle state.
    pub fn running_state(&self) -> RunningState {
        lock(&self.inner.session).running_state()
    }

    /// The metadata sink, once configured. Deliveries feed the detection
    /// state machine.
    pub fn metadata_output(&self) -> Option<Arc<MetadataOutput>> {
        lock(&self.inner.session)
            .topology()
            .map(|topology| Arc::clone(&topology.metadata_output))
    }

    /// The raw-frame sink, once configured.
    pub fn video_data_output(&self) -> Option<Arc<VideoDataOutput>> {
        lock(&self.inner.session)
            .topology()
            .map(|topology| Arc::clone(&topology.video_output))
    }

    /// Blocks until both delivery queues have drained. Deterministic tests
    /// and orderly shutdowns call this between deliveries and assertions.
    pub fn flush(&self) {
        self.inner.metadata_queue.sync();
        self.inner.video_queue.sync();
    }
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("running", &lock(&self.inner.session).running_state())
            .finish()
    }
}

impl Inner {
    /// Builds and installs the session topology, or reports why it cannot.
    ///
    /// Every acceptance check runs before anything is attached, so the swap
    /// is all-or-nothing. When authorization is still undetermined the
    /// metadata sink is armed and the session started pre-emptively; the
    /// platform prompt resolves asynchronously.
    fn setup_session(&self) -> Result<(), ScanError> {
        let (input, status) = {
            let mut backend = lock(&self.backend);
            let device = backend.default_video_device()?;
            let input = backend.make_input(&device)?;
            if !backend.can_add_input(&input) {
                return Err(ScanError::InputInvalid);
            }
            if !backend.can_add_metadata_output() {
                return Err(ScanError::MetadataOutputFailure);
            }
            if !backend.can_add_video_data_output() {
                return Err(ScanError::VideoDataOutputFailure);
            }
            (input, backend.authorization_status())
        };

        let metadata_output = Arc::new(MetadataOutput::new());
        metadata_output.set_symbologies(native_symbologies_for(&lock(&self.config).code_kinds));
        let weak = self.weak_self.clone();
        metadata_output.set_handler(
            self.metadata_queue.handle(),
            Arc::new(move |batch| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_metadata_batch(batch);
                }
            }),
        );

        let video_output = Arc::new(VideoDataOutput::new(PixelFormat::Rgba8));
        let weak = self.weak_self.clone();
        video_output.set_handler(
            self.video_queue.handle(),
            Arc::new(move |frame| {
                if let Some(inner) = weak.upgrade() {
                    inner.handle_frame(frame);
                }
            }),
        );

        lock(&self.session).apply_topology(SessionTopology {
            input,
            metadata_output,
            video_output,
        });

        if status == AuthorizationStatus::NotDetermined {
            lock(&self.machine).rearm();
            self.reporter.rearm();
            lock(&self.session).set_running_state(RunningState::Starting);
            self.start_session_async();
        }
        Ok(())
    }

    /// Starts the backend on the session queue, off the caller's context.
    fn start_session_async(&self) {
        let weak = self.weak_self.clone();
        self.metadata_queue.dispatch(move || {
            let Some(inner) = weak.upgrade() else { return };
            let started = lock(&inner.backend).start();
            match started {
                Ok(()) => {
                    lock(&inner.session).set_running_state(RunningState::Running);
                    tracing::info!("capture session running");
                }
                Err(error) => {
                    lock(&inner.session).set_running_state(RunningState::Stopped);
                    inner.reporter.failure(&error);
                }
            }
        });
    }

    /// Stops the backend on the session queue. `via` records whether the
    /// stop closes a detection cycle or was requested by the host.
    fn stop_running(&self, via: RunningState) {
        {
            let mut session = lock(&self.session);
            if !session.is_running() {
                return;
            }
            session.set_running_state(via);
        }
        lock(&self.machine).disarm();
        let weak = self.weak_self.clone();
        self.metadata_queue.dispatch(move || {
            let Some(inner) = weak.upgrade() else { return };
            lock(&inner.backend).stop();
            lock(&inner.session).set_running_state(RunningState::Stopped);
            tracing::info!("capture session stopped");
        });
    }

    /// Metadata-queue entry point for delivered detection batches.
    fn handle_metadata_batch(&self, batch: MetadataBatch) {
        let outcome = {
            let presenter = Arc::clone(&self.presenter);
            lock(&self.machine).on_batch(&batch, move |object| {
                presenter.transform_metadata(object)
            })
        };
        match outcome {
            BatchOutcome::Ignored => {}
            BatchOutcome::EmptyBatch => self.reporter.failure(&ScanError::ReadFailure),
            BatchOutcome::Detected(result) => {
                tracing::debug!(code = %result.code, "hopping to presentation context");
                let weak = self.weak_self.clone();
                self.presenter.dispatch(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.present_detection();
                    }
                }));
            }
        }
    }

    /// Presentation-context continuation of a detection hit: runs the
    /// overlay transition and stops the session for the result.
    fn present_detection(&self) {
        let Some((_code, corners)) = lock(&self.machine).begin_presenting() else {
            return;
        };
        let (padding, duration) = {
            let config = lock(&self.config);
            (config.focus_padding, config.transition_duration)
        };
        let target = lock(&self.driver).begin_transition(&corners, padding);
        let weak = self.weak_self.clone();
        self.presenter.animate(
            duration,
            target,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.finish_presentation();
                }
            }),
        );
        self.stop_running(RunningState::StoppingForResult);
    }

    /// Animation-completion continuation: reveal the captured image, then
    /// report success. The order matters — the thumbnail must never flash
    /// at stale geometry.
    fn finish_presentation(&self) {
        let Some((code, image)) = lock(&self.machine).finish_presenting() else {
            return;
        };
        if let Some(image) = image {
            self.presenter.set_thumbnail_image(image);
        }
        self.reporter.success(&code);
    }

    /// Video-queue entry point: snapshot exactly one frame per hit.
    fn handle_frame(&self, frame: Frame) {
        let Some(corners) = lock(&self.machine).take_frame_request() else {
            return;
        };
        let bitmap = lock(&self.backend).make_bitmap(&frame);
        let scale = self.presenter.display_scale();
        let captured = bitmap.and_then(|bitmap| crop_to_quad(&bitmap, &corners, scale));
        tracing::debug!(
            sequence = frame.sequence(),
            captured = captured.is_some(),
            "code snapshot"
        );
        lock(&self.machine).store_captured_image(captured);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.presenter.detach_layers();
        let was_running = {
            let mut session = lock(&self.session);
            let running = session.is_running();
            session.clear_topology();
            running
        };
        if was_running {
            // The queue drains on drop, so this stop still executes even
            // though the scanner itself is going away.
            let backend = Arc::clone(&self.backend);
            self.metadata_queue.dispatch(move || {
                lock(&backend).stop();
            });
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MockBackend;
    use crate::detection::MetadataObject;
    use crate::geometry::{Point, Quad, Rect};
    use crate::overlay::MockPresenter;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingDelegate {
        events: StdMutex<Vec<String>>,
    }

    impl RecordingDelegate {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
        fn successes(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| e.starts_with("success"))
                .count()
        }
    }

    impl ScanDelegate for RecordingDelegate {
        fn did_success(&self, code: &str) {
            self.events.lock().unwrap().push(format!("success:{code}"));
        }
        fn did_fail(&self, error: &ScanError) {
            self.events.lock().unwrap().push(format!("fail:{error}"));
        }
        fn did_change_torch(&self, is_on: bool) {
            self.events.lock().unwrap().push(format!("torch:{is_on}"));
        }
    }

    fn quad() -> Quad {
        Quad::new([
            Point::new(20.0, 30.0),
            Point::new(40.0, 30.0),
            Point::new(40.0, 50.0),
            Point::new(20.0, 50.0),
        ])
    }

    fn scanner_with(
        backend: MockBackend,
    ) -> (Scanner, Arc<MockPresenter>, Arc<RecordingDelegate>) {
        let presenter = Arc::new(MockPresenter::new(Rect::new(0.0, 0.0, 100.0, 200.0)));
        let delegate = Arc::new(RecordingDelegate::default());
        let scanner = Scanner::new(backend, presenter.clone() as Arc<dyn Presenter>);
        scanner.configure(
            Some(delegate.clone() as Arc<dyn ScanDelegate>),
            ScanConfiguration::default(),
            None,
        );
        (scanner, presenter, delegate)
    }

    fn deliver_hit(scanner: &Scanner, code: &str) {
        scanner
            .metadata_output()
            .unwrap()
            .deliver(vec![MetadataObject::qr(code, quad())]);
        // Two passes: one for the delivery itself, one for the session stop
        // the hit schedules behind it.
        scanner.flush();
        scanner.flush();
    }

    #[test]
    fn test_setup_failure_still_attaches_layers() {
        let (_scanner, presenter, delegate) = scanner_with(MockBackend::without_device());

        assert_eq!(
            delegate.events(),
            vec![format!("fail:{}", ScanError::DeviceUnavailable)]
        );
        assert!(presenter.attached());
    }

    #[test]
    fn test_configure_restricts_detection_to_focus_rect() {
        let (scanner, _presenter, _delegate) = scanner_with(MockBackend::new());
        let rect = scanner
            .metadata_output()
            .unwrap()
            .rect_of_interest()
            .unwrap();
        // Initial focus frame for 100×200 bounds is (19.1, 38.2, 61.8, 61.8),
        // rotated into the output's normalized convention.
        assert!((rect.origin.x - 0.191).abs() < 1e-9);
        assert!((rect.origin.y - 0.191).abs() < 1e-9);
        assert!((rect.size.width - 0.309).abs() < 1e-9);
        assert!((rect.size.height - 0.618).abs() < 1e-9);
    }

    #[test]
    fn test_start_running_unauthorized_is_noop() {
        let backend = MockBackend::with_authorization(AuthorizationStatus::Denied);
        let (scanner, _presenter, delegate) = scanner_with(backend);

        scanner.start_running();
        scanner.flush();
        assert_eq!(scanner.running_state(), RunningState::Stopped);
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_stop_running_when_stopped_is_noop() {
        let (scanner, _presenter, delegate) = scanner_with(MockBackend::new());
        scanner.stop_running();
        scanner.flush();
        assert_eq!(scanner.running_state(), RunningState::Stopped);
        assert!(delegate.events().is_empty());
    }

    #[test]
    fn test_not_determined_authorization_starts_preemptively() {
        let backend = MockBackend::with_authorization(AuthorizationStatus::NotDetermined);
        let (scanner, _presenter, _delegate) = scanner_with(backend);
        scanner.flush();
        assert_eq!(scanner.running_state(), RunningState::Running);
    }

    #[test]
    fn test_empty_batches_report_read_failures_and_stay_armed() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        scanner.start_running();
        scanner.flush();
        assert_eq!(scanner.running_state(), RunningState::Running);

        for _ in 0..3 {
            scanner.metadata_output().unwrap().deliver(Vec::new());
        }
        scanner.flush();

        let failure = format!("fail:{}", ScanError::ReadFailure);
        assert_eq!(delegate.events(), vec![failure.clone(), failure.clone(), failure]);
        assert_eq!(presenter.pending_animations(), 0);
        assert_eq!(scanner.running_state(), RunningState::Running);
    }

    #[test]
    fn test_full_scan_cycle_reports_success_after_transition() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        scanner.start_running();
        scanner.flush();

        deliver_hit(&scanner, "hello");

        // The hit stopped the session and queued exactly one transition,
        // but success waits for the animation.
        assert_eq!(scanner.running_state(), RunningState::Stopped);
        assert_eq!(presenter.pending_animations(), 1);
        assert_eq!(delegate.successes(), 0);

        // The one-shot frame snapshot lands while the transition runs.
        let frame = Frame::new(vec![128u8; 100 * 200], 100, 200, PixelFormat::Luma8, 1);
        scanner.video_data_output().unwrap().deliver(frame.clone());
        scanner.video_data_output().unwrap().deliver(frame);
        scanner.flush();

        assert!(presenter.complete_next_animation());
        assert_eq!(delegate.events().last().unwrap(), "success:hello");
        assert_eq!(delegate.successes(), 1);
        assert!(presenter.thumbnail_image().is_some());

        // The transition moved both indicators onto the code.
        let applied = presenter.last_applied().unwrap();
        assert_eq!(applied.focus.rect.center(), quad().bounds().center());
    }

    #[test]
    fn test_second_hit_in_same_cycle_is_ignored() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        scanner.start_running();
        scanner.flush();

        deliver_hit(&scanner, "first");
        deliver_hit(&scanner, "second");

        assert_eq!(presenter.pending_animations(), 1);
        assert!(presenter.complete_next_animation());
        assert!(!presenter.complete_next_animation());
        assert_eq!(delegate.events().last().unwrap(), "success:first");
        assert_eq!(delegate.successes(), 1);
    }

    #[test]
    fn test_failed_transform_keeps_scanning() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        presenter.fail_transforms();
        scanner.start_running();
        scanner.flush();

        deliver_hit(&scanner, "unseen");
        assert_eq!(presenter.pending_animations(), 0);
        assert_eq!(scanner.running_state(), RunningState::Running);

        scanner.metadata_output().unwrap().deliver(Vec::new());
        scanner.flush();
        assert_eq!(
            delegate.events().last().unwrap(),
            &format!("fail:{}", ScanError::ReadFailure)
        );
    }

    #[test]
    fn test_restart_rearms_for_a_second_scan() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        scanner.start_running();
        scanner.flush();
        deliver_hit(&scanner, "one");
        presenter.complete_next_animation();
        assert_eq!(delegate.successes(), 1);

        scanner.start_running();
        scanner.flush();
        assert_eq!(scanner.running_state(), RunningState::Running);

        deliver_hit(&scanner, "two");
        presenter.complete_next_animation();
        assert_eq!(delegate.events().last().unwrap(), "success:two");
        assert_eq!(delegate.successes(), 2);
    }

    #[test]
    fn test_teardown_mid_animation_does_not_fire_or_crash() {
        let (scanner, presenter, delegate) = scanner_with(MockBackend::new());
        scanner.start_running();
        scanner.flush();
        deliver_hit(&scanner, "gone");
        assert_eq!(presenter.pending_animations(), 1);

        drop(scanner);

        // The scheduled completion still runs once; the dead handle absorbs
        // it without reporting.
        assert!(presenter.complete_next_animation());
        assert!(!presenter.attached());
        assert_eq!(delegate.successes(), 0);
    }

    #[test]
    fn test_torch_toggle_reaches_delegate() {
        let (scanner, _presenter, delegate) = scanner_with(MockBackend::new());
        scanner.set_torch_active(true);
        assert_eq!(delegate.events(), vec!["torch:true".to_owned()]);
    }
}
