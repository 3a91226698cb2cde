//! The detection state machine.
//!
//! One tagged enum drives the whole first-hit-wins cycle:
//! `Armed → Detected → Presenting → Idle`, re-armed externally by the next
//! `start_running`. Which sink is live is *derived* from the variant —
//! metadata while `Armed`, the raw-frame sink only while a post-hit
//! snapshot is outstanding — so both sinks being enabled at once is
//! unrepresentable.

use super::{DetectionResult, MetadataObject, NativeSymbology};
use crate::geometry::Quad;
use image::RgbaImage;

#[derive(Debug)]
enum State {
    /// No cycle in progress; both sinks are off.
    Idle,
    /// Waiting for the first qualifying detection batch.
    Armed,
    /// A code was accepted; presentation has not started yet.
    Detected {
        result: DetectionResult,
        awaiting_frame: bool,
        image: Option<RgbaImage>,
    },
    /// The overlay transition is running.
    Presenting {
        code: String,
        corners: Quad,
        awaiting_frame: bool,
        image: Option<RgbaImage>,
    },
}

/// What a metadata batch did to the machine.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The batch was dropped without effect.
    Ignored,
    /// The batch was empty; the caller reports a read failure. Still armed.
    EmptyBatch,
    /// First qualifying hit: the machine moved to `Detected`.
    Detected(DetectionResult),
}

/// The detection-to-presentation state machine.
#[derive(Debug)]
pub struct DetectionMachine {
    state: State,
}

impl DetectionMachine {
    /// Creates an idle machine; `rearm` starts the first cycle.
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Starts a fresh cycle: any previous state is discarded.
    pub fn rearm(&mut self) {
        if !matches!(self.state, State::Armed) {
            tracing::debug!("detection machine armed");
        }
        self.state = State::Armed;
    }

    /// Disables the metadata sink on an external stop.
    ///
    /// Only an armed machine goes idle; a cycle past its hit keeps running
    /// so the presentation can finish.
    pub fn disarm(&mut self) {
        if matches!(self.state, State::Armed) {
            tracing::debug!("detection machine disarmed");
            self.state = State::Idle;
        }
    }

    /// Whether the metadata sink is live.
    pub fn metadata_enabled(&self) -> bool {
        matches!(self.state, State::Armed)
    }

    /// Whether the raw-frame sink is live (a post-hit snapshot is pending).
    pub fn frame_sink_enabled(&self) -> bool {
        matches!(
            self.state,
            State::Detected {
                awaiting_frame: true,
                ..
            } | State::Presenting {
                awaiting_frame: true,
                ..
            }
        )
    }

    /// Feeds a delivered metadata batch through the first-hit-wins policy.
    ///
    /// `transform` maps a raw object into view coordinates (the preview
    /// layer's job); returning `None` silently discards the hit, exactly
    /// like a missing payload or missing corners.
    pub fn on_batch(
        &mut self,
        batch: &[MetadataObject],
        transform: impl Fn(&MetadataObject) -> Option<MetadataObject>,
    ) -> BatchOutcome {
        if !matches!(self.state, State::Armed) {
            return BatchOutcome::Ignored;
        }
        if batch.is_empty() {
            return BatchOutcome::EmptyBatch;
        }
        let first = &batch[0];
        if first.symbology != NativeSymbology::Qr {
            return BatchOutcome::Ignored;
        }
        let Some(transformed) = transform(first) else {
            return BatchOutcome::Ignored;
        };
        let Some(code) = transformed.payload else {
            return BatchOutcome::Ignored;
        };
        let Some(corners) = transformed.corners else {
            return BatchOutcome::Ignored;
        };

        let result = DetectionResult { code, corners };
        tracing::info!(code = %result.code, "code detected");
        self.state = State::Detected {
            result: result.clone(),
            awaiting_frame: true,
            image: None,
        };
        BatchOutcome::Detected(result)
    }

    /// Claims the pending one-frame snapshot request.
    ///
    /// Returns the quad to crop to on the first call after a hit and `None`
    /// afterwards, so at most one delivered frame is ever consumed.
    pub fn take_frame_request(&mut self) -> Option<Quad> {
        match &mut self.state {
            State::Detected {
                result,
                awaiting_frame: awaiting @ true,
                ..
            } => {
                *awaiting = false;
                Some(result.corners)
            }
            State::Presenting {
                corners,
                awaiting_frame: awaiting @ true,
                ..
            } => {
                *awaiting = false;
                Some(*corners)
            }
            _ => None,
        }
    }

    /// Stores the snapshot produced for the claimed frame request.
    pub fn store_captured_image(&mut self, captured: Option<RgbaImage>) {
        match &mut self.state {
            State::Detected { image, .. } | State::Presenting { image, .. } => {
                *image = captured;
            }
            _ => {}
        }
    }

    /// Moves `Detected → Presenting`, handing back what the overlay needs.
    pub fn begin_presenting(&mut self) -> Option<(String, Quad)> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Detected {
                result,
                awaiting_frame,
                image,
            } => {
                let handoff = (result.code.clone(), result.corners);
                self.state = State::Presenting {
                    code: result.code,
                    corners: result.corners,
                    awaiting_frame,
                    image,
                };
                Some(handoff)
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Ends the cycle on animation completion.
    ///
    /// Returns the decoded text and any captured snapshot; `None` when the
    /// cycle was re-armed or torn down before the completion ran.
    pub fn finish_presenting(&mut self) -> Option<(String, Option<RgbaImage>)> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Presenting { code, image, .. } => Some((code, image)),
            other => {
                self.state = other;
                None
            }
        }
    }
}

impl Default for DetectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn quad() -> Quad {
        Quad::new([
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ])
    }

    fn identity(object: &MetadataObject) -> Option<MetadataObject> {
        Some(object.clone())
    }

    fn armed() -> DetectionMachine {
        let mut machine = DetectionMachine::new();
        machine.rearm();
        machine
    }

    #[test]
    fn test_starts_idle_with_both_sinks_off() {
        let machine = DetectionMachine::new();
        assert!(!machine.metadata_enabled());
        assert!(!machine.frame_sink_enabled());
    }

    #[test]
    fn test_empty_batches_repeat_failures_without_transition() {
        let mut machine = armed();
        for _ in 0..3 {
            assert!(matches!(
                machine.on_batch(&[], identity),
                BatchOutcome::EmptyBatch
            ));
            assert!(machine.metadata_enabled());
        }
    }

    #[test]
    fn test_non_qr_first_element_is_ignored() {
        let mut machine = armed();
        let batch = vec![MetadataObject {
            symbology: NativeSymbology::Ean13,
            payload: Some("4006381333931".to_owned()),
            corners: Some(quad()),
        }];
        assert!(matches!(
            machine.on_batch(&batch, identity),
            BatchOutcome::Ignored
        ));
        assert!(machine.metadata_enabled());
    }

    #[test]
    fn test_missing_payload_is_silently_ignored() {
        let mut machine = armed();
        let batch = vec![MetadataObject {
            symbology: NativeSymbology::Qr,
            payload: None,
            corners: Some(quad()),
        }];
        assert!(matches!(
            machine.on_batch(&batch, identity),
            BatchOutcome::Ignored
        ));
        assert!(machine.metadata_enabled());
    }

    #[test]
    fn test_failed_transform_is_silently_ignored() {
        let mut machine = armed();
        let batch = vec![MetadataObject::qr("hello", quad())];
        assert!(matches!(
            machine.on_batch(&batch, |_| None),
            BatchOutcome::Ignored
        ));
        assert!(machine.metadata_enabled());
    }

    #[test]
    fn test_hit_disables_metadata_and_arms_frame_sink_once() {
        let mut machine = armed();
        let batch = vec![MetadataObject::qr("hello", quad())];

        let outcome = machine.on_batch(&batch, identity);
        assert!(matches!(outcome, BatchOutcome::Detected(_)));
        assert!(!machine.metadata_enabled());
        assert!(machine.frame_sink_enabled());

        // Exactly one frame is consumed.
        assert!(machine.take_frame_request().is_some());
        assert!(!machine.frame_sink_enabled());
        assert!(machine.take_frame_request().is_none());

        // Further batches are dropped while the cycle runs.
        assert!(matches!(
            machine.on_batch(&batch, identity),
            BatchOutcome::Ignored
        ));
    }

    #[test]
    fn test_full_cycle_hands_code_and_image_to_completion() {
        let mut machine = armed();
        machine.on_batch(&[MetadataObject::qr("hello", quad())], identity);

        let (code, corners) = machine.begin_presenting().unwrap();
        assert_eq!(code, "hello");
        assert_eq!(corners, quad());

        // The snapshot can land while the transition is already running.
        let claimed = machine.take_frame_request().unwrap();
        assert_eq!(claimed, quad());
        machine.store_captured_image(Some(RgbaImage::new(4, 4)));

        let (code, image) = machine.finish_presenting().unwrap();
        assert_eq!(code, "hello");
        assert!(image.is_some());
        assert!(!machine.metadata_enabled());
        assert!(!machine.frame_sink_enabled());
    }

    #[test]
    fn test_completion_after_rearm_reports_nothing() {
        let mut machine = armed();
        machine.on_batch(&[MetadataObject::qr("hello", quad())], identity);
        machine.begin_presenting().unwrap();

        machine.rearm();
        assert!(machine.finish_presenting().is_none());
        assert!(machine.metadata_enabled());
    }

    #[test]
    fn test_disarm_only_affects_armed_state() {
        let mut machine = armed();
        machine.disarm();
        assert!(!machine.metadata_enabled());

        let mut machine = armed();
        machine.on_batch(&[MetadataObject::qr("hello", quad())], identity);
        machine.disarm();
        // Mid-cycle state is preserved so the presentation can finish.
        assert!(machine.begin_presenting().is_some());
    }
}
