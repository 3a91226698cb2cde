//! Capture session topology and running state.
//!
//! The session owns one device input and the two output sinks. Topology is
//! only ever replaced wholesale: the scanner performs every acceptance check
//! first, builds the complete [`SessionTopology`], and swaps it in with
//! [`CaptureSession::apply_topology`]. No reader can observe a session with,
//! say, an input but no metadata output.

use super::{DeviceInput, MetadataOutput, VideoDataOutput};
use std::sync::Arc;

/// Lifecycle state of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    /// Not capturing.
    Stopped,
    /// Start has been dispatched to the session queue.
    Starting,
    /// The backend is capturing.
    Running,
    /// Stop has been dispatched because a detection completed; the
    /// presentation cycle is still in flight.
    StoppingForResult,
}

/// The fully-built set of session attachments.
#[derive(Debug)]
pub struct SessionTopology {
    /// The device input frames are read from.
    pub input: DeviceInput,
    /// The code-metadata sink. Always present.
    pub metadata_output: Arc<MetadataOutput>,
    /// The raw-frame sink used to snapshot the detected code.
    pub video_output: Arc<VideoDataOutput>,
}

/// The capture session owned by the scanner.
#[derive(Debug)]
pub struct CaptureSession {
    topology: Option<SessionTopology>,
    running: RunningState,
}

impl CaptureSession {
    /// Creates an empty, stopped session.
    pub fn new() -> Self {
        Self {
            topology: None,
            running: RunningState::Stopped,
        }
    }

    /// Atomically installs a complete topology, replacing any previous one.
    pub fn apply_topology(&mut self, topology: SessionTopology) {
        tracing::debug!(device = %topology.input.device.name, "session topology applied");
        self.topology = Some(topology);
    }

    /// Detaches the input and both outputs.
    pub fn clear_topology(&mut self) -> Option<SessionTopology> {
        if self.topology.is_some() {
            tracing::debug!("session topology detached");
        }
        self.topology.take()
    }

    /// The current attachments, if configured.
    pub fn topology(&self) -> Option<&SessionTopology> {
        self.topology.as_ref()
    }

    /// Current lifecycle state.
    pub fn running_state(&self) -> RunningState {
        self.running
    }

    /// Records a lifecycle transition.
    pub fn set_running_state(&mut self, state: RunningState) {
        if self.running != state {
            tracing::debug!(from = ?self.running, to = ?state, "session state");
        }
        self.running = state;
    }

    /// Whether a start has been requested and not yet fully unwound.
    pub fn is_running(&self) -> bool {
        matches!(self.running, RunningState::Starting | RunningState::Running)
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PixelFormat, VideoDevice};

    fn topology() -> SessionTopology {
        SessionTopology {
            input: DeviceInput {
                device: VideoDevice {
                    id: 0,
                    name: "test".to_owned(),
                },
            },
            metadata_output: Arc::new(MetadataOutput::new()),
            video_output: Arc::new(VideoDataOutput::new(PixelFormat::Rgba8)),
        }
    }

    #[test]
    fn test_starts_empty_and_stopped() {
        let session = CaptureSession::new();
        assert!(session.topology().is_none());
        assert_eq!(session.running_state(), RunningState::Stopped);
        assert!(!session.is_running());
    }

    #[test]
    fn test_topology_swap_is_all_or_nothing() {
        let mut session = CaptureSession::new();
        session.apply_topology(topology());
        assert!(session.topology().is_some());

        let detached = session.clear_topology();
        assert!(detached.is_some());
        assert!(session.topology().is_none());
    }

    #[test]
    fn test_stopping_for_result_counts_as_not_running() {
        let mut session = CaptureSession::new();
        session.set_running_state(RunningState::Running);
        assert!(session.is_running());
        session.set_running_state(RunningState::StoppingForResult);
        assert!(!session.is_running());
    }
}
