//! Capture session ownership and the capture-device collaborator.
//!
//! This module holds everything between the scanner and the platform's
//! camera stack: the [`CaptureBackend`] trait the host implements, the
//! session topology with its two output sinks, raw frames, and the
//! partial-override configuration surface.

mod backend;
mod config;
mod frame;
mod output;
mod session;

pub use backend::{
    AuthorizationStatus, CaptureBackend, DeviceInput, MockBackend, VideoDevice,
};
pub use config::{
    ConfigError, FileConfig, ResolvedConfig, ScanConfiguration, ScanFileConfig,
    DEFAULT_FOCUS_PADDING, DEFAULT_TRANSITION_DURATION,
};
pub use frame::{Frame, PixelFormat};
pub use output::{focus_rect_of_interest, MetadataOutput, VideoDataOutput};
pub use session::{CaptureSession, RunningState, SessionTopology};
