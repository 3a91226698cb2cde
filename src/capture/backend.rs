//! Capture-device collaborator.
//!
//! The platform's capture stack (device enumeration, authorization,
//! session hardware, buffer-to-bitmap conversion) sits behind the
//! [`CaptureBackend`] trait, so hosts wire in the real thing while tests
//! and the demo binary run against [`MockBackend`].

use super::Frame;
use crate::error::ScanError;
use image::RgbaImage;

/// Camera authorization state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The host app may use the camera.
    Authorized,
    /// The user has not been asked yet; starting the session triggers the
    /// platform prompt.
    NotDetermined,
    /// The user declined camera access.
    Denied,
    /// Camera access is blocked by policy.
    Restricted,
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AuthorizationStatus::Authorized => "authorized",
            AuthorizationStatus::NotDetermined => "not determined",
            AuthorizationStatus::Denied => "denied",
            AuthorizationStatus::Restricted => "restricted",
        };
        f.write_str(name)
    }
}

/// A video capture device discovered by the backend.
#[derive(Debug, Clone)]
pub struct VideoDevice {
    /// Backend-specific device identifier.
    pub id: u32,
    /// Human-readable device name.
    pub name: String,
}

/// A device input accepted into the capture session.
#[derive(Debug, Clone)]
pub struct DeviceInput {
    /// The device this input reads from.
    pub device: VideoDevice,
}

/// The capture-device API consumed by the scanner.
///
/// Implementations drive real camera hardware; [`MockBackend`] scripts every
/// failure point for tests.
pub trait CaptureBackend: Send {
    /// Current camera authorization state.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// The platform's default video device, if any.
    fn default_video_device(&mut self) -> Result<VideoDevice, ScanError>;

    /// Builds a session input reading from `device`.
    fn make_input(&mut self, device: &VideoDevice) -> Result<DeviceInput, ScanError>;

    /// Whether the session will accept `input`.
    fn can_add_input(&self, input: &DeviceInput) -> bool;

    /// Whether the session will accept a code-metadata output.
    fn can_add_metadata_output(&self) -> bool;

    /// Whether the session will accept a raw-frame output.
    fn can_add_video_data_output(&self) -> bool;

    /// Starts the capture hardware. Blocking; always invoked off the
    /// caller's context, on the session queue.
    fn start(&mut self) -> Result<(), ScanError>;

    /// Stops the capture hardware. Idempotent.
    fn stop(&mut self);

    /// Whether the hardware is currently capturing.
    fn is_running(&self) -> bool;

    /// Toggles the torch, returning the resulting state.
    fn set_torch(&mut self, on: bool) -> Result<bool, ScanError>;

    /// Converts a delivered frame buffer into a bitmap.
    ///
    /// Returns `None` when the buffer is malformed; the thumbnail is then
    /// simply skipped for that cycle.
    fn make_bitmap(&self, frame: &Frame) -> Option<RgbaImage>;
}

/// Scripted in-memory backend for tests and demos.
///
/// Every acceptance check is a public flag, so a test can make setup fail at
/// any single step and assert the reported error.
#[derive(Debug)]
pub struct MockBackend {
    /// Authorization state returned to the scanner.
    pub authorization: AuthorizationStatus,
    /// Whether a default video device exists.
    pub device_present: bool,
    /// Whether the session accepts the device input.
    pub input_accepted: bool,
    /// Whether the session accepts the metadata output.
    pub metadata_output_accepted: bool,
    /// Whether the session accepts the raw-frame output.
    pub video_data_output_accepted: bool,
    /// Whether the device has a torch.
    pub torch_available: bool,
    running: bool,
    torch_on: bool,
    start_count: u32,
    stop_count: u32,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            authorization: AuthorizationStatus::Authorized,
            device_present: true,
            input_accepted: true,
            metadata_output_accepted: true,
            video_data_output_accepted: true,
            torch_available: true,
            running: false,
            torch_on: false,
            start_count: 0,
            stop_count: 0,
        }
    }
}

impl MockBackend {
    /// A permissive, authorized backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose authorization is fixed to `status`.
    pub fn with_authorization(status: AuthorizationStatus) -> Self {
        Self {
            authorization: status,
            ..Self::default()
        }
    }

    /// A backend reporting no default video device.
    pub fn without_device() -> Self {
        Self {
            device_present: false,
            ..Self::default()
        }
    }

    /// How many times `start` succeeded.
    pub fn start_count(&self) -> u32 {
        self.start_count
    }

    /// How many times `stop` was invoked while running.
    pub fn stop_count(&self) -> u32 {
        self.stop_count
    }

    /// Current torch state.
    pub fn torch_on(&self) -> bool {
        self.torch_on
    }
}

impl CaptureBackend for MockBackend {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.authorization
    }

    fn default_video_device(&mut self) -> Result<VideoDevice, ScanError> {
        if !self.device_present {
            return Err(ScanError::DeviceUnavailable);
        }
        Ok(VideoDevice {
            id: 0,
            name: "mock-camera".to_owned(),
        })
    }

    fn make_input(&mut self, device: &VideoDevice) -> Result<DeviceInput, ScanError> {
        if !self.input_accepted {
            return Err(ScanError::InputInvalid);
        }
        Ok(DeviceInput {
            device: device.clone(),
        })
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.input_accepted
    }

    fn can_add_metadata_output(&self) -> bool {
        self.metadata_output_accepted
    }

    fn can_add_video_data_output(&self) -> bool {
        self.video_data_output_accepted
    }

    fn start(&mut self) -> Result<(), ScanError> {
        self.running = true;
        self.start_count += 1;
        tracing::info!("MockBackend started");
        Ok(())
    }

    fn stop(&mut self) {
        if self.running {
            self.stop_count += 1;
        }
        self.running = false;
        tracing::info!("MockBackend stopped");
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn set_torch(&mut self, on: bool) -> Result<bool, ScanError> {
        if !self.torch_available {
            return Err(ScanError::Unknown);
        }
        self.torch_on = on;
        Ok(self.torch_on)
    }

    fn make_bitmap(&self, frame: &Frame) -> Option<RgbaImage> {
        if !frame.is_valid() {
            return None;
        }
        let (width, height) = (frame.width(), frame.height());
        match frame.format() {
            super::PixelFormat::Rgba8 => {
                RgbaImage::from_raw(width, height, frame.pixels().to_vec())
            }
            super::PixelFormat::Luma8 => {
                let mut rgba = Vec::with_capacity(frame.pixels().len() * 4);
                for &luma in frame.pixels() {
                    rgba.extend_from_slice(&[luma, luma, luma, 255]);
                }
                RgbaImage::from_raw(width, height, rgba)
            }
        }
    }
}
