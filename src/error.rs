//! Scanner error taxonomy.
//!
//! Setup-time errors (`DeviceUnavailable`, `InputInvalid`,
//! `MetadataOutputFailure`, `VideoDataOutputFailure`) are reported once per
//! `configure` call and are not retried automatically; the host must
//! re-configure or call `start_running` again. `ReadFailure` is transient
//! and leaves the scanner armed.

use crate::capture::AuthorizationStatus;
use thiserror::Error;

/// Errors reported through the scanner's result channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// No default video capture device is available.
    #[error("no default video capture device available")]
    DeviceUnavailable,
    /// A device input could not be built or was rejected by the session.
    #[error("capture device input rejected by the session")]
    InputInvalid,
    /// The session rejected the code-metadata output.
    #[error("session rejected the metadata output")]
    MetadataOutputFailure,
    /// The session rejected the raw-frame output.
    #[error("session rejected the video data output")]
    VideoDataOutputFailure,
    /// A detection batch arrived empty; the scanner stays armed.
    #[error("detection batch was empty")]
    ReadFailure,
    /// Camera access has not been granted; the host must re-prompt.
    #[error("camera access not authorized ({0})")]
    Unauthorized(AuthorizationStatus),
    /// Catch-all for failures outside the taxonomy above.
    #[error("unknown scanner failure")]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        assert_eq!(
            ScanError::ReadFailure.to_string(),
            "detection batch was empty"
        );
        assert_eq!(
            ScanError::Unauthorized(AuthorizationStatus::Denied).to_string(),
            "camera access not authorized (denied)"
        );
    }
}
