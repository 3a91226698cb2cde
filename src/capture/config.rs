//! Scanner configuration.
//!
//! [`ScanConfiguration`] is a partial override: only fields the host filled
//! in replace the scanner's current values, the rest stay as they are. The
//! resolved defaults are all code kinds, 8.0 padding units, a 0.5 s
//! transition, and detection restricted to the focus rectangle.

use crate::detection::CodeKind;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default focus-frame padding in view units.
pub const DEFAULT_FOCUS_PADDING: f64 = 8.0;

/// Default overlay transition duration.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_millis(500);

/// Partial-override configuration passed to `Scanner::configure`.
#[derive(Debug, Clone)]
pub struct ScanConfiguration {
    /// Accepted code kinds. An empty list keeps the current kinds.
    pub code_kinds: Vec<CodeKind>,
    /// Custom focus indicator image.
    pub focus_image: Option<RgbaImage>,
    /// Padding added around the detected code's bounding square.
    pub focus_padding: Option<f64>,
    /// Duration of the focus transition animation.
    pub transition_duration: Option<Duration>,
    /// Whether detection is restricted to the focus rectangle.
    pub restrict_to_focus: Option<bool>,
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            code_kinds: CodeKind::ALL.to_vec(),
            focus_image: None,
            focus_padding: None,
            transition_duration: None,
            restrict_to_focus: None,
        }
    }
}

impl ScanConfiguration {
    /// Validates the fields that carry values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(padding) = self.focus_padding {
            if !padding.is_finite() || padding < 0.0 {
                return Err(ConfigError::InvalidPadding);
            }
        }
        if let Some(duration) = self.transition_duration {
            if duration.is_zero() {
                return Err(ConfigError::InvalidDuration);
            }
        }
        Ok(())
    }
}

/// The scanner's fully-resolved settings after any number of merges.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Accepted code kinds. Never empty.
    pub code_kinds: Vec<CodeKind>,
    /// Custom focus indicator image, if the host supplied one.
    pub focus_image: Option<RgbaImage>,
    /// Padding added around the detected code's bounding square.
    pub focus_padding: f64,
    /// Duration of the focus transition animation.
    pub transition_duration: Duration,
    /// Whether detection is restricted to the focus rectangle.
    pub restrict_to_focus: bool,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            code_kinds: CodeKind::ALL.to_vec(),
            focus_image: None,
            focus_padding: DEFAULT_FOCUS_PADDING,
            transition_duration: DEFAULT_TRANSITION_DURATION,
            restrict_to_focus: true,
        }
    }
}

impl ResolvedConfig {
    /// Applies the fields `configuration` carries, keeping the rest.
    pub fn merge(&mut self, configuration: &ScanConfiguration) {
        if !configuration.code_kinds.is_empty() {
            self.code_kinds = configuration.code_kinds.clone();
        }
        if let Some(image) = &configuration.focus_image {
            self.focus_image = Some(image.clone());
        }
        if let Some(padding) = configuration.focus_padding {
            self.focus_padding = padding;
        }
        if let Some(duration) = configuration.transition_duration {
            self.transition_duration = duration;
        }
        if let Some(restrict) = configuration.restrict_to_focus {
            self.restrict_to_focus = restrict;
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Padding must be finite and non-negative.
    #[error("invalid focus padding")]
    InvalidPadding,
    /// The transition duration must be positive.
    #[error("invalid transition duration")]
    InvalidDuration,
    /// The configuration file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The configuration file could not be parsed.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
    /// The focus image could not be decoded.
    #[error("failed to load focus image: {0}")]
    FocusImageError(String),
}

/// On-disk configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Scanner settings.
    #[serde(default)]
    pub scan: ScanFileConfig,
}

/// The `[scan]` section of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScanFileConfig {
    /// Accepted code kinds. Empty keeps the defaults.
    #[serde(default)]
    pub code_kinds: Vec<CodeKind>,
    /// Path to a custom focus indicator image.
    pub focus_image: Option<std::path::PathBuf>,
    /// Padding around the detected code's bounding square.
    pub focus_padding: Option<f64>,
    /// Transition duration in seconds.
    pub transition_duration_secs: Option<f64>,
    /// Whether detection is restricted to the focus rectangle.
    pub restrict_to_focus: Option<bool>,
}

impl FileConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: FileConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.resolve()?;
        Ok(config)
    }

    /// Turns the file contents into a runtime configuration, decoding the
    /// focus image if one was given.
    pub fn resolve(&self) -> Result<ScanConfiguration, ConfigError> {
        let focus_image = match &self.scan.focus_image {
            Some(path) => Some(
                image::open(path)
                    .map_err(|e| ConfigError::FocusImageError(e.to_string()))?
                    .to_rgba8(),
            ),
            None => None,
        };
        let transition_duration = match self.scan.transition_duration_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
            Some(_) => return Err(ConfigError::InvalidDuration),
            None => None,
        };
        let configuration = ScanConfiguration {
            code_kinds: self.scan.code_kinds.clone(),
            focus_image,
            focus_padding: self.scan.focus_padding,
            transition_duration,
            restrict_to_focus: self.scan.restrict_to_focus,
        };
        configuration.validate()?;
        Ok(configuration)
    }
}
