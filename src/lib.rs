//! Embeddable camera code scanner.
//!
//! Drives a live capture session, watches its metadata sink for
//! machine-readable codes (QR, linear barcodes, PDF417), and snaps a focus
//! indicator onto the detected code's quadrilateral before reporting the
//! decoded text to the host.
//!
//! # Architecture
//!
//! ```text
//! capture ──▶ detection ──▶ overlay ──▶ report
//!    │            │            │
//!    └── backend  └── state    └── presenter
//!        (host)       machine      (host)
//! ```
//!
//! The platform's camera stack and view hierarchy stay outside the crate,
//! behind the [`CaptureBackend`] and [`Presenter`] traits. The detection
//! state machine applies the first-hit-wins policy and keeps the two
//! capture sinks mutually exclusive by construction; the geometry engine
//! turns the four corner points into the rotation, padded bounding square,
//! and crop region the overlay presents.
//!
//! # Example
//!
//! ```no_run
//! use scanview::geometry::Rect;
//! use scanview::{CompletionHandler, MockBackend, MockPresenter, ScanConfiguration, Scanner};
//! use std::sync::Arc;
//!
//! let presenter = Arc::new(MockPresenter::new(Rect::new(0.0, 0.0, 390.0, 844.0)));
//! let scanner = Scanner::new(MockBackend::new(), presenter.clone() as Arc<dyn scanview::Presenter>);
//!
//! let completion: CompletionHandler = Box::new(|succeeded, code, _error| {
//!     if succeeded {
//!         println!("scanned: {}", code.unwrap_or_default());
//!     }
//! });
//! scanner.configure(None, ScanConfiguration::default(), Some(completion));
//! scanner.start_running();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod detection;
pub mod dispatch;
pub mod error;
pub mod geometry;
pub mod overlay;
pub mod report;
pub mod scanner;

// Re-export commonly used types at crate root
pub use capture::{
    AuthorizationStatus, CaptureBackend, FileConfig, Frame, MockBackend, PixelFormat,
    RunningState, ScanConfiguration,
};
pub use detection::{CodeKind, MetadataObject};
pub use error::ScanError;
pub use geometry::Quad;
pub use overlay::{MockPresenter, OverlayState, Presenter};
pub use report::{CompletionHandler, ScanDelegate};
pub use scanner::Scanner;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
