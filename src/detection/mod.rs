//! Code detection: symbology mapping, metadata batches, and the
//! first-hit-wins state machine coordinating the two capture sinks.

mod machine;
mod metadata;
mod symbology;

pub use machine::{BatchOutcome, DetectionMachine};
pub use metadata::{DetectionResult, MetadataBatch, MetadataObject};
pub use symbology::{native_symbologies_for, CodeKind, NativeSymbology};
