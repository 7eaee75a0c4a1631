//! Per-test metadata recorder for test-suite runs.
//!
//! A host test engine drives a [`RunRecorder`] through four lifecycle hooks
//! (session start, collection, per-phase results, session finish). At session
//! end the recorder decides whether a report is warranted and writes a JSON
//! [`report::RunSummary`] to the configured path.

pub mod config;
pub mod descriptor;
pub mod errors;
pub mod gate;
pub mod host;
pub mod model;
pub mod recorder;
pub mod report;

pub use config::RecorderConfig;
pub use descriptor::{CollectedTest, DeclaresMetadata, TestDescriptor};
pub use errors::{MetadataError, RecorderError};
pub use gate::{EmitDecision, SessionEnd, SkipReason};
pub use model::{Outcome, Phase, PhaseReport, RecordState, RunCounters, TestRecord, TestStatus};
pub use recorder::{EmitOutcome, RunRecorder, SharedRecorder};
