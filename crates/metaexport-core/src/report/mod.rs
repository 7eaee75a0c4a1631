pub mod console;
pub mod json;

use crate::model::TestRecord;
use serde::Serialize;

/// The emitted artifact. Field order is part of the report contract.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary<'a> {
    /// ISO-8601 timestamp of report creation.
    pub run_date: String,
    pub duration_seconds: f64,
    pub collected: u64,
    pub passed: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Records in discovery order.
    pub tests: &'a [TestRecord],
}
