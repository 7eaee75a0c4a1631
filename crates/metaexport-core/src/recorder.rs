//! Run recorder: accumulates per-test metadata across the four lifecycle hooks
//! of one run and writes the summary report at session end.

use crate::config::RecorderConfig;
use crate::descriptor::TestDescriptor;
use crate::errors::RecorderError;
use crate::gate::{self, EmitDecision, SessionEnd, SkipReason};
use crate::model::{Phase, PhaseReport, RecordState, RunCounters, TestRecord, TestStatus};
use crate::report::{json, RunSummary};
use chrono::{Local, SecondsFormat};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Result of the session-finish hook.
#[derive(Debug, Clone, PartialEq)]
pub enum EmitOutcome {
    Skipped(SkipReason),
    Written {
        path: PathBuf,
        collected: u64,
        counters: RunCounters,
    },
}

/// Aggregation state for one run. Owned by the host integration layer.
#[derive(Debug)]
pub struct RunRecorder {
    config: RecorderConfig,
    started: Option<Instant>,
    records: Vec<TestRecord>,
    index: HashMap<String, usize>,
    counters: RunCounters,
}

impl RunRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            started: None,
            records: Vec::new(),
            index: HashMap::new(),
            counters: RunCounters::default(),
        }
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Records in discovery order.
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    pub fn record(&self, nodeid: &str) -> Option<&TestRecord> {
        self.index.get(nodeid).map(|&i| &self.records[i])
    }

    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    /// Drop all run state; configuration is kept.
    pub fn reset(&mut self) {
        self.started = None;
        self.records.clear();
        self.index.clear();
        self.counters = RunCounters::default();
    }

    pub fn on_session_start(&mut self) {
        self.started = Some(Instant::now());
        tracing::debug!("session started");
    }

    pub fn on_collection_complete<D: TestDescriptor>(
        &mut self,
        tests: &[D],
    ) -> Result<(), RecorderError> {
        for test in tests {
            let declared = test
                .metadata_source()
                .map(|source| source.declared_metadata())
                .transpose()
                .map_err(|source| RecorderError::Metadata {
                    nodeid: test.nodeid().to_string(),
                    source,
                })?;

            let record = self.entry(test.nodeid());
            if let Some(attrs) = declared {
                record.merge_declared(attrs);
            }
            if record.title.is_none() {
                record.title = Some(test.name().to_string());
            }
            tracing::debug!(nodeid = %record.nodeid, "collected");
        }
        Ok(())
    }

    pub fn on_test_result(&mut self, report: &PhaseReport) {
        let Some(reported) = TestStatus::from_outcome(report.outcome) else {
            tracing::debug!(nodeid = %report.nodeid, "ignoring unknown outcome");
            return;
        };
        let (status, duration_secs) = match (report.when, reported) {
            (Phase::Call, status) => (status, sanitize_duration(&report.nodeid, report.duration)),
            (Phase::Setup, TestStatus::Skipped) => (TestStatus::Skipped, 0.0),
            _ => return,
        };

        let record = self.entry(&report.nodeid);
        if let RecordState::Completed { status: prev, .. } = record.state {
            // Terminal state is set once per run; a second terminal report would double count.
            tracing::debug!(
                nodeid = %report.nodeid,
                previous = prev.as_str(),
                "ignoring repeated terminal result"
            );
            return;
        }
        record.state = RecordState::Completed {
            status,
            duration_secs,
        };
        self.counters.record(status);
    }

    pub fn on_session_finish(&mut self, end: &SessionEnd) -> Result<EmitOutcome, RecorderError> {
        if let EmitDecision::Skip(reason) =
            gate::decide(end, &self.counters, self.config.always_emit)
        {
            tracing::info!(reason = reason.as_str(), "report not emitted");
            return Ok(EmitOutcome::Skipped(reason));
        }

        let path = self
            .config
            .output
            .clone()
            .ok_or(RecorderError::MissingOutputPath)?;
        let summary = self.summary(end.collected)?;
        json::write_json(&summary, &path, self.config.pretty)?;

        tracing::info!(
            path = %path.display(),
            passed = self.counters.passed,
            failed = self.counters.failed,
            skipped = self.counters.skipped,
            "report written"
        );
        Ok(EmitOutcome::Written {
            path,
            collected: end.collected,
            counters: self.counters,
        })
    }

    /// Snapshot of the run as it would be emitted now.
    pub fn summary(&self, collected: u64) -> Result<RunSummary<'_>, RecorderError> {
        let started = self.started.ok_or(RecorderError::SessionNotStarted)?;
        Ok(RunSummary {
            run_date: Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            duration_seconds: started.elapsed().as_secs_f64(),
            collected,
            passed: self.counters.passed,
            skipped: self.counters.skipped,
            failed: self.counters.failed,
            tests: &self.records,
        })
    }

    fn entry(&mut self, nodeid: &str) -> &mut TestRecord {
        let i = match self.index.get(nodeid) {
            Some(&i) => i,
            None => {
                self.records.push(TestRecord::new(nodeid));
                let i = self.records.len() - 1;
                self.index.insert(nodeid.to_string(), i);
                i
            }
        };
        &mut self.records[i]
    }
}

fn sanitize_duration(nodeid: &str, duration: f64) -> f64 {
    if duration.is_finite() && duration >= 0.0 {
        duration
    } else {
        tracing::warn!(nodeid, duration, "invalid duration reported; using 0");
        0.0
    }
}

/// Recorder behind one mutex, for hosts that report from several threads.
#[derive(Debug, Clone)]
pub struct SharedRecorder {
    inner: Arc<Mutex<RunRecorder>>,
}

impl SharedRecorder {
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RunRecorder::new(config))),
        }
    }

    /// Run `f` with exclusive access. A poisoned lock is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut RunRecorder) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    pub fn on_session_start(&self) {
        self.with(RunRecorder::on_session_start)
    }

    pub fn on_collection_complete<D: TestDescriptor>(
        &self,
        tests: &[D],
    ) -> Result<(), RecorderError> {
        self.with(|r| r.on_collection_complete(tests))
    }

    pub fn on_test_result(&self, report: &PhaseReport) {
        self.with(|r| r.on_test_result(report))
    }

    pub fn on_session_finish(&self, end: &SessionEnd) -> Result<EmitOutcome, RecorderError> {
        self.with(|r| r.on_session_finish(end))
    }

    pub fn counters(&self) -> RunCounters {
        self.with(|r| r.counters())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::CollectedTest;
    use crate::model::Outcome;
    use serde_json::json;

    fn recorder() -> RunRecorder {
        RunRecorder::new(RecorderConfig::default())
    }

    fn report(nodeid: &str, when: Phase, outcome: Outcome, duration: f64) -> PhaseReport {
        PhaseReport::new(nodeid, when, outcome, duration)
    }

    #[test]
    fn setup_skip_without_call_is_skipped_once() {
        let mut r = recorder();
        r.on_collection_complete(&[CollectedTest::from_nodeid("m::t")])
            .unwrap();
        r.on_test_result(&report("m::t", Phase::Setup, Outcome::Skipped, 0.3));
        r.on_test_result(&report("m::t", Phase::Teardown, Outcome::Passed, 0.0));

        let rec = r.record("m::t").unwrap();
        assert_eq!(
            rec.state,
            RecordState::Completed {
                status: TestStatus::Skipped,
                duration_secs: 0.0
            }
        );
        assert_eq!(r.counters().skipped, 1);
        assert_eq!(r.counters().total(), 1);
    }

    #[test]
    fn teardown_failure_does_not_overwrite_call_result() {
        let mut r = recorder();
        r.on_test_result(&report("m::t", Phase::Setup, Outcome::Passed, 0.0));
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Failed, 0.2));
        r.on_test_result(&report("m::t", Phase::Teardown, Outcome::Failed, 0.1));

        let rec = r.record("m::t").unwrap();
        assert_eq!(rec.state.status(), Some(TestStatus::Failed));
        assert_eq!(rec.state.duration_secs(), Some(0.2));
        assert_eq!(r.counters().failed, 1);
        assert_eq!(r.counters().total(), 1);
    }

    #[test]
    fn pass_then_teardown_failure_reports_passed() {
        let mut r = recorder();
        r.on_test_result(&report("m::t", Phase::Setup, Outcome::Passed, 0.0));
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Passed, 0.05));
        r.on_test_result(&report("m::t", Phase::Teardown, Outcome::Failed, 0.0));
        assert_eq!(
            r.record("m::t").unwrap().state.status(),
            Some(TestStatus::Passed)
        );
        assert_eq!(r.counters().failed, 0);
    }

    #[test]
    fn unknown_phase_and_outcome_are_noops() {
        let mut r = recorder();
        r.on_test_result(&report("m::t", Phase::Other, Outcome::Failed, 1.0));
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Other, 1.0));
        assert!(r.records().is_empty());
        assert_eq!(r.counters(), RunCounters::default());
    }

    #[test]
    fn result_for_uncollected_test_creates_record() {
        let mut r = recorder();
        r.on_test_result(&report("m::ghost", Phase::Call, Outcome::Passed, 0.01));
        let rec = r.record("m::ghost").unwrap();
        assert_eq!(rec.title, None);
        assert_eq!(rec.state.status(), Some(TestStatus::Passed));
    }

    #[test]
    fn negative_duration_is_clamped() {
        let mut r = recorder();
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Passed, -1.0));
        assert_eq!(r.record("m::t").unwrap().state.duration_secs(), Some(0.0));
    }

    #[test]
    fn recollection_merges_without_resetting_results() {
        let mut r = recorder();
        let first =
            CollectedTest::new("m::t", "t").with_meta(json!({"owner": "qa", "tier": 1}));
        r.on_collection_complete(&[first]).unwrap();
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Passed, 0.4));

        let second =
            CollectedTest::new("m::t", "renamed").with_meta(json!({"tier": 2, "area": "db"}));
        r.on_collection_complete(&[second, CollectedTest::new("m::u", "u")])
            .unwrap();

        let rec = r.record("m::t").unwrap();
        assert_eq!(rec.title.as_deref(), Some("t"));
        assert_eq!(rec.declared.get("owner"), Some(&json!("qa")));
        assert_eq!(rec.declared.get("tier"), Some(&json!(2)));
        assert_eq!(rec.declared.get("area"), Some(&json!("db")));
        assert_eq!(rec.state.status(), Some(TestStatus::Passed));
        assert_eq!(rec.state.duration_secs(), Some(0.4));

        let order: Vec<_> = r.records().iter().map(|t| t.nodeid.as_str()).collect();
        assert_eq!(order, ["m::t", "m::u"]);
    }

    #[test]
    fn metadata_error_aborts_collection() {
        let mut r = recorder();
        let bad = CollectedTest::new("m::bad", "bad").with_meta(json!("not a map"));
        let err = r
            .on_collection_complete(&[CollectedTest::new("m::ok", "ok"), bad])
            .unwrap_err();
        match err {
            RecorderError::Metadata { nodeid, .. } => assert_eq!(nodeid, "m::bad"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(r.record("m::ok").is_some());
        assert!(r.record("m::bad").is_none());
    }

    struct Annotated {
        nodeid: &'static str,
        broken: bool,
    }

    impl TestDescriptor for Annotated {
        fn nodeid(&self) -> &str {
            self.nodeid
        }

        fn name(&self) -> &str {
            crate::descriptor::short_name(self.nodeid)
        }

        fn metadata_source(&self) -> Option<&dyn crate::DeclaresMetadata> {
            Some(self)
        }
    }

    impl crate::DeclaresMetadata for Annotated {
        fn declared_metadata(
            &self,
        ) -> Result<crate::model::DeclaredAttributes, crate::MetadataError> {
            if self.broken {
                return Err(crate::MetadataError::Source("marker raised".into()));
            }
            Ok([("suite".to_string(), json!("smoke"))].into_iter().collect())
        }
    }

    #[test]
    fn custom_descriptor_capability_is_used() {
        let mut r = recorder();
        r.on_collection_complete(&[Annotated {
            nodeid: "pkg::smoke::boots",
            broken: false,
        }])
        .unwrap();
        let rec = r.record("pkg::smoke::boots").unwrap();
        assert_eq!(rec.title.as_deref(), Some("boots"));
        assert_eq!(rec.declared.get("suite"), Some(&json!("smoke")));

        let err = r
            .on_collection_complete(&[Annotated {
                nodeid: "pkg::smoke::broken",
                broken: true,
            }])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "declared metadata for pkg::smoke::broken is invalid: marker raised"
        );
    }

    #[test]
    fn successful_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");
        let mut r = RunRecorder::new(RecorderConfig::default().with_output(&out));
        r.on_session_start();
        let tests: Vec<_> = ["a", "b", "c"].map(CollectedTest::from_nodeid).into();
        r.on_collection_complete(&tests).unwrap();

        let outcome = r.on_session_finish(&SessionEnd::new(0, 3)).unwrap();
        assert_eq!(outcome, EmitOutcome::Skipped(SkipReason::NoFailures));
        assert!(!out.exists());
    }

    #[test]
    fn missing_output_path_is_configuration_error() {
        let mut r = recorder();
        r.on_session_start();
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Failed, 0.1));
        let err = r.on_session_finish(&SessionEnd::new(1, 1)).unwrap_err();
        assert!(matches!(err, RecorderError::MissingOutputPath));
        assert!(err.is_configuration());
    }

    #[test]
    fn finish_without_start_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig::default().with_output(dir.path().join("r.json"));
        let mut r = RunRecorder::new(config);
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Failed, 0.1));
        let err = r.on_session_finish(&SessionEnd::new(1, 1)).unwrap_err();
        assert!(matches!(err, RecorderError::SessionNotStarted));
    }

    #[test]
    fn reset_clears_run_state() {
        let mut r = recorder();
        r.on_session_start();
        r.on_test_result(&report("m::t", Phase::Call, Outcome::Failed, 0.1));
        r.reset();
        assert!(r.records().is_empty());
        assert_eq!(r.counters(), RunCounters::default());
        assert!(matches!(r.summary(0), Err(RecorderError::SessionNotStarted)));
    }

    #[test]
    fn shared_recorder_counts_each_identity_once_across_threads() {
        let shared = SharedRecorder::new(RecorderConfig::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("m::t{t}_{i}");
                        let outcome = if i % 5 == 0 { Outcome::Failed } else { Outcome::Passed };
                        shared.on_test_result(&report(&id, Phase::Setup, Outcome::Passed, 0.0));
                        shared.on_test_result(&report(&id, Phase::Call, outcome, 0.001));
                        shared.on_test_result(&report(&id, Phase::Teardown, Outcome::Failed, 0.0));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let c = shared.counters();
        assert_eq!(c.total(), 400);
        assert_eq!(c.failed, 80);
        assert_eq!(shared.with(|r| r.records().len()), 400);
    }
}
