//! Adapter for libtest's JSON output (`cargo test -- -Z unstable-options --format json`).
//!
//! libtest interleaves discovery and execution, so the whole stream is read
//! first and re-emitted in lifecycle order: start, collection (first-seen
//! order), results, finish. Consecutive suites (one per test binary) merge
//! into a single session. When more than one suite runs tests, identities are
//! prefixed with the suite ordinal (`suite2::tests::roundtrip`) so equal test
//! names in different binaries stay distinct.

use super::{HostError, HostEvent};
use crate::descriptor::CollectedTest;
use crate::gate::{SessionEnd, EXIT_NO_TESTS_COLLECTED};
use crate::model::{Outcome, Phase, PhaseReport};
use serde::Deserialize;
use std::collections::HashSet;
use std::io::BufRead;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Line {
    Suite { event: String },
    Test(TestLine),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TestLine {
    event: String,
    name: String,
    #[serde(default)]
    exec_time: Option<f64>,
}

/// A test name scoped to the suite (1-based) that reported it.
type SuiteTest = (usize, String);

/// Translate a libtest JSON stream into native host events.
///
/// Lines that are not JSON objects (captured test output) are skipped.
pub fn translate(reader: impl BufRead) -> Result<Vec<HostEvent>, HostError> {
    let mut order: Vec<SuiteTest> = Vec::new();
    let mut seen: HashSet<SuiteTest> = HashSet::new();
    let mut results: Vec<(SuiteTest, Phase, Outcome, f64)> = Vec::new();
    let mut suite = 0usize;
    let mut suite_failed = false;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            continue;
        }
        let parsed: Line = serde_json::from_str(trimmed).map_err(|source| HostError::Parse {
            line: i + 1,
            source,
        })?;
        match parsed {
            Line::Suite { event } => match event.as_str() {
                "started" => suite += 1,
                "failed" => suite_failed = true,
                _ => {}
            },
            Line::Test(test) => {
                let key = (suite.max(1), test.name);
                if seen.insert(key.clone()) {
                    order.push(key.clone());
                }
                let duration = test.exec_time.unwrap_or(0.0);
                let (when, outcome, duration) = match test.event.as_str() {
                    "ok" => (Phase::Call, Outcome::Passed, duration),
                    "failed" => (Phase::Call, Outcome::Failed, duration),
                    "ignored" => (Phase::Setup, Outcome::Skipped, 0.0),
                    // "started", "timeout" and anything newer carry no terminal result
                    _ => continue,
                };
                results.push((key, when, outcome, duration));
            }
            Line::Other => {}
        }
    }

    let any_failed = suite_failed || results.iter().any(|r| r.2 == Outcome::Failed);
    let exit_status = if order.is_empty() {
        EXIT_NO_TESTS_COLLECTED
    } else if any_failed {
        1
    } else {
        0
    };
    let collected = order.len() as u64;
    let multi_suite = order.iter().any(|(s, _)| *s != order[0].0);
    let nodeid = |(suite, name): SuiteTest| {
        if multi_suite {
            format!("suite{suite}::{name}")
        } else {
            name
        }
    };

    let mut events = Vec::with_capacity(results.len() + 3);
    events.push(HostEvent::SessionStart);
    events.push(HostEvent::CollectionComplete {
        tests: order
            .into_iter()
            .map(|key| CollectedTest::from_nodeid(nodeid(key)))
            .collect(),
    });
    events.extend(results.into_iter().map(|(key, when, outcome, duration)| {
        HostEvent::TestResult(PhaseReport::new(nodeid(key), when, outcome, duration))
    }));
    events.push(HostEvent::SessionFinish(SessionEnd::new(exit_status, collected)));
    Ok(events)
}
