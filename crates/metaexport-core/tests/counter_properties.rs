//! Counter invariants under arbitrary result sequences.

use metaexport_core::{Outcome, Phase, PhaseReport, RecorderConfig, RunRecorder};
use proptest::prelude::*;
use std::collections::HashSet;

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::Passed),
        Just(Outcome::Failed),
        Just(Outcome::Skipped),
    ]
}

fn phase() -> impl Strategy<Value = Phase> {
    prop_oneof![
        Just(Phase::Setup),
        Just(Phase::Call),
        Just(Phase::Teardown),
        Just(Phase::Other),
    ]
}

proptest! {
    #[test]
    fn call_only_counters_sum_to_distinct_identities(
        calls in prop::collection::vec((0u8..12, outcome(), 0.0f64..5.0), 0..64)
    ) {
        let mut r = RunRecorder::new(RecorderConfig::default());
        let mut ids = HashSet::new();
        for (id, outcome, d) in &calls {
            let nodeid = format!("m::t{id}");
            ids.insert(nodeid.clone());
            r.on_test_result(&PhaseReport::new(nodeid, Phase::Call, *outcome, *d));
        }
        prop_assert_eq!(r.counters().total(), ids.len() as u64);
    }

    #[test]
    fn counters_match_record_statuses(
        reports in prop::collection::vec((0u8..8, phase(), outcome(), 0.0f64..5.0), 0..64)
    ) {
        let mut r = RunRecorder::new(RecorderConfig::default());
        for (id, phase, outcome, d) in &reports {
            r.on_test_result(&PhaseReport::new(format!("m::t{id}"), *phase, *outcome, *d));
        }
        let c = r.counters();
        let completed = r.records().iter().filter(|t| t.state.status().is_some()).count();
        prop_assert_eq!(c.total(), completed as u64);
        for rec in r.records() {
            if let Some(d) = rec.state.duration_secs() {
                prop_assert!(d >= 0.0);
            }
        }
    }
}
