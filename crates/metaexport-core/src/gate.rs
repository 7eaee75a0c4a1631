//! Session-end emission gate.

use crate::model::RunCounters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host option names that mark a collection-only / dry-run session.
pub const COLLECT_ONLY_FLAGS: &[&str] = &["collectonly", "collect_only", "co", "dry_run"];

/// Host exit status reserved for "no tests collected".
pub const EXIT_NO_TESTS_COLLECTED: i32 = 5;

/// What the host supplies at session end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnd {
    #[serde(alias = "exitstatus")]
    pub exit_status: i32,
    pub collected: u64,
    /// Names of boolean host options that are switched on.
    #[serde(default)]
    pub options: BTreeSet<String>,
}

impl SessionEnd {
    pub fn new(exit_status: i32, collected: u64) -> Self {
        Self {
            exit_status,
            collected,
            options: BTreeSet::new(),
        }
    }

    pub fn with_option(mut self, name: impl Into<String>) -> Self {
        self.options.insert(name.into());
        self
    }

    pub fn is_collect_only(&self) -> bool {
        COLLECT_ONLY_FLAGS
            .iter()
            .any(|flag| self.options.contains(*flag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    CollectOnly,
    NoFailures,
    NoTestsCollected,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CollectOnly => "collection-only session",
            Self::NoFailures => "all collected tests succeeded",
            Self::NoTestsCollected => "no tests collected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitDecision {
    Emit,
    Skip(SkipReason),
}

/// Checks run in order; the first match wins.
pub fn decide(end: &SessionEnd, counters: &RunCounters, always_emit: bool) -> EmitDecision {
    if end.is_collect_only() {
        return EmitDecision::Skip(SkipReason::CollectOnly);
    }
    if !always_emit && end.collected > 0 && counters.failed == 0 {
        return EmitDecision::Skip(SkipReason::NoFailures);
    }
    if end.exit_status == EXIT_NO_TESTS_COLLECTED {
        return EmitDecision::Skip(SkipReason::NoTestsCollected);
    }
    EmitDecision::Emit
}
