use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Author-declared attributes attached to a test definition, in declaration order.
pub type DeclaredAttributes = Map<String, Value>;

/// Keys owned by the record itself; declared attributes may not shadow them.
/// `title` is absent on purpose: a declared title overrides the display name.
pub const RESERVED_KEYS: &[&str] = &["nodeid", "status", "duration"];

/// Phase of a per-test result notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Call,
    Teardown,
    /// Phases this recorder does not model; always a no-op.
    #[serde(other)]
    Other,
}

/// Outcome as reported by the host for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
    #[serde(other)]
    Other,
}

/// Terminal status stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn from_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::Passed => Some(Self::Passed),
            Outcome::Failed => Some(Self::Failed),
            Outcome::Skipped => Some(Self::Skipped),
            Outcome::Other => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// One phase-result notification from the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub nodeid: String,
    pub when: Phase,
    pub outcome: Outcome,
    /// Phase duration in seconds.
    #[serde(default)]
    pub duration: f64,
}

impl PhaseReport {
    pub fn new(nodeid: impl Into<String>, when: Phase, outcome: Outcome, duration: f64) -> Self {
        Self {
            nodeid: nodeid.into(),
            when,
            outcome,
            duration,
        }
    }
}

/// Result state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RecordState {
    /// Collected (or referenced) but no terminal result yet.
    #[default]
    Pending,
    Completed {
        status: TestStatus,
        duration_secs: f64,
    },
}

impl RecordState {
    pub fn status(&self) -> Option<TestStatus> {
        match self {
            Self::Pending => None,
            Self::Completed { status, .. } => Some(*status),
        }
    }

    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            Self::Pending => None,
            Self::Completed { duration_secs, .. } => Some(*duration_secs),
        }
    }
}

/// Metadata for one discovered test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestRecord {
    pub nodeid: String,
    /// `None` only for records created by a result for an uncollected test.
    pub title: Option<String>,
    pub declared: DeclaredAttributes,
    pub state: RecordState,
}

impl TestRecord {
    pub fn new(nodeid: impl Into<String>) -> Self {
        Self {
            nodeid: nodeid.into(),
            title: None,
            declared: DeclaredAttributes::new(),
            state: RecordState::Pending,
        }
    }

    /// Additive merge: present keys add or overwrite, absent keys keep their value.
    ///
    /// A declared `title` overrides the record title. Reserved keys are dropped.
    pub fn merge_declared(&mut self, attrs: DeclaredAttributes) {
        for (key, value) in attrs {
            if key == "title" {
                match value {
                    Value::String(s) => self.title = Some(s),
                    other => self.title = Some(other.to_string()),
                }
                continue;
            }
            if RESERVED_KEYS.contains(&key.as_str()) {
                tracing::warn!(
                    nodeid = %self.nodeid,
                    key = %key,
                    "declared attribute shadows a reserved report key; dropped"
                );
                continue;
            }
            self.declared.insert(key, value);
        }
    }
}

/// Wire view of a record: fixed keys first, declared attributes after.
#[derive(Serialize)]
struct RecordView<'a> {
    nodeid: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<f64>,
    #[serde(flatten)]
    declared: &'a DeclaredAttributes,
}

impl Serialize for TestRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordView {
            nodeid: &self.nodeid,
            title: self.title.as_deref(),
            status: self.state.status(),
            duration: self.state.duration_secs(),
            declared: &self.declared,
        }
        .serialize(serializer)
    }
}

/// Run-wide tallies, incremented once per terminal outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl RunCounters {
    pub fn record(&mut self, status: TestStatus) {
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.passed + self.failed + self.skipped
    }
}
