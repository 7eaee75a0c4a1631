//! Host integration: a recorded lifecycle event stream and the driver that
//! replays it through a [`RunRecorder`].
//!
//! Native streams are JSON lines, one [`HostEvent`] per line, tagged by `event`:
//!
//! ```text
//! {"event":"session_start"}
//! {"event":"collection_complete","tests":[{"nodeid":"m::a","name":"a","meta":{"owner":"qa"}}]}
//! {"event":"test_result","nodeid":"m::a","when":"call","outcome":"failed","duration":0.02}
//! {"event":"session_finish","exit_status":1,"collected":1,"options":["verbose"]}
//! ```

pub mod libtest;

use crate::descriptor::CollectedTest;
use crate::errors::RecorderError;
use crate::gate::SessionEnd;
use crate::model::PhaseReport;
use crate::recorder::{EmitOutcome, RunRecorder};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    SessionStart,
    CollectionComplete { tests: Vec<CollectedTest> },
    TestResult(PhaseReport),
    SessionFinish(SessionEnd),
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("failed to read event stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Recorder(#[from] RecorderError),

    #[error("event stream ended without session_finish")]
    NoSessionFinish,
}

impl HostError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Recorder(e) => e.exit_code(),
            _ => crate::errors::EXIT_CONFIG_ERROR,
        }
    }
}

/// Parse native JSONL events. Blank lines are skipped.
pub fn parse_jsonl(reader: impl BufRead) -> Result<Vec<HostEvent>, HostError> {
    let mut events = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = serde_json::from_str(&line).map_err(|source| HostError::Parse {
            line: i + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

/// Drive `recorder` through `events`, adding `extra_options` to every session end.
///
/// Returns the outcome of the last `session_finish`.
pub fn replay(
    recorder: &mut RunRecorder,
    events: impl IntoIterator<Item = HostEvent>,
    extra_options: &[String],
) -> Result<EmitOutcome, HostError> {
    let mut last = None;
    for event in events {
        match event {
            HostEvent::SessionStart => recorder.on_session_start(),
            HostEvent::CollectionComplete { tests } => recorder.on_collection_complete(&tests)?,
            HostEvent::TestResult(report) => recorder.on_test_result(&report),
            HostEvent::SessionFinish(mut end) => {
                end.options.extend(extra_options.iter().cloned());
                last = Some(recorder.on_session_finish(&end)?);
            }
        }
    }
    last.ok_or(HostError::NoSessionFinish)
}
