use crate::recorder::EmitOutcome;

/// One-line human summary of the session-finish result. Deterministic, unit-testable.
#[must_use]
pub fn format_outcome_line(outcome: &EmitOutcome) -> String {
    match outcome {
        EmitOutcome::Skipped(reason) => format!("metaexport: no report ({})", reason.as_str()),
        EmitOutcome::Written {
            path,
            collected,
            counters,
        } => format!(
            "metaexport: wrote {} (collected={} passed={} failed={} skipped={})",
            path.display(),
            collected,
            counters.passed,
            counters.failed,
            counters.skipped
        ),
    }
}

/// Write the summary line to stderr.
pub fn print_outcome(outcome: &EmitOutcome) {
    eprintln!("{}", format_outcome_line(outcome));
}
