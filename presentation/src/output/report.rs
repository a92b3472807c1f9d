//! Human-readable execution report

use maker_domain::{ExecutionState, StepStatus};
use std::fmt::Write;

const RULE_WIDTH: usize = 50;

/// Trait for rendering a session's ledger as text
pub trait ReportFormatter {
    /// Render the report; `None` means the session has no state
    fn format_report(&self, state: Option<&ExecutionState>) -> String;
}

/// Plain-text report, one line per step in step-id order
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReport;

impl TextReport {
    fn icon(status: StepStatus) -> char {
        match status {
            StepStatus::Decided => '✓',
            StepStatus::Failed => '✗',
            StepStatus::Voting => '…',
        }
    }
}

impl ReportFormatter for TextReport {
    fn format_report(&self, state: Option<&ExecutionState>) -> String {
        let Some(state) = state else {
            return "No state found".to_string();
        };

        let mut out = String::new();
        let metrics = &state.metrics;
        let _ = writeln!(out, "Execution Report");
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
        let _ = writeln!(out, "Session: {}", state.session_id);
        let _ = writeln!(out, "Task: {}", state.task_description);
        let _ = writeln!(out, "Status: {}", state.status);
        let _ = writeln!(out, "Margin k: {}", state.k);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total steps: {}", state.total_steps);
        let _ = writeln!(out, "Completed: {}", metrics.completed_steps);
        let _ = writeln!(out, "Failed: {}", metrics.failed_steps);
        let _ = writeln!(out, "Total votes cast: {}", metrics.total_votes_cast);
        let _ = writeln!(out, "Red-flagged votes: {}", metrics.red_flags);
        let _ = writeln!(out);
        let _ = writeln!(out, "Step Details:");
        let _ = write!(out, "{}", "-".repeat(RULE_WIDTH));

        // BTreeMap iteration is already sorted by step id
        for (step_id, step) in &state.steps {
            let _ = write!(
                out,
                "\n{} {}: votes={}, margin={}, red_flags={}",
                Self::icon(step.status),
                step_id,
                step.votes,
                step.margin,
                step.red_flags
            );
        }

        let _ = write!(out, "\n\nStarted: {}", state.started_at.to_rfc3339());
        if let Some(completed_at) = state.completed_at {
            let _ = write!(out, "\nCompleted: {}", completed_at.to_rfc3339());
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use maker_domain::{MetricsMode, SessionId, StepRecord};

    fn state() -> ExecutionState {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut state =
            ExecutionState::new(SessionId::parse("s1").unwrap(), 3, "hanoi", 3, at).unwrap();
        for (id, status, votes) in [
            ("step-2", StepStatus::Failed, 7),
            ("step-1", StepStatus::Decided, 3),
            ("step-3", StepStatus::Voting, 1),
        ] {
            state.apply_step(
                StepRecord::new(id, status, at).with_counts(votes, 1, 0),
                MetricsMode::Cumulative,
            );
        }
        state
    }

    #[test]
    fn test_absent_state() {
        assert_eq!(TextReport.format_report(None), "No state found");
    }

    #[test]
    fn test_steps_sorted_with_icons() {
        let report = TextReport.format_report(Some(&state()));
        let steps: Vec<&str> = report
            .lines()
            .filter(|line| line.contains(": votes="))
            .collect();

        assert_eq!(
            steps,
            vec![
                "✓ step-1: votes=3, margin=1, red_flags=0",
                "✗ step-2: votes=7, margin=1, red_flags=0",
                "… step-3: votes=1, margin=1, red_flags=0",
            ]
        );
    }

    #[test]
    fn test_header_and_metrics() {
        let report = TextReport.format_report(Some(&state()));

        assert!(report.starts_with("Execution Report\n"));
        assert!(report.contains("Session: s1\n"));
        assert!(report.contains("Status: in_progress\n"));
        assert!(report.contains("Total votes cast: 11\n"));
        assert!(report.contains("Started: 2026-01-02T03:04:05+00:00"));
        assert!(!report.contains("Completed: 2026"));
    }

    #[test]
    fn test_report_is_deterministic() {
        let state = state();
        assert_eq!(
            TextReport.format_report(Some(&state)),
            TextReport.format_report(Some(&state))
        );
    }

    #[test]
    fn test_completed_timestamp() {
        let mut state = state();
        state.complete(true, Utc.with_ymd_and_hms(2026, 1, 2, 4, 0, 0).unwrap());

        let report = TextReport.format_report(Some(&state));
        assert!(report.contains("Status: success\n"));
        assert!(report.ends_with("Completed: 2026-01-02T04:00:00+00:00"));
    }
}
