//! Run summaries built from recorded execution events.

use crate::execution::{ExecutionEvent, RecordingListener, TestResult};
use crate::unique_id::UniqueId;
use serde::Serialize;
use std::fmt::Write;

/// One failed rule in a [`RunSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedRule {
    /// Id of the failed test node.
    pub id: UniqueId,
    /// Display name of the failed test node.
    pub display_name: String,
    /// Failure message.
    pub message: String,
}

/// Outcome counts of a run. Only test nodes are counted, plus every
/// reported skip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Rules without violations.
    pub successful: usize,
    /// Rules with violations or evaluation errors.
    pub failed: usize,
    /// Rules not evaluated because the run was aborted.
    pub aborted: usize,
    /// Ignored nodes.
    pub skipped: usize,
    /// Details of each failed rule, in execution order.
    pub failures: Vec<FailedRule>,
}

impl RunSummary {
    /// Creates an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Summarizes a sequence of execution events.
    #[must_use]
    pub fn from_events(events: &[ExecutionEvent]) -> Self {
        let mut summary = Self::new();
        for event in events {
            match event {
                ExecutionEvent::Finished {
                    id,
                    is_test: true,
                    display_name,
                    result,
                } => match result {
                    TestResult::Successful => summary.successful += 1,
                    TestResult::Aborted => summary.aborted += 1,
                    TestResult::Failed { message, .. } => {
                        summary.failed += 1;
                        summary.failures.push(FailedRule {
                            id: id.clone(),
                            display_name: display_name.clone(),
                            message: message.clone(),
                        });
                    }
                },
                ExecutionEvent::Skipped { .. } => summary.skipped += 1,
                _ => {}
            }
        }
        summary
    }

    /// Returns the number of executed rules.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.successful + self.failed + self.aborted
    }

    /// Returns true if no rule failed and nothing was aborted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.aborted == 0
    }

    /// Formats the summary as a human-readable multi-line report.
    #[must_use]
    pub fn format_report(&self) -> String {
        let mut report = String::new();
        let _ = writeln!(report, "=== arch-test: {} failed rule(s) ===", self.failed);

        for failure in &self.failures {
            let _ = writeln!(report);
            let _ = writeln!(report, "{} at {}", failure.display_name, failure.id);
            for line in failure.message.lines() {
                let _ = writeln!(report, "  {line}");
            }
        }

        let _ = writeln!(report);
        let _ = writeln!(
            report,
            "Total: {} successful, {} failed, {} aborted, {} skipped",
            self.successful, self.failed, self.aborted, self.skipped
        );
        report
    }

    /// Serializes the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&RecordingListener> for RunSummary {
    fn from(listener: &RecordingListener) -> Self {
        Self::from_events(listener.events())
    }
}
