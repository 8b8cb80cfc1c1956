//! Workflow execution results.

use super::context::SharedContext;
use crate::core::metrics::ExecutionMetrics;
use crate::squad::{SquadResult, SquadStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Completed,
    /// Ran, some squads or agents failed without a hard error.
    Partial,
    /// Hard error: a squad failed entirely or the step timed out.
    Failed,
    Skipped,
    Checkpoint,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::Completed => "completed",
            StepStatus::Partial => "partial",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
            StepStatus::Checkpoint => "checkpoint",
        }
    }
}

/// A failure recorded against a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// Squad that failed, or the step name for step-level failures.
    pub source: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub status: StepStatus,
    pub squad_results: Vec<SquadResult>,
    pub errors: Vec<StepError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub metrics: ExecutionMetrics,
}

impl StepOutcome {
    /// Derive the step status from its squad results.
    ///
    /// Any `Failed` squad is a hard error. Partial squads are recorded but
    /// leave the step `Partial`.
    pub fn from_squad_results(
        step: impl Into<String>,
        squad_results: Vec<SquadResult>,
        wall_clock: Duration,
    ) -> Self {
        let mut errors = Vec::new();
        for result in &squad_results {
            if result.status != SquadStatus::Completed {
                errors.push(StepError {
                    source: result.squad.clone(),
                    message: result.error_summary(),
                });
            }
        }

        let status = if squad_results.iter().any(SquadResult::is_failed) {
            StepStatus::Failed
        } else if squad_results.iter().any(|r| r.status == SquadStatus::Partial) {
            StepStatus::Partial
        } else {
            StepStatus::Completed
        };

        let metrics = squad_results
            .iter()
            .map(|r| &r.metrics)
            .sum::<ExecutionMetrics>()
            .with_elapsed(wall_clock);

        Self {
            step: step.into(),
            status,
            squad_results,
            errors,
            reason: None,
            metrics,
        }
    }

    pub fn skipped(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Skipped,
            squad_results: Vec::new(),
            errors: Vec::new(),
            reason: Some(reason.into()),
            metrics: ExecutionMetrics::new(),
        }
    }

    pub fn checkpoint(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            status: StepStatus::Checkpoint,
            squad_results: Vec::new(),
            errors: Vec::new(),
            reason: None,
            metrics: ExecutionMetrics::new(),
        }
    }

    /// A step that failed as a whole (timeout).
    pub fn failed(
        step: impl Into<String>,
        squad_results: Vec<SquadResult>,
        message: impl Into<String>,
        wall_clock: Duration,
    ) -> Self {
        let step = step.into();
        let message = message.into();
        let mut outcome = Self::from_squad_results(step.clone(), squad_results, wall_clock);
        outcome.status = StepStatus::Failed;
        outcome.errors.push(StepError {
            source: step,
            message: message.clone(),
        });
        outcome.reason = Some(message);
        outcome
    }

    pub fn is_hard_error(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// Snapshot taken by a checkpoint step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub step: String,
    pub context: SharedContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Completed,
    /// Every step ran, some recorded failures.
    CompletedWithErrors,
    /// A required step failed and later steps did not run.
    Halted,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub workflow: String,
    pub status: WorkflowStatus,
    pub steps: Vec<StepOutcome>,
    pub context: SharedContext,
    pub checkpoints: Vec<Checkpoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,
    pub metrics: ExecutionMetrics,
}

impl WorkflowResult {
    pub fn step(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == name)
    }

    /// Every failure recorded by any step, tagged with its step.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &StepError)> {
        self.steps
            .iter()
            .flat_map(|s| s.errors.iter().map(move |e| (s.step.as_str(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentOutput, AgentResult};

    fn ok(squad: &str) -> SquadResult {
        SquadResult::from_agent_results(
            squad,
            vec![AgentResult::success("a", AgentOutput::text("x"), ExecutionMetrics::new())],
            Duration::ZERO,
        )
    }

    #[test]
    fn test_failed_squad_is_hard_error() {
        let outcome = StepOutcome::from_squad_results(
            "build",
            vec![ok("c"), SquadResult::not_run("b", "boom")],
            Duration::ZERO,
        );
        assert!(outcome.is_hard_error());
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].source, "b");
    }

    #[test]
    fn test_partial_squad_is_not_hard_error() {
        let partial = SquadResult::from_agent_results(
            "b",
            vec![
                AgentResult::success("a", AgentOutput::text("x"), ExecutionMetrics::new()),
                AgentResult::failure("z", "bad", ExecutionMetrics::new()),
            ],
            Duration::ZERO,
        );
        let outcome =
            StepOutcome::from_squad_results("build", vec![ok("c"), partial], Duration::ZERO);
        assert_eq!(outcome.status, StepStatus::Partial);
        assert!(!outcome.is_hard_error());
    }

    #[test]
    fn test_timeout_failure_keeps_finished_results() {
        let outcome = StepOutcome::failed("build", vec![ok("c")], "timed out", Duration::ZERO);
        assert!(outcome.is_hard_error());
        assert_eq!(outcome.squad_results.len(), 1);
        assert_eq!(outcome.errors.last().unwrap().source, "build");
    }
}
