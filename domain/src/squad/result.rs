//! Fan-in of one squad's agent results.

use crate::agent::{AgentOutput, AgentResult};
use crate::core::metrics::ExecutionMetrics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Aggregate status of a squad run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquadStatus {
    /// Every agent succeeded.
    Completed,
    /// Some agents succeeded, some failed.
    Partial,
    /// No agent succeeded.
    Failed,
}

impl SquadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SquadStatus::Completed => "completed",
            SquadStatus::Partial => "partial",
            SquadStatus::Failed => "failed",
        }
    }
}

/// A contained agent failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFailure {
    pub agent: String,
    pub message: String,
}

/// Result of running one squad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadResult {
    pub squad: String,
    pub status: SquadStatus,
    /// Outputs of the agents that succeeded, by agent name.
    pub outputs: BTreeMap<String, AgentOutput>,
    pub errors: Vec<AgentFailure>,
    pub metrics: ExecutionMetrics,
}

impl SquadResult {
    /// Fold individual agent results into a squad result.
    ///
    /// `wall_clock` is the elapsed time of the whole fan-out.
    pub fn from_agent_results(
        squad: impl Into<String>,
        results: Vec<AgentResult>,
        wall_clock: Duration,
    ) -> Self {
        let mut outputs = BTreeMap::new();
        let mut errors = Vec::new();
        let mut metrics = ExecutionMetrics::new();

        metrics.agents_total = results.len() as u64;
        for result in results {
            metrics.merge(result.metrics());
            if result.is_success() {
                metrics.agents_executed += 1;
                let agent = result.agent().to_string();
                outputs.insert(agent, result.into_output());
            } else {
                metrics.agents_failed += 1;
                errors.push(AgentFailure {
                    agent: result.agent().to_string(),
                    message: result.error().unwrap_or("unknown error").to_string(),
                });
            }
        }
        errors.sort_by(|a, b| a.agent.cmp(&b.agent));

        let status = if errors.is_empty() {
            SquadStatus::Completed
        } else if outputs.is_empty() {
            SquadStatus::Failed
        } else {
            SquadStatus::Partial
        };

        Self {
            squad: squad.into(),
            status,
            outputs,
            errors,
            metrics: metrics.with_elapsed(wall_clock),
        }
    }

    /// A squad that never ran (unknown squad, failed prerequisite, step timeout).
    pub fn not_run(squad: impl Into<String>, reason: impl Into<String>) -> Self {
        let squad = squad.into();
        Self {
            errors: vec![AgentFailure {
                agent: squad.clone(),
                message: reason.into(),
            }],
            squad,
            status: SquadStatus::Failed,
            outputs: BTreeMap::new(),
            metrics: ExecutionMetrics::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == SquadStatus::Failed
    }

    /// One-line description of the errors, for error reports.
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.agent, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
