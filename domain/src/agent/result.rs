//! Per-call agent result.

use super::output::AgentOutput;
use crate::core::metrics::ExecutionMetrics;
use serde::{Deserialize, Serialize};

/// Outcome of one agent call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Success,
    Failed,
}

/// Result of one `Agent::run` call.
///
/// Only constructible through [`AgentResult::success`] and
/// [`AgentResult::failure`], so `status == Failed` exactly when `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    agent: String,
    status: AgentStatus,
    output: AgentOutput,
    metrics: ExecutionMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl AgentResult {
    pub fn success(agent: impl Into<String>, output: AgentOutput, metrics: ExecutionMetrics) -> Self {
        Self {
            agent: agent.into(),
            status: AgentStatus::Success,
            output,
            metrics,
            error: None,
        }
    }

    pub fn failure(
        agent: impl Into<String>,
        error: impl Into<String>,
        metrics: ExecutionMetrics,
    ) -> Self {
        Self {
            agent: agent.into(),
            status: AgentStatus::Failed,
            output: AgentOutput::default(),
            metrics,
            error: Some(error.into()),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Success
    }

    pub fn output(&self) -> &AgentOutput {
        &self.output
    }

    pub fn into_output(self) -> AgentOutput {
        self.output
    }

    pub fn metrics(&self) -> &ExecutionMetrics {
        &self.metrics
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
