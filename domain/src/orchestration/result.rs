//! Terminal result of an orchestration run.

use super::mode::ExecutionMode;
use crate::core::metrics::ExecutionMetrics;
use crate::quality::QualityReport;
use crate::squad::SquadResult;
use crate::workflow::{SharedContext, StepOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestrationStatus {
    /// Everything ran and nothing failed.
    Success,
    /// Output was produced but something failed along the way.
    Partial,
    /// The run could not produce a usable result.
    Failed,
}

impl OrchestrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationStatus::Success => "success",
            OrchestrationStatus::Partial => "partial",
            OrchestrationStatus::Failed => "failed",
        }
    }
}

/// What an [`OrchestrationError`] is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorSource {
    Squad,
    Step,
    Check,
    Dependency,
    Workflow,
    Request,
}

impl ErrorSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorSource::Squad => "squad",
            ErrorSource::Step => "step",
            ErrorSource::Check => "check",
            ErrorSource::Dependency => "dependency",
            ErrorSource::Workflow => "workflow",
            ErrorSource::Request => "request",
        }
    }
}

/// A failure named by what failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestrationError {
    pub source: ErrorSource,
    pub name: String,
    pub message: String,
}

impl OrchestrationError {
    pub fn new(source: ErrorSource, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn squad(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorSource::Squad, name, message)
    }

    pub fn step(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorSource::Step, name, message)
    }

    pub fn check(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorSource::Check, name, message)
    }
}

impl fmt::Display for OrchestrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}': {}", self.source.as_str(), self.name, self.message)
    }
}

/// Immutable outcome of one request.
///
/// A `Failed` or `Partial` result always carries at least one error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorResult {
    pub status: OrchestrationStatus,
    pub mode: ExecutionMode,
    /// Final running context: every squad output plus request variables.
    pub outputs: SharedContext,
    /// Per-step outcomes (workflow mode only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepOutcome>,
    /// Squad results in execution order, both modes.
    pub squad_results: Vec<SquadResult>,
    pub metrics: ExecutionMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_report: Option<QualityReport>,
    pub errors: Vec<OrchestrationError>,
}

impl OrchestratorResult {
    /// A run rejected before any squad executed.
    pub fn rejected(mode: ExecutionMode, error: OrchestrationError) -> Self {
        Self {
            status: OrchestrationStatus::Failed,
            mode,
            outputs: SharedContext::new(),
            steps: Vec::new(),
            squad_results: Vec::new(),
            metrics: ExecutionMetrics::new(),
            quality_report: None,
            errors: vec![error],
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OrchestrationStatus::Success
    }

    pub fn squad_result(&self, squad: &str) -> Option<&SquadResult> {
        self.squad_results.iter().find(|r| r.squad == squad)
    }
}
