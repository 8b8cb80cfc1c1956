//! Agent port
//!
//! An agent turns one [`AgentTask`] into an [`AgentResult`] in three phases:
//! `validate`, `execute`, `format`. Callers only ever use [`Agent::run`],
//! which chains the phases and never fails.

use super::completion::CompletionError;
use async_trait::async_trait;
use squadforge_domain::{
    AgentConfig, AgentOutput, AgentResult, AgentTask, ExecutionMetrics, TaskKind,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Rejected agent input. Fatal for the call, never for the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("agent '{agent}' does not handle {kind} tasks")]
    UnsupportedTask { agent: String, kind: TaskKind },

    #[error("instruction is empty")]
    EmptyInstruction,

    #[error("{0} task has no artifacts")]
    MissingArtifacts(TaskKind),

    #[error("fix task has no issues")]
    MissingIssues,
}

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unusable response: {0}")]
    Format(String),
}

/// Unparsed result of [`Agent::execute`].
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
    pub text: String,
    pub metrics: ExecutionMetrics,
}

impl RawOutput {
    pub fn new(text: impl Into<String>, metrics: ExecutionMetrics) -> Self {
        Self {
            text: text.into(),
            metrics,
        }
    }
}

/// Checks every agent shares: non-empty instruction, artifacts for review
/// and fix tasks, issues for fix tasks.
pub fn validate_task_shape(task: &AgentTask) -> Result<(), ValidationError> {
    if task.instruction().trim().is_empty() {
        return Err(ValidationError::EmptyInstruction);
    }
    match task {
        AgentTask::Generate { .. } => Ok(()),
        AgentTask::Review { artifacts, .. } if artifacts.is_empty() => {
            Err(ValidationError::MissingArtifacts(TaskKind::Review))
        }
        AgentTask::Fix { artifacts, .. } if artifacts.is_empty() => {
            Err(ValidationError::MissingArtifacts(TaskKind::Fix))
        }
        AgentTask::Fix { issues, .. } if issues.is_empty() => Err(ValidationError::MissingIssues),
        _ => Ok(()),
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn config(&self) -> &AgentConfig;

    fn name(&self) -> &str {
        self.config().name()
    }

    fn validate(&self, task: &AgentTask) -> Result<(), ValidationError>;

    /// Build the prompt, call the completion service, return raw text.
    async fn execute(&self, task: &AgentTask) -> Result<RawOutput, AgentError>;

    fn format(&self, raw: &str) -> Result<AgentOutput, AgentError>;

    /// Bound on the whole `execute` phase.
    ///
    /// Agents that pass their timeout down to each completion attempt
    /// return `None`, so a timed-out attempt can still be retried.
    fn execution_timeout(&self) -> Option<Duration> {
        Some(self.config().timeout())
    }

    /// Run all three phases. Any error or a timeout becomes a failed result.
    async fn run(&self, task: &AgentTask) -> AgentResult {
        let name = self.name().to_string();

        if let Err(e) = self.validate(task) {
            debug!("Agent {} rejected {} task: {}", name, task.kind(), e);
            let message = AgentError::from(e).to_string();
            return AgentResult::failure(name, message, ExecutionMetrics::new());
        }

        let executed = match self.execution_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.execute(task))
                .await
                .unwrap_or(Err(AgentError::Timeout(limit))),
            None => self.execute(task).await,
        };
        let raw = match executed {
            Ok(raw) => raw,
            Err(e) => {
                return AgentResult::failure(name, e.to_string(), ExecutionMetrics::new());
            }
        };

        match self.format(&raw.text) {
            Ok(output) => AgentResult::success(name, output, raw.metrics),
            Err(e) => AgentResult::failure(name, e.to_string(), raw.metrics),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Duplicate agent: {0}")]
pub struct DuplicateAgent(pub String);

/// Agents by name.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, agent: Arc<dyn Agent>) -> Result<(), DuplicateAgent> {
        let name = agent.name().to_string();
        if self.agents.contains_key(&name) {
            return Err(DuplicateAgent(name));
        }
        self.agents.insert(name, agent);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}
