//! Domain layer for squadforge
//!
//! Pure entities, value objects and algorithms. No I/O, no async runtime.
//!
//! # Core Concepts
//!
//! ## Agents and squads
//!
//! An agent turns one [`AgentTask`] into an [`AgentResult`]. A [`Squad`] is a
//! named group of agents with declared dependencies on other squads; its
//! agents always run together.
//!
//! ## Workflows and hybrid execution
//!
//! A [`Workflow`] is an ordered list of typed steps over squads. Without a
//! workflow, squads are scheduled by dependency through
//! [`SquadRegistry::ready_set`].
//!
//! ## Quality gate
//!
//! [`QualityCheck`]s run external commands over generated artifacts; their
//! output is parsed into [`Issue`]s and summarized in a [`QualityReport`].
//!
//! ## Context budget
//!
//! [`ContextCompressor`] keeps requests under a [`ContextBudget`] by
//! summarizing history and shrinking oversized files.

pub mod agent;
pub mod context;
pub mod core;
pub mod orchestration;
pub mod quality;
pub mod session;
pub mod squad;
pub mod workflow;

pub use agent::{AgentConfig, AgentOutput, AgentResult, AgentStatus, AgentTask, Artifact, TaskKind};
pub use context::{ContextBudget, ContextCompressor, clip_bytes, estimate_tokens};
pub use core::{
    error::DomainError,
    metrics::{ExecutionMetrics, TokenUsage},
};
pub use orchestration::{
    ErrorSource, ExecutionMode, OrchestrationError, OrchestrationEvent, OrchestrationRequest,
    OrchestrationStatus, OrchestratorResult,
};
pub use quality::{
    CheckResult, CheckStatus, Issue, QualityCheck, QualityReport, ReportStatus, Severity,
};
pub use session::{Message, Role};
pub use squad::{AgentFailure, DependencyError, Squad, SquadRegistry, SquadResult, SquadStatus};
pub use workflow::{
    Checkpoint, SharedContext, StepCondition, StepOutcome, StepStatus, StepType, Workflow,
    WorkflowResult, WorkflowStatus, WorkflowStep,
};
