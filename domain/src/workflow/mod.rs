//! Workflows: ordered, typed steps over squads.
//!
//! - [`entities::Workflow`] / [`entities::WorkflowStep`] — static definitions
//! - [`condition::StepCondition`] — predicate for conditional steps
//! - [`context::SharedContext`] — running context threaded between steps
//! - [`result::WorkflowResult`] — per-step outcomes, checkpoints, metrics

pub mod condition;
pub mod context;
pub mod entities;
pub mod result;

pub use condition::StepCondition;
pub use context::SharedContext;
pub use entities::{StepType, Workflow, WorkflowStep};
pub use result::{
    Checkpoint, StepError, StepOutcome, StepStatus, WorkflowResult, WorkflowStatus,
};
