//! Application layer for squadforge
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::ExecutionParams;
pub use ports::{
    agent::{Agent, AgentError, AgentRegistry, DuplicateAgent, RawOutput, ValidationError},
    check_runner::{CheckRunner, CommandError, CommandOutput},
    completion::{CompletionError, CompletionGateway, CompletionRequest, CompletionResponse},
    progress::{EventBus, ListenerError, ProgressListener},
};
pub use use_cases::hybrid_executor::{HybridExecutor, HybridOutcome};
pub use use_cases::orchestrator::Orchestrator;
pub use use_cases::quality_gate::QualityGateEngine;
pub use use_cases::squad_manager::SquadManager;
pub use use_cases::workflow_engine::WorkflowEngine;
