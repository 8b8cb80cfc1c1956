//! Top-level orchestration types: request, mode, events and final result.

pub mod event;
pub mod mode;
pub mod request;
pub mod result;

pub use event::OrchestrationEvent;
pub use mode::ExecutionMode;
pub use request::OrchestrationRequest;
pub use result::{ErrorSource, OrchestrationError, OrchestrationStatus, OrchestratorResult};
