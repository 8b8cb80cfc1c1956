//! Agent subdomain: static configuration, tagged requests and per-call results.
//!
//! The agent implementations themselves live outside the domain; this module
//! only fixes the data that crosses the `Agent` boundary.

pub mod config;
pub mod output;
pub mod result;
pub mod task;

pub use config::AgentConfig;
pub use output::{AgentOutput, Artifact};
pub use result::{AgentResult, AgentStatus};
pub use task::{AgentTask, TaskKind};
