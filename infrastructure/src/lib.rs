//! Infrastructure layer for squadforge
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, plus configuration file loading.

pub mod agents;
pub mod bootstrap;
pub mod completion;
pub mod config;
pub mod logging;
pub mod quality;

// Re-export commonly used types
pub use agents::{PromptAgent, extract_artifacts, language_for};
pub use bootstrap::build_orchestrator;
#[cfg(feature = "http")]
pub use completion::HttpTransport;
pub use completion::{ClientUsage, CompletionClient, CompletionTransport, RetryPolicy};
pub use config::{
    ConfigError, ConfigIssue, ConfigLoader, ConfigSource, FileAgentConfig, FileConfig,
};
pub use logging::JsonlEventLogger;
pub use quality::ProcessCheckRunner;
