//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// Raised when a static definition (agent config, squad, workflow, budget)
/// violates an invariant at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid agent config for '{agent}': {reason}")]
    InvalidAgentConfig { agent: String, reason: String },

    #[error("Invalid context budget: {0}")]
    InvalidBudget(String),

    #[error("Invalid squad '{squad}': {reason}")]
    InvalidSquad { squad: String, reason: String },

    #[error("Duplicate squad: {0}")]
    DuplicateSquad(String),

    #[error("Invalid workflow '{workflow}': {reason}")]
    InvalidWorkflow { workflow: String, reason: String },

    #[error("Invalid quality check '{check}': {reason}")]
    InvalidCheck { check: String, reason: String },
}

impl DomainError {
    pub(crate) fn agent(agent: &str, reason: impl Into<String>) -> Self {
        DomainError::InvalidAgentConfig {
            agent: agent.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_error_names_agent() {
        let error = DomainError::agent("frontend", "temperature out of range");
        assert_eq!(
            error.to_string(),
            "Invalid agent config for 'frontend': temperature out of range"
        );
    }
}
