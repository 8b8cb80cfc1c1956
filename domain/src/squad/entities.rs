//! Squad definition.

use crate::core::error::DomainError;
use crate::workflow::context::SharedContext;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A named group of agents executed together.
///
/// Squads are static: built once from configuration and never mutated.
/// `dependencies` name other squads that must have produced output before
/// this squad starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub name: String,
    pub agents: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Higher runs first among squads that are ready at the same time.
    #[serde(default)]
    pub priority: i32,
    /// Instruction handed to every agent of the squad. Falls back to the
    /// request description when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl Squad {
    pub fn new(name: impl Into<String>, agents: Vec<String>) -> Self {
        Self {
            name: name.into(),
            agents,
            dependencies: Vec::new(),
            priority: 0,
            instruction: None,
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn depends_on(&self, squad: &str) -> bool {
        self.dependencies.iter().any(|d| d == squad)
    }

    /// Structural checks that do not need the rest of the registry.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidSquad {
            squad: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.name == SharedContext::INPUT_SQUAD {
            return Err(invalid("name is reserved for request files"));
        }
        if self.agents.is_empty() {
            return Err(invalid("squad has no agents"));
        }
        let mut seen = HashSet::new();
        if let Some(agent) = self.agents.iter().find(|a| !seen.insert(a.as_str())) {
            return Err(invalid(&format!("agent '{agent}' is listed twice")));
        }
        if self.depends_on(&self.name) {
            return Err(invalid("squad depends on itself"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let squad = Squad::new("backend", vec!["api".to_string()]);
        assert!(squad.validate().is_ok());

        let empty = Squad::new("backend", vec![]);
        assert!(empty.validate().is_err());

        let self_dep =
            Squad::new("a", vec!["x".to_string()]).with_dependencies(vec!["a".to_string()]);
        assert!(self_dep.validate().is_err());
    }

    #[test]
    fn test_reserved_name_is_rejected() {
        let squad = Squad::new(SharedContext::INPUT_SQUAD, vec!["a".to_string()]);
        let err = squad.validate().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn test_duplicate_agent_is_rejected() {
        let squad = Squad::new(
            "backend",
            vec!["api".to_string(), "db".to_string(), "api".to_string()],
        );
        let err = squad.validate().unwrap_err();
        assert!(err.to_string().contains("'api' is listed twice"));
    }
}
