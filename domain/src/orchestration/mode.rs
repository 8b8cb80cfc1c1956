//! Execution mode chosen by the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How squads are scheduled for a request.
///
/// - **Workflow**: a named, ordered list of typed steps.
/// - **Hybrid**: every registered squad, scheduled by its declared
///   dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "workflow", rename_all = "snake_case")]
pub enum ExecutionMode {
    Workflow(String),
    #[default]
    Hybrid,
}

impl ExecutionMode {
    pub fn workflow_name(&self) -> Option<&str> {
        match self {
            ExecutionMode::Workflow(name) => Some(name),
            ExecutionMode::Hybrid => None,
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Workflow(name) => write!(f, "workflow:{name}"),
            ExecutionMode::Hybrid => f.write_str("hybrid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_serde() {
        let mode = ExecutionMode::Workflow("fullstack".to_string());
        assert_eq!(mode.to_string(), "workflow:fullstack");
        assert_eq!(
            serde_json::to_value(&mode).unwrap(),
            serde_json::json!({"kind": "workflow", "workflow": "fullstack"})
        );
        assert_eq!(ExecutionMode::default().to_string(), "hybrid");
        assert_eq!(ExecutionMode::Hybrid.workflow_name(), None);
    }
}
