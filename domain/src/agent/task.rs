//! Tagged agent requests.
//!
//! Every agent receives an [`AgentTask`]. The variant tells the agent what
//! kind of work is asked; agents reject variants they do not support during
//! validation instead of probing loosely typed payloads.

use super::output::Artifact;
use crate::quality::Issue;
use crate::workflow::SharedContext;
use std::sync::Arc;

/// Discriminant of an [`AgentTask`], used in validation errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    Generate,
    Review,
    Fix,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Generate => "generate",
            TaskKind::Review => "review",
            TaskKind::Fix => "fix",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request handed to one agent.
#[derive(Debug, Clone)]
pub enum AgentTask {
    /// Produce new output from an instruction plus everything generated so far.
    Generate {
        instruction: String,
        context: Arc<SharedContext>,
    },
    /// Critique existing artifacts.
    Review {
        instruction: String,
        artifacts: Vec<Artifact>,
    },
    /// Repair artifacts given the issues a quality check reported.
    Fix {
        instruction: String,
        artifacts: Vec<Artifact>,
        issues: Vec<Issue>,
    },
}

impl AgentTask {
    pub fn generate(instruction: impl Into<String>, context: Arc<SharedContext>) -> Self {
        AgentTask::Generate {
            instruction: instruction.into(),
            context,
        }
    }

    pub fn kind(&self) -> TaskKind {
        match self {
            AgentTask::Generate { .. } => TaskKind::Generate,
            AgentTask::Review { .. } => TaskKind::Review,
            AgentTask::Fix { .. } => TaskKind::Fix,
        }
    }

    pub fn instruction(&self) -> &str {
        match self {
            AgentTask::Generate { instruction, .. }
            | AgentTask::Review { instruction, .. }
            | AgentTask::Fix { instruction, .. } => instruction,
        }
    }

    /// Artifacts the task operates on. For `Generate` these are every
    /// artifact already present in the running context.
    pub fn artifacts(&self) -> Vec<&Artifact> {
        match self {
            AgentTask::Generate { context, .. } => context.artifacts(),
            AgentTask::Review { artifacts, .. } | AgentTask::Fix { artifacts, .. } => {
                artifacts.iter().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_instruction() {
        let task = AgentTask::generate("build api", Arc::new(SharedContext::new()));
        assert_eq!(task.kind(), TaskKind::Generate);
        assert_eq!(task.instruction(), "build api");

        let fix = AgentTask::Fix {
            instruction: "repair".to_string(),
            artifacts: vec![Artifact::new("a.rs", "fn main() {}")],
            issues: vec![],
        };
        assert_eq!(fix.kind().to_string(), "fix");
        assert_eq!(fix.artifacts().len(), 1);
    }
}
