//! Workflow definitions.

use super::condition::StepCondition;
use crate::core::error::DomainError;
use crate::squad::SquadRegistry;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a step runs its squads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    /// Squads run one after another, each seeing the previous one's output.
    Sequential,
    /// Squads run concurrently; no ordering among them.
    Parallel,
    /// Runs as `Parallel` when the condition holds, otherwise skipped.
    Conditional,
    /// Snapshots the running context; runs nothing.
    Checkpoint,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Sequential => "sequential",
            StepType::Parallel => "parallel",
            StepType::Conditional => "conditional",
            StepType::Checkpoint => "checkpoint",
        }
    }
}

/// One step of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub squads: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<StepCondition>,
    #[serde(
        default = "WorkflowStep::default_timeout",
        with = "crate::core::metrics::duration_secs"
    )]
    pub timeout: Duration,
    /// A failing required step halts the workflow.
    #[serde(default = "WorkflowStep::default_required")]
    pub required: bool,
}

impl WorkflowStep {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    pub fn new(name: impl Into<String>, step_type: StepType, squads: Vec<String>) -> Self {
        Self {
            name: name.into(),
            step_type,
            squads,
            condition: None,
            timeout: Self::DEFAULT_TIMEOUT,
            required: true,
        }
    }

    pub fn sequential(name: impl Into<String>, squads: &[&str]) -> Self {
        Self::new(name, StepType::Sequential, to_owned(squads))
    }

    pub fn parallel(name: impl Into<String>, squads: &[&str]) -> Self {
        Self::new(name, StepType::Parallel, to_owned(squads))
    }

    pub fn conditional(name: impl Into<String>, squads: &[&str], condition: StepCondition) -> Self {
        Self::new(name, StepType::Conditional, to_owned(squads)).with_condition(condition)
    }

    pub fn checkpoint(name: impl Into<String>) -> Self {
        Self::new(name, StepType::Checkpoint, Vec::new())
    }

    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn default_timeout() -> Duration {
        Self::DEFAULT_TIMEOUT
    }

    fn default_required() -> bool {
        true
    }
}

fn to_owned(squads: &[&str]) -> Vec<String> {
    squads.iter().map(|s| s.to_string()).collect()
}

/// A named, ordered list of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    /// Run the quality gate after the last step.
    #[serde(default)]
    pub quality_gate: bool,
}

impl Workflow {
    pub fn new(name: impl Into<String>, steps: Vec<WorkflowStep>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps,
            quality_gate: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_quality_gate(mut self, enabled: bool) -> Self {
        self.quality_gate = enabled;
        self
    }

    /// Check structure and squad references against a registry.
    pub fn validate(&self, squads: &SquadRegistry) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidWorkflow {
            workflow: self.name.clone(),
            reason,
        };
        if self.steps.is_empty() {
            return Err(invalid("workflow has no steps".to_string()));
        }
        for step in &self.steps {
            match step.step_type {
                StepType::Checkpoint => {}
                StepType::Conditional if step.condition.is_none() => {
                    return Err(invalid(format!(
                        "conditional step '{}' has no condition",
                        step.name
                    )));
                }
                _ if step.squads.is_empty() => {
                    return Err(invalid(format!("step '{}' lists no squads", step.name)));
                }
                _ => {}
            }
            if step.timeout.is_zero() {
                return Err(invalid(format!("step '{}' has a zero timeout", step.name)));
            }
            if let Some(unknown) = step.squads.iter().find(|s| !squads.contains(s)) {
                return Err(invalid(format!(
                    "step '{}' references unknown squad '{}'",
                    step.name, unknown
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::squad::Squad;

    fn registry() -> SquadRegistry {
        SquadRegistry::from_squads(vec![
            Squad::new("a", vec!["x".into()]),
            Squad::new("b", vec!["y".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_valid_workflow() {
        let wf = Workflow::new(
            "web",
            vec![
                WorkflowStep::sequential("design", &["a"]),
                WorkflowStep::checkpoint("snap"),
                WorkflowStep::parallel("build", &["a", "b"]).optional(),
            ],
        );
        assert!(wf.validate(&registry()).is_ok());
        assert!(!wf.steps[2].required);
    }

    #[test]
    fn test_unknown_squad_rejected() {
        let wf = Workflow::new("web", vec![WorkflowStep::parallel("build", &["ghost"])]);
        let err = wf.validate(&registry()).unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_conditional_requires_condition() {
        let wf = Workflow::new(
            "web",
            vec![WorkflowStep::new("maybe", StepType::Conditional, vec!["a".into()])],
        );
        assert!(wf.validate(&registry()).is_err());
    }

    #[test]
    fn test_deserialize_step_defaults() {
        let step: WorkflowStep =
            serde_json::from_str(r#"{"name":"s","type":"parallel","squads":["a"]}"#).unwrap();
        assert_eq!(step.step_type, StepType::Parallel);
        assert!(step.required);
        assert_eq!(step.timeout, WorkflowStep::DEFAULT_TIMEOUT);
    }
}
