//! Orchestration request.

use super::mode::ExecutionMode;
use crate::agent::Artifact;
use crate::session::Message;
use std::collections::BTreeMap;

/// One top-level generation request.
#[derive(Debug, Clone, Default)]
pub struct OrchestrationRequest {
    pub instruction: String,
    /// Named workflow to run; `None` selects hybrid execution.
    pub workflow: Option<String>,
    pub variables: BTreeMap<String, String>,
    /// Prior conversation, compressed when over budget.
    pub history: Vec<Message>,
    /// Files supplied with the request, compressed when over budget.
    pub files: Vec<Artifact>,
    /// Run the quality gate after generation. A workflow's own
    /// `quality_gate` flag must also be set.
    pub quality_gate: bool,
    pub auto_fix: bool,
    /// Run only these checks; `None` runs every registered check.
    pub checks: Option<Vec<String>>,
}

impl OrchestrationRequest {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            quality_gate: true,
            auto_fix: true,
            ..Self::default()
        }
    }

    pub fn with_workflow(mut self, workflow: impl Into<String>) -> Self {
        self.workflow = Some(workflow.into());
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }

    pub fn with_files(mut self, files: Vec<Artifact>) -> Self {
        self.files = files;
        self
    }

    pub fn with_quality_gate(mut self, enabled: bool) -> Self {
        self.quality_gate = enabled;
        self
    }

    pub fn with_auto_fix(mut self, enabled: bool) -> Self {
        self.auto_fix = enabled;
        self
    }

    pub fn with_checks(mut self, checks: Vec<String>) -> Self {
        self.checks = Some(checks);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        match &self.workflow {
            Some(name) => ExecutionMode::Workflow(name.clone()),
            None => ExecutionMode::Hybrid,
        }
    }
}
