//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Squads, workflows and quality checks deserialize straight into domain
//! types; everything else goes through a `File*` struct with defaults.

mod agent;
mod completion;
mod context;
mod execution;

pub use agent::FileAgentConfig;
pub use completion::{FileCompletionConfig, FileRetryConfig};
pub use context::FileContextConfig;
pub use execution::FileExecutionConfig;

use super::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use squadforge_application::ExecutionParams;
use squadforge_domain::{
    ContextBudget, DomainError, QualityCheck, Squad, SquadRegistry, Workflow,
};
use std::collections::HashSet;

/// `[quality]` section: the registered checks.
///
/// ```toml
/// [[quality.checks]]
/// name = "clippy"
/// command = "cargo clippy --all-targets -- -D warnings"
/// auto_fix_command = "cargo clippy --fix --allow-dirty"
/// timeout = 300
/// required = true
/// severity = "error"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQualityConfig {
    pub checks: Vec<QualityCheck>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub completion: FileCompletionConfig,
    pub context: FileContextConfig,
    pub execution: FileExecutionConfig,
    pub agents: Vec<FileAgentConfig>,
    pub squads: Vec<Squad>,
    pub workflows: Vec<Workflow>,
    pub quality: FileQualityConfig,
}

impl FileConfig {
    pub fn execution_params(&self) -> ExecutionParams {
        self.execution.to_execution_params(&self.context)
    }

    pub fn context_budget(&self) -> ContextBudget {
        self.context.to_context_budget().0
    }

    pub fn squad_registry(&self) -> Result<SquadRegistry, DomainError> {
        SquadRegistry::from_squads(self.squads.iter().cloned())
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks, in order:
    /// 1. `[completion]` and `[context]` values
    /// 2. agent definitions and duplicate agent names
    /// 3. squads: structure, duplicates, agent and dependency references
    /// 4. workflows against the squad registry
    /// 5. quality checks and duplicate check names
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Scalar sections
        issues.extend(self.completion.validate());
        issues.extend(self.context.validate());

        // 2. Agents
        let mut agent_names = HashSet::new();
        for agent in &self.agents {
            if !agent_names.insert(agent.name.as_str()) {
                issues.push(duplicate("agents", &agent.name));
            }
            if let Err(e) = agent.to_agent_config(&self.completion.default_model) {
                issues.push(ConfigIssue::invalid(format!("agents.{}", agent.name), e.to_string()));
            }
            issues.extend(agent.parse_tasks().1);
        }

        // 3. Squads
        let squad_names: HashSet<&str> = self.squads.iter().map(|s| s.name.as_str()).collect();
        let mut seen = HashSet::new();
        for squad in &self.squads {
            if !seen.insert(squad.name.as_str()) {
                issues.push(duplicate("squads", &squad.name));
            }
            if let Err(e) = squad.validate() {
                issues.push(ConfigIssue::invalid(format!("squads.{}", squad.name), e.to_string()));
            }
            for agent in &squad.agents {
                if !agent_names.contains(agent.as_str()) {
                    issues.push(unknown(
                        format!("squads.{}.agents", squad.name),
                        agent,
                        format!("squad '{}' references unknown agent '{}'", squad.name, agent),
                    ));
                }
            }
            for dependency in &squad.dependencies {
                if !squad_names.contains(dependency.as_str()) {
                    issues.push(unknown(
                        format!("squads.{}.dependencies", squad.name),
                        dependency,
                        format!(
                            "squad '{}' depends on unknown squad '{}'",
                            squad.name, dependency
                        ),
                    ));
                }
            }
        }

        // 4. Workflows (only meaningful once the squads themselves are valid)
        if let Ok(registry) = self.squad_registry() {
            let mut seen = HashSet::new();
            for workflow in &self.workflows {
                if !seen.insert(workflow.name.as_str()) {
                    issues.push(duplicate("workflows", &workflow.name));
                }
                if let Err(e) = workflow.validate(&registry) {
                    issues.push(ConfigIssue::invalid(
                        format!("workflows.{}", workflow.name),
                        e.to_string(),
                    ));
                }
            }
        }

        // 5. Quality checks
        let mut seen = HashSet::new();
        for check in &self.quality.checks {
            if !seen.insert(check.name.as_str()) {
                issues.push(duplicate("quality.checks", &check.name));
            }
            if let Err(e) = check.validate() {
                issues.push(ConfigIssue::invalid(
                    format!("quality.checks.{}", check.name),
                    e.to_string(),
                ));
            }
        }

        issues
    }
}

fn duplicate(section: &str, name: &str) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::Duplicate {
            section: section.to_string(),
            name: name.to_string(),
        },
        format!("{section}: duplicate name '{name}'"),
    )
}

fn unknown(field: String, name: &str, message: String) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::UnknownReference {
            field,
            name: name.to_string(),
        },
        message,
    )
}
