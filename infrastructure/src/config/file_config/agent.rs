//! Agent definitions from TOML (`[[agents]]` tables)

use crate::agents::PromptAgent;
use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use squadforge_application::CompletionGateway;
use squadforge_domain::{AgentConfig, DomainError, TaskKind};
use std::sync::Arc;
use std::time::Duration;

/// One configured agent.
///
/// # Example
///
/// ```toml
/// [[agents]]
/// name = "backend"
/// model = "gpt-4o"
/// temperature = 0.1
/// timeout_secs = 180
/// tasks = ["generate", "fix"]
/// system_prompt = "You write Rust web services."
/// template = "{instruction}\n\n{context}"
/// ```
///
/// Unset sampling fields use the [`AgentConfig`] defaults; an unset model
/// uses `completion.default_model`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: String,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub system_prompt: Option<String>,
    pub template: Option<String>,
    /// Task kinds the agent accepts. Empty means all.
    pub tasks: Vec<String>,
}

const TASK_KINDS: [&str; 3] = ["generate", "review", "fix"];

impl FileAgentConfig {
    pub fn to_agent_config(&self, default_model: &str) -> Result<AgentConfig, DomainError> {
        let model = self.model.as_deref().unwrap_or(default_model);
        let mut config = AgentConfig::new(&self.name, model)?;
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature)?;
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens)?;
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs))?;
        }
        if let Some(retries) = self.max_retries {
            config = config.with_max_retries(retries);
        }
        Ok(config)
    }

    /// Parse `tasks`, returning warnings for unknown names.
    pub fn parse_tasks(&self) -> (Vec<TaskKind>, Vec<ConfigIssue>) {
        if self.tasks.is_empty() {
            return (vec![TaskKind::Generate, TaskKind::Review, TaskKind::Fix], vec![]);
        }
        let mut kinds = Vec::new();
        let mut issues = Vec::new();
        for task in &self.tasks {
            match task.trim().to_ascii_lowercase().as_str() {
                "generate" => kinds.push(TaskKind::Generate),
                "review" => kinds.push(TaskKind::Review),
                "fix" => kinds.push(TaskKind::Fix),
                _ => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: format!("agents.{}.tasks", self.name),
                        value: task.clone(),
                        valid_values: TASK_KINDS.iter().map(|s| s.to_string()).collect(),
                    },
                    format!("agent '{}': unknown task kind '{}', ignored", self.name, task),
                )),
            }
        }
        (kinds, issues)
    }

    pub fn build(
        &self,
        gateway: Arc<dyn CompletionGateway>,
        default_model: &str,
        context_entry_bytes: usize,
    ) -> Result<PromptAgent, DomainError> {
        let mut agent = PromptAgent::new(self.to_agent_config(default_model)?, gateway)
            .with_tasks(self.parse_tasks().0)
            .with_context_entry_bytes(context_entry_bytes);
        if let Some(prompt) = &self.system_prompt {
            agent = agent.with_system_prompt(prompt.clone());
        }
        if let Some(template) = &self.template {
            agent = agent.with_template(template.clone());
        }
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overrides() {
        let file: FileAgentConfig = toml::from_str(
            r#"
name = "api"
temperature = 0.7
timeout_secs = 30
"#,
        )
        .unwrap();

        let config = file.to_agent_config("fallback-model").unwrap();
        assert_eq!(config.model(), "fallback-model");
        assert_eq!(config.temperature(), 0.7);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_tokens(), AgentConfig::DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = FileAgentConfig {
            name: "api".to_string(),
            temperature: Some(1.5),
            ..Default::default()
        };
        assert!(file.to_agent_config("m").is_err());

        let file = FileAgentConfig {
            name: "api".to_string(),
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(file.to_agent_config("m").is_err());
    }

    #[test]
    fn test_parse_tasks() {
        let file = FileAgentConfig {
            name: "reviewer".to_string(),
            tasks: vec!["Review".to_string(), "deploy".to_string()],
            ..Default::default()
        };
        let (kinds, issues) = file.parse_tasks();
        assert_eq!(kinds, vec![TaskKind::Review]);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());

        let (all, _) = FileAgentConfig::default().parse_tasks();
        assert_eq!(all.len(), 3);
    }
}
