//! Configuration-driven agent.

use super::extraction::extract_artifacts;
use async_trait::async_trait;
use squadforge_application::ports::agent::{
    Agent, AgentError, RawOutput, ValidationError, validate_task_shape,
};
use squadforge_application::ports::completion::{CompletionGateway, CompletionRequest};
use squadforge_domain::{
    AgentConfig, AgentOutput, AgentTask, Artifact, ExecutionMetrics, Issue, Message, TaskKind,
};
use std::sync::Arc;
use tracing::debug;

/// Template used when an agent does not configure its own.
pub const DEFAULT_TEMPLATE: &str = "{instruction}\n\n{context}\n\n{artifacts}\n\n{issues}";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a senior software engineer. \
Reply with complete files in fenced code blocks whose info string names the file path, \
for example ```rust src/main.rs.";

/// An agent defined entirely by configuration: a system prompt, a task
/// template and the task kinds it accepts.
///
/// Placeholders in the template: `{instruction}`, `{context}` (prior squad
/// outputs, generate tasks only), `{artifacts}` and `{issues}`.
pub struct PromptAgent {
    config: AgentConfig,
    gateway: Arc<dyn CompletionGateway>,
    system_prompt: String,
    template: String,
    tasks: Vec<TaskKind>,
    context_entry_bytes: usize,
}

impl PromptAgent {
    pub fn new(config: AgentConfig, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            config,
            gateway,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            tasks: vec![TaskKind::Generate, TaskKind::Review, TaskKind::Fix],
            context_entry_bytes: 8_000,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<TaskKind>) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn with_context_entry_bytes(mut self, bytes: usize) -> Self {
        self.context_entry_bytes = bytes;
        self
    }

    /// The user message for `task`.
    pub fn render(&self, task: &AgentTask) -> String {
        let (context, artifacts, issues) = match task {
            AgentTask::Generate { context, .. } => {
                let rendered = context.render(self.context_entry_bytes);
                (section("Context so far", rendered.trim()), String::new(), String::new())
            }
            AgentTask::Review { artifacts, .. } => {
                (String::new(), render_artifacts(artifacts), String::new())
            }
            AgentTask::Fix {
                artifacts, issues, ..
            } => (
                String::new(),
                render_artifacts(artifacts),
                render_issues(issues),
            ),
        };

        let prompt = self
            .template
            .replace("{instruction}", task.instruction().trim())
            .replace("{context}", &context)
            .replace("{artifacts}", &artifacts)
            .replace("{issues}", &issues);
        tidy(&prompt)
    }
}

fn section(title: &str, body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!("## {title}\n\n{body}")
    }
}

fn render_artifacts(artifacts: &[Artifact]) -> String {
    let body = artifacts
        .iter()
        .map(|a| {
            let content = a.content.trim_end();
            format!(
                "```{} {}\n{}\n```",
                a.language.as_deref().unwrap_or(""),
                a.path,
                content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    section("Files", &body)
}

fn render_issues(issues: &[Issue]) -> String {
    let body = issues
        .iter()
        .map(|i| match i.location() {
            Some(loc) => format!("- {loc}: {}: {}", i.severity.as_str(), i.message),
            None => format!("- {}: {}", i.severity.as_str(), i.message),
        })
        .collect::<Vec<_>>()
        .join("\n");
    section("Issues to fix", &body)
}

/// Drop runs of blank lines left by empty placeholders.
fn tidy(text: &str) -> String {
    let mut out = Vec::new();
    let mut previous_blank = false;
    for line in text.trim().lines() {
        let blank = line.trim().is_empty();
        if !(blank && previous_blank) {
            out.push(line);
        }
        previous_blank = blank;
    }
    out.join("\n")
}

#[async_trait]
impl Agent for PromptAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The configured timeout bounds each completion attempt instead.
    fn execution_timeout(&self) -> Option<std::time::Duration> {
        None
    }

    fn validate(&self, task: &AgentTask) -> Result<(), ValidationError> {
        if !self.tasks.contains(&task.kind()) {
            return Err(ValidationError::UnsupportedTask {
                agent: self.name().to_string(),
                kind: task.kind(),
            });
        }
        validate_task_shape(task)
    }

    async fn execute(&self, task: &AgentTask) -> Result<RawOutput, AgentError> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(self.render(task)),
        ];
        let request = CompletionRequest::for_agent(&self.config, messages);
        let response = self.gateway.complete(request).await?;
        debug!(
            "Agent {} received {} bytes ({} retries)",
            self.name(),
            response.text.len(),
            response.retry_count
        );
        Ok(RawOutput::new(
            response.text,
            ExecutionMetrics::for_call(response.usage, u64::from(response.retry_count)),
        ))
    }

    fn format(&self, raw: &str) -> Result<AgentOutput, AgentError> {
        if raw.trim().is_empty() {
            return Err(AgentError::Format("empty response".to_string()));
        }
        let extracted = extract_artifacts(raw);
        Ok(AgentOutput {
            content: extracted.prose,
            artifacts: extracted.artifacts,
        })
    }
}
