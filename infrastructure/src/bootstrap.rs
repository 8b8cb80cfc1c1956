//! Builds a ready-to-run [`Orchestrator`] from a [`FileConfig`].

use crate::config::{ConfigError, ConfigIssue, FileConfig};
use crate::quality::ProcessCheckRunner;
use squadforge_application::{
    AgentRegistry, CheckRunner, CompletionGateway, EventBus, Orchestrator, QualityGateEngine,
};
use squadforge_domain::ContextCompressor;
use std::sync::Arc;
use tracing::{info, warn};

/// Validate `config` and wire every layer together.
///
/// Warnings are logged; any error-level issue aborts with
/// [`ConfigError::Invalid`] listing all of them.
pub fn build_orchestrator(
    config: &FileConfig,
    gateway: Arc<dyn CompletionGateway>,
    events: EventBus,
) -> Result<Orchestrator, ConfigError> {
    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    let errors: Vec<ConfigIssue> = issues.into_iter().filter(ConfigIssue::is_error).collect();
    if !errors.is_empty() {
        return Err(ConfigError::Invalid(errors));
    }

    let params = config.execution_params();
    let invalid = |field: &str, e: &dyn std::fmt::Display| {
        ConfigError::Invalid(vec![ConfigIssue::invalid(field, e.to_string())])
    };

    let squads = config.squad_registry().map_err(|e| invalid("squads", &e))?;

    let mut agents = AgentRegistry::new();
    for file in &config.agents {
        let agent = file
            .build(
                Arc::clone(&gateway),
                &config.completion.default_model,
                params.context_entry_bytes,
            )
            .map_err(|e| invalid("agents", &e))?;
        agents
            .register(Arc::new(agent))
            .map_err(|e| invalid("agents", &e))?;
    }

    let mut runner = ProcessCheckRunner::new();
    if let Some(dir) = &params.working_dir {
        runner = runner.with_working_dir(dir);
    }
    let runner: Arc<dyn CheckRunner> = Arc::new(runner);
    let gate = QualityGateEngine::new(
        config.quality.checks.clone(),
        runner,
        events.clone(),
        params.max_fix_iterations,
    )
    .map_err(|e| invalid("quality.checks", &e))?;

    info!(
        "Configured {} agents, {} squads, {} workflows, {} checks",
        agents.len(),
        squads.len(),
        config.workflows.len(),
        config.quality.checks.len()
    );

    let orchestrator = Orchestrator::new(squads, agents, events, params)
        .with_workflows(config.workflows.clone())
        .map_err(|e| invalid("workflows", &e))?
        .with_quality_gate(gate)
        .with_compressor(ContextCompressor::new(config.context_budget()));

    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use squadforge_application::{CompletionError, CompletionRequest, CompletionResponse};
    use squadforge_domain::{OrchestrationRequest, OrchestrationStatus, TokenUsage};

    struct EchoGateway;

    #[async_trait]
    impl CompletionGateway for EchoGateway {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            let file = format!("```text {}.txt\nok\n```", request.model);
            Ok(CompletionResponse::new(file, TokenUsage::new(5, 5)))
        }
    }

    fn config(toml_str: &str) -> FileConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected_with_all_issues() {
        let config = config(
            r#"
[[squads]]
name = "a"
agents = ["missing"]
dependencies = ["b"]
"#,
        );
        let Err(ConfigError::Invalid(issues)) =
            build_orchestrator(&config, Arc::new(EchoGateway), EventBus::new())
        else {
            panic!("expected invalid config");
        };
        assert_eq!(issues.len(), 2);
    }

    #[tokio::test]
    async fn test_runs_configured_squads_end_to_end() {
        let config = config(
            r#"
[execution]
quality_gate = false

[[agents]]
name = "architect"
model = "design-model"

[[agents]]
name = "coder"
model = "code-model"

[[squads]]
name = "design"
agents = ["architect"]

[[squads]]
name = "build"
agents = ["coder"]
dependencies = ["design"]
"#,
        );
        let orchestrator =
            build_orchestrator(&config, Arc::new(EchoGateway), EventBus::new()).unwrap();

        let result = orchestrator
            .execute(OrchestrationRequest::new("make a todo app"))
            .await;

        assert_eq!(result.status, OrchestrationStatus::Success);
        let paths: Vec<String> = result
            .outputs
            .artifacts()
            .iter()
            .map(|a| a.path.clone())
            .collect();
        assert!(paths.contains(&"design-model.txt".to_string()));
        assert!(paths.contains(&"code-model.txt".to_string()));
        assert_eq!(result.metrics.llm_calls, 2);
    }
}
