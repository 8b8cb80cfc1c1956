//! Top-level orchestration use case.
//!
//! Picks the execution mode, compresses the request when it exceeds the
//! context budget, drives the [`WorkflowEngine`] or the [`HybridExecutor`],
//! runs the quality gate and folds everything into one
//! [`OrchestratorResult`].

use super::hybrid_executor::{HybridExecutor, HybridOutcome};
use super::quality_gate::QualityGateEngine;
use super::squad_manager::SquadManager;
use super::workflow_engine::WorkflowEngine;
use crate::config::ExecutionParams;
use crate::ports::agent::AgentRegistry;
use crate::ports::progress::EventBus;
use squadforge_domain::{
    ContextCompressor, DomainError, ErrorSource, ExecutionMetrics, ExecutionMode, Message,
    OrchestrationError, OrchestrationEvent, OrchestrationRequest, OrchestrationStatus,
    OrchestratorResult, QualityReport, SharedContext, SquadRegistry, SquadResult, StepOutcome,
    Workflow, WorkflowResult, WorkflowStatus,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Context variable holding the (possibly compressed) conversation history.
pub const HISTORY_VARIABLE: &str = "history";

pub struct Orchestrator {
    squads: Arc<SquadRegistry>,
    workflows: BTreeMap<String, Workflow>,
    workflow_engine: WorkflowEngine,
    hybrid: HybridExecutor,
    quality_gate: Option<Arc<QualityGateEngine>>,
    compressor: ContextCompressor,
    params: ExecutionParams,
    events: EventBus,
}

/// What the execution phase handed back, before the quality gate.
struct Execution {
    context: SharedContext,
    steps: Vec<StepOutcome>,
    squad_results: Vec<SquadResult>,
    metrics: ExecutionMetrics,
    errors: Vec<OrchestrationError>,
    /// The run cannot be considered usable (halt, stall, cancellation).
    fatal: bool,
    gate_allowed: bool,
}

impl Orchestrator {
    pub fn new(
        squads: SquadRegistry,
        agents: AgentRegistry,
        events: EventBus,
        params: ExecutionParams,
    ) -> Self {
        let squads = Arc::new(squads);
        let manager = Arc::new(SquadManager::new(agents, events.clone()));
        Self {
            workflow_engine: WorkflowEngine::new(
                Arc::clone(&squads),
                Arc::clone(&manager),
                events.clone(),
            ),
            hybrid: HybridExecutor::new(Arc::clone(&squads), manager, events.clone()),
            squads,
            workflows: BTreeMap::new(),
            quality_gate: None,
            compressor: ContextCompressor::default(),
            params,
            events,
        }
    }

    /// Register workflows. Each is validated against the squad registry.
    pub fn with_workflows(mut self, workflows: Vec<Workflow>) -> Result<Self, DomainError> {
        for workflow in workflows {
            workflow.validate(&self.squads)?;
            if self.workflows.contains_key(&workflow.name) {
                return Err(DomainError::InvalidWorkflow {
                    workflow: workflow.name,
                    reason: "duplicate workflow name".to_string(),
                });
            }
            self.workflows.insert(workflow.name.clone(), workflow);
        }
        Ok(self)
    }

    pub fn with_quality_gate(mut self, gate: QualityGateEngine) -> Self {
        self.quality_gate = Some(Arc::new(gate));
        self
    }

    pub fn with_compressor(mut self, compressor: ContextCompressor) -> Self {
        self.compressor = compressor;
        self
    }

    pub async fn execute(&self, request: OrchestrationRequest) -> OrchestratorResult {
        self.execute_with_cancel(request, CancellationToken::new())
            .await
    }

    pub async fn execute_with_cancel(
        &self,
        request: OrchestrationRequest,
        cancel: CancellationToken,
    ) -> OrchestratorResult {
        let mode = request.mode();
        info!("Orchestration starting in {} mode", mode);
        self.events.emit(OrchestrationEvent::OrchestrationStarted {
            mode: mode.to_string(),
        });

        let result = self.run(request, mode, &cancel).await;

        info!(
            "Orchestration {} ({} error(s), {} tokens)",
            result.status.as_str(),
            result.errors.len(),
            result.metrics.total_tokens()
        );
        self.events.emit(OrchestrationEvent::OrchestrationCompleted {
            status: result.status.as_str().to_string(),
        });
        result
    }

    async fn run(
        &self,
        request: OrchestrationRequest,
        mode: ExecutionMode,
        cancel: &CancellationToken,
    ) -> OrchestratorResult {
        let start = Instant::now();

        if request.instruction.trim().is_empty() {
            return OrchestratorResult::rejected(
                mode,
                OrchestrationError::new(ErrorSource::Request, "instruction", "instruction is empty"),
            );
        }

        let workflow = match &mode {
            ExecutionMode::Workflow(name) => match self.workflows.get(name) {
                Some(workflow) => Some(workflow),
                None => {
                    return OrchestratorResult::rejected(
                        mode.clone(),
                        OrchestrationError::new(ErrorSource::Workflow, name, "unknown workflow"),
                    );
                }
            },
            ExecutionMode::Hybrid => {
                if self.squads.is_empty() {
                    return OrchestratorResult::rejected(
                        mode.clone(),
                        OrchestrationError::new(
                            ErrorSource::Request,
                            "squads",
                            "no squads are registered",
                        ),
                    );
                }
                None
            }
        };

        let (context, compressions) = self.prepare_context(&request);

        let mut execution = match workflow {
            Some(workflow) => {
                let result = self
                    .workflow_engine
                    .execute(workflow, &request.instruction, context, cancel)
                    .await;
                from_workflow(result, workflow.quality_gate)
            }
            None => {
                let outcome = self
                    .hybrid
                    .execute(&request.instruction, context, cancel)
                    .await;
                from_hybrid(outcome, self.params.quality_gate)
            }
        };

        let quality_report = match &self.quality_gate {
            Some(gate) if request.quality_gate && execution.gate_allowed && !gate.is_empty() => {
                let artifacts = execution.context.latest_artifacts();
                let report = gate
                    .run_checks(&artifacts, request.checks.as_deref(), request.auto_fix)
                    .await;
                execution.errors.extend(check_errors(&report));
                Some(report)
            }
            _ => None,
        };

        let status = status_of(&execution);
        let mut metrics = execution.metrics;
        metrics.compressions += compressions;

        OrchestratorResult {
            status,
            mode,
            outputs: execution.context,
            steps: execution.steps,
            squad_results: execution.squad_results,
            metrics: metrics.with_elapsed(start.elapsed()),
            quality_report,
            errors: execution.errors,
        }
    }

    /// Seed the running context, compressing history and files when the
    /// request exceeds the budget. Returns the number of compressions.
    fn prepare_context(&self, request: &OrchestrationRequest) -> (SharedContext, u64) {
        let mut history = request.history.clone();
        let mut files = request.files.clone();
        let mut compressions = 0;

        if self
            .compressor
            .needs_compression(&history, &files, &request.instruction)
        {
            let before = self.compressor.estimate(&history, &files, &request.instruction);
            history = self
                .compressor
                .compress_conversation(&history, self.params.keep_recent);
            files = self
                .compressor
                .compress_files(&files, self.params.max_file_tokens);
            let after = self.compressor.estimate(&history, &files, &request.instruction);
            compressions = 1;

            info!("Context compressed: {} -> {} tokens", before, after);
            if after > self.compressor.budget().effective_max() {
                warn!(
                    "Request still exceeds the context budget after compression ({} > {})",
                    after,
                    self.compressor.budget().effective_max()
                );
            }
            self.events.emit(OrchestrationEvent::ContextCompressed {
                before_tokens: before,
                after_tokens: after,
            });
        }

        let mut context = SharedContext::new();
        for (key, value) in &request.variables {
            context.set_variable(key, value);
        }
        if !history.is_empty() {
            context.set_variable(HISTORY_VARIABLE, render_history(&history));
        }
        context.seed_files(files);
        (context, compressions)
    }
}

fn render_history(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn from_workflow(result: WorkflowResult, workflow_gate: bool) -> Execution {
    let mut errors = Vec::new();
    for outcome in &result.steps {
        for error in &outcome.errors {
            let source = if error.source == outcome.step {
                ErrorSource::Step
            } else {
                ErrorSource::Squad
            };
            errors.push(OrchestrationError::new(source, &error.source, &error.message));
        }
    }

    let fatal = match result.status {
        WorkflowStatus::Halted => {
            let step = result.halted_at.clone().unwrap_or_default();
            errors.push(OrchestrationError::new(
                ErrorSource::Workflow,
                &result.workflow,
                format!("halted at required step '{step}'"),
            ));
            true
        }
        WorkflowStatus::Cancelled => {
            errors.push(OrchestrationError::new(
                ErrorSource::Request,
                &result.workflow,
                "cancelled",
            ));
            true
        }
        WorkflowStatus::Completed | WorkflowStatus::CompletedWithErrors => false,
    };

    let squad_results = result
        .steps
        .iter()
        .flat_map(|s| s.squad_results.iter().cloned())
        .collect();

    Execution {
        context: result.context,
        steps: result.steps,
        squad_results,
        metrics: result.metrics,
        errors,
        fatal,
        gate_allowed: workflow_gate && !fatal,
    }
}

fn from_hybrid(outcome: HybridOutcome, hybrid_gate: bool) -> Execution {
    let mut errors = Vec::new();
    for result in &outcome.squad_results {
        if result.errors.is_empty() {
            continue;
        }
        let source = if outcome.dependency_failed.contains(&result.squad) {
            ErrorSource::Dependency
        } else {
            ErrorSource::Squad
        };
        errors.push(OrchestrationError::new(
            source,
            &result.squad,
            result.error_summary(),
        ));
    }

    if let Some(error) = &outcome.error {
        errors.push(OrchestrationError::new(
            ErrorSource::Dependency,
            error.squads().join(", "),
            error.to_string(),
        ));
    }
    if outcome.cancelled {
        errors.push(OrchestrationError::new(
            ErrorSource::Request,
            "hybrid",
            "cancelled",
        ));
    }

    let fatal = outcome.error.is_some() || outcome.cancelled;
    Execution {
        context: outcome.context,
        steps: Vec::new(),
        squad_results: outcome.squad_results,
        metrics: outcome.metrics,
        errors,
        fatal,
        gate_allowed: hybrid_gate && !fatal,
    }
}

/// Errors for required checks that ended `failed` or `error`.
fn check_errors(report: &QualityReport) -> Vec<OrchestrationError> {
    report
        .failing_checks()
        .filter(|c| c.required)
        .map(|c| {
            let message = match &c.message {
                Some(message) => message.clone(),
                None => format!("{} ({} issue(s))", c.status.as_str(), c.issues.len()),
            };
            OrchestrationError::check(&c.check_name, message)
        })
        .collect()
}

fn status_of(execution: &Execution) -> OrchestrationStatus {
    let nothing_succeeded = !execution.squad_results.is_empty()
        && execution.squad_results.iter().all(SquadResult::is_failed);
    if execution.fatal || nothing_succeeded {
        OrchestrationStatus::Failed
    } else if !execution.errors.is_empty() {
        OrchestrationStatus::Partial
    } else {
        OrchestrationStatus::Success
    }
}
