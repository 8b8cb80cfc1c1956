//! Workflow execution.
//!
//! Drives an ordered list of typed steps over squads, threading each squad's
//! output into the running [`SharedContext`]. A required step with a hard
//! error halts the workflow; everything else is recorded and execution
//! continues.

use super::squad_manager::{SquadManager, squad_task};
use crate::ports::progress::EventBus;
use squadforge_domain::{
    Checkpoint, ExecutionMetrics, OrchestrationEvent, SharedContext, SquadRegistry, SquadResult,
    StepOutcome, StepStatus, StepType, Workflow, WorkflowResult, WorkflowStatus, WorkflowStep,
};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct WorkflowEngine {
    squads: Arc<SquadRegistry>,
    manager: Arc<SquadManager>,
    events: EventBus,
}

impl WorkflowEngine {
    pub fn new(squads: Arc<SquadRegistry>, manager: Arc<SquadManager>, events: EventBus) -> Self {
        Self {
            squads,
            manager,
            events,
        }
    }

    /// Run `workflow` to completion, halt or cancellation.
    ///
    /// The workflow is expected to have been validated against the squad
    /// registry; unknown squads still surface as failed squad results.
    pub async fn execute(
        &self,
        workflow: &Workflow,
        instruction: &str,
        mut context: SharedContext,
        cancel: &CancellationToken,
    ) -> WorkflowResult {
        info!(
            "Workflow {} starting ({} steps)",
            workflow.name,
            workflow.steps.len()
        );
        self.events.emit(OrchestrationEvent::WorkflowStarted {
            workflow: workflow.name.clone(),
            steps: workflow.steps.len(),
        });

        let start = Instant::now();
        let mut steps = Vec::with_capacity(workflow.steps.len());
        let mut checkpoints = Vec::new();
        let mut halted_at = None;
        let mut cancelled = false;

        for step in &workflow.steps {
            if cancel.is_cancelled() {
                info!("Workflow {} cancelled before step {}", workflow.name, step.name);
                cancelled = true;
                break;
            }

            self.events.emit(OrchestrationEvent::StepStarted {
                step: step.name.clone(),
                step_type: step.step_type.as_str().to_string(),
            });

            let outcome = match step.step_type {
                StepType::Checkpoint => {
                    checkpoints.push(Checkpoint {
                        step: step.name.clone(),
                        context: context.clone(),
                    });
                    self.events.emit(OrchestrationEvent::CheckpointReached {
                        step: step.name.clone(),
                    });
                    StepOutcome::checkpoint(&step.name)
                }
                StepType::Conditional => {
                    let run = step
                        .condition
                        .as_ref()
                        .is_some_and(|c| c.evaluate(&context));
                    if run {
                        self.run_step(step, instruction, &mut context, false).await
                    } else {
                        debug!("Step {} skipped: condition not met", step.name);
                        StepOutcome::skipped(&step.name, "condition not met")
                    }
                }
                StepType::Parallel => self.run_step(step, instruction, &mut context, false).await,
                StepType::Sequential => self.run_step(step, instruction, &mut context, true).await,
            };

            info!("Step {} {}", step.name, outcome.status.as_str());
            self.events.emit(OrchestrationEvent::StepCompleted {
                step: step.name.clone(),
                status: outcome.status.as_str().to_string(),
            });

            let halt = step.required && outcome.is_hard_error();
            steps.push(outcome);
            if halt {
                warn!("Required step {} failed, halting workflow {}", step.name, workflow.name);
                halted_at = Some(step.name.clone());
                break;
            }
        }

        let status = if cancelled {
            WorkflowStatus::Cancelled
        } else if halted_at.is_some() {
            WorkflowStatus::Halted
        } else if steps
            .iter()
            .any(|s| matches!(s.status, StepStatus::Failed | StepStatus::Partial))
        {
            WorkflowStatus::CompletedWithErrors
        } else {
            WorkflowStatus::Completed
        };

        let metrics = steps
            .iter()
            .map(|s| &s.metrics)
            .sum::<ExecutionMetrics>()
            .with_elapsed(start.elapsed());

        WorkflowResult {
            workflow: workflow.name.clone(),
            status,
            steps,
            context,
            checkpoints,
            halted_at,
            metrics,
        }
    }

    /// Run a squad-bearing step under its timeout.
    async fn run_step(
        &self,
        step: &WorkflowStep,
        instruction: &str,
        context: &mut SharedContext,
        sequential: bool,
    ) -> StepOutcome {
        let start = Instant::now();
        let mut collected: Vec<SquadResult> = Vec::new();

        let finished = {
            let body = async {
                if sequential {
                    self.run_sequential(step, instruction, context, &mut collected)
                        .await
                } else {
                    self.manager
                        .run_squads(
                            &self.squads,
                            &step.squads,
                            instruction,
                            Arc::new(context.clone()),
                            &mut collected,
                        )
                        .await
                }
            };
            tokio::time::timeout(step.timeout, body).await.is_ok()
        };

        // Sequential steps merge as they go; parallel results merge once joined.
        if !sequential {
            for result in &collected {
                context.merge_squad(result);
            }
        }

        if finished {
            StepOutcome::from_squad_results(&step.name, collected, start.elapsed())
        } else {
            warn!("Step {} timed out after {:?}", step.name, step.timeout);
            StepOutcome::failed(
                &step.name,
                collected,
                format!("step timed out after {:?}", step.timeout),
                start.elapsed(),
            )
        }
    }

    async fn run_sequential(
        &self,
        step: &WorkflowStep,
        instruction: &str,
        context: &mut SharedContext,
        collected: &mut Vec<SquadResult>,
    ) {
        for name in &step.squads {
            let result = match self.squads.get(name) {
                Some(squad) => {
                    let task = squad_task(squad, instruction, Arc::new(context.clone()));
                    self.manager.run_squad(squad, task).await
                }
                None => SquadResult::not_run(name, format!("unknown squad '{name}'")),
            };
            context.merge_squad(&result);
            let failed = result.is_failed();
            collected.push(result);

            if failed && step.required {
                warn!("Squad {} failed, stopping required step {}", name, step.name);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::testing::RecordingListener;
    use crate::use_cases::test_support::{Behavior, MockAgent, registry};
    use squadforge_domain::{Squad, SquadStatus, StepCondition};
    use std::time::Duration;

    struct Fixture {
        engine: WorkflowEngine,
        recorder: Arc<RecordingListener>,
        agents: Vec<Arc<MockAgent>>,
    }

    /// One agent per squad, named after the squad with an `_agent` suffix.
    fn fixture(squads: &[(&str, Behavior)]) -> Fixture {
        let agents: Vec<Arc<MockAgent>> = squads
            .iter()
            .map(|(s, b)| Arc::new(MockAgent::new(&format!("{s}_agent"), b.clone())))
            .collect();
        let registry_squads = SquadRegistry::from_squads(
            squads
                .iter()
                .map(|(s, _)| Squad::new(*s, vec![format!("{s}_agent")])),
        )
        .unwrap();
        let recorder = Arc::new(RecordingListener::default());
        let events = EventBus::new().with_listener(recorder.clone());
        let manager = Arc::new(SquadManager::new(registry(agents.clone()), events.clone()));
        Fixture {
            engine: WorkflowEngine::new(Arc::new(registry_squads), manager, events),
            recorder,
            agents,
        }
    }

    fn ok(reply: &str) -> Behavior {
        Behavior::Reply(reply.to_string())
    }

    fn fail() -> Behavior {
        Behavior::Fail("boom".to_string())
    }

    async fn run(fixture: &Fixture, workflow: Workflow) -> WorkflowResult {
        fixture
            .engine
            .execute(
                &workflow,
                "build a todo app",
                SharedContext::new(),
                &CancellationToken::new(),
            )
            .await
    }

    #[tokio::test]
    async fn test_sequential_then_parallel_with_optional_failure() {
        let f = fixture(&[("a", ok("A")), ("b", fail()), ("c", ok("C")), ("d", ok("D"))]);
        let workflow = Workflow::new(
            "wf",
            vec![
                WorkflowStep::sequential("first", &["a"]),
                WorkflowStep::parallel("second", &["b", "c"]).optional(),
                WorkflowStep::sequential("third", &["d"]),
            ],
        );

        let result = run(&f, workflow).await;

        assert_eq!(result.status, WorkflowStatus::CompletedWithErrors);
        assert!(result.halted_at.is_none());
        assert!(result.context.has_output("c"));
        assert!(result.context.has_output("d"));
        let second = result.step("second").unwrap();
        assert_eq!(second.status, StepStatus::Failed);
        assert_eq!(second.errors[0].source, "b");
        assert!(second.errors[0].message.contains("boom"));
    }

    #[tokio::test]
    async fn test_required_parallel_failure_halts() {
        let f = fixture(&[("a", ok("A")), ("b", fail()), ("c", ok("C")), ("d", ok("D"))]);
        let workflow = Workflow::new(
            "wf",
            vec![
                WorkflowStep::sequential("first", &["a"]),
                WorkflowStep::parallel("second", &["b", "c"]),
                WorkflowStep::sequential("third", &["d"]),
            ],
        );

        let result = run(&f, workflow).await;

        assert_eq!(result.status, WorkflowStatus::Halted);
        assert_eq!(result.halted_at.as_deref(), Some("second"));
        assert!(result.context.has_output("c"));
        assert!(!result.context.has_output("d"));
        assert!(result.step("third").is_none());
        assert_eq!(f.agents[3].seen_count(), 0);
    }

    #[tokio::test]
    async fn test_sequential_threads_context_forward() {
        let f = fixture(&[("a", ok("A")), ("b", ok("B"))]);
        let workflow = Workflow::new("wf", vec![WorkflowStep::sequential("only", &["a", "b"])]);

        run(&f, workflow).await;

        let seen = f.agents[1].seen.lock().unwrap();
        let squadforge_domain::AgentTask::Generate { context, .. } = &seen[0] else {
            panic!("expected a generate task");
        };
        assert!(context.has_output("a"));
    }

    #[tokio::test]
    async fn test_required_sequential_stops_at_first_failed_squad() {
        let f = fixture(&[("a", fail()), ("b", ok("B"))]);
        let required = Workflow::new("wf", vec![WorkflowStep::sequential("s", &["a", "b"])]);
        let result = run(&f, required).await;
        assert_eq!(result.steps[0].squad_results.len(), 1);
        assert_eq!(f.agents[1].seen_count(), 0);

        let f = fixture(&[("a", fail()), ("b", ok("B"))]);
        let optional = Workflow::new(
            "wf",
            vec![WorkflowStep::sequential("s", &["a", "b"]).optional()],
        );
        let result = run(&f, optional).await;
        assert_eq!(result.steps[0].squad_results.len(), 2);
        assert!(result.context.has_output("b"));
    }

    #[tokio::test]
    async fn test_conditional_and_checkpoint() {
        let f = fixture(&[("a", ok("needs database")), ("db", ok("schema")), ("ui", ok("ui"))]);
        let workflow = Workflow::new(
            "wf",
            vec![
                WorkflowStep::sequential("plan", &["a"]),
                WorkflowStep::checkpoint("after-plan"),
                WorkflowStep::conditional(
                    "database",
                    &["db"],
                    StepCondition::OutputContains {
                        squad: "a".to_string(),
                        needle: "DATABASE".to_string(),
                    },
                ),
                WorkflowStep::conditional(
                    "frontend",
                    &["ui"],
                    StepCondition::VariablePresent {
                        key: "frontend".to_string(),
                    },
                ),
            ],
        );

        let result = run(&f, workflow).await;

        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.checkpoints.len(), 1);
        assert!(result.checkpoints[0].context.has_output("a"));
        assert!(!result.checkpoints[0].context.has_output("db"));
        assert_eq!(result.step("database").unwrap().status, StepStatus::Completed);
        assert_eq!(result.step("frontend").unwrap().status, StepStatus::Skipped);
        assert!(f.recorder.kinds().contains(&"checkpoint_reached"));
    }

    #[tokio::test]
    async fn test_step_timeout_is_hard_error() {
        let f = fixture(&[("fast", ok("F")), ("slow", Behavior::Sleep(Duration::from_secs(5)))]);
        let workflow = Workflow::new(
            "wf",
            vec![
                WorkflowStep::parallel("race", &["fast", "slow"])
                    .with_timeout(Duration::from_millis(200)),
            ],
        );

        let result = run(&f, workflow).await;

        assert_eq!(result.status, WorkflowStatus::Halted);
        let race = result.step("race").unwrap();
        assert_eq!(race.status, StepStatus::Failed);
        assert!(race.reason.as_deref().unwrap().contains("timed out after 200ms"));
        assert_eq!(race.squad_results.len(), 1);
        assert_eq!(race.squad_results[0].status, SquadStatus::Completed);
        assert!(result.context.has_output("fast"));
    }

    #[tokio::test]
    async fn test_cancellation_between_steps() {
        let f = fixture(&[("a", ok("A"))]);
        let workflow = Workflow::new("wf", vec![WorkflowStep::sequential("s", &["a"])]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = f
            .engine
            .execute(&workflow, "x", SharedContext::new(), &cancel)
            .await;

        assert_eq!(result.status, WorkflowStatus::Cancelled);
        assert!(result.steps.is_empty());
        assert_eq!(f.agents[0].seen_count(), 0);
    }
}
