//! Dependency-ordered execution of every registered squad.
//!
//! Each wave runs the ready set (unexecuted squads whose dependencies have
//! all executed) concurrently, then merges the outputs. A wave with nothing
//! ready while squads remain is a stall and ends the run with a
//! [`DependencyError`], so an unknown or cyclic dependency can never hang.

use super::squad_manager::SquadManager;
use crate::ports::progress::EventBus;
use squadforge_domain::{
    DependencyError, ExecutionMetrics, OrchestrationEvent, SharedContext, SquadRegistry,
    SquadResult,
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct HybridOutcome {
    pub context: SharedContext,
    /// Squad results in execution order, skipped squads included.
    pub squad_results: Vec<SquadResult>,
    /// Squads not started because a dependency failed.
    pub dependency_failed: Vec<String>,
    /// Set when the resolution loop stalled.
    pub error: Option<DependencyError>,
    pub cancelled: bool,
    pub waves: usize,
    pub metrics: ExecutionMetrics,
}

pub struct HybridExecutor {
    squads: Arc<SquadRegistry>,
    manager: Arc<SquadManager>,
    events: EventBus,
}

impl HybridExecutor {
    pub fn new(squads: Arc<SquadRegistry>, manager: Arc<SquadManager>, events: EventBus) -> Self {
        Self {
            squads,
            manager,
            events,
        }
    }

    pub async fn execute(
        &self,
        instruction: &str,
        mut context: SharedContext,
        cancel: &CancellationToken,
    ) -> HybridOutcome {
        info!("Hybrid execution over {} squad(s)", self.squads.len());
        let start = Instant::now();
        let mut executed: HashSet<String> = HashSet::new();
        let mut failed: HashSet<String> = HashSet::new();
        let mut squad_results = Vec::new();
        let mut dependency_failed = Vec::new();
        let mut error = None;
        let mut cancelled = false;
        let mut waves = 0;

        while executed.len() < self.squads.len() {
            if cancel.is_cancelled() {
                info!("Hybrid execution cancelled after {} wave(s)", waves);
                cancelled = true;
                break;
            }

            let ready = self.squads.ready_set(&executed);
            if ready.is_empty() {
                let stall = self.squads.diagnose_stall(&executed);
                warn!("Dependency resolution stalled: {}", stall);
                error = Some(stall);
                break;
            }

            let mut runnable = Vec::new();
            for squad in ready {
                let failed_deps: Vec<&str> = squad
                    .dependencies
                    .iter()
                    .filter(|d| failed.contains(*d))
                    .map(String::as_str)
                    .collect();
                if failed_deps.is_empty() {
                    runnable.push(squad.name.clone());
                    continue;
                }

                let reason = format!("dependency failed: {}", failed_deps.join(", "));
                debug!("Skipping squad {}: {}", squad.name, reason);
                self.events.emit(OrchestrationEvent::SquadSkipped {
                    squad: squad.name.clone(),
                    reason: reason.clone(),
                });
                squad_results.push(SquadResult::not_run(&squad.name, reason));
                dependency_failed.push(squad.name.clone());
                failed.insert(squad.name.clone());
                executed.insert(squad.name.clone());
            }

            if runnable.is_empty() {
                continue;
            }

            waves += 1;
            debug!("Wave {}: {}", waves, runnable.join(", "));
            let mut wave = Vec::with_capacity(runnable.len());
            self.manager
                .run_squads(
                    &self.squads,
                    &runnable,
                    instruction,
                    Arc::new(context.clone()),
                    &mut wave,
                )
                .await;

            for result in wave {
                context.merge_squad(&result);
                if result.is_failed() {
                    failed.insert(result.squad.clone());
                }
                executed.insert(result.squad.clone());
                squad_results.push(result);
            }
        }

        let metrics = squad_results
            .iter()
            .map(|r| &r.metrics)
            .sum::<ExecutionMetrics>()
            .with_elapsed(start.elapsed());

        HybridOutcome {
            context,
            squad_results,
            dependency_failed,
            error,
            cancelled,
            waves,
            metrics,
        }
    }
}
