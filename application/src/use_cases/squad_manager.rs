//! Squad fan-out / fan-in.
//!
//! Runs every agent of a squad concurrently and folds the individual
//! [`AgentResult`]s into one [`SquadResult`]. A failing or panicking agent
//! never cancels its siblings.

use crate::ports::agent::AgentRegistry;
use crate::ports::progress::EventBus;
use futures::FutureExt;
use squadforge_domain::{
    AgentResult, AgentTask, ExecutionMetrics, OrchestrationEvent, SharedContext, Squad,
    SquadRegistry, SquadResult,
};
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

pub struct SquadManager {
    agents: AgentRegistry,
    events: EventBus,
}

impl SquadManager {
    pub fn new(agents: AgentRegistry, events: EventBus) -> Self {
        Self { agents, events }
    }

    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Run all agents of `squad` on `task`.
    ///
    /// Agents missing from the registry count as failed entries.
    pub async fn run_squad(&self, squad: &Squad, task: AgentTask) -> SquadResult {
        info!(
            "Squad {} starting with {} agent(s)",
            squad.name,
            squad.agents.len()
        );
        self.events.emit(OrchestrationEvent::SquadStarted {
            squad: squad.name.clone(),
            agents: squad.agents.len(),
        });

        let start = Instant::now();
        let mut join_set = JoinSet::new();
        let mut results = Vec::with_capacity(squad.agents.len());

        for name in &squad.agents {
            let Some(agent) = self.agents.get(name) else {
                warn!("Squad {} references unknown agent {}", squad.name, name);
                results.push(AgentResult::failure(
                    name.clone(),
                    format!("unknown agent '{name}'"),
                    ExecutionMetrics::new(),
                ));
                continue;
            };
            let task = task.clone();
            let name = name.clone();
            join_set.spawn(async move {
                match AssertUnwindSafe(agent.run(&task)).catch_unwind().await {
                    Ok(result) => result,
                    Err(_) => {
                        AgentResult::failure(name, "agent panicked", ExecutionMetrics::new())
                    }
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("Agent task join error in squad {}: {}", squad.name, e),
            }
        }

        // Agents whose task vanished (aborted runtime) still count as failed.
        let returned: HashSet<String> = results.iter().map(|r| r.agent().to_string()).collect();
        for name in squad.agents.iter().filter(|n| !returned.contains(*n)) {
            results.push(AgentResult::failure(
                name.clone(),
                "agent task aborted",
                ExecutionMetrics::new(),
            ));
        }

        for result in &results {
            debug!(
                "Agent {} in squad {}: {:?}",
                result.agent(),
                squad.name,
                result.status()
            );
            self.events.emit(OrchestrationEvent::AgentCompleted {
                squad: squad.name.clone(),
                agent: result.agent().to_string(),
                success: result.is_success(),
                error: result.error().map(str::to_string),
            });
        }

        let squad_result = SquadResult::from_agent_results(&squad.name, results, start.elapsed());
        info!(
            "Squad {} {} ({} ok, {} failed)",
            squad.name,
            squad_result.status.as_str(),
            squad_result.metrics.agents_executed,
            squad_result.metrics.agents_failed
        );
        self.events.emit(OrchestrationEvent::SquadCompleted {
            squad: squad.name.clone(),
            status: squad_result.status.as_str().to_string(),
        });
        squad_result
    }

    /// Run several squads concurrently on the same context snapshot.
    ///
    /// Each result is pushed to `collected` as soon as it joins, so a caller
    /// that abandons this future on timeout keeps the finished ones. Names
    /// missing from `squads` yield a failed result.
    pub async fn run_squads(
        self: &Arc<Self>,
        squads: &SquadRegistry,
        names: &[String],
        instruction: &str,
        context: Arc<SharedContext>,
        collected: &mut Vec<SquadResult>,
    ) {
        let mut join_set = JoinSet::new();
        let mut pending: HashSet<String> = HashSet::new();

        for name in names {
            let Some(squad) = squads.get(name) else {
                collected.push(SquadResult::not_run(name, format!("unknown squad '{name}'")));
                continue;
            };
            let manager = Arc::clone(self);
            let squad = squad.clone();
            let task = squad_task(&squad, instruction, Arc::clone(&context));
            pending.insert(squad.name.clone());
            join_set.spawn(async move { manager.run_squad(&squad, task).await });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => {
                    pending.remove(&result.squad);
                    collected.push(result);
                }
                Err(e) => warn!("Squad task join error: {}", e),
            }
        }

        let mut lost: Vec<String> = pending.into_iter().collect();
        lost.sort();
        for name in lost {
            collected.push(SquadResult::not_run(name, "squad task aborted"));
        }
    }
}

/// Generate task for one squad: the request instruction plus the squad's
/// own focus, if any.
pub fn squad_task(squad: &Squad, instruction: &str, context: Arc<SharedContext>) -> AgentTask {
    let instruction = match &squad.instruction {
        Some(focus) => format!("{instruction}\n\nSquad focus ({}): {focus}", squad.name),
        None => instruction.to_string(),
    };
    AgentTask::generate(instruction, context)
}
