//! Use cases (application services)

pub mod hybrid_executor;
pub mod orchestrator;
pub mod quality_gate;
pub mod squad_manager;
pub mod workflow_engine;

#[cfg(test)]
pub(crate) mod test_support;
