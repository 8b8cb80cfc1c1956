//! Hand-written mocks shared by the use case tests.

use crate::ports::agent::{Agent, AgentError, AgentRegistry, RawOutput, ValidationError};
use crate::ports::completion::CompletionError;
use async_trait::async_trait;
use squadforge_domain::{
    AgentConfig, AgentOutput, AgentTask, Artifact, ExecutionMetrics, TokenUsage,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    /// Reply with this text and one artifact named `<agent>.txt`.
    Reply(String),
    Fail(String),
    Sleep(Duration),
    Panic,
}

/// Agent with a fixed behavior that records the tasks it saw.
pub struct MockAgent {
    config: AgentConfig,
    behavior: Behavior,
    pub seen: Mutex<Vec<AgentTask>>,
}

impl MockAgent {
    pub fn new(name: &str, behavior: Behavior) -> Self {
        Self {
            config: AgentConfig::new(name, "mock-model").unwrap(),
            behavior,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name, Behavior::Reply(format!("{name} output"))))
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self::new(name, Behavior::Fail(format!("{name} broke"))))
    }

    pub fn seen_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn validate(&self, _task: &AgentTask) -> Result<(), ValidationError> {
        Ok(())
    }

    async fn execute(&self, task: &AgentTask) -> Result<RawOutput, AgentError> {
        self.seen.lock().unwrap().push(task.clone());
        match &self.behavior {
            Behavior::Reply(text) => Ok(RawOutput::new(
                text.clone(),
                ExecutionMetrics::for_call(TokenUsage::new(10, 5), 0),
            )),
            Behavior::Fail(message) => Err(CompletionError::Other(message.clone()).into()),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(RawOutput::new("slept", ExecutionMetrics::new()))
            }
            Behavior::Panic => panic!("mock agent panic"),
        }
    }

    fn format(&self, raw: &str) -> Result<AgentOutput, AgentError> {
        let path = format!("{}.txt", self.config.name());
        Ok(AgentOutput::text(raw).with_artifact(Artifact::new(path, raw)))
    }
}

pub fn registry(agents: Vec<Arc<MockAgent>>) -> AgentRegistry {
    let mut registry = AgentRegistry::new();
    for agent in agents {
        registry.register(agent).unwrap();
    }
    registry
}
