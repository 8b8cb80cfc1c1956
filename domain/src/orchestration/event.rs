//! Progress events emitted during an orchestration run.

use serde::Serialize;
use serde_json::Value;

/// Every observable step of a run. Listeners receive these through the
/// application's event bus; each serializes to a flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrchestrationEvent {
    OrchestrationStarted {
        mode: String,
    },
    ContextCompressed {
        before_tokens: usize,
        after_tokens: usize,
    },
    WorkflowStarted {
        workflow: String,
        steps: usize,
    },
    StepStarted {
        step: String,
        step_type: String,
    },
    StepCompleted {
        step: String,
        status: String,
    },
    CheckpointReached {
        step: String,
    },
    SquadStarted {
        squad: String,
        agents: usize,
    },
    AgentCompleted {
        squad: String,
        agent: String,
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    SquadCompleted {
        squad: String,
        status: String,
    },
    SquadSkipped {
        squad: String,
        reason: String,
    },
    CheckStarted {
        check: String,
    },
    CheckCompleted {
        check: String,
        status: String,
        issues: usize,
    },
    FixApplied {
        check: String,
        iteration: u32,
        success: bool,
    },
    QualityGateCompleted {
        passed: bool,
        fix_iterations: u32,
    },
    OrchestrationCompleted {
        status: String,
    },
}

impl OrchestrationEvent {
    /// Event name, matching the `event` field of the JSON payload.
    pub fn kind(&self) -> &'static str {
        match self {
            OrchestrationEvent::OrchestrationStarted { .. } => "orchestration_started",
            OrchestrationEvent::ContextCompressed { .. } => "context_compressed",
            OrchestrationEvent::WorkflowStarted { .. } => "workflow_started",
            OrchestrationEvent::StepStarted { .. } => "step_started",
            OrchestrationEvent::StepCompleted { .. } => "step_completed",
            OrchestrationEvent::CheckpointReached { .. } => "checkpoint_reached",
            OrchestrationEvent::SquadStarted { .. } => "squad_started",
            OrchestrationEvent::AgentCompleted { .. } => "agent_completed",
            OrchestrationEvent::SquadCompleted { .. } => "squad_completed",
            OrchestrationEvent::SquadSkipped { .. } => "squad_skipped",
            OrchestrationEvent::CheckStarted { .. } => "check_started",
            OrchestrationEvent::CheckCompleted { .. } => "check_completed",
            OrchestrationEvent::FixApplied { .. } => "fix_applied",
            OrchestrationEvent::QualityGateCompleted { .. } => "quality_gate_completed",
            OrchestrationEvent::OrchestrationCompleted { .. } => "orchestration_completed",
        }
    }

    pub fn payload(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_payload_tag() {
        let events = [
            OrchestrationEvent::SquadStarted {
                squad: "backend".to_string(),
                agents: 2,
            },
            OrchestrationEvent::AgentCompleted {
                squad: "backend".to_string(),
                agent: "api".to_string(),
                success: false,
                error: Some("timeout".to_string()),
            },
            OrchestrationEvent::QualityGateCompleted {
                passed: true,
                fix_iterations: 1,
            },
        ];
        for event in events {
            assert_eq!(event.payload()["event"], event.kind());
        }
    }

    #[test]
    fn test_optional_error_omitted() {
        let event = OrchestrationEvent::AgentCompleted {
            squad: "s".to_string(),
            agent: "a".to_string(),
            success: true,
            error: None,
        };
        assert!(event.payload().get("error").is_none());
    }
}
