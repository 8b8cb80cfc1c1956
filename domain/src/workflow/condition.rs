//! Predicates deciding whether a conditional step runs.

use super::context::SharedContext;
use serde::{Deserialize, Serialize};

/// A predicate over the running context.
///
/// Deserialized from configuration as an internally tagged enum:
///
/// ```toml
/// condition = { kind = "output_contains", squad = "design", needle = "database" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepCondition {
    Always,
    /// The squad has produced at least one output.
    OutputPresent { squad: String },
    /// Some output of the squad contains `needle` (case-insensitive).
    OutputContains { squad: String, needle: String },
    VariablePresent { key: String },
    VariableEquals { key: String, value: String },
    Not { condition: Box<StepCondition> },
    All { conditions: Vec<StepCondition> },
    Any { conditions: Vec<StepCondition> },
}

impl StepCondition {
    pub fn evaluate(&self, context: &SharedContext) -> bool {
        match self {
            StepCondition::Always => true,
            StepCondition::OutputPresent { squad } => context.has_output(squad),
            StepCondition::OutputContains { squad, needle } => {
                let needle = needle.to_lowercase();
                context.squad_outputs(squad).is_some_and(|agents| {
                    agents.values().any(|o| {
                        o.content.to_lowercase().contains(&needle)
                            || o
                                .artifacts
                                .iter()
                                .any(|a| a.content.to_lowercase().contains(&needle))
                    })
                })
            }
            StepCondition::VariablePresent { key } => context.variable(key).is_some(),
            StepCondition::VariableEquals { key, value } => {
                context.variable(key) == Some(value.as_str())
            }
            StepCondition::Not { condition } => !condition.evaluate(context),
            StepCondition::All { conditions } => conditions.iter().all(|c| c.evaluate(context)),
            StepCondition::Any { conditions } => conditions.iter().any(|c| c.evaluate(context)),
        }
    }
}
