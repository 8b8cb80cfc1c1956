//! Running context threaded through a workflow or hybrid run.

use crate::agent::{AgentOutput, Artifact};
use crate::squad::SquadResult;
use crate::context::tokens::clip_bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Outputs produced so far plus request variables.
///
/// Only the caller of a fan-out writes to the context, after the fan-out has
/// joined; concurrent branches read an immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedContext {
    variables: BTreeMap<String, String>,
    outputs: BTreeMap<String, BTreeMap<String, AgentOutput>>,
    /// Squad names in the order their results were merged.
    merge_order: Vec<String>,
}

impl SharedContext {
    /// Pseudo-squad holding the files supplied with the request.
    pub const INPUT_SQUAD: &'static str = "input";

    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the context with request files, visible to agents and the
    /// quality gate like any squad output.
    pub fn seed_files(&mut self, files: Vec<Artifact>) {
        if files.is_empty() {
            return;
        }
        let output = AgentOutput {
            content: String::new(),
            artifacts: files,
        };
        self.outputs
            .entry(Self::INPUT_SQUAD.to_string())
            .or_default()
            .insert("request".to_string(), output);
        self.merge_order.retain(|s| s != Self::INPUT_SQUAD);
        self.merge_order.insert(0, Self::INPUT_SQUAD.to_string());
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_variable(key, value);
        self
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    /// Merge the successful outputs of a squad. A squad without any output
    /// leaves the context unchanged.
    pub fn merge_squad(&mut self, result: &SquadResult) {
        if result.outputs.is_empty() {
            return;
        }
        let entry = self.outputs.entry(result.squad.clone()).or_default();
        for (agent, output) in &result.outputs {
            entry.insert(agent.clone(), output.clone());
        }
        self.merge_order.retain(|s| s != &result.squad);
        self.merge_order.push(result.squad.clone());
    }

    pub fn has_output(&self, squad: &str) -> bool {
        self.outputs.get(squad).is_some_and(|o| !o.is_empty())
    }

    pub fn squad_outputs(&self, squad: &str) -> Option<&BTreeMap<String, AgentOutput>> {
        self.outputs.get(squad)
    }

    pub fn outputs(&self) -> &BTreeMap<String, BTreeMap<String, AgentOutput>> {
        &self.outputs
    }

    /// Squads with output, in merge order.
    pub fn squads(&self) -> &[String] {
        &self.merge_order
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// All artifacts in merge order.
    pub fn artifacts(&self) -> Vec<&Artifact> {
        self.merge_order
            .iter()
            .filter_map(|s| self.outputs.get(s))
            .flat_map(|agents| agents.values())
            .flat_map(|o| o.artifacts.iter())
            .collect()
    }

    /// Artifacts deduplicated by path; a later squad's file replaces an
    /// earlier one with the same path.
    pub fn latest_artifacts(&self) -> Vec<Artifact> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut files: Vec<Artifact> = Vec::new();
        for artifact in self.artifacts() {
            match index.get(artifact.path.as_str()) {
                Some(&i) => files[i] = artifact.clone(),
                None => {
                    index.insert(artifact.path.as_str(), files.len());
                    files.push(artifact.clone());
                }
            }
        }
        files
    }

    /// Render prior outputs for inclusion in a prompt.
    ///
    /// Each agent's text is cut to `max_entry_bytes`; artifacts are listed by
    /// path only.
    pub fn render(&self, max_entry_bytes: usize) -> String {
        let mut out = String::new();
        for (key, value) in &self.variables {
            out.push_str(&format!("{key}: {value}\n"));
        }
        for squad in &self.merge_order {
            let Some(agents) = self.outputs.get(squad) else {
                continue;
            };
            for (agent, output) in agents {
                out.push_str(&format!("\n## {squad}/{agent}\n"));
                let text = clip_bytes(output.content.trim(), max_entry_bytes);
                if !text.is_empty() {
                    out.push_str(text);
                    out.push('\n');
                }
                for artifact in &output.artifacts {
                    out.push_str(&format!("- {}\n", artifact.path));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentResult;
    use crate::core::metrics::ExecutionMetrics;
    use std::time::Duration;

    fn squad_result(squad: &str, agent: &str, output: AgentOutput) -> SquadResult {
        SquadResult::from_agent_results(
            squad,
            vec![AgentResult::success(agent, output, ExecutionMetrics::new())],
            Duration::ZERO,
        )
    }

    #[test]
    fn test_merge_and_lookup() {
        let mut ctx = SharedContext::new().with_variable("project", "todo app");
        ctx.merge_squad(&squad_result("design", "architect", AgentOutput::text("plan")));

        assert!(ctx.has_output("design"));
        assert!(!ctx.has_output("backend"));
        assert_eq!(ctx.variable("project"), Some("todo app"));
        assert_eq!(ctx.squads(), ["design".to_string()]);
    }

    #[test]
    fn test_failed_squad_leaves_context_unchanged() {
        let mut ctx = SharedContext::new();
        ctx.merge_squad(&SquadResult::not_run("backend", "boom"));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_latest_artifacts_replaces_by_path() {
        let mut ctx = SharedContext::new();
        ctx.merge_squad(&squad_result(
            "backend",
            "api",
            AgentOutput::text("").with_artifact(Artifact::new("src/main.rs", "v1")),
        ));
        ctx.merge_squad(&squad_result(
            "fixer",
            "fix",
            AgentOutput::text("")
                .with_artifact(Artifact::new("src/main.rs", "v2"))
                .with_artifact(Artifact::new("README.md", "docs")),
        ));

        assert_eq!(ctx.artifacts().len(), 3);
        let latest = ctx.latest_artifacts();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].content, "v2");
        assert_eq!(latest[1].path, "README.md");
    }

    #[test]
    fn test_seeded_files_come_first() {
        let mut ctx = SharedContext::new();
        ctx.merge_squad(&squad_result(
            "backend",
            "api",
            AgentOutput::text("").with_artifact(Artifact::new("src/lib.rs", "new")),
        ));
        ctx.seed_files(vec![Artifact::new("src/lib.rs", "old")]);

        assert!(ctx.has_output(SharedContext::INPUT_SQUAD));
        assert_eq!(ctx.squads()[0], SharedContext::INPUT_SQUAD);
        assert_eq!(ctx.latest_artifacts()[0].content, "new");
    }

    #[test]
    fn test_render_truncates_entries() {
        let mut ctx = SharedContext::new();
        ctx.merge_squad(&squad_result("s", "a", AgentOutput::text("x".repeat(100))));
        let rendered = ctx.render(10);
        assert!(rendered.contains("## s/a"));
        assert!(rendered.contains(&"x".repeat(10)));
        assert!(!rendered.contains(&"x".repeat(11)));
    }
}
