//! Execution parameters — use case loop control.
//!
//! [`ExecutionParams`] groups the static parameters that control the
//! orchestration use cases. These are application-layer concerns, not
//! domain policy.

use serde::{Deserialize, Serialize};

/// Orchestration loop control parameters.
///
/// | Field | Used by |
/// |-------|---------|
/// | `max_fix_iterations` | QualityGateEngine |
/// | `keep_recent`, `max_file_tokens` | Orchestrator (compression) |
/// | `context_entry_bytes` | agents rendering the running context |
/// | `quality_gate` | Orchestrator (hybrid mode) |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionParams {
    /// Upper bound on auto-fix iterations per quality gate run.
    pub max_fix_iterations: u32,
    /// Messages kept verbatim at the end of a compressed history.
    pub keep_recent: usize,
    /// Token ceiling for a single request file once compression kicks in.
    pub max_file_tokens: usize,
    /// Bytes of each prior agent output included in a prompt.
    pub context_entry_bytes: usize,
    /// Run the quality gate after hybrid execution.
    pub quality_gate: bool,
    /// Working directory for quality check commands.
    pub working_dir: Option<String>,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_fix_iterations: 3,
            keep_recent: 6,
            max_file_tokens: 4_000,
            context_entry_bytes: 8_000,
            quality_gate: true,
            working_dir: None,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_fix_iterations(mut self, max: u32) -> Self {
        self.max_fix_iterations = max;
        self
    }

    pub fn with_keep_recent(mut self, keep: usize) -> Self {
        self.keep_recent = keep;
        self
    }

    pub fn with_max_file_tokens(mut self, tokens: usize) -> Self {
        self.max_file_tokens = tokens;
        self
    }

    pub fn with_quality_gate(mut self, enabled: bool) -> Self {
        self.quality_gate = enabled;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = ExecutionParams::default();
        assert_eq!(params.max_fix_iterations, 3);
        assert_eq!(params.keep_recent, 6);
        assert!(params.quality_gate);
        assert!(params.working_dir.is_none());
    }

    #[test]
    fn test_builder() {
        let params = ExecutionParams::default()
            .with_max_fix_iterations(5)
            .with_keep_recent(2)
            .with_working_dir("/tmp/test");

        assert_eq!(params.max_fix_iterations, 5);
        assert_eq!(params.keep_recent, 2);
        assert_eq!(params.working_dir, Some("/tmp/test".to_string()));
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let params: ExecutionParams =
            serde_json::from_str(r#"{"max_fix_iterations": 1}"#).unwrap();
        assert_eq!(params.max_fix_iterations, 1);
        assert_eq!(params.max_file_tokens, 4_000);
    }
}
