//! Execution configuration from TOML (`[execution]` section)

use super::context::FileContextConfig;
use serde::{Deserialize, Serialize};
use squadforge_application::ExecutionParams;

/// # Example
///
/// ```toml
/// [execution]
/// max_fix_iterations = 3
/// quality_gate = true
/// auto_fix = true
/// working_dir = "./generated"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_fix_iterations: u32,
    /// Run the quality gate after hybrid execution.
    pub quality_gate: bool,
    /// Let the gate apply fix commands.
    pub auto_fix: bool,
    /// Directory quality check commands run in.
    pub working_dir: Option<String>,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_fix_iterations: params.max_fix_iterations,
            quality_gate: params.quality_gate,
            auto_fix: true,
            working_dir: None,
        }
    }
}

impl FileExecutionConfig {
    pub fn to_execution_params(&self, context: &FileContextConfig) -> ExecutionParams {
        let mut params = ExecutionParams::default()
            .with_max_fix_iterations(self.max_fix_iterations)
            .with_quality_gate(self.quality_gate)
            .with_keep_recent(context.keep_recent)
            .with_max_file_tokens(context.max_file_tokens);
        params.context_entry_bytes = context.entry_bytes;
        if let Some(dir) = &self.working_dir {
            params = params.with_working_dir(dir.clone());
        }
        params
    }
}
