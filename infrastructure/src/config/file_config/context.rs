//! Context budget configuration from TOML (`[context]` section)

use crate::config::issue::ConfigIssue;
use serde::{Deserialize, Serialize};
use squadforge_domain::ContextBudget;

/// Token budget and compression settings.
///
/// # Example
///
/// ```toml
/// [context]
/// max_tokens = 128000
/// safe_margin = 0.8
/// keep_recent = 6
/// max_file_tokens = 4000
/// entry_bytes = 8000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileContextConfig {
    /// Model context window, in tokens.
    pub max_tokens: usize,
    /// Fraction of the window a request may use.
    pub safe_margin: f64,
    /// History messages kept verbatim when compressing.
    pub keep_recent: usize,
    /// Token ceiling per file once compression kicks in.
    pub max_file_tokens: usize,
    /// Bytes of each prior agent output included in prompts.
    pub entry_bytes: usize,
}

impl Default for FileContextConfig {
    fn default() -> Self {
        Self {
            max_tokens: ContextBudget::DEFAULT_MAX_TOKENS,
            safe_margin: ContextBudget::DEFAULT_SAFE_MARGIN,
            keep_recent: 6,
            max_file_tokens: 4_000,
            entry_bytes: 8_000,
        }
    }
}

impl FileContextConfig {
    /// Convert to domain `ContextBudget`, returning validation issues.
    ///
    /// Out-of-range values fall back to `ContextBudget::default()`.
    pub fn to_context_budget(&self) -> (ContextBudget, Vec<ConfigIssue>) {
        match ContextBudget::new(self.max_tokens, self.safe_margin) {
            Ok(budget) => (budget, vec![]),
            Err(e) => (
                ContextBudget::default(),
                vec![ConfigIssue::invalid("context", format!("context: {e}"))],
            ),
        }
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = self.to_context_budget().1;
        if self.max_file_tokens == 0 {
            issues.push(ConfigIssue::invalid(
                "context.max_file_tokens",
                "context.max_file_tokens must be > 0",
            ));
        }
        issues
    }
}
