//! Completion service configuration (`[completion]` section)

use crate::completion::RetryPolicy;
use crate::config::issue::ConfigIssue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where and how to reach the completion service.
///
/// # Example
///
/// ```toml
/// [completion]
/// endpoint = "https://api.openai.com/v1"
/// api_key_env = "OPENAI_API_KEY"
/// default_model = "gpt-4o-mini"
/// timeout_secs = 120
///
/// [completion.retry]
/// max_retries = 3
/// base_delay_ms = 500
/// multiplier = 2.0
/// max_delay_ms = 30000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCompletionConfig {
    pub endpoint: String,
    /// Environment variable holding the API key. Unset means no auth header.
    pub api_key_env: String,
    /// Model used by agents that do not name one.
    pub default_model: String,
    /// HTTP request timeout.
    pub timeout_secs: u64,
    pub retry: FileRetryConfig,
}

impl Default for FileCompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            timeout_secs: 120,
            retry: FileRetryConfig::default(),
        }
    }
}

impl FileCompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        if self.endpoint.trim().is_empty() {
            issues.push(ConfigIssue::invalid(
                "completion.endpoint",
                "completion.endpoint cannot be empty",
            ));
        }
        if self.default_model.trim().is_empty() {
            issues.push(ConfigIssue::invalid(
                "completion.default_model",
                "completion.default_model cannot be empty",
            ));
        }
        if self.timeout_secs == 0 {
            issues.push(ConfigIssue::invalid(
                "completion.timeout_secs",
                "completion.timeout_secs must be > 0",
            ));
        }
        issues.extend(self.retry.to_policy().1);
        issues
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            multiplier: policy.multiplier,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

impl FileRetryConfig {
    /// Convert to a [`RetryPolicy`], returning validation issues.
    ///
    /// Invalid values fall back to `RetryPolicy::default()`.
    pub fn to_policy(&self) -> (RetryPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            issues.push(ConfigIssue::invalid(
                "completion.retry.multiplier",
                format!(
                    "completion.retry.multiplier must be >= 1.0, got {}",
                    self.multiplier
                ),
            ));
        }
        if self.max_delay_ms < self.base_delay_ms {
            issues.push(ConfigIssue::invalid(
                "completion.retry.max_delay_ms",
                "completion.retry.max_delay_ms must be >= base_delay_ms",
            ));
        }
        if !issues.is_empty() {
            return (RetryPolicy::default(), issues);
        }
        let policy = RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            multiplier: self.multiplier,
            max_delay: Duration::from_millis(self.max_delay_ms),
        };
        (policy, issues)
    }
}
