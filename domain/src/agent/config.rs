//! Agent configuration, validated once at construction.

use crate::core::error::DomainError;
use serde::Serialize;
use std::time::Duration;

/// Static configuration for a single agent.
///
/// Built through [`AgentConfig::new`] or the `with_*` builders, all of which
/// enforce the invariants:
///
/// - `temperature` in `[0, 1]`
/// - `max_tokens > 0`
/// - `timeout > 0`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentConfig {
    name: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    #[serde(with = "crate::core::metrics::duration_secs")]
    timeout: Duration,
    max_retries: u32,
}

impl AgentConfig {
    pub const DEFAULT_TEMPERATURE: f32 = 0.2;
    pub const DEFAULT_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Create a config with default sampling parameters.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Result<Self, DomainError> {
        let config = Self {
            name: name.into(),
            model: model.into(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            timeout: Self::DEFAULT_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
        };
        config.validate()?;
        Ok(config)
    }

    // ==================== Builder Methods ====================

    pub fn with_temperature(mut self, temperature: f32) -> Result<Self, DomainError> {
        self.temperature = temperature;
        self.validate()?;
        Ok(self)
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Result<Self, DomainError> {
        self.max_tokens = max_tokens;
        self.validate()?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, DomainError> {
        self.timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    // ==================== Accessors ====================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::agent(&self.name, "name cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(DomainError::agent(&self.name, "model cannot be empty"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::agent(
                &self.name,
                format!("temperature {} must be within [0, 1]", self.temperature),
            ));
        }
        if self.max_tokens == 0 {
            return Err(DomainError::agent(&self.name, "max_tokens must be > 0"));
        }
        if self.timeout.is_zero() {
            return Err(DomainError::agent(&self.name, "timeout must be > 0"));
        }
        Ok(())
    }
}
