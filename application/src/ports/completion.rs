//! Completion gateway port
//!
//! Defines the interface for calling the remote text-generation service.

use async_trait::async_trait;
use squadforge_domain::{AgentConfig, Message, TokenUsage};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a completion gateway.
///
/// Only `RateLimited` and `ConnectionFailed` are transient; clients retry
/// those and propagate `Other` immediately.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Completion failed: {0}")]
    Other(String),
}

impl CompletionError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited(_) | CompletionError::ConnectionFailed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the client's retry budget for this request.
    pub max_retries: Option<u32>,
    /// Bound on each attempt. An attempt that runs past it counts as
    /// `ConnectionFailed` and is retried.
    pub timeout: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: AgentConfig::DEFAULT_TEMPERATURE,
            max_tokens: AgentConfig::DEFAULT_MAX_TOKENS,
            max_retries: None,
            timeout: None,
        }
    }

    /// Request carrying an agent's sampling parameters, retry budget and
    /// per-attempt timeout.
    pub fn for_agent(config: &AgentConfig, messages: Vec<Message>) -> Self {
        Self {
            model: config.model().to_string(),
            messages,
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            max_retries: Some(config.max_retries()),
            timeout: Some(config.timeout()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
    /// Retries consumed before this response arrived.
    pub retry_count: u32,
}

impl CompletionResponse {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            usage,
            retry_count: 0,
        }
    }
}

/// Gateway for completion calls
///
/// Implementations live in the infrastructure layer. They bound every
/// attempt by `request.timeout` when it is set.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError>;
}
