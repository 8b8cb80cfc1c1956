//! Retrying completion client.

use super::retry::RetryPolicy;
use async_trait::async_trait;
use squadforge_application::ports::completion::{
    CompletionError, CompletionGateway, CompletionRequest, CompletionResponse,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// One raw call to the completion service, no retries.
///
/// `HttpTransport` is the production implementation; tests script one.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, CompletionError>;
}

/// Snapshot of a client's running counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientUsage {
    /// Calls to [`CompletionGateway::complete`].
    pub requests: u64,
    /// Retries across all requests.
    pub retries: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Debug, Default)]
struct Counters {
    requests: AtomicU64,
    retries: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    total_tokens: AtomicU64,
}

/// Completion gateway that retries `RateLimited` and `ConnectionFailed`
/// with exponential backoff. Counters are per instance.
pub struct CompletionClient<T> {
    transport: T,
    policy: RetryPolicy,
    counters: Counters,
}

impl<T: CompletionTransport> CompletionClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_policy(transport, RetryPolicy::default())
    }

    pub fn with_policy(transport: T, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            counters: Counters::default(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn usage(&self) -> ClientUsage {
        ClientUsage {
            requests: self.counters.requests.load(Ordering::Relaxed),
            retries: self.counters.retries.load(Ordering::Relaxed),
            prompt_tokens: self.counters.prompt_tokens.load(Ordering::Relaxed),
            completion_tokens: self.counters.completion_tokens.load(Ordering::Relaxed),
            total_tokens: self.counters.total_tokens.load(Ordering::Relaxed),
        }
    }

    fn record(&self, response: &CompletionResponse) {
        let c = &self.counters;
        c.prompt_tokens
            .fetch_add(response.usage.prompt_tokens, Ordering::Relaxed);
        c.completion_tokens
            .fetch_add(response.usage.completion_tokens, Ordering::Relaxed);
        c.total_tokens
            .fetch_add(response.usage.total_tokens, Ordering::Relaxed);
    }
}

#[async_trait]
impl<T: CompletionTransport> CompletionGateway for CompletionClient<T> {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);
        let max_retries = request.max_retries.unwrap_or(self.policy.max_retries);
        let mut attempt = 0u32;

        loop {
            let sent = match request.timeout {
                Some(limit) => tokio::time::timeout(limit, self.transport.send(&request))
                    .await
                    .unwrap_or_else(|_| {
                        Err(CompletionError::ConnectionFailed(format!(
                            "attempt timed out after {limit:?}"
                        )))
                    }),
                None => self.transport.send(&request).await,
            };
            match sent {
                Ok(mut response) => {
                    response.retry_count = attempt;
                    self.record(&response);
                    debug!(
                        "Completion for {} succeeded after {} retries ({} tokens)",
                        request.model, attempt, response.usage.total_tokens
                    );
                    return Ok(response);
                }
                Err(e) if e.is_transient() && attempt < max_retries => {
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "Completion for {} failed ({}), retry {}/{} in {:?}",
                        request.model,
                        e,
                        attempt + 1,
                        max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    self.counters.retries.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
