//! Execution metrics.
//!
//! [`ExecutionMetrics`] is an explicit metrics context: every layer builds
//! its own value and the caller folds child metrics in with
//! [`ExecutionMetrics::merge`]. All counters merge by summation.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Token usage reported by the completion service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}

/// Aggregated metrics for an agent call, squad, step or whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub usage: TokenUsage,
    /// Number of completion requests that returned a response.
    pub llm_calls: u64,
    /// Transient-failure retries consumed by the completion client.
    pub retry_count: u64,
    /// Agents that ran to a successful result.
    pub agents_executed: u64,
    pub agents_failed: u64,
    pub agents_total: u64,
    /// Number of context compressions applied before execution.
    pub compressions: u64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for a single completion call.
    pub fn for_call(usage: TokenUsage, retry_count: u64) -> Self {
        Self {
            usage,
            llm_calls: 1,
            retry_count,
            ..Default::default()
        }
    }

    /// Fold `other` into `self`. Every counter is summed.
    pub fn merge(&mut self, other: &ExecutionMetrics) {
        self.usage += other.usage;
        self.llm_calls += other.llm_calls;
        self.retry_count += other.retry_count;
        self.agents_executed += other.agents_executed;
        self.agents_failed += other.agents_failed;
        self.agents_total += other.agents_total;
        self.compressions += other.compressions;
        self.elapsed += other.elapsed;
    }

    /// Replace the elapsed time with a measured wall-clock duration.
    ///
    /// Fan-out owners call this after merging children, since summed child
    /// durations overstate the time of a concurrent section.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.usage.total_tokens
    }
}

impl<'a> std::iter::Sum<&'a ExecutionMetrics> for ExecutionMetrics {
    fn sum<I: Iterator<Item = &'a ExecutionMetrics>>(iter: I) -> Self {
        let mut total = ExecutionMetrics::default();
        for m in iter {
            total.merge(m);
        }
        total
    }
}

/// Durations as whole milliseconds.
pub(crate) mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Durations as seconds: an integer when whole, a float otherwise.
pub(crate) mod duration_secs {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Secs {
        Whole(u64),
        Fractional(f64),
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if d.subsec_nanos() == 0 {
            s.serialize_u64(d.as_secs())
        } else {
            s.serialize_f64(d.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        match Secs::deserialize(d)? {
            Secs::Whole(secs) => Ok(Duration::from_secs(secs)),
            Secs::Fractional(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|e| D::Error::custom(format!("invalid duration {secs}: {e}"))),
        }
    }
}
