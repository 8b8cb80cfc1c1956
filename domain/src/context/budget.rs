//! Token budget for a single completion request.

use crate::core::error::DomainError;
use serde::Serialize;

/// Token ceiling a request must fit within.
///
/// `safe_margin` is the fraction of the model window that prompts may fill;
/// the rest is left for the completion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContextBudget {
    max_tokens: usize,
    safe_margin: f64,
}

impl ContextBudget {
    pub const DEFAULT_MAX_TOKENS: usize = 128_000;
    pub const DEFAULT_SAFE_MARGIN: f64 = 0.8;

    pub fn new(max_tokens: usize, safe_margin: f64) -> Result<Self, DomainError> {
        if max_tokens == 0 {
            return Err(DomainError::InvalidBudget(
                "max_tokens must be > 0".to_string(),
            ));
        }
        if !safe_margin.is_finite() || safe_margin <= 0.0 || safe_margin > 1.0 {
            return Err(DomainError::InvalidBudget(format!(
                "safe_margin must be in (0, 1], got {safe_margin}"
            )));
        }
        Ok(Self {
            max_tokens,
            safe_margin,
        })
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn safe_margin(&self) -> f64 {
        self.safe_margin
    }

    /// Tokens a prompt may use. Always strictly below `max_tokens`.
    pub fn effective_max(&self) -> usize {
        let scaled = (self.max_tokens as f64 * self.safe_margin).floor() as usize;
        scaled.min(self.max_tokens - 1)
    }
}

impl Default for ContextBudget {
    fn default() -> Self {
        Self {
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            safe_margin: Self::DEFAULT_SAFE_MARGIN,
        }
    }
}
