//! Core domain concepts shared across all subdomains.
//!
//! - [`error::DomainError`] — domain-level errors
//! - [`metrics::ExecutionMetrics`] — summing metrics context
//! - [`metrics::TokenUsage`] — completion-service token accounting

pub mod error;
pub mod metrics;
