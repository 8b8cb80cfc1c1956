//! Completion service adapters.
//!
//! [`CompletionClient`] implements the `CompletionGateway` port on top of a
//! [`CompletionTransport`], adding retry with backoff and usage counters.
//! [`HttpTransport`] (feature `http`) talks to an OpenAI-compatible endpoint.

mod client;
#[cfg(feature = "http")]
mod http;
mod retry;

pub use client::{ClientUsage, CompletionClient, CompletionTransport};
#[cfg(feature = "http")]
pub use http::HttpTransport;
pub use retry::RetryPolicy;
