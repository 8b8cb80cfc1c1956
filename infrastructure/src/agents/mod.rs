//! Agent implementations.

pub mod extraction;
mod prompt_agent;

pub use extraction::{Extracted, extract_artifacts, language_for};
pub use prompt_agent::{DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPLATE, PromptAgent};
