//! Token budgeting and context compression.

pub mod budget;
pub mod compressor;
pub mod tokens;

pub use budget::ContextBudget;
pub use compressor::ContextCompressor;
pub use tokens::{CHARS_PER_TOKEN, clip_bytes, estimate_tokens};
