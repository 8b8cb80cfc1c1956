//! Logging infrastructure: structured event logging.
//!
//! Provides [`JsonlEventLogger`], a JSONL file writer that implements the
//! [`ProgressListener`](squadforge_application::ProgressListener) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlEventLogger;
