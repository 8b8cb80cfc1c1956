//! Quality check adapters.

mod process_runner;

pub use process_runner::ProcessCheckRunner;
