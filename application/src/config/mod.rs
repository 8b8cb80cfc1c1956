//! Application-level configuration.
//!
//! - [`ExecutionParams`] — orchestration loop control (fix iterations,
//!   compression knobs, working directory)

pub mod execution_params;

pub use execution_params::ExecutionParams;
