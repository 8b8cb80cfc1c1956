//! Quality gate domain: checks, issues, results and reports.
//!
//! The gate itself (running commands, auto-fix loop) is an application use
//! case; this module holds the data and the pure output parsing.

pub mod entities;
pub mod parsing;
pub mod report;

pub use entities::{CheckResult, CheckStatus, Issue, QualityCheck, Severity};
pub use parsing::{classify, parse_issues};
pub use report::{QualityReport, ReportStatus};
