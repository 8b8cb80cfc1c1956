//! Quality gate report.

use super::entities::{CheckResult, CheckStatus};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Passed,
    Failed,
}

/// Immutable summary of a quality gate run.
///
/// `passed` is true iff no check ended `failed` or `error`, regardless of
/// the `required` flag. Callers that only care about required checks use
/// [`QualityReport::required_passed`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub status: ReportStatus,
    pub passed: bool,
    pub checks: Vec<CheckResult>,
    pub summary: String,
    pub recommendations: Vec<String>,
    /// Auto-fix iterations that ran.
    pub fix_iterations: u32,
}

impl QualityReport {
    pub fn build(mut checks: Vec<CheckResult>, fix_iterations: u32) -> Self {
        checks.sort_by(|a, b| a.check_name.cmp(&b.check_name));

        let passed = !checks.iter().any(|c| c.status.is_failing());
        let recommendations = checks
            .iter()
            .filter(|c| c.status.is_failing())
            .map(recommendation)
            .collect();
        let summary = summarize(&checks, fix_iterations);

        Self {
            status: if passed {
                ReportStatus::Passed
            } else {
                ReportStatus::Failed
            },
            passed,
            checks,
            summary,
            recommendations,
            fix_iterations,
        }
    }

    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.check_name == name)
    }

    /// True when every required check avoided `failed` and `error`.
    pub fn required_passed(&self) -> bool {
        !self
            .checks
            .iter()
            .any(|c| c.required && c.status.is_failing())
    }

    pub fn failing_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.status.is_failing())
    }

    pub fn count(&self, status: CheckStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }
}

fn recommendation(check: &CheckResult) -> String {
    let required = if check.required { "required" } else { "optional" };
    match check.status {
        CheckStatus::Error => format!(
            "Check '{}' ({required}) could not complete: {}",
            check.check_name,
            check.message.as_deref().unwrap_or("unknown error")
        ),
        _ => {
            let count = check.issues.len();
            let first = check
                .issues
                .first()
                .map(|i| match i.location() {
                    Some(loc) => format!(" First: {loc}: {}", i.message),
                    None => format!(" First: {}", i.message),
                })
                .unwrap_or_default();
            if count == 0 {
                format!(
                    "Check '{}' ({required}) failed without reporting issues; run it manually.",
                    check.check_name
                )
            } else {
                format!(
                    "Resolve {count} issue(s) reported by '{}' ({required}).{first}",
                    check.check_name
                )
            }
        }
    }
}

fn summarize(checks: &[CheckResult], fix_iterations: u32) -> String {
    let count = |s: CheckStatus| checks.iter().filter(|c| c.status == s).count();
    let mut summary = format!(
        "{} check(s): {} passed, {} warning, {} failed, {} error, {} skipped",
        checks.len(),
        count(CheckStatus::Passed),
        count(CheckStatus::Warning),
        count(CheckStatus::Failed),
        count(CheckStatus::Error),
        count(CheckStatus::Skipped),
    );
    if fix_iterations > 0 {
        summary.push_str(&format!(" after {fix_iterations} auto-fix iteration(s)"));
    }
    summary
}
