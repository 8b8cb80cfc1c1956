//! Quality check definitions and per-check results.

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Severity of an issue or of a check as a whole.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    #[default]
    Error,
}

impl Severity {
    /// Map a tool's severity label (`error`, `warning`, `note`, ...) to a severity.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "error" | "fatal" | "critical" => Some(Severity::Error),
            "warning" | "warn" => Some(Severity::Warning),
            "note" | "info" | "hint" | "help" => Some(Severity::Info),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// A registered check: an external command plus an optional fix command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_fix_command: Option<String>,
    #[serde(
        default = "QualityCheck::default_timeout",
        with = "crate::core::metrics::duration_secs"
    )]
    pub timeout: Duration,
    #[serde(default = "QualityCheck::default_required")]
    pub required: bool,
    /// Highest severity this check's issues are reported at. A style
    /// linter set to `warning` never reports errors.
    #[serde(default)]
    pub severity: Severity,
}

impl QualityCheck {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            auto_fix_command: None,
            timeout: Self::DEFAULT_TIMEOUT,
            required: true,
            severity: Severity::Error,
        }
    }

    pub fn with_auto_fix(mut self, command: impl Into<String>) -> Self {
        self.auto_fix_command = Some(command.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn is_fixable(&self) -> bool {
        self.auto_fix_command.is_some()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: &str| DomainError::InvalidCheck {
            check: self.name.clone(),
            reason: reason.to_string(),
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.command.trim().is_empty() {
            return Err(invalid("command cannot be empty"));
        }
        if self.timeout.is_zero() {
            return Err(invalid("timeout must be > 0"));
        }
        if self
            .auto_fix_command
            .as_deref()
            .is_some_and(|c| c.trim().is_empty())
        {
            return Err(invalid("auto_fix_command cannot be empty"));
        }
        Ok(())
    }

    fn default_timeout() -> Duration {
        Self::DEFAULT_TIMEOUT
    }

    fn default_required() -> bool {
        true
    }
}

/// One problem extracted from a check's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl Issue {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            line: None,
            column: None,
            rule: None,
        }
    }

    pub fn at(mut self, file: impl Into<String>, line: Option<u32>, column: Option<u32>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self.column = column;
        self
    }

    pub fn with_rule(mut self, rule: impl Into<String>) -> Self {
        self.rule = Some(rule.into());
        self
    }

    /// Lower the severity to at most `ceiling`.
    pub fn capped_at(mut self, ceiling: Severity) -> Self {
        self.severity = self.severity.min(ceiling);
        self
    }

    /// `file:line:col` when known.
    pub fn location(&self) -> Option<String> {
        let file = self.file.as_deref()?;
        Some(match (self.line, self.column) {
            (Some(l), Some(c)) => format!("{file}:{l}:{c}"),
            (Some(l), None) => format!("{file}:{l}"),
            _ => file.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Passed,
    Failed,
    Warning,
    Skipped,
    /// The check could not run: timeout or runner failure.
    Error,
}

impl CheckStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Warning => "warning",
            CheckStatus::Skipped => "skipped",
            CheckStatus::Error => "error",
        }
    }

    /// `Failed` and `Error` both count as not passed.
    pub fn is_failing(&self) -> bool {
        matches!(self, CheckStatus::Failed | CheckStatus::Error)
    }
}

/// Result of the latest run of one check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_name: String,
    pub status: CheckStatus,
    pub issues: Vec<Issue>,
    /// Fix commands applied to this check, across all auto-fix iterations.
    pub fixes_applied: Vec<String>,
    #[serde(with = "crate::core::metrics::duration_millis")]
    pub time: Duration,
    pub required: bool,
    /// How many times the check command ran.
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Why the check ended in `Error` or `Skipped`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckResult {
    pub fn new(
        check: &QualityCheck,
        status: CheckStatus,
        issues: Vec<Issue>,
        time: Duration,
    ) -> Self {
        Self {
            check_name: check.name.clone(),
            status,
            issues,
            fixes_applied: Vec::new(),
            time,
            required: check.required,
            attempts: 1,
            exit_code: None,
            message: None,
        }
    }

    pub fn error(check: &QualityCheck, message: impl Into<String>, time: Duration) -> Self {
        let mut result = Self::new(check, CheckStatus::Error, Vec::new(), time);
        result.message = Some(message.into());
        result
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            check_name: name.into(),
            status: CheckStatus::Skipped,
            issues: Vec::new(),
            fixes_applied: Vec::new(),
            time: Duration::ZERO,
            required: false,
            attempts: 0,
            exit_code: None,
            message: Some(reason.into()),
        }
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_capped_at_check_severity() {
        let issue = Issue::new(Severity::Error, "bad").capped_at(Severity::Warning);
        assert_eq!(issue.severity, Severity::Warning);
        let note = Issue::new(Severity::Info, "fyi").capped_at(Severity::Warning);
        assert_eq!(note.severity, Severity::Info);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::from_label("ERROR"), Some(Severity::Error));
        assert_eq!(Severity::from_label("warn"), Some(Severity::Warning));
        assert_eq!(Severity::from_label("note"), Some(Severity::Info));
        assert_eq!(Severity::from_label("src/main.rs"), None);
    }

    #[test]
    fn test_check_validation() {
        assert!(QualityCheck::new("lint", "cargo clippy").validate().is_ok());
        assert!(QualityCheck::new("lint", " ").validate().is_err());
        assert!(
            QualityCheck::new("lint", "x")
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            QualityCheck::new("lint", "x")
                .with_auto_fix("")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_deserialize_check_defaults() {
        let check: QualityCheck =
            serde_json::from_str(r#"{"name":"fmt","command":"cargo fmt --check"}"#).unwrap();
        assert!(check.required);
        assert!(!check.is_fixable());
        assert_eq!(check.severity, Severity::Error);
        assert_eq!(check.timeout, QualityCheck::DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_issue_location() {
        let issue = Issue::new(Severity::Error, "bad").at("a.rs", Some(3), Some(7));
        assert_eq!(issue.location().as_deref(), Some("a.rs:3:7"));
        assert_eq!(Issue::new(Severity::Info, "x").location(), None);
    }

    #[test]
    fn test_failing_statuses() {
        assert!(CheckStatus::Failed.is_failing());
        assert!(CheckStatus::Error.is_failing());
        assert!(!CheckStatus::Warning.is_failing());
        assert!(!CheckStatus::Skipped.is_failing());
    }
}
