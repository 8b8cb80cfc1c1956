//! Issue extraction from check output.
//!
//! Pure text pattern matching over stdout/stderr of an external check. No
//! tool-specific integration: each line is tried against a fixed set of
//! shapes that cover most compilers, linters and test runners.
//!
//! | Shape | Example |
//! |-------|---------|
//! | colon location | `src/app.py:12:5: E501 line too long` |
//! | paren location | `src/a.ts(3,5): error TS2322: Type 'x' ...` |
//! | compiler diagnostic | `error[E0308]: mismatched types` + `--> src/main.rs:4:9` |
//! | eslint row | `  12:5  error  'x' is not defined  no-undef` under a file header |
//! | failure marker | `FAILED tests/test_api.py::test_login - AssertionError` |

use super::entities::{CheckStatus, Issue, Severity};

/// Extract issues from the combined output of a check.
pub fn parse_issues(output: &str) -> Vec<Issue> {
    let mut issues: Vec<Issue> = Vec::new();
    let mut current_file: Option<String> = None;

    for raw in output.lines() {
        let line = raw.trim();
        if line.is_empty() {
            current_file = None;
            continue;
        }
        if is_noise(line) {
            continue;
        }

        if let Some(location) = line.strip_prefix("--> ") {
            if let Some(last) = issues.last_mut()
                && last.file.is_none()
            {
                let (file, l, c) = split_location(location.trim());
                *last = last.clone().at(file, l, c);
            }
            continue;
        }

        let parsed = parse_compiler_diagnostic(line)
            .or_else(|| parse_paren_location(line))
            .or_else(|| parse_colon_location(line))
            .or_else(|| {
                current_file
                    .as_deref()
                    .and_then(|file| parse_eslint_row(line, file))
            });

        if let Some(issue) = parsed {
            issues.push(issue);
        } else if looks_like_path(line) {
            current_file = Some(line.to_string());
        } else if let Some(issue) = parse_failure_marker(line) {
            issues.push(issue);
        }
    }

    issues
}

/// Status of a check from its exit code and parsed issues.
///
/// Exit status decides pass/fail; issues only distinguish a clean pass from
/// a pass with warnings.
pub fn classify(exit_code: i32, issues: &[Issue]) -> CheckStatus {
    if exit_code != 0 {
        return CheckStatus::Failed;
    }
    if issues.iter().any(|i| i.severity >= Severity::Warning) {
        CheckStatus::Warning
    } else {
        CheckStatus::Passed
    }
}

fn is_noise(line: &str) -> bool {
    let lower = line.to_ascii_lowercase();
    lower.contains("aborting due to")
        || lower.starts_with("error: could not compile")
        || lower.starts_with("for more information")
        || (lower.starts_with("warning:") && lower.ends_with("emitted"))
}

/// `error: msg`, `warning[W0612]: msg`, `error[E0308]: msg`
fn parse_compiler_diagnostic(line: &str) -> Option<Issue> {
    let (head, message) = line.split_once(": ")?;
    let (label, rule) = match head.split_once('[') {
        Some((label, code)) => (label, Some(code.strip_suffix(']')?)),
        None => (head, None),
    };
    let severity = Severity::from_label(label)?;
    let mut issue = Issue::new(severity, message.trim());
    if let Some(rule) = rule {
        issue = issue.with_rule(rule);
    }
    Some(issue)
}

/// `path(line,col): severity CODE: message`
fn parse_paren_location(line: &str) -> Option<Issue> {
    let (path, after) = line.split_once('(')?;
    if !looks_like_path(path) {
        return None;
    }
    let (coords, rest) = after.split_once("):")?;
    let (l, c) = coords.split_once(',')?;
    let l: u32 = l.trim().parse().ok()?;
    let c: u32 = c.trim().parse().ok()?;

    let (severity, message, rule) = split_severity(rest.trim());
    let mut issue = Issue::new(severity, message).at(path, Some(l), Some(c));
    if let Some(rule) = rule {
        issue = issue.with_rule(rule);
    }
    Some(issue)
}

/// `path:line[:col]: [severity:] message`
fn parse_colon_location(line: &str) -> Option<Issue> {
    let (path, after) = line.split_once(':')?;
    if !looks_like_path(path) {
        return None;
    }
    let (line_str, after) = after.split_once(':')?;
    let l: u32 = line_str.trim().parse().ok()?;
    let (c, rest) = match after.split_once(':') {
        Some((col, rest)) if col.trim().parse::<u32>().is_ok() => (col.trim().parse().ok(), rest),
        _ => (None, after),
    };

    let (severity, message, rule) = split_severity(rest.trim());
    let mut issue = Issue::new(severity, message).at(path, Some(l), c);
    if let Some(rule) = rule {
        issue = issue.with_rule(rule);
    }
    Some(issue)
}

/// `12:5  error  message  rule-name`
fn parse_eslint_row(line: &str, file: &str) -> Option<Issue> {
    let (position, rest) = line.split_once(char::is_whitespace)?;
    let (l, c) = position.split_once(':')?;
    let l: u32 = l.parse().ok()?;
    let c: u32 = c.parse().ok()?;

    let rest = rest.trim_start();
    let (label, rest) = rest.split_once(char::is_whitespace)?;
    let severity = Severity::from_label(label)?;

    let rest = rest.trim();
    let (message, rule) = match rest.rsplit_once("  ") {
        Some((message, rule)) if !rule.trim().contains(' ') => (message.trim(), Some(rule.trim())),
        _ => (rest, None),
    };
    let mut issue = Issue::new(severity, message).at(file, Some(l), Some(c));
    if let Some(rule) = rule {
        issue = issue.with_rule(rule);
    }
    Some(issue)
}

/// `FAIL src/app.test.ts`, `FAILED tests/x.py::t`, `test api::login ... FAILED`
fn parse_failure_marker(line: &str) -> Option<Issue> {
    let marked = line.starts_with("FAIL ")
        || line.starts_with("FAILED ")
        || line.ends_with(" FAILED")
        || line.ends_with("... FAILED");
    marked.then(|| Issue::new(Severity::Error, line))
}

/// Split a message tail into severity, message and rule code.
///
/// Recognizes `error: msg`, `error TS2322: msg`, and flake8-style
/// `E501 msg` prefixes. Anything else is an error-severity message.
fn split_severity(rest: &str) -> (Severity, String, Option<String>) {
    if let Some(issue) = parse_compiler_diagnostic(rest) {
        return (issue.severity, issue.message, issue.rule);
    }

    if let Some((label, tail)) = rest.split_once(' ')
        && let Some(severity) = Severity::from_label(label)
    {
        return match tail.split_once(": ") {
            Some((code, message)) if !code.contains(' ') => {
                (severity, message.trim().to_string(), Some(code.to_string()))
            }
            _ => (severity, tail.trim().to_string(), None),
        };
    }

    if let Some((code, message)) = rest.split_once(' ')
        && is_lint_code(code)
    {
        let severity = if code.starts_with('E') || code.starts_with('F') {
            Severity::Error
        } else {
            Severity::Warning
        };
        return (severity, message.trim().to_string(), Some(code.to_string()));
    }

    (Severity::Error, rest.to_string(), None)
}

/// `E501`, `W0612`, `F401`
fn is_lint_code(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_uppercase())
        && token.len() >= 3
        && chars.all(|c| c.is_ascii_digit())
}

fn looks_like_path(s: &str) -> bool {
    !s.is_empty()
        && !s.contains(char::is_whitespace)
        && !s.starts_with("http")
        && (s.contains('/') || s.contains('\\') || s.contains('.'))
        && !s.ends_with('.')
}

fn split_location(location: &str) -> (String, Option<u32>, Option<u32>) {
    let mut parts = location.rsplitn(3, ':');
    let last = parts.next();
    let middle = parts.next();
    let first = parts.next();
    match (first, middle, last) {
        (Some(file), Some(l), Some(c)) => (file.to_string(), l.parse().ok(), c.parse().ok()),
        (None, Some(file), Some(l)) => (file.to_string(), l.parse().ok(), None),
        _ => (location.to_string(), None, None),
    }
}
