//! Quality gate: run checks, parse their output, auto-fix and re-run.

use crate::ports::check_runner::{CheckRunner, CommandError, CommandOutput};
use crate::ports::progress::EventBus;
use futures::future::join_all;
use squadforge_domain::quality::{classify, parse_issues};
use squadforge_domain::{
    Artifact, CheckResult, CheckStatus, DomainError, OrchestrationEvent, QualityCheck,
    QualityReport,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Placeholder replaced by the artifact paths under check.
pub const FILES_PLACEHOLDER: &str = "{files}";

pub struct QualityGateEngine {
    checks: BTreeMap<String, QualityCheck>,
    runner: Arc<dyn CheckRunner>,
    events: EventBus,
    max_fix_iterations: u32,
}

impl QualityGateEngine {
    /// Build the registry. Every check is validated; names must be unique.
    pub fn new(
        checks: Vec<QualityCheck>,
        runner: Arc<dyn CheckRunner>,
        events: EventBus,
        max_fix_iterations: u32,
    ) -> Result<Self, DomainError> {
        let mut registry = BTreeMap::new();
        for check in checks {
            check.validate()?;
            if registry.contains_key(&check.name) {
                return Err(DomainError::InvalidCheck {
                    check: check.name,
                    reason: "duplicate check name".to_string(),
                });
            }
            registry.insert(check.name.clone(), check);
        }
        Ok(Self {
            checks: registry,
            runner,
            events,
            max_fix_iterations,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run the selected checks (all when `subset` is `None`) over `outputs`.
    ///
    /// With `auto_fix`, failed checks that have a fix command go through at
    /// most `max_fix_iterations` rounds of fix-then-re-run.
    pub async fn run_checks(
        &self,
        outputs: &[Artifact],
        subset: Option<&[String]>,
        auto_fix: bool,
    ) -> QualityReport {
        let files = file_list(outputs);
        let mut results: BTreeMap<String, CheckResult> = BTreeMap::new();
        let mut selected: Vec<&QualityCheck> = Vec::new();

        match subset {
            Some(names) => {
                for name in names {
                    match self.checks.get(name) {
                        Some(check) => selected.push(check),
                        None => {
                            warn!("Quality check {} is not registered, skipping", name);
                            results.insert(
                                name.clone(),
                                CheckResult::skipped(name, "check is not registered"),
                            );
                        }
                    }
                }
            }
            None => selected.extend(self.checks.values()),
        }

        info!("Running {} quality check(s)", selected.len());
        for result in join_all(selected.iter().map(|c| self.run_one(c, &files))).await {
            results.insert(result.check_name.clone(), result);
        }

        let mut iterations = 0;
        while auto_fix && iterations < self.max_fix_iterations {
            let fixable: Vec<&QualityCheck> = results
                .values()
                .filter(|r| r.status == CheckStatus::Failed)
                .filter_map(|r| self.checks.get(&r.check_name))
                .filter(|c| c.is_fixable())
                .collect();
            if fixable.is_empty() {
                break;
            }
            iterations += 1;
            info!(
                "Auto-fix iteration {}/{} for {} check(s)",
                iterations,
                self.max_fix_iterations,
                fixable.len()
            );

            // Fixes write files, so they never run concurrently.
            let mut applied: BTreeMap<&str, String> = BTreeMap::new();
            for check in &fixable {
                if let Some(command) = self.apply_fix(check, &files, iterations).await {
                    applied.insert(check.name.as_str(), command);
                }
            }

            let reruns = join_all(fixable.iter().map(|c| self.run_one(c, &files))).await;
            for mut rerun in reruns {
                if let Some(previous) = results.remove(&rerun.check_name) {
                    rerun.attempts += previous.attempts;
                    rerun.fixes_applied = previous.fixes_applied;
                }
                if let Some(command) = applied.get(rerun.check_name.as_str()) {
                    rerun.fixes_applied.push(command.clone());
                }
                results.insert(rerun.check_name.clone(), rerun);
            }
        }

        let report = QualityReport::build(results.into_values().collect(), iterations);
        info!("Quality gate: {}", report.summary);
        self.events.emit(OrchestrationEvent::QualityGateCompleted {
            passed: report.passed,
            fix_iterations: report.fix_iterations,
        });
        report
    }

    async fn run_one(&self, check: &QualityCheck, files: &str) -> CheckResult {
        self.events.emit(OrchestrationEvent::CheckStarted {
            check: check.name.clone(),
        });
        let command = expand_command(&check.command, files);
        debug!("Check {}: {}", check.name, command);

        let start = Instant::now();
        let result = match self.run_bounded(&command, check.timeout).await {
            Ok(output) => evaluate(check, &output, start.elapsed()),
            Err(e) => {
                warn!("Check {} could not complete: {}", check.name, e);
                CheckResult::error(check, e.to_string(), start.elapsed())
            }
        };

        self.events.emit(OrchestrationEvent::CheckCompleted {
            check: check.name.clone(),
            status: result.status.as_str().to_string(),
            issues: result.issues.len(),
        });
        result
    }

    /// Runners are asked to honor `limit`; a runner that does not is cut
    /// off here.
    async fn run_bounded(
        &self,
        command: &str,
        limit: Duration,
    ) -> Result<CommandOutput, CommandError> {
        tokio::time::timeout(limit, self.runner.run(command, limit))
            .await
            .unwrap_or(Err(CommandError::Timeout(limit)))
    }

    /// Run a check's fix command. Returns the command when it ran to a
    /// zero exit.
    async fn apply_fix(
        &self,
        check: &QualityCheck,
        files: &str,
        iteration: u32,
    ) -> Option<String> {
        let command = expand_command(check.auto_fix_command.as_deref()?, files);
        debug!("Fix {} (iteration {}): {}", check.name, iteration, command);

        let success = match self.run_bounded(&command, check.timeout).await {
            Ok(output) if output.success() => true,
            Ok(output) => {
                warn!("Fix for {} exited with {:?}", check.name, output.exit_code);
                false
            }
            Err(e) => {
                warn!("Fix for {} could not run: {}", check.name, e);
                false
            }
        };

        self.events.emit(OrchestrationEvent::FixApplied {
            check: check.name.clone(),
            iteration,
            success,
        });
        success.then_some(command)
    }
}

fn evaluate(check: &QualityCheck, output: &CommandOutput, elapsed: Duration) -> CheckResult {
    let issues: Vec<_> = parse_issues(&output.combined())
        .into_iter()
        .map(|issue| issue.capped_at(check.severity))
        .collect();
    // Killed by a signal counts as a non-zero exit.
    let exit_code = output.exit_code.unwrap_or(-1);
    let status = classify(exit_code, &issues);
    CheckResult::new(check, status, issues, elapsed).with_exit_code(exit_code)
}

fn file_list(outputs: &[Artifact]) -> String {
    outputs
        .iter()
        .map(|a| shell_quote(&a.path))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expand `{files}` in a check or fix command.
pub fn expand_command(command: &str, files: &str) -> String {
    command.replace(FILES_PLACEHOLDER, files)
}

fn shell_quote(path: &str) -> String {
    let plain = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "/._-+".contains(c));
    if plain && !path.is_empty() {
        path.to_string()
    } else {
        format!("'{}'", path.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::testing::RecordingListener;
    use async_trait::async_trait;
    use squadforge_domain::{ReportStatus, Severity};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    type Script = Box<dyn Fn(&str) -> Result<CommandOutput, CommandError> + Send + Sync>;

    /// Runner answering from a closure and logging every command.
    struct ScriptedRunner {
        script: Script,
        log: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(
            script: impl Fn(&str) -> Result<CommandOutput, CommandError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Box::new(script),
                log: Mutex::new(Vec::new()),
            })
        }

        fn count(&self, command: &str) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == command)
                .count()
        }
    }

    #[async_trait]
    impl CheckRunner for ScriptedRunner {
        async fn run(
            &self,
            command: &str,
            _timeout: Duration,
        ) -> Result<CommandOutput, CommandError> {
            self.log.lock().unwrap().push(command.to_string());
            (self.script)(command)
        }
    }

    fn lint() -> QualityCheck {
        QualityCheck::new("lint", "lint").with_auto_fix("fix")
    }

    fn gate(
        checks: Vec<QualityCheck>,
        runner: Arc<ScriptedRunner>,
        max: u32,
    ) -> QualityGateEngine {
        QualityGateEngine::new(checks, runner, EventBus::new(), max).unwrap()
    }

    fn failing_output() -> CommandOutput {
        CommandOutput::new(1, "src/a.rs:3:1: error: unused import", "")
    }

    #[tokio::test]
    async fn test_statuses_from_exit_code_and_issues() {
        let runner = ScriptedRunner::new(|cmd| match cmd {
            "clean" => Ok(CommandOutput::new(0, "all good", "")),
            "warns" => Ok(CommandOutput::new(0, "src/a.rs:1:1: warning: unused", "")),
            "fails" => Ok(failing_output()),
            _ => Err(CommandError::Timeout(Duration::from_secs(1))),
        });
        let engine = gate(
            vec![
                QualityCheck::new("a-clean", "clean"),
                QualityCheck::new("b-warns", "warns"),
                QualityCheck::new("c-fails", "fails"),
                QualityCheck::new("d-slow", "slow"),
            ],
            runner,
            3,
        );

        let report = engine.run_checks(&[], None, false).await;

        let status = |n: &str| report.check(n).unwrap().status;
        assert_eq!(status("a-clean"), CheckStatus::Passed);
        assert_eq!(status("b-warns"), CheckStatus::Warning);
        assert_eq!(status("c-fails"), CheckStatus::Failed);
        assert_eq!(status("d-slow"), CheckStatus::Error);
        assert_eq!(report.check("c-fails").unwrap().issues.len(), 1);
        assert!(!report.passed);
        assert_eq!(report.recommendations.len(), 2);
    }

    #[tokio::test]
    async fn test_auto_fix_converges() {
        let fixed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fixed);
        let runner = ScriptedRunner::new(move |cmd| {
            if cmd == "fix" {
                flag.store(true, Ordering::SeqCst);
                return Ok(CommandOutput::new(0, "", ""));
            }
            if flag.load(Ordering::SeqCst) {
                Ok(CommandOutput::new(0, "", ""))
            } else {
                Ok(failing_output())
            }
        });
        let engine = gate(vec![lint()], runner.clone(), 3);

        let report = engine.run_checks(&[], None, true).await;

        assert!(report.passed);
        assert_eq!(report.status, ReportStatus::Passed);
        assert_eq!(report.fix_iterations, 1);
        let lint = report.check("lint").unwrap();
        assert_eq!(lint.attempts, 2);
        assert_eq!(lint.fixes_applied, ["fix"]);
        assert_eq!(runner.count("fix"), 1);
    }

    #[tokio::test]
    async fn test_auto_fix_bounded_when_never_resolved() {
        let runner = ScriptedRunner::new(|cmd| match cmd {
            "fix" => Ok(CommandOutput::new(0, "", "")),
            _ => Ok(failing_output()),
        });
        let engine = gate(vec![lint()], runner.clone(), 3);

        let report = engine.run_checks(&[], None, true).await;

        assert!(!report.passed);
        assert_eq!(report.fix_iterations, 3);
        assert_eq!(runner.count("fix"), 3);
        assert_eq!(runner.count("lint"), 4);
        let lint = report.check("lint").unwrap();
        assert_eq!(lint.status, CheckStatus::Failed);
        assert_eq!(lint.attempts, 4);
        assert_eq!(lint.fixes_applied.len(), 3);
    }

    #[tokio::test]
    async fn test_errors_and_unfixable_checks_are_not_fixed() {
        let runner = ScriptedRunner::new(|cmd| match cmd {
            "lint" => Err(CommandError::Spawn("no such file".to_string())),
            _ => Ok(failing_output()),
        });
        let engine = gate(
            vec![lint(), QualityCheck::new("test", "test")],
            runner.clone(),
            3,
        );

        let report = engine.run_checks(&[], None, true).await;

        assert_eq!(report.fix_iterations, 0);
        assert_eq!(runner.count("fix"), 0);
        assert_eq!(report.check("lint").unwrap().status, CheckStatus::Error);
        assert_eq!(report.check("test").unwrap().status, CheckStatus::Failed);
    }

    #[tokio::test]
    async fn test_subset_with_unknown_name_is_skipped() {
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::new(0, "", "")));
        let recorder = Arc::new(RecordingListener::default());
        let engine = QualityGateEngine::new(
            vec![lint(), QualityCheck::new("test", "test")],
            runner.clone(),
            EventBus::new().with_listener(recorder.clone()),
            3,
        )
        .unwrap();

        let subset = vec!["lint".to_string(), "typo".to_string()];
        let report = engine.run_checks(&[], Some(&subset), false).await;

        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.check("typo").unwrap().status, CheckStatus::Skipped);
        assert_eq!(runner.count("test"), 0);
        assert!(report.passed);
        assert_eq!(recorder.kinds().last(), Some(&"quality_gate_completed"));
    }

    #[tokio::test]
    async fn test_files_placeholder_expansion() {
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::new(0, "", "")));
        let engine = gate(
            vec![QualityCheck::new("fmt", "rustfmt --check {files}")],
            runner.clone(),
            3,
        );
        let outputs = vec![
            Artifact::new("src/main.rs", ""),
            Artifact::new("my file.rs", ""),
        ];

        engine.run_checks(&outputs, None, false).await;

        assert_eq!(runner.count("rustfmt --check src/main.rs 'my file.rs'"), 1);
    }

    #[test]
    fn test_registry_rejects_duplicates_and_invalid() {
        let runner = ScriptedRunner::new(|_| Ok(CommandOutput::default()));
        assert!(
            QualityGateEngine::new(vec![lint(), lint()], runner.clone(), EventBus::new(), 3)
                .is_err()
        );
        assert!(
            QualityGateEngine::new(
                vec![QualityCheck::new("x", "")],
                runner,
                EventBus::new(),
                3
            )
            .is_err()
        );
    }

    /// Runner that ignores its timeout and hangs on `hang`.
    struct HangingRunner;

    #[async_trait]
    impl CheckRunner for HangingRunner {
        async fn run(
            &self,
            command: &str,
            _timeout: Duration,
        ) -> Result<CommandOutput, CommandError> {
            if command == "hang" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(CommandOutput::new(0, "", ""))
        }
    }

    #[tokio::test]
    async fn test_runner_ignoring_timeout_is_cut_off() {
        let engine = QualityGateEngine::new(
            vec![
                QualityCheck::new("hang", "hang").with_timeout(Duration::from_millis(20)),
                QualityCheck::new("quick", "quick"),
            ],
            Arc::new(HangingRunner),
            EventBus::new(),
            3,
        )
        .unwrap();

        let start = Instant::now();
        let report = engine.run_checks(&[], None, false).await;

        assert!(start.elapsed() < Duration::from_secs(5));
        let hang = report.check("hang").unwrap();
        assert_eq!(hang.status, CheckStatus::Error);
        assert!(hang.message.as_deref().unwrap().contains("timed out after 20ms"));
        assert_eq!(report.check("quick").unwrap().status, CheckStatus::Passed);
    }

    #[tokio::test]
    async fn test_check_severity_caps_reported_issues() {
        let runner = ScriptedRunner::new(|_| {
            Ok(CommandOutput::new(0, "src/a.rs:3:1: error: line too long", ""))
        });
        let engine = gate(
            vec![QualityCheck::new("style", "style").with_severity(Severity::Warning)],
            runner,
            3,
        );

        let report = engine.run_checks(&[], None, false).await;

        let style = report.check("style").unwrap();
        assert_eq!(style.status, CheckStatus::Warning);
        assert_eq!(style.issues[0].severity, Severity::Warning);
        assert!(report.passed);
    }
}
