//! Console output formatter for orchestration results

use colored::{ColoredString, Colorize};
use squadforge_domain::{
    CheckStatus, OrchestrationStatus, OrchestratorResult, QualityReport, SquadStatus, StepStatus,
};

/// Formats orchestration results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete result as a readable report
    pub fn format_summary(result: &OrchestratorResult) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Squadforge Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n{} {}\n",
            "Mode:".cyan().bold(),
            result.mode,
            "Status:".cyan().bold(),
            Self::run_status(result.status)
        ));

        if !result.steps.is_empty() {
            output.push_str(&Self::section_header("Steps"));
            for step in &result.steps {
                output.push_str(&format!(
                    "  {:<12} {}",
                    Self::step_status(step.status),
                    step.step
                ));
                if let Some(reason) = &step.reason {
                    output.push_str(&format!(" ({})", reason));
                }
                output.push('\n');
            }
        }

        if !result.squad_results.is_empty() {
            output.push_str(&Self::section_header("Squads"));
            for squad in &result.squad_results {
                let agents: Vec<&str> = squad.outputs.keys().map(String::as_str).collect();
                output.push_str(&format!(
                    "  {:<12} {} [{}]\n",
                    Self::squad_status(squad.status),
                    squad.squad.bold(),
                    agents.join(", ")
                ));
                for failure in &squad.errors {
                    output.push_str(&format!(
                        "      {} {}: {}\n",
                        "x".red(),
                        failure.agent,
                        failure.message
                    ));
                }
            }
        }

        let artifacts = result.outputs.artifacts();
        if !artifacts.is_empty() {
            output.push_str(&Self::section_header("Artifacts"));
            for artifact in artifacts {
                output.push_str(&format!(
                    "  {} ({}, {} lines)\n",
                    artifact.path.yellow(),
                    artifact.language.as_deref().unwrap_or("text"),
                    artifact.line_count()
                ));
            }
        }

        if let Some(report) = &result.quality_report {
            output.push_str(&Self::quality_section(report));
        }

        let metrics = &result.metrics;
        output.push_str(&Self::section_header("Metrics"));
        output.push_str(&format!(
            "  agents: {} ok / {} failed / {} total\n  llm calls: {} (retries: {})\n  tokens: {} prompt + {} completion = {}\n  compressions: {}\n  elapsed: {:.1}s\n",
            metrics.agents_executed,
            metrics.agents_failed,
            metrics.agents_total,
            metrics.llm_calls,
            metrics.retry_count,
            metrics.usage.prompt_tokens,
            metrics.usage.completion_tokens,
            metrics.total_tokens(),
            metrics.compressions,
            metrics.elapsed.as_secs_f64()
        ));

        if !result.errors.is_empty() {
            output.push_str(&format!("\n{}\n", "Errors:".red().bold()));
            for error in &result.errors {
                output.push_str(&format!("  * {}\n", error));
            }
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(result: &OrchestratorResult) -> String {
        serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
    }

    fn quality_section(report: &QualityReport) -> String {
        let mut output = Self::section_header("Quality Gate");
        output.push_str(&format!("  {}\n", report.summary));
        for check in &report.checks {
            output.push_str(&format!(
                "  {:<10} {}",
                Self::check_status(check.status),
                check.check_name.bold()
            ));
            if !check.issues.is_empty() {
                output.push_str(&format!(" ({} issues)", check.issues.len()));
            }
            if !check.fixes_applied.is_empty() {
                output.push_str(&format!(" fixed: {}", check.fixes_applied.join(", ")));
            }
            output.push('\n');
            for issue in check.issues.iter().take(5) {
                let location = issue.location().unwrap_or_default();
                output.push_str(&format!(
                    "      {} {} {}\n",
                    issue.severity.as_str(),
                    location.dimmed(),
                    issue.message
                ));
            }
            if check.issues.len() > 5 {
                output.push_str(&format!("      ... {} more\n", check.issues.len() - 5));
            }
        }
        for recommendation in &report.recommendations {
            output.push_str(&format!("  {} {}\n", "*".cyan(), recommendation));
        }
        output
    }

    fn run_status(status: OrchestrationStatus) -> ColoredString {
        match status {
            OrchestrationStatus::Success => status.as_str().green().bold(),
            OrchestrationStatus::Partial => status.as_str().yellow().bold(),
            OrchestrationStatus::Failed => status.as_str().red().bold(),
        }
    }

    fn squad_status(status: SquadStatus) -> ColoredString {
        match status {
            SquadStatus::Completed => status.as_str().green(),
            SquadStatus::Partial => status.as_str().yellow(),
            SquadStatus::Failed => status.as_str().red(),
        }
    }

    fn step_status(status: StepStatus) -> ColoredString {
        match status {
            StepStatus::Completed => status.as_str().green(),
            StepStatus::Partial | StepStatus::Checkpoint => status.as_str().yellow(),
            StepStatus::Failed => status.as_str().red(),
            StepStatus::Skipped => status.as_str().dimmed(),
        }
    }

    fn check_status(status: CheckStatus) -> ColoredString {
        match status {
            CheckStatus::Passed => status.as_str().green(),
            CheckStatus::Warning => status.as_str().yellow(),
            CheckStatus::Failed | CheckStatus::Error => status.as_str().red(),
            CheckStatus::Skipped => status.as_str().dimmed(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}\n", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n", format!("── {} ──", title).cyan().bold())
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadforge_domain::{
        AgentOutput, AgentResult, Artifact, CheckResult, ExecutionMetrics, ExecutionMode, Issue,
        OrchestrationError, QualityCheck, Severity, SharedContext, SquadResult,
    };
    use std::time::Duration;

    fn sample_result() -> OrchestratorResult {
        let squad = SquadResult::from_agent_results(
            "build",
            vec![
                AgentResult::success(
                    "coder",
                    AgentOutput::text("done")
                        .with_artifact(Artifact::new("src/lib.rs", "fn a() {}\nfn b() {}").with_language("rust")),
                    ExecutionMetrics::new(),
                ),
                AgentResult::failure("reviewer", "rate limited", ExecutionMetrics::new()),
            ],
            Duration::from_millis(20),
        );
        let mut outputs = SharedContext::new();
        outputs.merge_squad(&squad);

        let check = QualityCheck::new("clippy", "cargo clippy");
        let report = QualityReport::build(
            vec![CheckResult::new(
                &check,
                CheckStatus::Failed,
                vec![Issue::new(Severity::Error, "unused variable").at("src/lib.rs", Some(1), None)],
                Duration::from_millis(5),
            )],
            1,
        );

        OrchestratorResult {
            status: OrchestrationStatus::Partial,
            mode: ExecutionMode::Hybrid,
            outputs,
            steps: Vec::new(),
            squad_results: vec![squad],
            metrics: ExecutionMetrics::new(),
            quality_report: Some(report),
            errors: vec![OrchestrationError::check("clippy", "1 error")],
        }
    }

    #[test]
    fn test_summary_lists_every_section() {
        colored::control::set_override(false);
        let summary = ConsoleFormatter::format_summary(&sample_result());

        assert!(summary.contains("Mode: hybrid"));
        assert!(summary.contains("Status: partial"));
        assert!(summary.contains("build [coder]"));
        assert!(summary.contains("reviewer: rate limited"));
        assert!(summary.contains("src/lib.rs (rust, 2 lines)"));
        assert!(summary.contains("clippy (1 issues)"));
        assert!(summary.contains("unused variable"));
        assert!(summary.contains("check 'clippy': 1 error"));
    }

    #[test]
    fn test_rejected_result_has_no_squad_section() {
        colored::control::set_override(false);
        let result = OrchestratorResult::rejected(
            ExecutionMode::Workflow("missing".to_string()),
            OrchestrationError::step("missing", "unknown workflow"),
        );
        let summary = ConsoleFormatter::format_summary(&result);

        assert!(summary.contains("Status: failed"));
        assert!(!summary.contains("Squads"));
        assert!(summary.contains("unknown workflow"));
    }

    #[test]
    fn test_json_round_trips_status() {
        let json = ConsoleFormatter::format_json(&sample_result());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "partial");
        assert_eq!(value["errors"][0]["source"], "check");
    }
}
