//! Progress reporting for orchestration runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use squadforge_application::{ListenerError, ProgressListener};
use squadforge_domain::OrchestrationEvent;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Reports progress with one bar per running squad and a spinner per
/// running quality check.
pub struct ProgressReporter {
    multi: MultiProgress,
    squad_bars: Mutex<HashMap<String, ProgressBar>>,
    check_bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    pub fn with_draw_target(target: ProgressDrawTarget) -> Self {
        Self {
            multi: MultiProgress::with_draw_target(target),
            squad_bars: Mutex::new(HashMap::new()),
            check_bars: Mutex::new(HashMap::new()),
        }
    }

    fn squad_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn lock(
        bars: &Mutex<HashMap<String, ProgressBar>>,
    ) -> Result<MutexGuard<'_, HashMap<String, ProgressBar>>, ListenerError> {
        bars.lock()
            .map_err(|_| ListenerError("progress state poisoned".to_string()))
    }

    fn println(&self, line: String) -> Result<(), ListenerError> {
        self.multi
            .println(line)
            .map_err(|e| ListenerError(e.to_string()))
    }

    /// Bars still on screen, squads and checks together.
    pub fn active_bars(&self) -> usize {
        let squads = self.squad_bars.lock().map(|b| b.len()).unwrap_or(0);
        let checks = self.check_bars.lock().map(|b| b.len()).unwrap_or(0);
        squads + checks
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressListener for ProgressReporter {
    fn name(&self) -> &str {
        "console-progress"
    }

    fn on_event(&self, event: &OrchestrationEvent) -> Result<(), ListenerError> {
        match event {
            OrchestrationEvent::SquadStarted { squad, agents } => {
                let pb = self.multi.add(ProgressBar::new(*agents as u64));
                pb.set_style(Self::squad_style());
                pb.set_prefix(squad.clone());
                Self::lock(&self.squad_bars)?.insert(squad.clone(), pb);
            }
            OrchestrationEvent::AgentCompleted {
                squad,
                agent,
                success,
                ..
            } => {
                if let Some(pb) = Self::lock(&self.squad_bars)?.get(squad) {
                    let status = if *success {
                        format!("{} {}", "v".green(), agent)
                    } else {
                        format!("{} {}", "x".red(), agent)
                    };
                    pb.set_message(status);
                    pb.inc(1);
                }
            }
            OrchestrationEvent::SquadCompleted { squad, status } => {
                if let Some(pb) = Self::lock(&self.squad_bars)?.remove(squad) {
                    pb.finish_with_message(colored_status(status));
                }
            }
            OrchestrationEvent::CheckStarted { check } => {
                let pb = self.multi.add(ProgressBar::new_spinner());
                pb.set_style(Self::spinner_style());
                pb.set_prefix(check.clone());
                pb.set_message("running");
                Self::lock(&self.check_bars)?.insert(check.clone(), pb);
            }
            OrchestrationEvent::CheckCompleted {
                check,
                status,
                issues,
            } => {
                let message = format!("{} ({} issues)", colored_status(status), issues);
                match Self::lock(&self.check_bars)?.remove(check) {
                    Some(pb) => pb.finish_with_message(message),
                    None => self.println(format!("  {} {}", check.bold(), message))?,
                }
            }
            other => {
                if let Some(line) = SimpleProgress::line(other) {
                    self.println(line)?;
                }
            }
        }
        Ok(())
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl SimpleProgress {
    /// One line per event, or `None` for events not worth printing.
    pub fn line(event: &OrchestrationEvent) -> Option<String> {
        let line = match event {
            OrchestrationEvent::OrchestrationStarted { mode } => {
                format!("{} {} {}", "->".cyan(), "Starting".bold(), mode)
            }
            OrchestrationEvent::ContextCompressed {
                before_tokens,
                after_tokens,
            } => format!(
                "{} context compressed: {} -> {} tokens",
                "~".yellow(),
                before_tokens,
                after_tokens
            ),
            OrchestrationEvent::WorkflowStarted { workflow, steps } => format!(
                "{} {} ({} steps)",
                "->".cyan(),
                workflow.bold(),
                steps
            ),
            OrchestrationEvent::StepStarted { step, step_type } => {
                format!("{} {} [{}]", "->".cyan(), step.bold(), step_type)
            }
            OrchestrationEvent::StepCompleted { step, status } => {
                format!("  {} {}", colored_status(status), step)
            }
            OrchestrationEvent::CheckpointReached { step } => {
                format!("  {} checkpoint {}", "*".yellow(), step)
            }
            OrchestrationEvent::SquadStarted { squad, agents } => {
                format!("{} {} ({} agents)", "->".cyan(), squad.bold(), agents)
            }
            OrchestrationEvent::AgentCompleted {
                agent,
                success,
                error,
                ..
            } => match (success, error) {
                (true, _) => format!("  {} {}", "v".green(), agent),
                (false, Some(error)) => format!("  {} {} ({})", "x".red(), agent, error),
                (false, None) => format!("  {} {} (failed)", "x".red(), agent),
            },
            OrchestrationEvent::SquadCompleted { squad, status } => {
                format!("  {} {}", colored_status(status), squad)
            }
            OrchestrationEvent::SquadSkipped { squad, reason } => {
                format!("  {} {} ({})", "-".dimmed(), squad, reason)
            }
            OrchestrationEvent::CheckStarted { check } => {
                format!("{} check {}", "->".cyan(), check.bold())
            }
            OrchestrationEvent::CheckCompleted {
                check,
                status,
                issues,
            } => format!("  {} {} ({} issues)", colored_status(status), check, issues),
            OrchestrationEvent::FixApplied {
                check,
                iteration,
                success,
            } => {
                let mark = if *success { "v".green() } else { "x".red() };
                format!("  {} fix #{} for {}", mark, iteration, check)
            }
            OrchestrationEvent::QualityGateCompleted {
                passed,
                fix_iterations,
            } => {
                let verdict = if *passed {
                    "passed".green()
                } else {
                    "failed".red()
                };
                format!(
                    "{} quality gate {} after {} fix iterations",
                    "=>".cyan(),
                    verdict,
                    fix_iterations
                )
            }
            OrchestrationEvent::OrchestrationCompleted { .. } => return None,
        };
        Some(line)
    }
}

impl ProgressListener for SimpleProgress {
    fn name(&self) -> &str {
        "simple-progress"
    }

    fn on_event(&self, event: &OrchestrationEvent) -> Result<(), ListenerError> {
        if let Some(line) = Self::line(event) {
            eprintln!("{line}");
        }
        Ok(())
    }
}

fn colored_status(status: &str) -> String {
    match status {
        "completed" | "passed" | "success" => status.green().to_string(),
        "partial" | "warning" | "checkpoint" => status.yellow().to_string(),
        "failed" | "error" => status.red().to_string(),
        _ => status.dimmed().to_string(),
    }
}
