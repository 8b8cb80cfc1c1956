//! CLI entrypoint for squadforge
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use squadforge_application::{CompletionGateway, EventBus};
use squadforge_domain::{Artifact, OrchestrationRequest, OrchestrationStatus};
use squadforge_infrastructure::config::ENV_PREFIX;
use squadforge_infrastructure::{
    CompletionClient, ConfigLoader, HttpTransport, JsonlEventLogger, build_orchestrator,
    language_for,
};
use squadforge_presentation::{
    Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    info!("Starting squadforge");

    if cli.show_config {
        show_config(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    if let Some(dir) = &cli.working_dir {
        config.execution.working_dir = Some(dir.display().to_string());
    }

    let instruction = match cli.instruction.clone() {
        Some(i) => i,
        None => bail!("An instruction is required."),
    };
    if config.squads.is_empty() {
        bail!("No squads configured. Define [[agents]] and [[squads]] in squadforge.toml.");
    }

    // === Dependency Injection ===
    let completion = &config.completion;
    let api_key = completion.api_key();
    if api_key.is_none() {
        warn!(
            "{} is not set; sending requests without credentials",
            completion.api_key_env
        );
    }
    let (policy, _) = completion.retry.to_policy();
    let transport = HttpTransport::new(&completion.endpoint, api_key, completion.timeout())?;
    let client = Arc::new(CompletionClient::with_policy(transport, policy));
    let gateway: Arc<dyn CompletionGateway> = client.clone();

    let mut events = EventBus::new();
    if !cli.quiet {
        if std::io::stderr().is_terminal() {
            events.subscribe(Arc::new(ProgressReporter::new()));
        } else {
            events.subscribe(Arc::new(SimpleProgress));
        }
    }
    if let Some(path) = &cli.event_log {
        let logger = JsonlEventLogger::new(path)
            .with_context(|| format!("Cannot open event log {}", path.display()))?;
        events.subscribe(Arc::new(logger));
    }

    let orchestrator = build_orchestrator(&config, gateway, events)?;

    let mut request = OrchestrationRequest::new(instruction)
        .with_files(read_files(&cli.files)?)
        .with_quality_gate(!cli.no_quality_gate)
        .with_auto_fix(config.execution.auto_fix && !cli.no_auto_fix);
    if let Some(workflow) = &cli.workflow {
        request = request.with_workflow(workflow.clone());
    }
    for (key, value) in &cli.vars {
        request = request.with_variable(key.clone(), value.clone());
    }
    if let Some(checks) = &cli.checks {
        request = request.with_checks(checks.clone());
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let result = orchestrator.execute_with_cancel(request, cancel).await;

    let usage = client.usage();
    info!(
        "Completion usage: {} requests, {} retries, {} tokens",
        usage.requests, usage.retries, usage.total_tokens
    );

    let output = match cli.output {
        OutputFormat::Summary => ConsoleFormatter::format_summary(&result),
        OutputFormat::Json => ConsoleFormatter::format_json(&result),
    };
    println!("{}", output);

    Ok(match result.status {
        OrchestrationStatus::Success => ExitCode::SUCCESS,
        OrchestrationStatus::Partial => ExitCode::from(2),
        OrchestrationStatus::Failed => ExitCode::FAILURE,
    })
}

/// Console logging at the `-v` level, plus a daily-rolling file when
/// `log_dir` is set. The returned guard flushes the file on drop.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let (file, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "squadforge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .init();

    Ok(guard)
}

fn show_config(explicit: Option<&Path>) {
    println!("Configuration sources (lowest priority first):");
    for source in ConfigLoader::sources(explicit) {
        let state = if source.found { "found" } else { "not found" };
        println!(
            "  {:<9} {} ({})",
            source.label,
            source.path.display(),
            state
        );
    }
    println!("  {:<9} {}* variables", "Env", ENV_PREFIX);
}

fn read_files(paths: &[PathBuf]) -> Result<Vec<Artifact>> {
    paths
        .iter()
        .map(|path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let name = path.display().to_string();
            let artifact = Artifact::new(name.clone(), content);
            Ok(match language_for(&name) {
                Some(language) => artifact.with_language(language),
                None => artifact,
            })
        })
        .collect()
}
