//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for orchestration results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored report: squads, artifacts, quality gate and metrics
    Summary,
    /// The full result as pretty-printed JSON
    Json,
}

/// CLI arguments for squadforge
#[derive(Parser, Debug)]
#[command(name = "squadforge")]
#[command(author, version, about = "Run squads of LLM agents over a task, then gate the result")]
#[command(long_about = r#"
Squadforge runs squads of LLM agents over an instruction and checks what they
produce with external quality commands.

Without --workflow, every configured squad runs in dependency order (hybrid
mode). With --workflow, the named workflow's steps run in order.

Configuration files are loaded from (in priority order):
1. SQUADFORGE_* environment variables (`__` separates sections)
2. --config <path>      Explicit config file
3. ./squadforge.toml    Project-level config
4. ~/.config/squadforge/config.toml   Global config

Example:
  squadforge "Add a /health endpoint"
  squadforge -w standard --file src/main.rs "Refactor the request handler"
  squadforge --var lang=rust --checks fmt,clippy "Write a CSV parser"
"#)]
pub struct Cli {
    /// The instruction given to the squads
    #[arg(required_unless_present = "show_config")]
    pub instruction: Option<String>,

    /// Run the named workflow instead of hybrid scheduling
    #[arg(short, long, value_name = "NAME")]
    pub workflow: Option<String>,

    /// Request variable shared with every agent (can be specified multiple times)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub vars: Vec<(String, String)>,

    /// Input file handed to the agents (can be specified multiple times)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Only run these quality checks (comma separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    pub checks: Option<Vec<String>>,

    /// Skip the quality gate
    #[arg(long)]
    pub no_quality_gate: bool,

    /// Do not run auto-fix commands for failing checks
    #[arg(long)]
    pub no_auto_fix: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    pub output: OutputFormat,

    /// Append every orchestration event to this JSONL file
    #[arg(long, value_name = "PATH")]
    pub event_log: Option<PathBuf>,

    /// Directory quality checks run in (overrides `execution.working_dir`)
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_request_flags() {
        let cli = Cli::try_parse_from([
            "squadforge",
            "-w",
            "standard",
            "--var",
            "lang=rust",
            "--var",
            "style=a=b",
            "--file",
            "src/main.rs",
            "--checks",
            "fmt,clippy",
            "--no-auto-fix",
            "-vv",
            "build it",
        ])
        .unwrap();

        assert_eq!(cli.instruction.as_deref(), Some("build it"));
        assert_eq!(cli.workflow.as_deref(), Some("standard"));
        assert_eq!(
            cli.vars,
            vec![
                ("lang".to_string(), "rust".to_string()),
                ("style".to_string(), "a=b".to_string())
            ]
        );
        assert_eq!(cli.files, vec![PathBuf::from("src/main.rs")]);
        assert_eq!(
            cli.checks,
            Some(vec!["fmt".to_string(), "clippy".to_string()])
        );
        assert!(cli.no_auto_fix);
        assert!(!cli.no_quality_gate);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, OutputFormat::Summary);
    }

    #[test]
    fn test_instruction_required_unless_showing_config() {
        assert!(Cli::try_parse_from(["squadforge"]).is_err());
        let cli = Cli::try_parse_from(["squadforge", "--show-config"]).unwrap();
        assert!(cli.show_config);
        assert!(cli.instruction.is_none());
    }

    #[test]
    fn test_rejects_malformed_variable() {
        assert!(Cli::try_parse_from(["squadforge", "--var", "novalue", "x"]).is_err());
        assert!(Cli::try_parse_from(["squadforge", "--var", "=v", "x"]).is_err());
    }
}
