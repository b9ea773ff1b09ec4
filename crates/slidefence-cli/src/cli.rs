use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands::{run_check_config, run_suggest, run_summary};
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "slidefence",
    about = "Inspect slide overflow reports and validate engine configuration",
    version
)]
pub struct Cli {
    /// Emit machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Summarize an overflow report.
    Summary(SummaryArgs),

    /// Grade overflowing slides and propose fixes.
    Suggest(SuggestArgs),

    /// Load and validate an engine options file (TOML or JSON).
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    /// Path to `overflow-report.json`.
    #[arg(long)]
    pub report: PathBuf,

    /// Exit with status 2 when any slide overflows.
    #[arg(long = "fail-on-overflow")]
    pub fail_on_overflow: bool,
}

#[derive(Debug, Clone, Args)]
pub struct SuggestArgs {
    #[arg(long)]
    pub report: PathBuf,

    /// Also write the suggestions as JSON to this path.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckConfigArgs {
    pub path: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(cli, &mut out)
}

/// Dispatch `cli`, writing command output to `out`.
pub fn execute(cli: Cli, out: &mut dyn Write) -> Result<()> {
    tracing::debug!(target: "slidefence.cli", command = ?cli.command, json = cli.json, "dispatch");
    match cli.command {
        Commands::Summary(args) => run_summary(&args, cli.json, out),
        Commands::Suggest(args) => run_suggest(&args, cli.json, out),
        Commands::CheckConfig(args) => run_check_config(&args, cli.json, out),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{CheckConfigArgs, Cli, Commands, SummaryArgs, execute};
    use crate::error::CliError;
    use slidefence_report::ReportError;

    #[test]
    fn parses_subcommands_and_global_json() {
        let cli = Cli::try_parse_from([
            "slidefence",
            "suggest",
            "--report",
            "r.json",
            "--output",
            "fix.json",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Suggest(args) => {
                assert_eq!(args.report, PathBuf::from("r.json"));
                assert_eq!(args.output, Some(PathBuf::from("fix.json")));
            }
            other => panic!("expected suggest, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["slidefence", "check-config", "deck.toml"]).unwrap();
        assert!(!cli.json);
        assert!(matches!(cli.command, Commands::CheckConfig(_)));
    }

    #[test]
    fn summary_requires_report() {
        assert!(Cli::try_parse_from(["slidefence", "summary"]).is_err());
    }

    #[test]
    fn summary_dispatches_missing_report_error() {
        let mut out = Vec::new();
        let result = execute(
            Cli {
                json: false,
                command: Commands::Summary(SummaryArgs {
                    report: PathBuf::from("/tmp/slidefence/does-not-exist.json"),
                    fail_on_overflow: false,
                }),
            },
            &mut out,
        );
        match result.expect_err("missing report should fail") {
            CliError::Report(ReportError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/tmp/slidefence/does-not-exist.json"));
            }
            other => panic!("expected Report(Io), got {other}"),
        }
        assert!(out.is_empty());
    }

    #[test]
    fn check_config_dispatches_missing_file_error() {
        let mut out = Vec::new();
        let result = execute(
            Cli {
                json: true,
                command: Commands::CheckConfig(CheckConfigArgs {
                    path: PathBuf::from("/tmp/slidefence/missing.toml"),
                }),
            },
            &mut out,
        );
        assert!(matches!(result, Err(CliError::Config { .. })));
    }
}
