pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::commands::evaluate::EvaluateArgs;

#[derive(Debug, Parser)]
#[command(
    name = "readygate",
    about = "Deployment readiness operator CLI",
    long_about = "Evaluate deployment readiness for a region or subnet, inspect configuration, and run preflight checks.",
    after_help = "Examples:\n  readygate evaluate --target us-west-2 --location Portland\n  readygate evaluate --target us-east-1 --min-required 50 --json\n  readygate doctor --json\n  readygate config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Collect readiness signals and print a GO / CAUTION / NO_GO recommendation",
        after_help = "Exit codes: 0 GO, 3 CAUTION, 4 NO_GO, 2 invalid input or config, 1 runtime failure"
    )]
    Evaluate {
        #[arg(long, help = "Region or environment identifier to evaluate")]
        target: String,
        #[arg(long, help = "City used for the environmental check (skipped when absent)")]
        location: Option<String>,
        #[arg(long, help = "Subnet tag for the capacity check (defaults to the target)")]
        subnet: Option<String>,
        #[arg(
            long = "min-required",
            allow_negative_numbers = true,
            help = "Minimum free addresses required"
        )]
        min_required: Option<i64>,
        #[arg(
            long = "warning-utilization",
            allow_negative_numbers = true,
            help = "Utilization percent at which capacity becomes a concern"
        )]
        warning_utilization: Option<f64>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, provider wiring, and capacity source")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Evaluate { target, location, subnet, min_required, warning_utilization, json } => {
            commands::evaluate::run(EvaluateArgs {
                target,
                location,
                subnet,
                min_required,
                warning_utilization,
                json,
            })
        }
        Command::Config => commands::CommandResult::report(0, commands::config::run()),
        Command::Doctor { json } => {
            commands::CommandResult::report(0, commands::doctor::run(json))
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Diagnostics go to stderr so command output stays parseable.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("READYGATE_CLI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
