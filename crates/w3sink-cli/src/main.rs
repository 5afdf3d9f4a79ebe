#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use w3sink_core::config;
use w3sink_core::error::ErrorCode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "w3sink: replay DGS and JSON graph streams",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Replay",
        about = "Print the events of a stream",
        long_about = "Replay a DGS or JSON stream and print every event with its time id.",
        after_help = "EXAMPLES:\n    # Print every event\n    w3sink replay graph.dgs\n\n    # Only the first two steps, normalized through the graph\n    w3sink replay graph.dgs --steps 2 --normalize\n\n    # Emit machine-readable output\n    w3sink replay graph.json --format json"
    )]
    Replay(cmd::replay::ReplayArgs),

    #[command(
        next_help_heading = "Replay",
        about = "Summarize the graph a stream builds",
        long_about = "Replay a stream into the in-memory graph and print node, edge, step and event counts.",
        after_help = "EXAMPLES:\n    # Summarize a stream\n    w3sink stats graph.dgs\n\n    # Emit machine-readable output\n    w3sink stats graph.dgs --format json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Validate",
        about = "Check a stream for errors",
        long_about = "Parse a stream without replaying it anywhere and report every malformed line or entry.",
        after_help = "EXAMPLES:\n    # Check a file\n    w3sink check graph.dgs\n\n    # Stop at the first error\n    w3sink check graph.dgs --fail-fast"
    )]
    Check(cmd::check::CheckArgs),

    #[command(
        next_help_heading = "Write",
        about = "Convert a stream to DGS",
        long_about = "Replay a DGS or JSON stream into a DGS writer.",
        after_help = "EXAMPLES:\n    # Convert a JSON log\n    w3sink convert graph.json -o graph.dgs\n\n    # Drop inconsistent events on the way\n    w3sink convert graph.dgs -o clean.dgs --normalize"
    )]
    Convert(cmd::convert::ConvertArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("W3SINK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "w3sink=debug,info"
        } else {
            "w3sink=info,warn"
        })
    });

    let format = env::var("W3SINK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = std::env::current_dir()?;
    let effective = match config::resolve_config(&project_root, cli.json) {
        Ok(effective) => effective,
        Err(err) => {
            let output = resolve_output_mode(cli.format, if cli.json { "json" } else { "text" });
            render_error(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            return Err(err);
        }
    };
    let output = resolve_output_mode(cli.format, &effective.resolved_output);
    debug!(?output, json = output.is_json(), "resolved output mode");

    let project = &effective.project;
    match cli.command {
        Commands::Replay(ref args) => cmd::replay::run_replay(args, project, output),
        Commands::Stats(ref args) => cmd::stats::run_stats(args, project, output),
        Commands::Check(ref args) => cmd::check::run_check(args, project, output),
        Commands::Convert(ref args) => cmd::convert::run_convert(args, project, output),
    }
}
