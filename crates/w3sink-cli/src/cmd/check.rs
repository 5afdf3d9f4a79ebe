//! `w3sink check`: parse a stream without any sink and report every bad unit.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::debug;
use w3sink_core::config::ProjectConfig;
use w3sink_core::file_source::{FileSource, SourceError, SourceFormat};

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `w3sink check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Stream file (`.dgs` or `.json`).
    pub file: PathBuf,

    /// Force the input format instead of detecting it.
    #[arg(long, value_name = "dgs|json")]
    pub input_format: Option<SourceFormat>,

    /// Stop at the first error.
    #[arg(long)]
    pub fail_fast: bool,
}

/// Report payload for a clean `w3sink check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub file: String,
    pub format: SourceFormat,
    pub units: usize,
    pub events: u64,
}

/// Consume every queued unit, collecting failures. A failing unit is
/// consumed like any other, so checking resumes on the next one.
pub fn collect_errors(source: &mut dyn FileSource, fail_fast: bool) -> (usize, Vec<SourceError>) {
    let mut units = 0;
    let mut errors = Vec::new();
    while source.ready() {
        units += 1;
        if let Err(err) = source.next_events() {
            errors.push(err);
            if fail_fast {
                break;
            }
        }
    }
    (units, errors)
}

/// Execute `w3sink check`.
pub fn run_check(args: &CheckArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let forced = args.input_format.or(config.replay.input_format);
    let mut source = super::open(&args.file, &config.replay.source_id, forced, output)?;

    let (units, errors) = collect_errors(source.as_mut(), args.fail_fast);
    debug!(file = %args.file.display(), units, errors = errors.len(), "checked");

    if !errors.is_empty() {
        for err in &errors {
            render_error(output, &CliError::from(err))?;
        }
        anyhow::bail!("{} error(s) in {}", errors.len(), args.file.display());
    }

    let report = CheckReport {
        file: args.file.display().to_string(),
        format: source.format(),
        units,
        events: source.source().next_time_id(),
    };
    render(output, &report, |r, w| {
        writeln!(w, "ok: {} ({}, {} units, {} events)", r.file, r.format, r.units, r.events)
    })
}
