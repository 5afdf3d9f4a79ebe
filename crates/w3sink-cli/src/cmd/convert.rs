//! `w3sink convert`: replay any stream and write it back out as DGS.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tracing::info;
use w3sink_core::config::ProjectConfig;
use w3sink_core::dgs::DgsWriter;
use w3sink_core::error::ErrorCode;
use w3sink_core::file_source::SourceFormat;
use w3sink_core::graph::Graph;
use w3sink_core::source::shared;

use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `w3sink convert`.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Stream file (`.dgs` or `.json`).
    pub file: PathBuf,

    /// Destination DGS file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Stream name written in the DGS header.
    #[arg(long)]
    pub name: Option<String>,

    /// Force the input format instead of detecting it.
    #[arg(long, value_name = "dgs|json")]
    pub input_format: Option<SourceFormat>,

    /// Drop inconsistent events (duplicate nodes, dangling edges) by routing
    /// the stream through the in-memory graph first.
    #[arg(long)]
    pub normalize: bool,
}

/// Report payload for `w3sink convert`.
#[derive(Debug, Serialize)]
pub struct ConvertReport {
    pub input: String,
    pub format: SourceFormat,
    pub output: String,
    pub lines_written: usize,
}

fn write_failed(output: OutputMode, path: &str, err: &dyn std::fmt::Display) -> anyhow::Result<()> {
    render_error(
        output,
        &CliError::from_code(ErrorCode::OutputWriteFailed, format!("failed to write {path}: {err}")),
    )
}

/// Execute `w3sink convert`.
pub fn run_convert(
    args: &ConvertArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let source_id = config.replay.source_id.as_str();
    let forced = args.input_format.or(config.replay.input_format);
    let name = args.name.as_deref().unwrap_or(&config.convert.stream_name);
    let out_path = args.output.display().to_string();

    let mut source = super::open(&args.file, source_id, forced, output)?;
    let format = source.format();

    let file = match File::create(&args.output) {
        Ok(file) => file,
        Err(err) => {
            write_failed(output, &out_path, &err)?;
            return Err(err).with_context(|| format!("failed to create {out_path}"));
        }
    };
    let writer = shared(DgsWriter::new(BufWriter::new(file), name));

    {
        let _graph = if args.normalize || config.replay.normalize {
            let graph = shared(Graph::new(source_id));
            graph.borrow_mut().add_sink(writer.clone());
            source.source_mut().add_sink(graph.clone());
            Some(graph)
        } else {
            source.source_mut().add_sink(writer.clone());
            None
        };
        source.parse_all().map_err(|err| super::report(output, err))?;
    }
    drop(source);

    let Ok(writer) = Rc::try_unwrap(writer) else {
        let message = "dgs writer is still attached to a source";
        render_error(output, &CliError::from_code(ErrorCode::InternalUnexpected, message))?;
        anyhow::bail!(message);
    };
    let writer = writer.into_inner();
    let lines_written = writer.lines_written();
    if let Err(err) = writer.finish() {
        write_failed(output, &out_path, &err)?;
        return Err(err).with_context(|| format!("failed to write {out_path}"));
    }
    info!(input = %args.file.display(), output = %out_path, lines_written, "converted");

    let report = ConvertReport {
        input: args.file.display().to_string(),
        format,
        output: out_path,
        lines_written,
    };
    render(output, &report, |r, w| {
        writeln!(
            w,
            "wrote {} lines to {} ({} input)",
            r.lines_written, r.output, r.format
        )
    })
}
