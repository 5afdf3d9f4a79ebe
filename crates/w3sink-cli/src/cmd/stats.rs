//! `w3sink stats`: replay a stream into the in-memory graph and summarize it.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use w3sink_core::config::ProjectConfig;
use w3sink_core::file_source::SourceFormat;
use w3sink_core::graph::{Graph, GraphStats};
use w3sink_core::source::shared;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `w3sink stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Stream file (`.dgs` or `.json`).
    pub file: PathBuf,

    /// Force the input format instead of detecting it.
    #[arg(long, value_name = "dgs|json")]
    pub input_format: Option<SourceFormat>,
}

/// Report payload for `w3sink stats`.
#[derive(Debug, Serialize)]
pub struct StreamStats {
    pub file: String,
    pub format: SourceFormat,
    /// Events emitted by the file source itself.
    pub events_emitted: u64,
    #[serde(flatten)]
    pub graph: GraphStats,
}

/// Execute `w3sink stats`.
pub fn run_stats(args: &StatsArgs, config: &ProjectConfig, output: OutputMode) -> anyhow::Result<()> {
    let source_id = config.replay.source_id.as_str();
    let forced = args.input_format.or(config.replay.input_format);

    let mut source = super::open(&args.file, source_id, forced, output)?;
    let graph = shared(Graph::new(source_id));
    source.source_mut().add_sink(graph.clone());
    source.parse_all().map_err(|err| super::report(output, err))?;

    let payload = StreamStats {
        file: args.file.display().to_string(),
        format: source.format(),
        events_emitted: source.source().next_time_id(),
        graph: graph.borrow().stats(),
    };

    render_mode(
        output,
        &payload,
        |s, w| {
            writeln!(
                w,
                "nodes={} edges={} directed={} attributes={} step={} steps={} events={} dropped={}",
                s.graph.nodes,
                s.graph.edges,
                s.graph.directed_edges,
                s.graph.graph_attributes,
                s.graph.step,
                s.graph.steps_seen,
                s.events_emitted,
                s.graph.events_dropped
            )
        },
        |s, w| {
            pretty_section(w, &format!("Stats for {} ({})", s.file, s.format))?;
            pretty_kv(w, "nodes", s.graph.nodes.to_string())?;
            pretty_kv(
                w,
                "edges",
                format!("{} ({} directed)", s.graph.edges, s.graph.directed_edges),
            )?;
            pretty_kv(w, "graph attrs", s.graph.graph_attributes.to_string())?;
            pretty_kv(
                w,
                "step",
                format!("{} ({} seen)", s.graph.step, s.graph.steps_seen),
            )?;
            pretty_kv(w, "events", s.events_emitted.to_string())?;
            pretty_kv(w, "dropped", s.graph.events_dropped.to_string())
        },
    )
}
