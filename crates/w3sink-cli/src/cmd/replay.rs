//! `w3sink replay`: print the events of a stream in emission order.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::debug;
use w3sink_core::config::ProjectConfig;
use w3sink_core::file_source::{FileSource, SourceError, SourceFormat};
use w3sink_core::graph::Graph;
use w3sink_core::sink::{EventLog, TracingSink};
use w3sink_core::source::shared;
use w3sink_core::{Event, TimedEvent, Value};

use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `w3sink replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Stream file (`.dgs` or `.json`).
    pub file: PathBuf,

    /// Stop after this many steps.
    #[arg(long, conflicts_with = "lines")]
    pub steps: Option<usize>,

    /// Stop after this many lines (DGS) or entries (JSON).
    #[arg(long)]
    pub lines: Option<usize>,

    /// Force the input format instead of detecting it.
    #[arg(long, value_name = "dgs|json")]
    pub input_format: Option<SourceFormat>,

    /// Route events through the in-memory graph, so attribute sets come out
    /// as added or changed with their previous value.
    #[arg(long)]
    pub normalize: bool,

    /// Also log every event at info level.
    #[arg(long)]
    pub trace: bool,
}

/// How much of the stream to replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    All,
    Steps(usize),
    Units(usize),
}

impl Limit {
    fn from_args(args: &ReplayArgs) -> Self {
        match (args.steps, args.lines) {
            (Some(n), _) => Self::Steps(n),
            (None, Some(n)) => Self::Units(n),
            (None, None) => Self::All,
        }
    }
}

/// Report payload for `w3sink replay`.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub file: String,
    pub format: SourceFormat,
    pub source_id: String,
    pub normalized: bool,
    /// No input is left queued.
    pub finished: bool,
    pub events: Vec<TimedEvent>,
}

/// Replay `source` up to `limit`. Stops at the first unit that fails.
pub fn drive(source: &mut dyn FileSource, limit: Limit) -> Result<(), SourceError> {
    match limit {
        Limit::All => {
            source.parse_all()?;
        }
        Limit::Steps(n) => {
            for _ in 0..n {
                if !source.ready() || !source.next_step()? {
                    break;
                }
            }
        }
        Limit::Units(n) => {
            for _ in 0..n {
                if !source.ready() || !source.next_events()? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Short, DGS-flavored rendering of an event payload.
#[must_use]
pub fn describe(event: &Event) -> String {
    let changed = |target: &str, key: &str, old: Option<&Value>, value: &Value| match old {
        Some(old) => format!("{target}{key}={value} (was {old})"),
        None => format!("{target}{key}={value}"),
    };
    match event {
        Event::NodeAdded { node } | Event::NodeRemoved { node } => node.clone(),
        Event::EdgeRemoved { edge } => edge.clone(),
        Event::NodeAttributeAdded { node, key, value } => format!("{node} {key}={value}"),
        Event::EdgeAttributeAdded { edge, key, value } => format!("{edge} {key}={value}"),
        Event::GraphAttributeAdded { key, value } => format!("{key}={value}"),
        Event::NodeAttributeChanged {
            node,
            key,
            old,
            value,
        } => changed(&format!("{node} "), key, old.as_ref(), value),
        Event::EdgeAttributeChanged {
            edge,
            key,
            old,
            value,
        } => changed(&format!("{edge} "), key, old.as_ref(), value),
        Event::GraphAttributeChanged { key, old, value } => changed("", key, old.as_ref(), value),
        Event::NodeAttributeRemoved { node, key } => format!("{node} -{key}"),
        Event::EdgeAttributeRemoved { edge, key } => format!("{edge} -{key}"),
        Event::GraphAttributeRemoved { key } => format!("-{key}"),
        Event::EdgeAdded {
            edge,
            from,
            to,
            directed,
        } => {
            let arrow = if *directed { " > " } else { " " };
            format!("{edge} {from}{arrow}{to}")
        }
        Event::GraphCleared => String::new(),
        Event::StepBegins { step } => step.to_string(),
    }
}

fn write_event(w: &mut dyn Write, event: &TimedEvent) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        event.time_id,
        event.source_id,
        event.event.kind_name(),
        describe(&event.event)
    )
}

/// Execute `w3sink replay`.
pub fn run_replay(
    args: &ReplayArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> anyhow::Result<()> {
    let source_id = config.replay.source_id.as_str();
    let forced = args.input_format.or(config.replay.input_format);
    let normalized = args.normalize || config.replay.normalize;

    let mut source = super::open(&args.file, source_id, forced, output)?;
    let log = shared(EventLog::new());

    // The graph re-emits under the same id so the printed stream reads as one.
    let _graph = if normalized {
        let graph = shared(Graph::new(source_id));
        graph.borrow_mut().add_sink(log.clone());
        source.source_mut().add_sink(graph.clone());
        Some(graph)
    } else {
        source.source_mut().add_sink(log.clone());
        None
    };
    if args.trace {
        source.source_mut().add_sink(shared(TracingSink));
    }

    let limit = Limit::from_args(args);
    debug!(file = %args.file.display(), ?limit, normalized, "replaying");
    drive(source.as_mut(), limit).map_err(|err| super::report(output, err))?;

    let report = ReplayReport {
        file: args.file.display().to_string(),
        format: source.format(),
        source_id: source_id.to_string(),
        normalized,
        finished: !source.ready(),
        events: log.borrow_mut().take(),
    };

    render_mode(
        output,
        &report,
        |r, w| {
            for event in &r.events {
                write_event(w, event)?;
            }
            Ok(())
        },
        |r, w| {
            pretty_section(w, &format!("Replay of {} ({})", r.file, r.format))?;
            for event in &r.events {
                writeln!(
                    w,
                    "{:>6}  {:<24} {}",
                    event.time_id,
                    event.event.kind_name(),
                    describe(&event.event)
                )?;
            }
            pretty_rule(w)?;
            pretty_kv(w, "events", r.events.len().to_string())?;
            pretty_kv(w, "finished", if r.finished { "yes" } else { "no" })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use w3sink_core::dgs::DgsSource;

    const STREAM: &str = "DGS004\nt 0 0\nan A\nst 1\nan B\nst 2\nan C\n";

    fn loaded() -> (DgsSource, std::rc::Rc<std::cell::RefCell<EventLog>>) {
        let mut source = DgsSource::from_text("t", STREAM).expect("header");
        let log = shared(EventLog::new());
        source.add_sink(log.clone());
        (source, log)
    }

    #[test]
    fn step_limit_stops_after_the_marker() {
        let (mut source, log) = loaded();
        drive(&mut source, Limit::Steps(1)).expect("replay");
        assert_eq!(log.borrow().len(), 2);
        assert!(source.ready());
    }

    #[test]
    fn unit_limit_counts_lines() {
        let (mut source, log) = loaded();
        drive(&mut source, Limit::Units(3)).expect("replay");
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn limits_past_the_end_are_fine() {
        let (mut source, log) = loaded();
        drive(&mut source, Limit::Steps(10)).expect("replay");
        assert_eq!(log.borrow().len(), 5);
        assert!(!source.ready());
    }

    #[test]
    fn describe_edges_and_changes() {
        let edge = Event::EdgeAdded {
            edge: "e".into(),
            from: "A".into(),
            to: "B".into(),
            directed: true,
        };
        assert_eq!(describe(&edge), "e A > B");

        let change = Event::NodeAttributeChanged {
            node: "A".into(),
            key: "w".into(),
            old: Some(Value::Int(1)),
            value: Value::Int(2),
        };
        assert_eq!(describe(&change), "A w=2 (was 1)");

        let removal = Event::GraphAttributeRemoved { key: "k".into() };
        assert_eq!(describe(&removal), "-k");
    }
}
