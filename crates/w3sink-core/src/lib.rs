//! Graph-stream replay core.
//!
//! Reads a DGS text stream or a JSON event log and replays it as an ordered
//! sequence of graph-mutation events through a [`Source`] to any number of
//! [`Sink`]s.
//!
//! ```
//! use w3sink_core::dgs::DgsSource;
//! use w3sink_core::graph::Graph;
//! use w3sink_core::source::shared;
//!
//! let mut dgs = DgsSource::from_text("demo", "DGS004\ndemo 0 0\nan A\nan B\nae AB A > B\n")?;
//! let graph = shared(Graph::new("graph"));
//! dgs.add_sink(graph.clone());
//! dgs.parse_all()?;
//! assert_eq!(graph.borrow().edge_count(), 1);
//! # Ok::<(), w3sink_core::dgs::DgsError>(())
//! ```

pub mod config;
pub mod dgs;
pub mod directive;
pub mod error;
pub mod event;
pub mod file_source;
pub mod graph;
pub mod json;
pub mod sink;
pub mod source;
pub mod value;

pub use event::{Event, TimedEvent};
pub use sink::Sink;
pub use source::{SinkId, SinkRef, Source};
pub use value::Value;
