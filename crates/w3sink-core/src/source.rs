//! Event fan-out.
//!
//! A [`Source`] owns a list of sinks and a per-source `time_id` counter.
//! Every `send_*` call stamps the event with the next `time_id` and delivers
//! it synchronously to each registered sink, in registration order.
//!
//! Sinks are shared as [`SinkRef`] (`Rc<RefCell<dyn Sink>>`) so that the
//! caller keeps a handle to inspect them after a replay.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::warn;

use crate::event::Event;
use crate::sink::Sink;
use crate::value::Value;

/// Shared, mutable handle to a sink.
pub type SinkRef = Rc<RefCell<dyn Sink>>;

/// Wrap a concrete sink so it can be registered and still inspected later.
pub fn shared<S: Sink + 'static>(sink: S) -> Rc<RefCell<S>> {
    Rc::new(RefCell::new(sink))
}

/// Handle returned by [`Source::add_sink`], used to unregister the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}

/// Emitter of graph events.
pub struct Source {
    id: String,
    time_id: u64,
    next_sink: u64,
    sinks: Vec<(SinkId, SinkRef)>,
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("id", &self.id)
            .field("time_id", &self.time_id)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Source {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            time_id: 0,
            next_sink: 0,
            sinks: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `time_id` the next emitted event will carry.
    #[must_use]
    pub const fn next_time_id(&self) -> u64 {
        self.time_id
    }

    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Register a sink. Events emitted afterwards are delivered to it.
    pub fn add_sink(&mut self, sink: SinkRef) -> SinkId {
        let id = SinkId(self.next_sink);
        self.next_sink += 1;
        self.sinks.push((id, sink));
        id
    }

    /// Unregister a sink. Returns `false` when `id` was not registered.
    pub fn remove_sink(&mut self, id: SinkId) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(sid, _)| *sid != id);
        self.sinks.len() != before
    }

    /// Stamp `event` with the next `time_id` and deliver it to every sink.
    ///
    /// Returns the `time_id` used. The sink list is snapshotted first, so a
    /// registration change made while delivering only affects later events.
    /// A sink that is already borrowed (the event re-entered it) is skipped.
    pub fn emit(&mut self, event: Event) -> u64 {
        let time_id = self.time_id;
        self.time_id += 1;

        let snapshot: Vec<(SinkId, SinkRef)> = self.sinks.clone();
        for (sink_id, sink) in &snapshot {
            match sink.try_borrow_mut() {
                Ok(mut sink) => event.dispatch(&self.id, time_id, &mut *sink),
                Err(_) => warn!(
                    source = %self.id,
                    time_id,
                    sink = %sink_id,
                    kind = event.kind_name(),
                    "sink is busy, skipping re-entrant delivery"
                ),
            }
        }
        time_id
    }

    pub fn send_node_added(&mut self, node: &str) -> u64 {
        self.emit(Event::NodeAdded {
            node: node.to_string(),
        })
    }

    pub fn send_node_removed(&mut self, node: &str) -> u64 {
        self.emit(Event::NodeRemoved {
            node: node.to_string(),
        })
    }

    pub fn send_node_attribute_added(&mut self, node: &str, key: &str, value: Value) -> u64 {
        self.emit(Event::NodeAttributeAdded {
            node: node.to_string(),
            key: key.to_string(),
            value,
        })
    }

    pub fn send_node_attribute_changed(
        &mut self,
        node: &str,
        key: &str,
        old: Option<Value>,
        value: Value,
    ) -> u64 {
        self.emit(Event::NodeAttributeChanged {
            node: node.to_string(),
            key: key.to_string(),
            old,
            value,
        })
    }

    pub fn send_node_attribute_removed(&mut self, node: &str, key: &str) -> u64 {
        self.emit(Event::NodeAttributeRemoved {
            node: node.to_string(),
            key: key.to_string(),
        })
    }

    pub fn send_edge_added(&mut self, edge: &str, from: &str, to: &str, directed: bool) -> u64 {
        self.emit(Event::EdgeAdded {
            edge: edge.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            directed,
        })
    }

    pub fn send_edge_removed(&mut self, edge: &str) -> u64 {
        self.emit(Event::EdgeRemoved {
            edge: edge.to_string(),
        })
    }

    pub fn send_edge_attribute_added(&mut self, edge: &str, key: &str, value: Value) -> u64 {
        self.emit(Event::EdgeAttributeAdded {
            edge: edge.to_string(),
            key: key.to_string(),
            value,
        })
    }

    pub fn send_edge_attribute_changed(
        &mut self,
        edge: &str,
        key: &str,
        old: Option<Value>,
        value: Value,
    ) -> u64 {
        self.emit(Event::EdgeAttributeChanged {
            edge: edge.to_string(),
            key: key.to_string(),
            old,
            value,
        })
    }

    pub fn send_edge_attribute_removed(&mut self, edge: &str, key: &str) -> u64 {
        self.emit(Event::EdgeAttributeRemoved {
            edge: edge.to_string(),
            key: key.to_string(),
        })
    }

    pub fn send_graph_attribute_added(&mut self, key: &str, value: Value) -> u64 {
        self.emit(Event::GraphAttributeAdded {
            key: key.to_string(),
            value,
        })
    }

    pub fn send_graph_attribute_changed(
        &mut self,
        key: &str,
        old: Option<Value>,
        value: Value,
    ) -> u64 {
        self.emit(Event::GraphAttributeChanged {
            key: key.to_string(),
            old,
            value,
        })
    }

    pub fn send_graph_attribute_removed(&mut self, key: &str) -> u64 {
        self.emit(Event::GraphAttributeRemoved {
            key: key.to_string(),
        })
    }

    pub fn send_graph_cleared(&mut self) -> u64 {
        self.emit(Event::GraphCleared)
    }

    pub fn send_step_begins(&mut self, step: f64) -> u64 {
        self.emit(Event::StepBegins { step })
    }
}
