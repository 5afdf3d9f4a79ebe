//! Graph-mutation events.
//!
//! An [`Event`] is the immutable payload of one mutation. When a
//! [`Source`](crate::source::Source) emits it, the event is stamped with the
//! source id and the next per-source `time_id`; the stamped form is
//! [`TimedEvent`].
//!
//! Every event kind maps to exactly one [`Sink`] callback, see
//! [`Event::dispatch`].

use serde::Serialize;

use crate::sink::Sink;
use crate::value::Value;

/// A single graph mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NodeAdded {
        node: String,
    },
    NodeRemoved {
        node: String,
    },
    NodeAttributeAdded {
        node: String,
        key: String,
        value: Value,
    },
    /// `old` is `None` when the producer does not track prior state (the
    /// DGS parser never does).
    NodeAttributeChanged {
        node: String,
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        old: Option<Value>,
        value: Value,
    },
    NodeAttributeRemoved {
        node: String,
        key: String,
    },
    EdgeAdded {
        edge: String,
        from: String,
        to: String,
        directed: bool,
    },
    EdgeRemoved {
        edge: String,
    },
    EdgeAttributeAdded {
        edge: String,
        key: String,
        value: Value,
    },
    EdgeAttributeChanged {
        edge: String,
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        old: Option<Value>,
        value: Value,
    },
    EdgeAttributeRemoved {
        edge: String,
        key: String,
    },
    GraphAttributeAdded {
        key: String,
        value: Value,
    },
    GraphAttributeChanged {
        key: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        old: Option<Value>,
        value: Value,
    },
    GraphAttributeRemoved {
        key: String,
    },
    GraphCleared,
    StepBegins {
        step: f64,
    },
}

impl Event {
    /// Stable snake-case name of the event kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "node_added",
            Self::NodeRemoved { .. } => "node_removed",
            Self::NodeAttributeAdded { .. } => "node_attribute_added",
            Self::NodeAttributeChanged { .. } => "node_attribute_changed",
            Self::NodeAttributeRemoved { .. } => "node_attribute_removed",
            Self::EdgeAdded { .. } => "edge_added",
            Self::EdgeRemoved { .. } => "edge_removed",
            Self::EdgeAttributeAdded { .. } => "edge_attribute_added",
            Self::EdgeAttributeChanged { .. } => "edge_attribute_changed",
            Self::EdgeAttributeRemoved { .. } => "edge_attribute_removed",
            Self::GraphAttributeAdded { .. } => "graph_attribute_added",
            Self::GraphAttributeChanged { .. } => "graph_attribute_changed",
            Self::GraphAttributeRemoved { .. } => "graph_attribute_removed",
            Self::GraphCleared => "graph_cleared",
            Self::StepBegins { .. } => "step_begins",
        }
    }

    /// Deliver this event to the matching callback of `sink`.
    pub fn dispatch(&self, source_id: &str, time_id: u64, sink: &mut dyn Sink) {
        match self {
            Self::NodeAdded { node } => sink.node_added(source_id, time_id, node),
            Self::NodeRemoved { node } => sink.node_removed(source_id, time_id, node),
            Self::NodeAttributeAdded { node, key, value } => {
                sink.node_attribute_added(source_id, time_id, node, key, value);
            }
            Self::NodeAttributeChanged {
                node,
                key,
                old,
                value,
            } => sink.node_attribute_changed(source_id, time_id, node, key, old.as_ref(), value),
            Self::NodeAttributeRemoved { node, key } => {
                sink.node_attribute_removed(source_id, time_id, node, key);
            }
            Self::EdgeAdded {
                edge,
                from,
                to,
                directed,
            } => sink.edge_added(source_id, time_id, edge, from, to, *directed),
            Self::EdgeRemoved { edge } => sink.edge_removed(source_id, time_id, edge),
            Self::EdgeAttributeAdded { edge, key, value } => {
                sink.edge_attribute_added(source_id, time_id, edge, key, value);
            }
            Self::EdgeAttributeChanged {
                edge,
                key,
                old,
                value,
            } => sink.edge_attribute_changed(source_id, time_id, edge, key, old.as_ref(), value),
            Self::EdgeAttributeRemoved { edge, key } => {
                sink.edge_attribute_removed(source_id, time_id, edge, key);
            }
            Self::GraphAttributeAdded { key, value } => {
                sink.graph_attribute_added(source_id, time_id, key, value);
            }
            Self::GraphAttributeChanged { key, old, value } => {
                sink.graph_attribute_changed(source_id, time_id, key, old.as_ref(), value);
            }
            Self::GraphAttributeRemoved { key } => {
                sink.graph_attribute_removed(source_id, time_id, key);
            }
            Self::GraphCleared => sink.graph_cleared(source_id, time_id),
            Self::StepBegins { step } => sink.step_begins(source_id, time_id, *step),
        }
    }
}

/// An event as observed by a sink: payload plus emitter identity and sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedEvent {
    pub source_id: String,
    pub time_id: u64,
    #[serde(flatten)]
    pub event: Event,
}
