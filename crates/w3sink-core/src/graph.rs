//! In-memory graph model.
//!
//! [`Graph`] is a [`Sink`] that applies incoming events to its node, edge
//! and attribute tables, and re-emits the events it accepted through its own
//! [`Source`]. Re-emitted attribute events are normalized: a set on a key
//! that was absent becomes `*AttributeAdded`, a set on a present key becomes
//! `*AttributeChanged` carrying the previous value. Events that do not fit
//! the current state (duplicate node, edge with a missing endpoint, change
//! on an unknown element) are logged and dropped.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::sink::Sink;
use crate::source::{SinkId, SinkRef, Source};
use crate::value::Value;

pub type Attributes = BTreeMap<String, Value>;

fn label_of(attributes: &Attributes) -> Option<String> {
    attributes.get("label").map(|v| match v {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    })
}

fn class_of(attributes: &Attributes) -> Option<&str> {
    attributes.get("ui.class").and_then(Value::as_str)
}

/// Hidden only for `ui.hide` set to `true` or the string `"true"`.
fn hidden_in(attributes: &Attributes) -> bool {
    match attributes.get("ui.hide") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Str(s)) => s == "true",
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    pub attributes: Attributes,
}

impl Node {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            attributes: Attributes::new(),
        }
    }

    /// Position from `xyz`, else `xy`, else the individual `x`/`y`/`z`
    /// attributes. Missing coordinates are 0.
    #[must_use]
    pub fn position(&self) -> Option<[f64; 3]> {
        let coords = |v: &Value| -> Option<Vec<f64>> {
            v.as_array()?.iter().map(Value::as_f64).collect()
        };
        for key in ["xyz", "xy"] {
            if let Some(c) = self.attributes.get(key).and_then(coords) {
                let mut pos = [0.0; 3];
                for (slot, value) in pos.iter_mut().zip(c) {
                    *slot = value;
                }
                return Some(pos);
            }
        }
        let axis = |k: &str| self.attributes.get(k).and_then(Value::as_f64);
        let (x, y, z) = (axis("x"), axis("y"), axis("z"));
        if x.is_none() && y.is_none() && z.is_none() {
            return None;
        }
        Some([x.unwrap_or(0.0), y.unwrap_or(0.0), z.unwrap_or(0.0)])
    }

    #[must_use]
    pub fn label(&self) -> Option<String> {
        label_of(&self.attributes)
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        class_of(&self.attributes)
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        hidden_in(&self.attributes)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub id: String,
    pub from: String,
    pub to: String,
    pub directed: bool,
    pub attributes: Attributes,
}

impl Edge {
    #[must_use]
    pub fn label(&self) -> Option<String> {
        label_of(&self.attributes)
    }

    #[must_use]
    pub fn class(&self) -> Option<&str> {
        class_of(&self.attributes)
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        hidden_in(&self.attributes)
    }

    fn touches(&self, node: &str) -> bool {
        self.from == node || self.to == node
    }
}

/// Summary counts of a graph, as printed by `w3sink stats`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub directed_edges: usize,
    pub graph_attributes: usize,
    pub step: f64,
    pub steps_seen: u64,
    pub events_received: u64,
    pub events_dropped: u64,
}

#[derive(Debug)]
pub struct Graph {
    source: Source,
    nodes: BTreeMap<String, Node>,
    edges: BTreeMap<String, Edge>,
    attributes: Attributes,
    step: f64,
    steps_seen: u64,
    events_received: u64,
    events_dropped: u64,
}

impl Graph {
    /// Empty graph re-emitting under the source id `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            source: Source::new(id),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            attributes: Attributes::new(),
            step: 0.0,
            steps_seen: 0,
            events_received: 0,
            events_dropped: 0,
        }
    }

    pub fn add_sink(&mut self, sink: SinkRef) -> SinkId {
        self.source.add_sink(sink)
    }

    pub fn remove_sink(&mut self, id: SinkId) -> bool {
        self.source.remove_sink(id)
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Edges with `node` as either endpoint.
    pub fn incident_edges<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.values().filter(move |e| e.touches(node))
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub const fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Last step announced by a `StepBegins` event.
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            directed_edges: self.edges.values().filter(|e| e.directed).count(),
            graph_attributes: self.attributes.len(),
            step: self.step,
            steps_seen: self.steps_seen,
            events_received: self.events_received,
            events_dropped: self.events_dropped,
        }
    }

    fn drop_event(&mut self, source_id: &str, time_id: u64, reason: &str) {
        self.events_dropped += 1;
        warn!(source = source_id, time_id, "{reason}");
    }

    fn remove_edge(&mut self, edge_id: &str) {
        if self.edges.remove(edge_id).is_some() {
            self.source.send_edge_removed(edge_id);
        }
    }
}

/// Store `value` under `key`; `Some(old)` when the key was already present.
fn store(attributes: &mut Attributes, key: &str, value: &Value) -> Option<Value> {
    attributes.insert(key.to_string(), value.clone())
}

impl Sink for Graph {
    fn node_added(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        self.events_received += 1;
        if self.nodes.contains_key(node_id) {
            self.drop_event(source_id, time_id, &format!("node exists \"{node_id}\""));
            return;
        }
        self.nodes.insert(node_id.to_string(), Node::new(node_id));
        self.source.send_node_added(node_id);
    }

    fn node_removed(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        self.events_received += 1;
        if !self.nodes.contains_key(node_id) {
            self.drop_event(source_id, time_id, &format!("node \"{node_id}\" not found"));
            return;
        }
        let incident: Vec<String> = self.incident_edges(node_id).map(|e| e.id.clone()).collect();
        for edge_id in &incident {
            debug!(node = node_id, edge = %edge_id, "removing incident edge");
            self.remove_edge(edge_id);
        }
        self.nodes.remove(node_id);
        self.source.send_node_removed(node_id);
    }

    fn node_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.node_attribute_changed(source_id, time_id, node_id, key, None, value);
    }

    fn node_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.events_received += 1;
        let Some(node) = self.nodes.get_mut(node_id) else {
            self.drop_event(source_id, time_id, &format!("node \"{node_id}\" not found"));
            return;
        };
        match store(&mut node.attributes, key, new_value) {
            None => self.source.send_node_attribute_added(node_id, key, new_value.clone()),
            Some(old) => {
                self.source
                    .send_node_attribute_changed(node_id, key, Some(old), new_value.clone())
            }
        };
    }

    fn node_attribute_removed(&mut self, source_id: &str, time_id: u64, node_id: &str, key: &str) {
        self.events_received += 1;
        let Some(node) = self.nodes.get_mut(node_id) else {
            self.drop_event(source_id, time_id, &format!("node \"{node_id}\" not found"));
            return;
        };
        if node.attributes.remove(key).is_some() {
            self.source.send_node_attribute_removed(node_id, key);
        } else {
            debug!(node = node_id, key, "attribute not set, nothing to remove");
        }
    }

    fn edge_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        from: &str,
        to: &str,
        directed: bool,
    ) {
        self.events_received += 1;
        if self.edges.contains_key(edge_id) {
            self.drop_event(source_id, time_id, &format!("edge exists \"{edge_id}\""));
            return;
        }
        for endpoint in [from, to] {
            if !self.nodes.contains_key(endpoint) {
                self.drop_event(
                    source_id,
                    time_id,
                    &format!("node \"{endpoint}\" not found for edge \"{edge_id}\""),
                );
                return;
            }
        }
        self.edges.insert(
            edge_id.to_string(),
            Edge {
                id: edge_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                directed,
                attributes: Attributes::new(),
            },
        );
        self.source.send_edge_added(edge_id, from, to, directed);
    }

    fn edge_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str) {
        self.events_received += 1;
        if !self.edges.contains_key(edge_id) {
            self.drop_event(source_id, time_id, &format!("edge \"{edge_id}\" not found"));
            return;
        }
        self.remove_edge(edge_id);
    }

    fn edge_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.edge_attribute_changed(source_id, time_id, edge_id, key, None, value);
    }

    fn edge_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.events_received += 1;
        let Some(edge) = self.edges.get_mut(edge_id) else {
            self.drop_event(source_id, time_id, &format!("edge \"{edge_id}\" not found"));
            return;
        };
        match store(&mut edge.attributes, key, new_value) {
            None => self.source.send_edge_attribute_added(edge_id, key, new_value.clone()),
            Some(old) => {
                self.source
                    .send_edge_attribute_changed(edge_id, key, Some(old), new_value.clone())
            }
        };
    }

    fn edge_attribute_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str, key: &str) {
        self.events_received += 1;
        let Some(edge) = self.edges.get_mut(edge_id) else {
            self.drop_event(source_id, time_id, &format!("edge \"{edge_id}\" not found"));
            return;
        };
        if edge.attributes.remove(key).is_some() {
            self.source.send_edge_attribute_removed(edge_id, key);
        } else {
            debug!(edge = edge_id, key, "attribute not set, nothing to remove");
        }
    }

    fn graph_attribute_added(&mut self, source_id: &str, time_id: u64, key: &str, value: &Value) {
        self.graph_attribute_changed(source_id, time_id, key, None, value);
    }

    fn graph_attribute_changed(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.events_received += 1;
        match store(&mut self.attributes, key, new_value) {
            None => self.source.send_graph_attribute_added(key, new_value.clone()),
            Some(old) => self
                .source
                .send_graph_attribute_changed(key, Some(old), new_value.clone()),
        };
    }

    fn graph_attribute_removed(&mut self, _source_id: &str, _time_id: u64, key: &str) {
        self.events_received += 1;
        if self.attributes.remove(key).is_some() {
            self.source.send_graph_attribute_removed(key);
        } else {
            debug!(key, "graph attribute not set, nothing to remove");
        }
    }

    fn graph_cleared(&mut self, _source_id: &str, _time_id: u64) {
        self.events_received += 1;
        self.nodes.clear();
        self.edges.clear();
        self.attributes.clear();
        self.source.send_graph_cleared();
    }

    fn step_begins(&mut self, _source_id: &str, _time_id: u64, step: f64) {
        self.events_received += 1;
        self.step = step;
        self.steps_seen += 1;
        self.source.send_step_begins(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::sink::EventLog;
    use crate::source::shared;

    fn graph_with_log() -> (Graph, std::rc::Rc<std::cell::RefCell<EventLog>>) {
        let mut graph = Graph::new("graph");
        let log = shared(EventLog::new());
        graph.add_sink(log.clone());
        (graph, log)
    }

    #[test]
    fn set_becomes_added_then_changed() {
        let (mut g, log) = graph_with_log();
        g.node_added("in", 0, "A");
        g.node_attribute_changed("in", 1, "A", "label", None, &Value::from("a"));
        g.node_attribute_changed("in", 2, "A", "label", None, &Value::from("b"));

        let payloads: Vec<Event> = log.borrow().payloads().cloned().collect();
        assert_eq!(
            payloads[1],
            Event::NodeAttributeAdded {
                node: "A".into(),
                key: "label".into(),
                value: Value::from("a"),
            }
        );
        assert_eq!(
            payloads[2],
            Event::NodeAttributeChanged {
                node: "A".into(),
                key: "label".into(),
                old: Some(Value::from("a")),
                value: Value::from("b"),
            }
        );
        assert_eq!(g.node("A").and_then(Node::label).as_deref(), Some("b"));
    }

    #[test]
    fn duplicate_node_and_dangling_edge_are_dropped() {
        let (mut g, log) = graph_with_log();
        g.node_added("in", 0, "A");
        g.node_added("in", 1, "A");
        g.edge_added("in", 2, "e", "A", "B", false);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(g.stats().events_dropped, 2);
    }

    #[test]
    fn removing_a_node_removes_incident_edges_first() {
        let (mut g, log) = graph_with_log();
        for (t, id) in ["A", "B", "C"].into_iter().enumerate() {
            g.node_added("in", t as u64, id);
        }
        g.edge_added("in", 3, "ab", "A", "B", true);
        g.edge_added("in", 4, "bc", "B", "C", false);
        g.edge_added("in", 5, "ca", "C", "A", false);
        log.borrow_mut().take();

        g.node_removed("in", 6, "A");
        let payloads: Vec<Event> = log.borrow().payloads().cloned().collect();
        assert_eq!(
            payloads,
            vec![
                Event::EdgeRemoved { edge: "ab".into() },
                Event::EdgeRemoved { edge: "ca".into() },
                Event::NodeRemoved { node: "A".into() },
            ]
        );
        assert_eq!(g.edge_count(), 1);
        assert!(g.edge("bc").is_some());
    }

    #[test]
    fn clear_empties_everything() {
        let (mut g, _log) = graph_with_log();
        g.node_added("in", 0, "A");
        g.graph_attribute_added("in", 1, "title", &Value::from("t"));
        g.step_begins("in", 2, 3.0);
        g.graph_cleared("in", 3);
        assert_eq!(g.node_count(), 0);
        assert!(g.attributes().is_empty());
        assert!((g.step() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn node_helpers() {
        let (mut g, _log) = graph_with_log();
        g.node_added("in", 0, "A");
        let set = |g: &mut Graph, key: &str, value: Value| {
            g.node_attribute_changed("in", 0, "A", key, None, &value);
        };
        set(&mut g, "xy", Value::Array(vec![Value::Int(1), Value::Float(2.5)]));
        set(&mut g, "ui.class", Value::from("important"));
        set(&mut g, "ui.hide", Value::Bool(true));
        set(&mut g, "label", Value::Int(7));

        let node = g.node("A").expect("node");
        assert_eq!(node.position(), Some([1.0, 2.5, 0.0]));
        assert_eq!(node.class(), Some("important"));
        assert!(node.is_hidden());
        assert_eq!(node.label().as_deref(), Some("7"));

        g.node_added("in", 0, "B");
        g.node_attribute_changed("in", 0, "B", "y", None, &Value::Int(4));
        let node = g.node("B").expect("node");
        assert_eq!(node.position(), Some([0.0, 4.0, 0.0]));
        assert!(!node.is_hidden());
        assert_eq!(node.label(), None);

        for (value, hidden) in [
            (Value::from("true"), true),
            (Value::from("yes"), false),
            (Value::from("false"), false),
            (Value::Int(1), false),
            (Value::Bool(false), false),
        ] {
            g.node_attribute_changed("in", 0, "B", "ui.hide", None, &value);
            let node = g.node("B").expect("node");
            assert_eq!(node.is_hidden(), hidden, "ui.hide = {value}");
        }
    }

    #[test]
    fn attribute_on_unknown_element_is_dropped() {
        let (mut g, log) = graph_with_log();
        g.edge_attribute_changed("in", 0, "nope", "w", None, &Value::Int(1));
        g.node_attribute_removed("in", 1, "nope", "w");
        assert!(log.borrow().is_empty());
        assert_eq!(g.stats().events_received, 2);
    }
}
