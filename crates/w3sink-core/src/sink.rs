//! The `Sink` callback interface and two general-purpose sinks.
//!
//! A sink receives every event a [`Source`](crate::source::Source) emits,
//! with the emitting source id and the event's `time_id`. Every callback has
//! a no-op default, so a sink implements only the kinds it cares about.
//!
//! - [`EventLog`] records every event as a [`TimedEvent`].
//! - [`TracingSink`] logs every event through `tracing`.

use tracing::info;

use crate::event::{Event, TimedEvent};
use crate::value::Value;

/// Consumer of graph-mutation events.
#[allow(unused_variables)]
pub trait Sink {
    fn node_added(&mut self, source_id: &str, time_id: u64, node_id: &str) {}

    fn node_removed(&mut self, source_id: &str, time_id: u64, node_id: &str) {}

    fn node_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        value: &Value,
    ) {
    }

    fn node_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
    }

    fn node_attribute_removed(&mut self, source_id: &str, time_id: u64, node_id: &str, key: &str) {
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
    }

    fn edge_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str) {}

    fn edge_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        value: &Value,
    ) {
    }

    fn edge_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
    }

    fn edge_attribute_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str, key: &str) {
    }

    fn graph_attribute_added(&mut self, source_id: &str, time_id: u64, key: &str, value: &Value) {}

    fn graph_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
    }

    fn graph_attribute_removed(&mut self, source_id: &str, time_id: u64, key: &str) {}

    fn graph_cleared(&mut self, source_id: &str, time_id: u64) {}

    fn step_begins(&mut self, source_id: &str, time_id: u64, step: f64) {}
}

/// Sink that records every event it receives, in arrival order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<TimedEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Payloads only, without source id and time id.
    pub fn payloads(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().map(|e| &e.event)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drain the recorded events.
    pub fn take(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    fn push(&mut self, source_id: &str, time_id: u64, event: Event) {
        self.events.push(TimedEvent {
            source_id: source_id.to_string(),
            time_id,
            event,
        });
    }
}

impl Sink for EventLog {
    fn node_added(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        self.push(
            source_id,
            time_id,
            Event::NodeAdded {
                node: node_id.to_string(),
            },
        );
    }

    fn node_removed(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        self.push(
            source_id,
            time_id,
            Event::NodeRemoved {
                node: node_id.to_string(),
            },
        );
    }

    fn node_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.push(
            source_id,
            time_id,
            Event::NodeAttributeAdded {
                node: node_id.to_string(),
                key: key.to_string(),
                value: value.clone(),
            },
        );
    }

    fn node_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.push(
            source_id,
            time_id,
            Event::NodeAttributeChanged {
                node: node_id.to_string(),
                key: key.to_string(),
                old: old_value.cloned(),
                value: new_value.clone(),
            },
        );
    }

    fn node_attribute_removed(&mut self, source_id: &str, time_id: u64, node_id: &str, key: &str) {
        self.push(
            source_id,
            time_id,
            Event::NodeAttributeRemoved {
                node: node_id.to_string(),
                key: key.to_string(),
            },
        );
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
        self.push(
            source_id,
            time_id,
            Event::EdgeAdded {
                edge: edge_id.to_string(),
                from: from.to_string(),
                to: to.to_string(),
                directed,
            },
        );
    }

    fn edge_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str) {
        self.push(
            source_id,
            time_id,
            Event::EdgeRemoved {
                edge: edge_id.to_string(),
            },
        );
    }

    fn edge_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.push(
            source_id,
            time_id,
            Event::EdgeAttributeAdded {
                edge: edge_id.to_string(),
                key: key.to_string(),
                value: value.clone(),
            },
        );
    }

    fn edge_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.push(
            source_id,
            time_id,
            Event::EdgeAttributeChanged {
                edge: edge_id.to_string(),
                key: key.to_string(),
                old: old_value.cloned(),
                value: new_value.clone(),
            },
        );
    }

    fn edge_attribute_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str, key: &str) {
        self.push(
            source_id,
            time_id,
            Event::EdgeAttributeRemoved {
                edge: edge_id.to_string(),
                key: key.to_string(),
            },
        );
    }

    fn graph_attribute_added(&mut self, source_id: &str, time_id: u64, key: &str, value: &Value) {
        self.push(
            source_id,
            time_id,
            Event::GraphAttributeAdded {
                key: key.to_string(),
                value: value.clone(),
            },
        );
    }

    fn graph_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        key: &str,
        old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.push(
            source_id,
            time_id,
            Event::GraphAttributeChanged {
                key: key.to_string(),
                old: old_value.cloned(),
                value: new_value.clone(),
            },
        );
    }

    fn graph_attribute_removed(&mut self, source_id: &str, time_id: u64, key: &str) {
        self.push(
            source_id,
            time_id,
            Event::GraphAttributeRemoved {
                key: key.to_string(),
            },
        );
    }

    fn graph_cleared(&mut self, source_id: &str, time_id: u64) {
        self.push(source_id, time_id, Event::GraphCleared);
    }

    fn step_begins(&mut self, source_id: &str, time_id: u64, step: f64) {
        self.push(source_id, time_id, Event::StepBegins { step });
    }
}

/// Sink that logs each event at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn node_added(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        info!(source = source_id, time_id, node = node_id, "node added");
    }

    fn node_removed(&mut self, source_id: &str, time_id: u64, node_id: &str) {
        info!(source = source_id, time_id, node = node_id, "node removed");
    }

    fn node_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        node_id: &str,
        key: &str,
        value: &Value,
    ) {
        info!(source = source_id, time_id, node = node_id, key, %value, "node attribute added");
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
        info!(source = source_id, time_id, node = node_id, key, value = %new_value, "node attribute changed");
    }

    fn node_attribute_removed(&mut self, source_id: &str, time_id: u64, node_id: &str, key: &str) {
        info!(source = source_id, time_id, node = node_id, key, "node attribute removed");
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
        info!(source = source_id, time_id, edge = edge_id, from, to, directed, "edge added");
    }

    fn edge_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str) {
        info!(source = source_id, time_id, edge = edge_id, "edge removed");
    }

    fn edge_attribute_added(
        &mut self,
        source_id: &str,
        time_id: u64,
        edge_id: &str,
        key: &str,
        value: &Value,
    ) {
        info!(source = source_id, time_id, edge = edge_id, key, %value, "edge attribute added");
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
        info!(source = source_id, time_id, edge = edge_id, key, value = %new_value, "edge attribute changed");
    }

    fn edge_attribute_removed(&mut self, source_id: &str, time_id: u64, edge_id: &str, key: &str) {
        info!(source = source_id, time_id, edge = edge_id, key, "edge attribute removed");
    }

    fn graph_attribute_added(&mut self, source_id: &str, time_id: u64, key: &str, value: &Value) {
        info!(source = source_id, time_id, key, %value, "graph attribute added");
    }

    fn graph_attribute_changed(
        &mut self,
        source_id: &str,
        time_id: u64,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        info!(source = source_id, time_id, key, value = %new_value, "graph attribute changed");
    }

    fn graph_attribute_removed(&mut self, source_id: &str, time_id: u64, key: &str) {
        info!(source = source_id, time_id, key, "graph attribute removed");
    }

    fn graph_cleared(&mut self, source_id: &str, time_id: u64) {
        info!(source = source_id, time_id, "graph cleared");
    }

    fn step_begins(&mut self, source_id: &str, time_id: u64, step: f64) {
        info!(source = source_id, time_id, step, "step begins");
    }
}
