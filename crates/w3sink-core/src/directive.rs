//! Decoded stream directives.
//!
//! Both the DGS parser and the JSON event-log reader decode one input unit
//! into a [`Directive`] before emitting anything. [`Directive::emit`] then
//! turns it into events on a [`Source`], so a unit that fails to decode never
//! produces a partial event sequence.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::source::Source;
use crate::value::Value;

/// The nine two-letter directive codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    /// `an`: add node.
    AddNode,
    /// `cn`: change node attributes.
    ChangeNode,
    /// `dn`: delete node.
    DeleteNode,
    /// `ae`: add edge.
    AddEdge,
    /// `ce`: change edge attributes.
    ChangeEdge,
    /// `de`: delete edge.
    DeleteEdge,
    /// `cg`: change graph attributes.
    ChangeGraph,
    /// `st`: step marker.
    Step,
    /// `cl`: clear the graph.
    Clear,
}

/// Error returned when a directive code is not one of the nine known codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirective {
    pub raw: String,
}

impl fmt::Display for UnknownDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown directive '{}': expected one of an, cn, dn, ae, ce, de, cg, st, cl",
            self.raw
        )
    }
}

impl std::error::Error for UnknownDirective {}

impl DirectiveKind {
    pub const ALL: [Self; 9] = [
        Self::AddNode,
        Self::ChangeNode,
        Self::DeleteNode,
        Self::AddEdge,
        Self::ChangeEdge,
        Self::DeleteEdge,
        Self::ChangeGraph,
        Self::Step,
        Self::Clear,
    ];

    /// Lower-case two-letter code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddNode => "an",
            Self::ChangeNode => "cn",
            Self::DeleteNode => "dn",
            Self::AddEdge => "ae",
            Self::ChangeEdge => "ce",
            Self::DeleteEdge => "de",
            Self::ChangeGraph => "cg",
            Self::Step => "st",
            Self::Clear => "cl",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveKind {
    type Err = UnknownDirective;

    /// Codes are matched case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownDirective { raw: s.to_string() })
    }
}

impl Serialize for DirectiveKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DirectiveKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// One attribute operation inside an attribute list.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeOp {
    /// `+key:value`
    Add { key: String, value: Value },
    /// `key:value`. `old` is only known to producers that track state.
    Set {
        key: String,
        old: Option<Value>,
        value: Value,
    },
    /// `-key`
    Remove { key: String },
}

impl AttributeOp {
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Add { key, .. } | Self::Set { key, .. } | Self::Remove { key } => key,
        }
    }
}

/// A fully decoded directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    AddNode {
        id: String,
        attributes: Vec<AttributeOp>,
    },
    ChangeNode {
        id: String,
        attributes: Vec<AttributeOp>,
    },
    DeleteNode {
        id: String,
    },
    AddEdge {
        id: String,
        from: String,
        to: String,
        directed: bool,
        attributes: Vec<AttributeOp>,
    },
    ChangeEdge {
        id: String,
        attributes: Vec<AttributeOp>,
    },
    DeleteEdge {
        id: String,
    },
    ChangeGraph {
        attributes: Vec<AttributeOp>,
    },
    Step(f64),
    Clear,
}

enum Target<'a> {
    Node(&'a str),
    Edge(&'a str),
    Graph,
}

impl Directive {
    #[must_use]
    pub const fn kind(&self) -> DirectiveKind {
        match self {
            Self::AddNode { .. } => DirectiveKind::AddNode,
            Self::ChangeNode { .. } => DirectiveKind::ChangeNode,
            Self::DeleteNode { .. } => DirectiveKind::DeleteNode,
            Self::AddEdge { .. } => DirectiveKind::AddEdge,
            Self::ChangeEdge { .. } => DirectiveKind::ChangeEdge,
            Self::DeleteEdge { .. } => DirectiveKind::DeleteEdge,
            Self::ChangeGraph { .. } => DirectiveKind::ChangeGraph,
            Self::Step(_) => DirectiveKind::Step,
            Self::Clear => DirectiveKind::Clear,
        }
    }

    /// Emit the events of this directive, in order. Returns how many were emitted.
    pub fn emit(self, source: &mut Source) -> usize {
        match self {
            Self::AddNode { id, attributes } => {
                source.send_node_added(&id);
                1 + emit_attributes(source, &Target::Node(&id), attributes)
            }
            Self::ChangeNode { id, attributes } => {
                emit_attributes(source, &Target::Node(&id), attributes)
            }
            Self::DeleteNode { id } => {
                source.send_node_removed(&id);
                1
            }
            Self::AddEdge {
                id,
                from,
                to,
                directed,
                attributes,
            } => {
                source.send_edge_added(&id, &from, &to, directed);
                1 + emit_attributes(source, &Target::Edge(&id), attributes)
            }
            Self::ChangeEdge { id, attributes } => {
                emit_attributes(source, &Target::Edge(&id), attributes)
            }
            Self::DeleteEdge { id } => {
                source.send_edge_removed(&id);
                1
            }
            Self::ChangeGraph { attributes } => emit_attributes(source, &Target::Graph, attributes),
            Self::Step(step) => {
                source.send_step_begins(step);
                1
            }
            Self::Clear => {
                source.send_graph_cleared();
                1
            }
        }
    }
}

fn emit_attributes(source: &mut Source, target: &Target<'_>, attributes: Vec<AttributeOp>) -> usize {
    let count = attributes.len();
    for op in attributes {
        match (target, op) {
            (Target::Node(id), AttributeOp::Add { key, value }) => {
                source.send_node_attribute_added(id, &key, value);
            }
            (Target::Node(id), AttributeOp::Set { key, old, value }) => {
                source.send_node_attribute_changed(id, &key, old, value);
            }
            (Target::Node(id), AttributeOp::Remove { key }) => {
                source.send_node_attribute_removed(id, &key);
            }
            (Target::Edge(id), AttributeOp::Add { key, value }) => {
                source.send_edge_attribute_added(id, &key, value);
            }
            (Target::Edge(id), AttributeOp::Set { key, old, value }) => {
                source.send_edge_attribute_changed(id, &key, old, value);
            }
            (Target::Edge(id), AttributeOp::Remove { key }) => {
                source.send_edge_attribute_removed(id, &key);
            }
            (Target::Graph, AttributeOp::Add { key, value }) => {
                source.send_graph_attribute_added(&key, value);
            }
            (Target::Graph, AttributeOp::Set { key, old, value }) => {
                source.send_graph_attribute_changed(&key, old, value);
            }
            (Target::Graph, AttributeOp::Remove { key }) => {
                source.send_graph_attribute_removed(&key);
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::sink::EventLog;
    use crate::source::shared;

    #[test]
    fn codes_roundtrip() {
        for kind in DirectiveKind::ALL {
            let parsed: DirectiveKind = kind.as_str().parse().expect("should parse");
            assert_eq!(parsed, kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!("AN".parse::<DirectiveKind>(), Ok(DirectiveKind::AddNode));
        assert_eq!("Cl".parse::<DirectiveKind>(), Ok(DirectiveKind::Clear));
    }

    #[test]
    fn unknown_code_is_rejected() {
        let err = "xx".parse::<DirectiveKind>().unwrap_err();
        assert_eq!(err.raw, "xx");
        assert!(err.to_string().contains("expected one of"));
        assert!("".parse::<DirectiveKind>().is_err());
    }

    #[test]
    fn add_edge_emits_edge_then_attributes() {
        let mut source = Source::new("t");
        let log = shared(EventLog::new());
        source.add_sink(log.clone());

        let directive = Directive::AddEdge {
            id: "e".into(),
            from: "A".into(),
            to: "B".into(),
            directed: true,
            attributes: vec![
                AttributeOp::Add {
                    key: "w".into(),
                    value: Value::Int(2),
                },
                AttributeOp::Remove { key: "x".into() },
            ],
        };
        assert_eq!(directive.kind(), DirectiveKind::AddEdge);
        assert_eq!(directive.emit(&mut source), 3);

        let payloads: Vec<Event> = log.borrow().payloads().cloned().collect();
        assert_eq!(
            payloads,
            vec![
                Event::EdgeAdded {
                    edge: "e".into(),
                    from: "A".into(),
                    to: "B".into(),
                    directed: true,
                },
                Event::EdgeAttributeAdded {
                    edge: "e".into(),
                    key: "w".into(),
                    value: Value::Int(2),
                },
                Event::EdgeAttributeRemoved {
                    edge: "e".into(),
                    key: "x".into(),
                },
            ]
        );
    }

    #[test]
    fn graph_set_emits_changed_without_old() {
        let mut source = Source::new("t");
        let log = shared(EventLog::new());
        source.add_sink(log.clone());
        Directive::ChangeGraph {
            attributes: vec![AttributeOp::Set {
                key: "title".into(),
                old: None,
                value: Value::from("g"),
            }],
        }
        .emit(&mut source);
        assert_eq!(
            log.borrow().events()[0].event,
            Event::GraphAttributeChanged {
                key: "title".into(),
                old: None,
                value: Value::from("g"),
            }
        );
    }
}
