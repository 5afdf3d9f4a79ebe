//! JSON event-log source.
//!
//! The log is an object with an `events` array; each entry is an array
//! whose first element is a directive code:
//!
//! ```json
//! {"events": [
//!   ["an", "A"],
//!   ["cn", "A", ["+", "label", "first"], ["weight", 1, 2], ["-", "color"]],
//!   ["ae", "AB", "A", "B", true],
//!   ["st", 1],
//!   ["cl"]
//! ]}
//! ```
//!
//! Attribute entries start with an optional marker: `"+"` adds, `"-"`
//! removes, `""` or no marker sets. A set with two values carries the old
//! value first. Entries with an unknown code are skipped with a warning.

use serde_json::Value as Json;
use thiserror::Error;
use tracing::{debug, warn};

use crate::directive::{AttributeOp, Directive, DirectiveKind};
use crate::error::ErrorCode;
use crate::source::{SinkId, SinkRef, Source};
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonLogError {
    #[error("invalid JSON event log: {0}")]
    InvalidJson(String),

    #[error("malformed event #{index}: {message}")]
    MalformedEvent { index: usize, message: String },
}

impl JsonLogError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidJson(_) => ErrorCode::InvalidJsonLog,
            Self::MalformedEvent { .. } => ErrorCode::MalformedJsonEvent,
        }
    }
}

/// What popping one entry did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    Replayed(DirectiveKind),
    /// Unknown directive code; nothing emitted.
    Skipped,
}

#[derive(Debug)]
pub struct JsonSource {
    source: Source,
    /// Reversed; the next entry is at the end. Paired with its 0-based index.
    entries: Vec<(usize, Json)>,
    last_directive: Option<DirectiveKind>,
}

impl JsonSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            source: Source::new(id),
            entries: Vec::new(),
            last_directive: None,
        }
    }

    /// Source loaded with the JSON text `text`.
    ///
    /// # Errors
    ///
    /// [`JsonLogError::InvalidJson`] when `text` is not a JSON event log.
    pub fn from_text(id: impl Into<String>, text: &str) -> Result<Self, JsonLogError> {
        let mut json = Self::new(id);
        json.set_data(text)?;
        Ok(json)
    }

    /// Parse `text` and queue its entries, replacing anything still queued.
    ///
    /// # Errors
    ///
    /// [`JsonLogError::InvalidJson`]; the queue is left empty.
    pub fn set_data(&mut self, text: &str) -> Result<(), JsonLogError> {
        self.entries.clear();
        self.last_directive = None;
        let doc: Json =
            serde_json::from_str(text).map_err(|e| JsonLogError::InvalidJson(e.to_string()))?;
        self.set_value(doc)
    }

    /// Queue the entries of an already parsed document.
    ///
    /// # Errors
    ///
    /// [`JsonLogError::InvalidJson`] when `doc` has no `events` array.
    pub fn set_value(&mut self, doc: Json) -> Result<(), JsonLogError> {
        self.entries.clear();
        self.last_directive = None;
        let events = match doc {
            Json::Object(mut obj) => obj.remove("events"),
            _ => None,
        };
        let Some(Json::Array(events)) = events else {
            return Err(JsonLogError::InvalidJson(
                "expected an object with an \"events\" array".to_string(),
            ));
        };
        debug!(source = self.source.id(), entries = events.len(), "json data loaded");
        self.entries = events.into_iter().enumerate().rev().collect();
        Ok(())
    }

    /// Drop everything still queued.
    pub fn end(&mut self) {
        self.entries.clear();
        self.last_directive = None;
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn last_directive(&self) -> Option<DirectiveKind> {
        self.last_directive
    }

    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    pub const fn source_mut(&mut self) -> &mut Source {
        &mut self.source
    }

    pub fn add_sink(&mut self, sink: SinkRef) -> SinkId {
        self.source.add_sink(sink)
    }

    pub fn remove_sink(&mut self, id: SinkId) -> bool {
        self.source.remove_sink(id)
    }

    /// Pop and replay one entry. `None` when nothing is queued.
    ///
    /// # Errors
    ///
    /// [`JsonLogError::MalformedEvent`]; the entry is consumed and nothing
    /// is emitted for it.
    pub fn next_entry(&mut self) -> Result<Option<EntryOutcome>, JsonLogError> {
        let Some((index, entry)) = self.entries.pop() else {
            return Ok(None);
        };
        let Some(directive) = decode_entry(index, &entry)? else {
            return Ok(Some(EntryOutcome::Skipped));
        };
        let kind = directive.kind();
        let emitted = directive.emit(&mut self.source);
        debug!(source = self.source.id(), index, directive = %kind, events = emitted, "json entry");
        self.last_directive = Some(kind);
        Ok(Some(EntryOutcome::Replayed(kind)))
    }

    /// Replay one entry. Returns whether entries remain.
    ///
    /// # Errors
    ///
    /// See [`Self::next_entry`].
    pub fn next_events(&mut self) -> Result<bool, JsonLogError> {
        self.next_entry()?;
        Ok(self.ready())
    }

    /// Replay entries up to and including the next `st`. Returns whether
    /// entries remain.
    ///
    /// # Errors
    ///
    /// See [`Self::next_entry`].
    pub fn next_step(&mut self) -> Result<bool, JsonLogError> {
        while let Some(outcome) = self.next_entry()? {
            if outcome == EntryOutcome::Replayed(DirectiveKind::Step) {
                break;
            }
        }
        Ok(self.ready())
    }

    /// Replay every queued entry. Returns how many were consumed, skipped
    /// ones included.
    ///
    /// # Errors
    ///
    /// See [`Self::next_entry`].
    pub fn parse_all(&mut self) -> Result<usize, JsonLogError> {
        let mut count = 0;
        while self.next_entry()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

fn malformed(index: usize, message: impl Into<String>) -> JsonLogError {
    JsonLogError::MalformedEvent {
        index,
        message: message.into(),
    }
}

/// Node, edge or graph identifier: a string or a number.
fn json_id(index: usize, json: Option<&Json>, what: &str) -> Result<String, JsonLogError> {
    match json {
        Some(Json::String(s)) => Ok(s.clone()),
        Some(Json::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(malformed(index, format!("{what} must be a string or number, got {other}"))),
        None => Err(malformed(index, format!("missing {what}"))),
    }
}

fn json_attribute(index: usize, kv: &Json) -> Result<AttributeOp, JsonLogError> {
    let Json::Array(items) = kv else {
        return Err(malformed(index, format!("attribute must be an array, got {kv}")));
    };
    let (marker, rest) = match items.first() {
        Some(Json::String(m)) if matches!(m.as_str(), "+" | "-" | "") => (m.as_str(), &items[1..]),
        _ => ("", &items[..]),
    };
    let key = match rest.first() {
        Some(Json::String(k)) => k.clone(),
        Some(other) => return Err(malformed(index, format!("attribute key must be a string, got {other}"))),
        None => return Err(malformed(index, "attribute without key")),
    };
    let values: Vec<Value> = rest[1..].iter().map(Value::from_json).collect();

    match marker {
        "+" => Ok(AttributeOp::Add {
            key,
            value: if values.is_empty() {
                Value::Bool(true)
            } else {
                Value::from_list(values)
            },
        }),
        "-" => Ok(AttributeOp::Remove { key }),
        _ => {
            let mut values = values.into_iter();
            match (values.next(), values.next(), values.next()) {
                (None, _, _) => Ok(AttributeOp::Set {
                    key,
                    old: None,
                    value: Value::Bool(true),
                }),
                (Some(value), None, _) => Ok(AttributeOp::Set {
                    key,
                    old: None,
                    value,
                }),
                (Some(old), Some(value), None) => Ok(AttributeOp::Set {
                    key,
                    old: Some(old),
                    value,
                }),
                _ => Err(malformed(index, format!("attribute '{key}' has more than two values"))),
            }
        }
    }
}

fn json_attributes(index: usize, items: &[Json]) -> Result<Vec<AttributeOp>, JsonLogError> {
    items.iter().map(|kv| json_attribute(index, kv)).collect()
}

/// Decode one entry. `Ok(None)` for an unknown directive code.
fn decode_entry(index: usize, entry: &Json) -> Result<Option<Directive>, JsonLogError> {
    let Json::Array(items) = entry else {
        return Err(malformed(index, format!("entry must be an array, got {entry}")));
    };
    let Some(Json::String(code)) = items.first() else {
        return Err(malformed(index, "entry must start with a directive code"));
    };
    let Ok(kind) = code.parse::<DirectiveKind>() else {
        warn!(index, code = %code, "skipping unknown directive in json event log");
        return Ok(None);
    };
    let args = &items[1..];

    let directive = match kind {
        DirectiveKind::AddNode => Directive::AddNode {
            id: json_id(index, args.first(), "node id")?,
            attributes: json_attributes(index, args.get(1..).unwrap_or_default())?,
        },
        DirectiveKind::ChangeNode => Directive::ChangeNode {
            id: json_id(index, args.first(), "node id")?,
            attributes: json_attributes(index, args.get(1..).unwrap_or_default())?,
        },
        DirectiveKind::DeleteNode => Directive::DeleteNode {
            id: json_id(index, args.first(), "node id")?,
        },
        DirectiveKind::AddEdge => Directive::AddEdge {
            id: json_id(index, args.first(), "edge id")?,
            from: json_id(index, args.get(1), "source node")?,
            to: json_id(index, args.get(2), "target node")?,
            directed: match args.get(3) {
                None | Some(Json::Null) => false,
                Some(Json::Bool(b)) => *b,
                Some(other) => {
                    return Err(malformed(index, format!("directed flag must be a boolean, got {other}")));
                }
            },
            attributes: Vec::new(),
        },
        DirectiveKind::ChangeEdge => Directive::ChangeEdge {
            id: json_id(index, args.first(), "edge id")?,
            attributes: json_attributes(index, args.get(1..).unwrap_or_default())?,
        },
        DirectiveKind::DeleteEdge => Directive::DeleteEdge {
            id: json_id(index, args.first(), "edge id")?,
        },
        DirectiveKind::ChangeGraph => Directive::ChangeGraph {
            attributes: json_attributes(index, args)?,
        },
        DirectiveKind::Step => {
            let step = match args.first() {
                Some(Json::Number(n)) => n.as_f64(),
                Some(Json::String(s)) => s.parse::<f64>().ok(),
                _ => None,
            };
            Directive::Step(step.ok_or_else(|| malformed(index, "step must be a number"))?)
        }
        DirectiveKind::Clear => Directive::Clear,
    };
    Ok(Some(directive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::sink::EventLog;
    use crate::source::shared;

    fn replay(text: &str) -> Vec<Event> {
        let mut json = JsonSource::from_text("json", text).expect("valid log");
        let log = shared(EventLog::new());
        json.add_sink(log.clone());
        json.parse_all().expect("replay");
        let events = log.borrow().payloads().cloned().collect();
        events
    }

    #[test]
    fn attribute_markers() {
        let events = replay(
            r#"{"events": [
                ["cn", "A", ["+", "label", "x"], ["", "w", 1], ["w", 1, 2], ["-", "color"], ["flag"]]
            ]}"#,
        );
        assert_eq!(
            events,
            vec![
                Event::NodeAttributeAdded {
                    node: "A".into(),
                    key: "label".into(),
                    value: Value::from("x"),
                },
                Event::NodeAttributeChanged {
                    node: "A".into(),
                    key: "w".into(),
                    old: None,
                    value: Value::Int(1),
                },
                Event::NodeAttributeChanged {
                    node: "A".into(),
                    key: "w".into(),
                    old: Some(Value::Int(1)),
                    value: Value::Int(2),
                },
                Event::NodeAttributeRemoved {
                    node: "A".into(),
                    key: "color".into(),
                },
                Event::NodeAttributeChanged {
                    node: "A".into(),
                    key: "flag".into(),
                    old: None,
                    value: Value::Bool(true),
                },
            ]
        );
    }

    #[test]
    fn numeric_ids_and_directed_edges() {
        let events = replay(r#"{"events": [["an", 1], ["ae", "e", 1, 2, true], ["ae", "f", 1, 2]]}"#);
        assert_eq!(events[0], Event::NodeAdded { node: "1".into() });
        assert!(matches!(&events[1], Event::EdgeAdded { from, directed: true, .. } if from == "1"));
        assert!(matches!(&events[2], Event::EdgeAdded { directed: false, .. }));
    }

    #[test]
    fn unknown_codes_are_skipped() {
        let mut json =
            JsonSource::from_text("json", r#"{"events": [["zz", 1], ["an", "A"]]}"#).expect("valid");
        assert_eq!(json.next_entry(), Ok(Some(EntryOutcome::Skipped)));
        assert_eq!(json.last_directive(), None);
        assert_eq!(json.next_entry(), Ok(Some(EntryOutcome::Replayed(DirectiveKind::AddNode))));
        assert_eq!(json.next_entry(), Ok(None));
    }

    #[test]
    fn next_step_stops_after_step() {
        let mut json = JsonSource::from_text(
            "json",
            r#"{"events": [["an", "A"], ["st", 1], ["an", "B"], ["st", 2.5], ["cl"]]}"#,
        )
        .expect("valid");
        let log = shared(EventLog::new());
        json.add_sink(log.clone());

        assert_eq!(json.next_step(), Ok(true));
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(json.next_step(), Ok(true));
        assert_eq!(log.borrow().len(), 4);
        assert_eq!(json.next_step(), Ok(false));
        assert_eq!(log.borrow().len(), 5);
        assert_eq!(json.next_events(), Ok(false));
    }

    #[test]
    fn invalid_documents() {
        assert!(matches!(
            JsonSource::from_text("j", "not json"),
            Err(JsonLogError::InvalidJson(_))
        ));
        assert!(matches!(
            JsonSource::from_text("j", r#"[["an", "A"]]"#),
            Err(JsonLogError::InvalidJson(_))
        ));
        assert!(matches!(
            JsonSource::from_text("j", r#"{"events": 3}"#),
            Err(JsonLogError::InvalidJson(_))
        ));
    }

    #[test]
    fn malformed_entry_is_consumed() {
        let mut json = JsonSource::from_text(
            "json",
            r#"{"events": [["an"], ["cn", "A", ["w", 1, 2, 3]], ["st", "x"], ["an", "B"]]}"#,
        )
        .expect("valid");
        for expected_index in 0..3 {
            let err = json.next_entry().unwrap_err();
            assert!(matches!(err, JsonLogError::MalformedEvent { index, .. } if index == expected_index));
            assert_eq!(err.code(), ErrorCode::MalformedJsonEvent);
        }
        assert_eq!(json.parse_all(), Ok(1));
    }
}
