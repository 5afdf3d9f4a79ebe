//! DGS writer sink.
//!
//! [`DgsWriter`] turns every event it receives into one DGS directive line,
//! so any source can be converted to DGS. The output reads back through
//! [`DgsSource`](super::DgsSource) to the same event sequence, with one
//! exception: a value-less attribute is written as a bare key and reads back
//! as `true`.
//!
//! Events that have no DGS spelling reading back as themselves (a string
//! holding both quote characters, `false`, a nested `true`, a non-finite
//! float, an empty id) are not written approximately: the writer records an
//! [`io::ErrorKind::InvalidData`] error and stops, like on an I/O failure.

use std::fmt::Write as _;
use std::io::{self, Write};

use tracing::warn;

use crate::sink::Sink;
use crate::value::{Value, is_bare_char, is_color_literal, quote_for, write_id, write_quoted};

/// Version written in the magic line.
pub const WRITER_VERSION: u8 = 4;

/// Sink writing DGS text to `W`.
///
/// Errors do not interrupt the event flow: the first one is kept, later
/// writes are dropped, and [`DgsWriter::finish`] reports it.
#[derive(Debug)]
pub struct DgsWriter<W: Write> {
    out: W,
    error: Option<io::Error>,
    lines: usize,
}

/// Stream name as a header token: whitespace becomes `_`, empty becomes
/// `w3sink`.
fn header_name(name: &str) -> String {
    if name.is_empty() {
        return "w3sink".to_string();
    }
    name.chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

impl<W: Write> DgsWriter<W> {
    /// Create a writer and emit the header. Whitespace in `name` is
    /// replaced by `_` so the header stays a single token.
    pub fn new(out: W, name: &str) -> Self {
        let mut writer = Self {
            out,
            error: None,
            lines: 0,
        };
        let token = header_name(name);
        if token != name && !name.is_empty() {
            warn!(name, written = %token, "stream name contains whitespace");
        }
        writer.write_line(Ok(format!("DGS00{WRITER_VERSION}\n{token} 0 0")));
        writer.lines = 0;
        writer
    }

    /// Directive lines written so far.
    #[must_use]
    pub const fn lines_written(&self) -> usize {
        self.lines
    }

    /// Flush and return the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns the first error seen while writing (I/O, or an event with
    /// no faithful DGS spelling), or the flush error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_line(&mut self, line: Result<String, String>) {
        if self.error.is_some() {
            return;
        }
        let result = match line {
            Ok(line) => writeln!(self.out, "{line}"),
            Err(reason) => Err(io::Error::new(io::ErrorKind::InvalidData, reason)),
        };
        if let Err(err) = result {
            warn!(error = %err, "dgs writer failed, dropping further output");
            self.error = Some(err);
            return;
        }
        self.lines += 1;
    }
}

/// Why `s` cannot be written as a quoted string.
fn check_quotable(s: &str, what: &str) -> Result<(), String> {
    if s.contains(['\n', '\r']) {
        return Err(format!("{what} {s:?} spans lines"));
    }
    if quote_for(s).is_none() {
        return Err(format!("{what} {s:?} cannot be quoted"));
    }
    Ok(())
}

/// Identifier or key check shared by [`push_ident`] and [`push_key`].
fn check_name(name: &str, what: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("empty {what}"));
    }
    check_quotable(name, what)
}

/// Whether `value` has a literal reading back as itself. `nested` is false
/// for the top-level value of an attribute, where `true` is spelled as a
/// bare key.
fn check_value(value: &Value, nested: bool) -> Result<(), String> {
    match value {
        Value::Int(_) => Ok(()),
        Value::Float(x) if x.is_finite() => Ok(()),
        Value::Str(s) => check_quotable(s, "string"),
        Value::Color(c) if is_color_literal(c) => Ok(()),
        Value::Bool(true) if !nested => Ok(()),
        Value::Array(items) => items.iter().try_for_each(|item| check_value(item, true)),
        Value::Map(map) => map.iter().try_for_each(|(key, item)| {
            check_name(key, "map key")?;
            check_value(item, true)
        }),
        other => Err(format!("{} value {other} has no DGS literal", other.kind_name())),
    }
}

/// Identifier as the line parser reads it back: bare only when every
/// character is an id character (no `.`).
fn push_ident(buf: &mut String, id: &str) -> Result<(), String> {
    check_name(id, "identifier")?;
    let bare = id.chars().all(|c| c != '.' && is_bare_char(c));
    // Writing into a String cannot fail.
    let _ = if bare {
        buf.write_str(id)
    } else {
        write_quoted(buf, id)
    };
    Ok(())
}

/// Attribute key; quoted when it starts with a `-` that would read back as
/// a removal marker.
fn push_key(buf: &mut String, key: &str) -> Result<(), String> {
    check_name(key, "attribute key")?;
    let _ = if key.starts_with('-') {
        write_quoted(buf, key)
    } else {
        write_id(buf, key)
    };
    Ok(())
}

/// One attribute line: `code [id] <marker>key[:value]`.
fn attribute_line(
    code: &str,
    id: Option<&str>,
    marker: &str,
    key: &str,
    value: Option<&Value>,
) -> Result<String, String> {
    let mut buf = String::from(code);
    if let Some(id) = id {
        buf.push(' ');
        push_ident(&mut buf, id)?;
    }
    buf.push(' ');
    buf.push_str(marker);
    push_key(&mut buf, key)?;
    match value {
        Some(Value::Bool(true)) | None => {}
        Some(value) => {
            check_value(value, false)?;
            let _ = write!(buf, ":{value}");
        }
    }
    Ok(buf)
}

fn element_line(code: &str, id: &str) -> Result<String, String> {
    let mut buf = String::from(code);
    buf.push(' ');
    push_ident(&mut buf, id)?;
    Ok(buf)
}

fn edge_line(id: &str, from: &str, to: &str, directed: bool) -> Result<String, String> {
    let mut buf = element_line("ae", id)?;
    buf.push(' ');
    push_ident(&mut buf, from)?;
    buf.push_str(if directed { " > " } else { " " });
    push_ident(&mut buf, to)?;
    Ok(buf)
}

fn step_line(step: f64) -> Result<String, String> {
    // f64 Display never uses an exponent, which the step grammar forbids.
    if step.is_finite() && step >= 0.0 {
        Ok(format!("st {step}"))
    } else {
        Err(format!("step {step} is not a non-negative number"))
    }
}

impl<W: Write> Sink for DgsWriter<W> {
    fn node_added(&mut self, _source_id: &str, _time_id: u64, node_id: &str) {
        self.write_line(element_line("an", node_id));
    }

    fn node_removed(&mut self, _source_id: &str, _time_id: u64, node_id: &str) {
        self.write_line(element_line("dn", node_id));
    }

    fn node_attribute_added(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        node_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.write_line(attribute_line("cn", Some(node_id), "+", key, Some(value)));
    }

    fn node_attribute_changed(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        node_id: &str,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.write_line(attribute_line("cn", Some(node_id), "", key, Some(new_value)));
    }

    fn node_attribute_removed(&mut self, _source_id: &str, _time_id: u64, node_id: &str, key: &str) {
        self.write_line(attribute_line("cn", Some(node_id), "-", key, None));
    }

    fn edge_added(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        edge_id: &str,
        from: &str,
        to: &str,
        directed: bool,
    ) {
        self.write_line(edge_line(edge_id, from, to, directed));
    }

    fn edge_removed(&mut self, _source_id: &str, _time_id: u64, edge_id: &str) {
        self.write_line(element_line("de", edge_id));
    }

    fn edge_attribute_added(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        edge_id: &str,
        key: &str,
        value: &Value,
    ) {
        self.write_line(attribute_line("ce", Some(edge_id), "+", key, Some(value)));
    }

    fn edge_attribute_changed(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        edge_id: &str,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.write_line(attribute_line("ce", Some(edge_id), "", key, Some(new_value)));
    }

    fn edge_attribute_removed(&mut self, _source_id: &str, _time_id: u64, edge_id: &str, key: &str) {
        self.write_line(attribute_line("ce", Some(edge_id), "-", key, None));
    }

    fn graph_attribute_added(&mut self, _source_id: &str, _time_id: u64, key: &str, value: &Value) {
        self.write_line(attribute_line("cg", None, "+", key, Some(value)));
    }

    fn graph_attribute_changed(
        &mut self,
        _source_id: &str,
        _time_id: u64,
        key: &str,
        _old_value: Option<&Value>,
        new_value: &Value,
    ) {
        self.write_line(attribute_line("cg", None, "", key, Some(new_value)));
    }

    fn graph_attribute_removed(&mut self, _source_id: &str, _time_id: u64, key: &str) {
        self.write_line(attribute_line("cg", None, "-", key, None));
    }

    fn graph_cleared(&mut self, _source_id: &str, _time_id: u64) {
        self.write_line(Ok("cl".to_string()));
    }

    fn step_begins(&mut self, _source_id: &str, _time_id: u64, step: f64) {
        self.write_line(step_line(step));
    }
}
