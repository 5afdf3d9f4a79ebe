//! Attribute values carried by graph events.
//!
//! A [`Value`] is the decoded form of a DGS attribute literal (or of a JSON
//! value in the JSON event log). Arrays and maps nest to any depth.
//!
//! `Display` renders the value back in DGS literal syntax, so
//! `format!("{v}")` can be fed to the DGS value reader again.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// A decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Integer literal without fraction or exponent.
    Int(i64),
    /// Decimal or scientific literal.
    Float(f64),
    /// Quoted string or bare word.
    Str(String),
    /// Color literal, stored with its leading `#` (`#ff00aa`, `#f0a`).
    Color(String),
    /// Presence marker for attributes written without a value.
    Bool(bool),
    /// `{a, b, c}` or a comma-separated list of more than one value.
    Array(Vec<Value>),
    /// `[k1: v1, k2 = v2]`.
    Map(BTreeMap<String, Value>),
}

/// Returns `true` when `s` is `#` followed by exactly 3 or 6 hex digits.
#[must_use]
pub fn is_color_literal(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|hex| {
        (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Characters allowed in an unquoted DGS word.
pub(crate) fn is_bare_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}

impl Value {
    /// Collapse a decoded value list: one value stays scalar, more become an array.
    #[must_use]
    pub fn from_list(mut values: Vec<Self>) -> Self {
        if values.len() == 1 {
            values.remove(0)
        } else {
            Self::Array(values)
        }
    }

    /// Whether this value was written as a color literal.
    #[must_use]
    pub const fn is_color(&self) -> bool {
        matches!(self, Self::Color(_))
    }

    /// String content of a `Str` or `Color`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Color(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content of an `Int` or `Float`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Self]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short type name used in diagnostics and CLI output.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Color(_) => "color",
            Self::Bool(_) => "bool",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }

    /// Convert a JSON value from the JSON event log.
    ///
    /// Strings that are color literals become [`Value::Color`]; `null`
    /// becomes `Bool(false)`.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Bool(false),
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) if is_color_literal(s) => Self::Color(s.clone()),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::Array(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(obj) => Self::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Whether `s` reads back unchanged between `quote` characters: no bare
/// `quote` and no trailing backslash that would escape the closing quote.
fn quotes_cleanly(s: &str, quote: char) -> bool {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == quote || (c == '\\' && chars.next().is_none()) {
            return false;
        }
    }
    true
}

/// Quote character that writes `s` as a DGS string reading back verbatim,
/// `None` when neither does.
#[must_use]
pub(crate) fn quote_for(s: &str) -> Option<char> {
    ['"', '\''].into_iter().find(|&q| quotes_cleanly(s, q))
}

/// Write `s` as a DGS quoted string, picking a quote that reads back
/// verbatim. Falls back to `"` when no quote does.
pub(crate) fn write_quoted(f: &mut impl fmt::Write, s: &str) -> fmt::Result {
    let quote = quote_for(s).unwrap_or('"');
    write!(f, "{quote}{s}{quote}")
}

/// Write an identifier or key: bare when possible, quoted otherwise.
pub(crate) fn write_id(f: &mut impl fmt::Write, id: &str) -> fmt::Result {
    if !id.is_empty() && id.chars().all(is_bare_char) {
        f.write_str(id)
    } else {
        write_quoted(f, id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps a fraction or exponent, so the literal reads back as a float.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => write_quoted(f, s),
            Self::Color(c) => f.write_str(c),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Array(items) => {
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Self::Map(map) => {
                f.write_str("[")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_id(f, key)?;
                    write!(f, ":{value}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Str(s) | Self::Color(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_literals() {
        assert!(is_color_literal("#ff00aa"));
        assert!(is_color_literal("#F0A"));
        assert!(!is_color_literal("#ff00a"));
        assert!(!is_color_literal("ff00aa"));
        assert!(!is_color_literal("#gg0000"));
    }

    #[test]
    fn from_list_collapses_single_value() {
        assert_eq!(Value::from_list(vec![Value::Int(1)]), Value::Int(1));
        assert_eq!(
            Value::from_list(vec![Value::Int(1), Value::Int(2)]),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn display_uses_dgs_syntax() {
        let mut map = BTreeMap::new();
        map.insert("k1".to_string(), Value::from("v 1"));
        map.insert("ui.x".to_string(), Value::Float(1.0));
        let value = Value::Array(vec![
            Value::Int(-2),
            Value::Color("#abc".into()),
            Value::Map(map),
        ]);
        assert_eq!(value.to_string(), r#"{-2,#abc,[k1:"v 1",ui.x:1.0]}"#);
    }

    #[test]
    fn display_picks_single_quotes_for_embedded_double_quote() {
        assert_eq!(Value::from(r#"say "hi""#).to_string(), r#"'say "hi"'"#);
    }

    #[test]
    fn quote_choice() {
        assert_eq!(quote_for("it's"), Some('"'));
        assert_eq!(quote_for(r#"say \"hi\" it's"#), Some('"'));
        assert_eq!(quote_for(r#"it's "x""#), None);
        assert_eq!(quote_for("ends with \\"), None);
        assert_eq!(quote_for(r"ends with \\"), Some('"'));
    }

    #[test]
    fn json_conversion() {
        let json = serde_json::json!({"a": [1, 2.5, "#00ff00", "x"], "b": null});
        let value = Value::from_json(&json);
        let map = value.as_map().expect("map");
        let items = map["a"].as_array().expect("array");
        assert_eq!(items[0], Value::Int(1));
        assert_eq!(items[1], Value::Float(2.5));
        assert!(items[2].is_color());
        assert_eq!(items[3], Value::from("x"));
        assert_eq!(map["b"], Value::Bool(false));
    }

    #[test]
    fn serializes_as_plain_json() {
        let value = Value::Array(vec![Value::Int(1), Value::Color("#fff".into())]);
        let json = serde_json::to_string(&value).expect("serialize");
        assert_eq!(json, r##"[1,"#fff"]"##);
    }
}
