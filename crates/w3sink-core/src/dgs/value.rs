//! Attribute-value reader.
//!
//! Alternatives are tried in a fixed order: quoted string, color, `{array}`,
//! `[map]`, number, bare word. A token that starts like a number but runs on
//! into word characters (`12px`, `3d`) is read as a bare word.
//!
//! Arrays and maps nest up to [`MAX_NESTING`] levels; deeper input is a
//! syntax error rather than unbounded recursion.

use std::collections::BTreeMap;

use super::SyntaxError;
use super::cursor::LineCursor;
use crate::value::{Value, is_bare_char, is_color_literal};

/// Deepest array/map nesting accepted in one value.
pub const MAX_NESTING: usize = 256;

/// Read one value at the cursor.
///
/// # Errors
///
/// Returns a [`SyntaxError`] for unmatched brackets, malformed map entries,
/// malformed colors, or when no value starts at the cursor.
pub fn read_value(cur: &mut LineCursor<'_>) -> Result<Value, SyntaxError> {
    read_nested(cur, 0)
}

fn read_nested(cur: &mut LineCursor<'_>, depth: usize) -> Result<Value, SyntaxError> {
    cur.skip_ws();
    match cur.peek() {
        Some('"' | '\'') => cur.read_quoted().map(Value::Str),
        Some('#') => read_color(cur),
        Some('{' | '[') if depth >= MAX_NESTING => {
            Err(cur.error(format!("nesting deeper than {MAX_NESTING} levels")))
        }
        Some('{') => read_array(cur, depth + 1),
        Some('[') => read_map(cur, depth + 1),
        _ => read_scalar(cur),
    }
}

/// Read a comma-separated list of values. A single value is returned as is;
/// two or more become a [`Value::Array`].
///
/// # Errors
///
/// Propagates the first [`read_value`] failure.
pub fn read_value_list(cur: &mut LineCursor<'_>) -> Result<Value, SyntaxError> {
    let mut values = vec![read_value(cur)?];
    loop {
        let save = cur.position();
        cur.skip_ws();
        if cur.eat(',') {
            values.push(read_value(cur)?);
        } else {
            cur.reset(save);
            break;
        }
    }
    Ok(Value::from_list(values))
}

fn read_color(cur: &mut LineCursor<'_>) -> Result<Value, SyntaxError> {
    let start = cur.position();
    cur.bump();
    let digits = cur.take_while(is_bare_char);
    let literal = format!("#{digits}");
    if is_color_literal(&literal) {
        Ok(Value::Color(literal))
    } else {
        Err(cur.error_at(start, "malformed color, expected # and 3 or 6 hex digits"))
    }
}

fn read_array(cur: &mut LineCursor<'_>, depth: usize) -> Result<Value, SyntaxError> {
    let start = cur.position();
    cur.bump();
    let mut items = Vec::new();
    cur.skip_ws();
    if cur.eat('}') {
        return Ok(Value::Array(items));
    }
    loop {
        if cur.is_at_end() {
            return Err(cur.error_at(start, "unmatched '{'"));
        }
        items.push(read_nested(cur, depth)?);
        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        if cur.eat('}') {
            return Ok(Value::Array(items));
        }
        return Err(cur.error_at(start, "unmatched '{'"));
    }
}

fn read_map(cur: &mut LineCursor<'_>, depth: usize) -> Result<Value, SyntaxError> {
    let start = cur.position();
    cur.bump();
    let mut map = BTreeMap::new();
    cur.skip_ws();
    if cur.eat(']') {
        return Ok(Value::Map(map));
    }
    loop {
        if cur.is_at_end() {
            return Err(cur.error_at(start, "unmatched '['"));
        }
        let entry = cur.position();
        let key = cur
            .read_key()
            .map_err(|_| cur.error_at(entry, "malformed map entry, expected key"))?;
        cur.skip_ws();
        if !(cur.eat(':') || cur.eat('=')) {
            return Err(cur.error_at(entry, "malformed map entry, expected ':' or '='"));
        }
        let value = read_nested(cur, depth)?;
        map.insert(key, value);
        cur.skip_ws();
        if cur.eat(',') {
            continue;
        }
        if cur.eat(']') {
            return Ok(Value::Map(map));
        }
        return Err(cur.error_at(start, "unmatched '['"));
    }
}

/// Length of the numeric literal at the start of `s`:
/// `[+-]? digits ('.' digits)? ([eE] [+-]? digits)?`, 0 when none.
fn numeric_prefix_len(s: &str) -> (usize, bool) {
    let bytes = s.as_bytes();
    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = count_digits(i);
    if int_digits == 0 {
        return (0, false);
    }
    i += int_digits;
    let mut is_float = false;

    if bytes.get(i) == Some(&b'.') {
        let frac = count_digits(i + 1);
        if frac > 0 {
            i += 1 + frac;
            is_float = true;
        }
    }
    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(i + 1), Some(b'+' | b'-')));
        let exp = count_digits(i + 1 + sign);
        if exp > 0 {
            i += 1 + sign + exp;
            is_float = true;
        }
    }
    (i, is_float)
}

fn read_scalar(cur: &mut LineCursor<'_>) -> Result<Value, SyntaxError> {
    let rest = cur.remainder();
    let (len, is_float) = numeric_prefix_len(rest);
    let runs_on = rest[len..].chars().next().is_some_and(is_bare_char);

    if len > 0 && !runs_on {
        let literal = &rest[..len];
        let parsed = if is_float {
            literal.parse::<f64>().ok().map(Value::Float)
        } else {
            literal
                .parse::<i64>()
                .ok()
                .map(Value::Int)
                .or_else(|| literal.parse::<f64>().ok().map(Value::Float))
        };
        if let Some(value) = parsed {
            cur.reset(cur.position() + len);
            return Ok(value);
        }
    }

    let word = cur.take_while(is_bare_char);
    if word.is_empty() {
        Err(cur.error("unparseable value"))
    } else {
        Ok(Value::Str(word.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> Value {
        read_value(&mut LineCursor::new(text)).expect("value")
    }

    fn list(text: &str) -> Value {
        read_value_list(&mut LineCursor::new(text)).expect("list")
    }

    fn error(text: &str) -> SyntaxError {
        read_value_list(&mut LineCursor::new(text)).unwrap_err()
    }

    #[test]
    fn scalars() {
        assert_eq!(value(r#""hello""#), Value::from("hello"));
        assert_eq!(value("'it is'"), Value::from("it is"));
        assert_eq!(value("42"), Value::Int(42));
        assert_eq!(value("-3.5"), Value::Float(-3.5));
        assert_eq!(value("+7"), Value::Int(7));
        assert_eq!(value("1.2e10"), Value::Float(1.2e10));
        assert_eq!(value("5E-2"), Value::Float(0.05));
        assert_eq!(value("#ff00aa"), Value::Color("#ff00aa".into()));
        assert_eq!(value("#F0a"), Value::Color("#F0a".into()));
        assert_eq!(value("red"), Value::from("red"));
        assert_eq!(value("fill-color"), Value::from("fill-color"));
    }

    #[test]
    fn number_running_into_word_is_a_word() {
        assert_eq!(value("12px"), Value::from("12px"));
        assert_eq!(value("3d"), Value::from("3d"));
        assert_eq!(value("1.2.3"), Value::from("1.2.3"));
    }

    #[test]
    fn huge_integer_falls_back_to_float() {
        assert_eq!(value("99999999999999999999"), Value::Float(1e20));
    }

    #[test]
    fn arrays_nest() {
        assert_eq!(
            value("{1,2,3}"),
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(
            value("{ {1}, {} , x }"),
            Value::Array(vec![
                Value::Array(vec![Value::Int(1)]),
                Value::Array(vec![]),
                Value::from("x"),
            ])
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |depth: usize| format!("{}1{}", "{".repeat(depth), "}".repeat(depth));

        let mut value = list(&nested(MAX_NESTING));
        for _ in 0..MAX_NESTING {
            value = value.as_array().expect("array level")[0].clone();
        }
        assert_eq!(value, Value::Int(1));

        let err = error(&nested(MAX_NESTING + 1));
        assert!(err.message.starts_with("nesting deeper than"));
        let err = error(&"[k=".repeat(MAX_NESTING + 1));
        assert!(err.message.starts_with("nesting deeper than"));
        assert!(error(&nested(10_000)).message.starts_with("nesting deeper than"));
    }

    #[test]
    fn maps_accept_both_separators() {
        let map = value("[k1=v1, k2:{1,2}, \"k 3\": [inner=#abc]]");
        let map = map.as_map().expect("map");
        assert_eq!(map["k1"], Value::from("v1"));
        assert_eq!(map["k2"], Value::Array(vec![Value::Int(1), Value::Int(2)]));
        let inner = map["k 3"].as_map().expect("inner map");
        assert_eq!(inner["inner"], Value::Color("#abc".into()));
    }

    #[test]
    fn value_list_collapses_single_value() {
        assert_eq!(list("1.5"), Value::Float(1.5));
        assert_eq!(
            list("1.5, 2 ,three rest"),
            Value::Array(vec![Value::Float(1.5), Value::Int(2), Value::from("three")])
        );
        assert_eq!(list("{1}"), Value::Array(vec![Value::Int(1)]));
    }

    #[test]
    fn list_stops_before_next_attribute() {
        let mut cur = LineCursor::new("1,2 label:x");
        read_value_list(&mut cur).expect("list");
        assert_eq!(cur.remainder(), " label:x");
    }

    #[test]
    fn malformed_values() {
        let err = error("{1,2");
        assert_eq!(err.message, "unmatched '{'");
        assert_eq!(err.remainder, "{1,2");

        let err = error("[k1 v1]");
        assert!(err.message.starts_with("malformed map entry"));
        assert_eq!(err.remainder, "k1 v1]");

        assert_eq!(error("[a=1").message, "unmatched '['");
        assert!(error("#ff00a").message.starts_with("malformed color"));
        assert!(error("#zzz").message.starts_with("malformed color"));
        assert_eq!(error("1,").message, "unparseable value");
        assert_eq!(error(":x").remainder, ":x");
    }
}
