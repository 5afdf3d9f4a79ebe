//! Header validation and line preparation.

use serde::Serialize;

use super::DgsError;

/// Magic prefix of the first line; followed by one version digit.
pub const MAGIC_PREFIX: &str = "DGS00";

/// Parsed two-line DGS header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Version digit from the `DGS00N` magic.
    pub version: u8,
    /// Stream name token.
    pub name: String,
    /// Advisory node count. Not enforced; saturates at `u64::MAX`.
    pub node_count: u64,
    /// Advisory edge count. Not enforced.
    pub edge_count: u64,
}

/// A directive line waiting to be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLine {
    /// 1-based line number in the original text.
    pub number: usize,
    pub text: String,
}

fn parse_magic(line: &str) -> Option<u8> {
    let digit = line.strip_prefix(MAGIC_PREFIX)?;
    let mut chars = digit.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10).and_then(|d| u8::try_from(d).ok()),
        _ => None,
    }
}

/// `\S+ \d+ \d+`, separated by single spaces.
fn parse_stream_line(line: &str) -> Option<(String, u64, u64)> {
    let mut parts = line.split(' ');
    let name = parts.next().filter(|s| !s.is_empty() && !s.contains(char::is_whitespace))?;
    // Counts are advisory: any digit run is accepted, oversized ones saturate.
    let mut count = || {
        parts
            .next()
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .map(|s| s.parse::<u64>().unwrap_or(u64::MAX))
    };
    let nodes = count()?;
    let edges = count()?;
    if parts.next().is_some() {
        return None;
    }
    Some((name.to_string(), nodes, edges))
}

/// Validate the header and collect the directive lines that follow it.
///
/// Trailing `\r` is stripped from every line. Blank lines and lines whose
/// first non-space character is `#` are dropped.
///
/// # Errors
///
/// Returns [`DgsError::MalformedHeader`] when line 1 is not `DGS00N` or
/// line 2 is not `name nodes edges`.
pub fn validate_header(text: &str) -> Result<(Header, Vec<PendingLine>), DgsError> {
    let mut lines = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .enumerate()
        .map(|(i, l)| (i + 1, l));

    let (_, magic) = lines.next().unwrap_or((1, ""));
    let version = parse_magic(magic).ok_or_else(|| DgsError::MalformedHeader {
        line: 1,
        found: magic.to_string(),
    })?;

    let (_, stream) = lines.next().unwrap_or((2, ""));
    let (name, node_count, edge_count) =
        parse_stream_line(stream).ok_or_else(|| DgsError::MalformedHeader {
            line: 2,
            found: stream.to_string(),
        })?;

    let pending = lines
        .filter(|(_, l)| {
            let t = l.trim_start();
            !t.is_empty() && !t.starts_with('#')
        })
        .map(|(number, l)| PendingLine {
            number,
            text: l.to_string(),
        })
        .collect();

    Ok((
        Header {
            version,
            name,
            node_count,
            edge_count,
        },
        pending,
    ))
}
