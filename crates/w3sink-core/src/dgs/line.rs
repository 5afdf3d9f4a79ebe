//! Directive parser: one DGS line to one [`Directive`].

use super::cursor::LineCursor;
use super::value::read_value_list;
use super::{LineError, SyntaxError};
use crate::directive::{AttributeOp, Directive, DirectiveKind};
use crate::value::Value;

/// Decode one directive line. Blank lines and `#` comment lines decode to
/// `None`.
///
/// Nothing is emitted here; the caller emits the returned directive only
/// after the whole line decoded.
///
/// # Errors
///
/// - [`LineError::UnknownDirective`] when the leading token is not a known
///   two-letter code.
/// - [`LineError::Syntax`] for malformed identifiers, values or step numbers.
pub fn parse_line(line: &str) -> Result<Option<Directive>, LineError> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let mut cur = LineCursor::new(line);
    let token = cur.read_directive_token();
    let kind: DirectiveKind = token
        .parse()
        .map_err(|_| LineError::UnknownDirective(token.to_string()))?;

    let directive = match kind {
        DirectiveKind::AddNode => Directive::AddNode {
            id: cur.read_id()?,
            attributes: read_attributes(&mut cur)?,
        },
        DirectiveKind::ChangeNode => Directive::ChangeNode {
            id: cur.read_id()?,
            attributes: read_attributes(&mut cur)?,
        },
        DirectiveKind::DeleteNode => Directive::DeleteNode {
            id: cur.read_id()?,
        },
        DirectiveKind::AddEdge => {
            let id = cur.read_id()?;
            let from = cur.read_id()?;
            let directed = cur.read_directed_marker();
            let to = cur.read_id()?;
            Directive::AddEdge {
                id,
                from,
                to,
                directed,
                attributes: read_attributes(&mut cur)?,
            }
        }
        DirectiveKind::ChangeEdge => Directive::ChangeEdge {
            id: cur.read_id()?,
            attributes: read_attributes(&mut cur)?,
        },
        DirectiveKind::DeleteEdge => Directive::DeleteEdge {
            id: cur.read_id()?,
        },
        DirectiveKind::ChangeGraph => Directive::ChangeGraph {
            attributes: read_attributes(&mut cur)?,
        },
        DirectiveKind::Step => Directive::Step(cur.read_step_real()?),
        DirectiveKind::Clear => Directive::Clear,
    };
    Ok(Some(directive))
}

/// Attribute list: `([+-]? key ((:|=) value (, value)*)?)*` up to end of line.
fn read_attributes(cur: &mut LineCursor<'_>) -> Result<Vec<AttributeOp>, SyntaxError> {
    let mut ops = Vec::new();
    while !cur.is_at_end() {
        cur.skip_ws();
        let marker = if cur.eat('+') {
            Some('+')
        } else if cur.eat('-') {
            Some('-')
        } else {
            None
        };
        let key = cur.read_key()?;

        let save = cur.position();
        cur.skip_ws();
        let value = if cur.eat(':') || cur.eat('=') {
            read_value_list(cur)?
        } else {
            cur.reset(save);
            Value::Bool(true)
        };

        ops.push(match marker {
            Some('+') => AttributeOp::Add { key, value },
            Some(_) => AttributeOp::Remove { key },
            None => AttributeOp::Set {
                key,
                old: None,
                value,
            },
        });
    }
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Directive {
        parse_line(line)
            .expect("line should parse")
            .expect("line should hold a directive")
    }

    fn set(key: &str, value: Value) -> AttributeOp {
        AttributeOp::Set {
            key: key.into(),
            old: None,
            value,
        }
    }

    #[test]
    fn add_node_with_attributes() {
        assert_eq!(
            parse(r#"an A label:"first" ui.class=important xy:1,2.5 flag"#),
            Directive::AddNode {
                id: "A".into(),
                attributes: vec![
                    set("label", Value::from("first")),
                    set("ui.class", Value::from("important")),
                    set("xy", Value::Array(vec![Value::Int(1), Value::Float(2.5)])),
                    set("flag", Value::Bool(true)),
                ],
            }
        );
    }

    #[test]
    fn markers() {
        assert_eq!(
            parse("cn A +weight:3 -label -color:red"),
            Directive::ChangeNode {
                id: "A".into(),
                attributes: vec![
                    AttributeOp::Add {
                        key: "weight".into(),
                        value: Value::Int(3),
                    },
                    AttributeOp::Remove {
                        key: "label".into()
                    },
                    AttributeOp::Remove {
                        key: "color".into()
                    },
                ],
            }
        );
    }

    #[test]
    fn edges() {
        assert_eq!(
            parse("ae e0 A > B"),
            Directive::AddEdge {
                id: "e0".into(),
                from: "A".into(),
                to: "B".into(),
                directed: true,
                attributes: vec![],
            }
        );
        assert_eq!(
            parse("ae 0-1 0 1 array:{1,2,3}"),
            Directive::AddEdge {
                id: "0-1".into(),
                from: "0".into(),
                to: "1".into(),
                directed: false,
                attributes: vec![set(
                    "array",
                    Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
                )],
            }
        );
        assert_eq!(parse("de e0"), Directive::DeleteEdge { id: "e0".into() });
    }

    #[test]
    fn codes_are_case_insensitive() {
        assert_eq!(parse("AN A"), parse("an A"));
        assert_eq!(parse("CL"), Directive::Clear);
    }

    #[test]
    fn step_and_graph() {
        assert_eq!(parse("st 3.5"), Directive::Step(3.5));
        assert_eq!(parse("cg"), Directive::ChangeGraph { attributes: vec![] });
        assert!(matches!(parse("cg title='my graph'"), Directive::ChangeGraph { attributes } if attributes.len() == 1));
    }

    #[test]
    fn unknown_directive() {
        assert_eq!(
            parse_line("xx A"),
            Err(LineError::UnknownDirective("xx".into()))
        );
        assert_eq!(
            parse_line("node A"),
            Err(LineError::UnknownDirective("node".into()))
        );
    }

    #[test]
    fn comment_and_blank_lines_are_skipped() {
        assert_eq!(parse_line("# an A"), Ok(None));
        assert_eq!(parse_line("   #"), Ok(None));
        assert_eq!(parse_line("  "), Ok(None));
    }

    #[test]
    fn escaped_quote_in_value() {
        assert_eq!(
            parse(r#"cn A label:"say \"hi\"""#),
            Directive::ChangeNode {
                id: "A".into(),
                attributes: vec![set("label", Value::from(r#"say \"hi\""#))],
            }
        );
    }

    #[test]
    fn empty_quoted_key_is_an_error() {
        assert!(matches!(
            parse_line(r#"cn A "":1"#),
            Err(LineError::Syntax(e)) if e.message == "unparseable attribute key"
        ));
        assert!(matches!(parse_line("an ''"), Err(LineError::Syntax(_))));
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(parse_line("an"), Err(LineError::Syntax(_))));
        assert!(matches!(parse_line("ae e A"), Err(LineError::Syntax(_))));
        assert!(matches!(parse_line("st -1"), Err(LineError::Syntax(_))));
        assert!(matches!(parse_line("cn A k:{1"), Err(LineError::Syntax(_))));
        assert!(matches!(parse_line("cn A :x"), Err(LineError::Syntax(e)) if e.remainder == ":x"));
    }
}
