//! Position cursor over one DGS line.
//!
//! The cursor never copies the line; it advances a byte offset and hands out
//! sub-slices. Every `read_*` method either consumes what it recognized or
//! returns a [`SyntaxError`] carrying the unconsumed remainder.

use super::SyntaxError;
use crate::value::is_bare_char;

/// Characters allowed in an unquoted identifier (node id, edge id).
fn is_id_char(c: char) -> bool {
    c != '.' && is_bare_char(c)
}

#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    line: &'a str,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    #[must_use]
    pub const fn new(line: &'a str) -> Self {
        Self { line, pos: 0 }
    }

    /// Unconsumed part of the line.
    #[must_use]
    pub fn remainder(&self) -> &'a str {
        &self.line[self.pos..]
    }

    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Rewind to a position previously returned by [`Self::position`].
    pub const fn reset(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// True when nothing but whitespace is left.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.remainder().trim_start().is_empty()
    }

    pub fn skip_ws(&mut self) {
        let rest = self.remainder();
        self.pos += rest.len() - rest.trim_start().len();
    }

    #[must_use]
    pub fn peek(&self) -> Option<char> {
        self.remainder().chars().next()
    }

    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `expected` if it is the next character.
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume the longest prefix whose characters satisfy `pred`.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.remainder();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Syntax error at the current position.
    #[must_use]
    pub fn error(&self, message: impl Into<String>) -> SyntaxError {
        self.error_at(self.pos, message)
    }

    /// Syntax error whose remainder starts at `pos`.
    #[must_use]
    pub fn error_at(&self, pos: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError {
            message: message.into(),
            remainder: self.line[pos..].to_string(),
        }
    }

    /// Leading directive token: a run of ASCII letters, or the first word
    /// when the line does not start with a letter.
    pub fn read_directive_token(&mut self) -> &'a str {
        self.skip_ws();
        let token = self.take_while(|c| c.is_ascii_alphabetic());
        if token.is_empty() {
            self.take_while(|c| !c.is_whitespace())
        } else {
            token
        }
    }

    /// Quoted string: `'...'` or `"..."`, ending at the first quote not
    /// preceded by a backslash. The contents are kept verbatim, backslashes
    /// included.
    ///
    /// # Errors
    ///
    /// Fails when the cursor is not on a quote or the quote is not closed.
    pub fn read_quoted(&mut self) -> Result<String, SyntaxError> {
        let start = self.pos;
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected quoted string")),
        };
        self.bump();
        let body_start = self.pos;
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => break,
                Some(_) => {}
                None => {
                    return Err(self.error_at(start, format!("unterminated string, missing {quote}")));
                }
            }
        }
        Ok(self.line[body_start..self.pos - quote.len_utf8()].to_string())
    }

    /// Node or edge identifier: quoted string or bare run of word characters,
    /// digits, `-` and `_`.
    ///
    /// # Errors
    ///
    /// Fails when no identifier starts at the cursor.
    pub fn read_id(&mut self) -> Result<String, SyntaxError> {
        self.read_word(is_id_char, "unparseable identifier")
    }

    /// Attribute key: like [`Self::read_id`], but bare keys may contain `.`.
    ///
    /// # Errors
    ///
    /// Fails when no key starts at the cursor.
    pub fn read_key(&mut self) -> Result<String, SyntaxError> {
        self.read_word(is_bare_char, "unparseable attribute key")
    }

    fn read_word(&mut self, pred: fn(char) -> bool, message: &str) -> Result<String, SyntaxError> {
        self.skip_ws();
        match self.peek() {
            Some('"' | '\'') => {
                let start = self.pos;
                let word = self.read_quoted()?;
                if word.is_empty() {
                    Err(self.error_at(start, message))
                } else {
                    Ok(word)
                }
            }
            _ => {
                let word = self.take_while(pred);
                if word.is_empty() {
                    Err(self.error(message))
                } else {
                    Ok(word.to_string())
                }
            }
        }
    }

    /// Optional `>` between the endpoints of an edge.
    pub fn read_directed_marker(&mut self) -> bool {
        let save = self.pos;
        self.skip_ws();
        if self.eat('>') {
            true
        } else {
            self.pos = save;
            false
        }
    }

    /// Step number: the trimmed rest of the line must be `\d+(\.\d+)?`.
    ///
    /// # Errors
    ///
    /// Fails on a sign, an exponent, trailing text or an empty line.
    pub fn read_step_real(&mut self) -> Result<f64, SyntaxError> {
        self.skip_ws();
        let text = self.remainder().trim_end();
        let (int, frac) = text.split_once('.').unwrap_or((text, "0"));
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(int) || !digits(frac) {
            return Err(self.error("invalid step value"));
        }
        let step = text
            .parse::<f64>()
            .map_err(|_| self.error("invalid step value"))?;
        self.pos = self.line.len();
        Ok(step)
    }
}
