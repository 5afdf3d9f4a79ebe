//! DGS text format: parser and writer.
//!
//! ```text
//! DGS004
//! my-graph 0 0
//! an A label:"first" ui.class:important
//! an B xy:1.5,2
//! ae AB A > B weight:3
//! st 1
//! cn A -label
//! ```
//!
//! The first two lines are the header (magic `DGS00N`, then stream name and
//! two advisory counts). Every other non-blank, non-`#` line is one
//! directive. [`DgsSource`] drives the parse and emits events through its
//! [`Source`](crate::source::Source); [`DgsWriter`] is a sink that writes
//! events back out as DGS text.

pub mod cursor;
pub mod header;
pub mod line;
pub mod stream;
pub mod value;
pub mod writer;

use thiserror::Error;

use crate::error::ErrorCode;

pub use header::{Header, PendingLine, validate_header};
pub use line::parse_line;
pub use stream::DgsSource;
pub use writer::DgsWriter;

/// Errors raised while parsing a DGS stream. All are fatal to the call
/// that produced them; `line` is 1-based in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DgsError {
    #[error("invalid dgs header at line {line}: '{found}'")]
    MalformedHeader { line: usize, found: String },

    #[error("syntax error at line {line}: {message} (near '{remainder}')")]
    Syntax {
        line: usize,
        message: String,
        remainder: String,
    },

    #[error("unknown directive '{token}' at line {line}")]
    UnknownDirective { line: usize, token: String },
}

impl DgsError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedHeader { .. } => ErrorCode::MalformedHeader,
            Self::Syntax { .. } => ErrorCode::SyntaxError,
            Self::UnknownDirective { .. } => ErrorCode::UnknownDirective,
        }
    }

    /// 1-based line number the error refers to.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::MalformedHeader { line, .. }
            | Self::Syntax { line, .. }
            | Self::UnknownDirective { line, .. } => *line,
        }
    }
}

/// A syntax error inside one line, before the line number is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (near '{remainder}')")]
pub struct SyntaxError {
    pub message: String,
    /// Unconsumed text of the line at the point of failure.
    pub remainder: String,
}

/// Failure to decode a single directive line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("unknown directive '{0}'")]
    UnknownDirective(String),
}

impl LineError {
    /// Attach the source line number.
    #[must_use]
    pub fn at_line(self, line: usize) -> DgsError {
        match self {
            Self::Syntax(SyntaxError { message, remainder }) => DgsError::Syntax {
                line,
                message,
                remainder,
            },
            Self::UnknownDirective(token) => DgsError::UnknownDirective { line, token },
        }
    }
}
