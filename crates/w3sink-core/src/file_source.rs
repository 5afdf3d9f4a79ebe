//! Sources backed by a file.
//!
//! [`FileSource`] is the common driver interface of [`DgsSource`] and
//! [`JsonSource`]: load once with `begin`, then pull events one unit or one
//! step at a time. Loading is the only I/O; replay afterwards is synchronous.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dgs::{DgsError, DgsSource};
use crate::directive::DirectiveKind;
use crate::error::ErrorCode;
use crate::json::{JsonLogError, JsonSource};
use crate::source::Source;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error(transparent)]
    Dgs(#[from] DgsError),

    #[error(transparent)]
    Json(#[from] JsonLogError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot tell the format of {}: expected .dgs or .json", .path.display())]
    UnknownFormat { path: PathBuf },
}

impl SourceError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Dgs(err) => err.code(),
            Self::Json(err) => err.code(),
            Self::Io { .. } => ErrorCode::SourceReadFailed,
            Self::UnknownFormat { .. } => ErrorCode::UnknownSourceFormat,
        }
    }
}

/// Input format of a file source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Dgs,
    Json,
}

impl SourceFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dgs => "dgs",
            Self::Json => "json",
        }
    }

    /// Format implied by the file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Format implied by the first non-blank characters of `text`.
    #[must_use]
    pub fn sniff(text: &str) -> Option<Self> {
        let head = text.trim_start();
        if head.starts_with(crate::dgs::header::MAGIC_PREFIX) {
            Some(Self::Dgs)
        } else if head.starts_with('{') {
            Some(Self::Json)
        } else {
            None
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dgs" => Ok(Self::Dgs),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown source format '{other}': expected dgs or json")),
        }
    }
}

/// Driver interface shared by file-backed sources.
pub trait FileSource {
    fn format(&self) -> SourceFormat;

    /// Load `text`, replacing anything still queued.
    ///
    /// # Errors
    ///
    /// Header or document errors of the concrete format.
    fn begin_text(&mut self, text: &str) -> Result<(), SourceError>;

    /// Read `path` and load it.
    ///
    /// # Errors
    ///
    /// [`SourceError::Io`] when the file cannot be read, otherwise as
    /// [`FileSource::begin_text`].
    fn begin(&mut self, path: &Path) -> Result<(), SourceError> {
        let text = read_source_text(path)?;
        self.begin_text(&text)
    }

    /// Replay one unit (a line or a JSON entry). Returns whether more remain.
    ///
    /// # Errors
    ///
    /// The unit failed to decode; it is consumed and emitted nothing.
    fn next_events(&mut self) -> Result<bool, SourceError>;

    /// Replay up to and including the next step marker. Returns whether
    /// more units remain.
    ///
    /// # Errors
    ///
    /// Stops at the first unit that fails to decode.
    fn next_step(&mut self) -> Result<bool, SourceError>;

    /// Replay everything queued. Returns the number of units consumed.
    ///
    /// # Errors
    ///
    /// Stops at the first unit that fails to decode.
    fn parse_all(&mut self) -> Result<usize, SourceError>;

    /// Drop everything still queued.
    fn end(&mut self);

    fn ready(&self) -> bool;

    fn last_directive(&self) -> Option<DirectiveKind>;

    fn source(&self) -> &Source;

    fn source_mut(&mut self) -> &mut Source;
}

impl FileSource for DgsSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Dgs
    }

    fn begin_text(&mut self, text: &str) -> Result<(), SourceError> {
        Ok(self.set_data(text)?)
    }

    fn next_events(&mut self) -> Result<bool, SourceError> {
        self.parse_one_line()?;
        Ok(Self::ready(self))
    }

    fn next_step(&mut self) -> Result<bool, SourceError> {
        self.parse_until_next_step()?;
        Ok(Self::ready(self))
    }

    fn parse_all(&mut self) -> Result<usize, SourceError> {
        Ok(Self::parse_all(self)?)
    }

    fn end(&mut self) {
        Self::end(self);
    }

    fn ready(&self) -> bool {
        Self::ready(self)
    }

    fn last_directive(&self) -> Option<DirectiveKind> {
        Self::last_directive(self)
    }

    fn source(&self) -> &Source {
        Self::source(self)
    }

    fn source_mut(&mut self) -> &mut Source {
        Self::source_mut(self)
    }
}

impl FileSource for JsonSource {
    fn format(&self) -> SourceFormat {
        SourceFormat::Json
    }

    fn begin_text(&mut self, text: &str) -> Result<(), SourceError> {
        Ok(self.set_data(text)?)
    }

    fn next_events(&mut self) -> Result<bool, SourceError> {
        Ok(Self::next_events(self)?)
    }

    fn next_step(&mut self) -> Result<bool, SourceError> {
        Ok(Self::next_step(self)?)
    }

    fn parse_all(&mut self) -> Result<usize, SourceError> {
        Ok(Self::parse_all(self)?)
    }

    fn end(&mut self) {
        Self::end(self);
    }

    fn ready(&self) -> bool {
        Self::ready(self)
    }

    fn last_directive(&self) -> Option<DirectiveKind> {
        Self::last_directive(self)
    }

    fn source(&self) -> &Source {
        Self::source(self)
    }

    fn source_mut(&mut self) -> &mut Source {
        Self::source_mut(self)
    }
}

/// Read a source file as UTF-8 text.
///
/// # Errors
///
/// [`SourceError::Io`] with the offending path.
pub fn read_source_text(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Pick the format of `path`: `forced` wins, then the extension, then the
/// content of `text`.
///
/// # Errors
///
/// [`SourceError::UnknownFormat`] when nothing matches.
pub fn detect_format(
    path: &Path,
    text: &str,
    forced: Option<SourceFormat>,
) -> Result<SourceFormat, SourceError> {
    forced
        .or_else(|| SourceFormat::from_extension(path))
        .or_else(|| SourceFormat::sniff(text))
        .ok_or_else(|| SourceError::UnknownFormat {
            path: path.to_path_buf(),
        })
}

/// Open `path` as a loaded file source with the given source id.
///
/// # Errors
///
/// Read, format detection and header/document errors.
pub fn open_source(
    path: &Path,
    source_id: &str,
    forced: Option<SourceFormat>,
) -> Result<Box<dyn FileSource>, SourceError> {
    let text = read_source_text(path)?;
    let format = detect_format(path, &text, forced)?;
    debug!(path = %path.display(), %format, bytes = text.len(), "opening source");

    let mut source: Box<dyn FileSource> = match format {
        SourceFormat::Dgs => Box::new(DgsSource::new(source_id)),
        SourceFormat::Json => Box::new(JsonSource::new(source_id)),
    };
    source.begin_text(&text)?;
    Ok(source)
}
