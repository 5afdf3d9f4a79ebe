//! DGS stream driver.
//!
//! [`DgsSource`] holds the pending directive lines of one DGS text and
//! replays them through its own [`Source`]. Lines are kept in reverse order
//! so the next one is popped from the end of the vector.
//!
//! Each call is all-or-nothing per line: the line is decoded into a
//! [`Directive`](crate::directive::Directive) first and only then emitted.
//! A line that fails to decode is consumed and produces no event; the lines
//! after it stay queued.

use tracing::debug;

use super::DgsError;
use super::header::{Header, PendingLine, validate_header};
use super::line::parse_line;
use crate::directive::DirectiveKind;
use crate::source::{SinkId, SinkRef, Source};

#[derive(Debug)]
pub struct DgsSource {
    source: Source,
    header: Option<Header>,
    lines: Vec<PendingLine>,
    last_directive: Option<DirectiveKind>,
    consumed: usize,
}

impl DgsSource {
    /// Empty parser; call [`Self::set_data`] before parsing.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            source: Source::new(id),
            header: None,
            lines: Vec::new(),
            last_directive: None,
            consumed: 0,
        }
    }

    /// Parser loaded with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`DgsError::MalformedHeader`] if the header is invalid.
    pub fn from_text(id: impl Into<String>, text: &str) -> Result<Self, DgsError> {
        let mut dgs = Self::new(id);
        dgs.set_data(text)?;
        Ok(dgs)
    }

    /// Validate the header of `text` and queue its directive lines,
    /// replacing anything still queued.
    ///
    /// # Errors
    ///
    /// Returns [`DgsError::MalformedHeader`]; the queue is left empty.
    pub fn set_data(&mut self, text: &str) -> Result<(), DgsError> {
        self.lines.clear();
        self.header = None;
        self.last_directive = None;
        self.consumed = 0;

        let (header, mut lines) = validate_header(text)?;
        debug!(
            source = self.source.id(),
            version = header.version,
            name = %header.name,
            lines = lines.len(),
            "dgs data loaded"
        );
        lines.reverse();
        self.lines = lines;
        self.header = Some(header);
        Ok(())
    }

    /// Drop everything still queued.
    pub fn end(&mut self) {
        self.lines.clear();
        self.header = None;
        self.last_directive = None;
    }

    /// Whether at least one directive line is queued.
    #[must_use]
    pub fn ready(&self) -> bool {
        !self.lines.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }

    /// Lines consumed since the last [`Self::set_data`], failed ones included.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    #[must_use]
    pub const fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// Kind of the last directive that parsed successfully.
    #[must_use]
    pub const fn last_directive(&self) -> Option<DirectiveKind> {
        self.last_directive
    }

    /// 1-based line number of the next queued line.
    #[must_use]
    pub fn next_line_number(&self) -> Option<usize> {
        self.lines.last().map(|l| l.number)
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

    /// Pop and replay one line.
    ///
    /// Returns the directive kind, or `None` when nothing is queued.
    ///
    /// # Errors
    ///
    /// [`DgsError::Syntax`] or [`DgsError::UnknownDirective`]. The failing
    /// line is consumed and nothing is emitted for it.
    pub fn parse_one_line(&mut self) -> Result<Option<DirectiveKind>, DgsError> {
        let (line, directive) = loop {
            let Some(line) = self.lines.pop() else {
                return Ok(None);
            };
            self.consumed += 1;
            let parsed = parse_line(&line.text).map_err(|e| e.at_line(line.number))?;
            if let Some(directive) = parsed {
                break (line, directive);
            }
        };
        let kind = directive.kind();
        let emitted = directive.emit(&mut self.source);
        debug!(
            source = self.source.id(),
            line = line.number,
            directive = %kind,
            events = emitted,
            "dgs directive"
        );
        self.last_directive = Some(kind);
        Ok(Some(kind))
    }

    /// Replay lines up to and including the next `st` line, or until the
    /// queue is empty. Returns whether any line was consumed.
    ///
    /// # Errors
    ///
    /// Stops at the first failing line; see [`Self::parse_one_line`].
    pub fn parse_until_next_step(&mut self) -> Result<bool, DgsError> {
        let mut consumed_any = false;
        while let Some(kind) = self.parse_one_line()? {
            consumed_any = true;
            if kind == DirectiveKind::Step {
                break;
            }
        }
        Ok(consumed_any)
    }

    /// Replay every queued line. Returns the number of lines consumed.
    ///
    /// # Errors
    ///
    /// Stops at the first failing line; see [`Self::parse_one_line`].
    pub fn parse_all(&mut self) -> Result<usize, DgsError> {
        let mut count = 0;
        while self.parse_one_line()?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::sink::EventLog;
    use crate::source::shared;

    const STEPPED: &str = "DGS004\nsteps 0 0\nan A\nst 1\nan B\nae AB A B\nst 2\ncn A x:1\n";

    fn loaded(text: &str) -> (DgsSource, std::rc::Rc<std::cell::RefCell<EventLog>>) {
        let mut dgs = DgsSource::from_text("dgs", text).expect("header");
        let log = shared(EventLog::new());
        dgs.add_sink(log.clone());
        (dgs, log)
    }

    #[test]
    fn empty_queue_yields_none() {
        let mut dgs = DgsSource::new("dgs");
        assert!(!dgs.ready());
        assert_eq!(dgs.parse_one_line(), Ok(None));
        assert_eq!(dgs.parse_until_next_step(), Ok(false));
        assert_eq!(dgs.parse_all(), Ok(0));
    }

    #[test]
    fn lines_are_replayed_in_file_order() {
        let (mut dgs, log) = loaded("DGS004\ng 0 0\nan A\nan B\ndn A\n");
        assert_eq!(dgs.remaining(), 3);
        assert_eq!(dgs.next_line_number(), Some(3));
        assert_eq!(dgs.parse_all(), Ok(3));
        let nodes: Vec<_> = log
            .borrow()
            .payloads()
            .map(|e| match e {
                Event::NodeAdded { node } => format!("+{node}"),
                Event::NodeRemoved { node } => format!("-{node}"),
                other => other.kind_name().to_string(),
            })
            .collect();
        assert_eq!(nodes, vec!["+A", "+B", "-A"]);
        assert_eq!(dgs.last_directive(), Some(DirectiveKind::DeleteNode));
    }

    #[test]
    fn stepwise_replay() {
        let (mut dgs, log) = loaded(STEPPED);

        assert_eq!(dgs.parse_until_next_step(), Ok(true));
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(dgs.last_directive(), Some(DirectiveKind::Step));

        assert_eq!(dgs.parse_until_next_step(), Ok(true));
        assert_eq!(log.borrow().len(), 5);

        assert_eq!(dgs.parse_until_next_step(), Ok(true));
        assert_eq!(log.borrow().len(), 6);
        assert!(!dgs.ready());

        assert_eq!(dgs.parse_until_next_step(), Ok(false));
    }

    #[test]
    fn failing_line_is_consumed_and_emits_nothing() {
        let (mut dgs, log) = loaded("DGS004\ng 0 0\nan A\nan B k:{1,2\nan C\n");
        dgs.parse_one_line().expect("an A");
        let err = dgs.parse_one_line().unwrap_err();
        assert!(matches!(err, DgsError::Syntax { line: 4, .. }));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(dgs.remaining(), 1);
        assert_eq!(dgs.last_directive(), Some(DirectiveKind::AddNode));

        assert_eq!(dgs.parse_one_line(), Ok(Some(DirectiveKind::AddNode)));
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(log.borrow().events()[1].time_id, 1);
        assert_eq!(dgs.consumed(), 3);
    }

    #[test]
    fn set_data_resets_queue() {
        let (mut dgs, _log) = loaded("DGS004\ng 0 0\nan A\nan B\n");
        dgs.parse_one_line().expect("an A");
        assert!(dgs.set_data("DGSxxx\n").is_err());
        assert!(!dgs.ready());
        assert!(dgs.header().is_none());

        dgs.set_data("DGS003\nh 1 0\ncl\n").expect("valid");
        assert_eq!(dgs.header().map(|h| h.name.as_str()), Some("h"));
        assert_eq!(dgs.parse_all(), Ok(1));
    }
}
