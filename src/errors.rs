//! Diagnostics and parse errors.
//!
//! The tokenizer reports recoverable problems to a [Diagnostics] sink and
//! keeps going; only the parser (and allocation failure) produce a hard
//! [ParseError]. No entry written to the sink is ever dropped.
use std::fmt::{self, Display, Formatter};

use thiserror::Error;

use crate::alloc::AllocError;
use crate::ast::SourcePos;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match *self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        })
    }
}

/// A single severity-tagged message with a source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub pos: SourcePos,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {} @ {}", self.severity, self.message, self.pos)
    }
}

/// A write-only sink of [Diagnostic]s.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[inline]
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn report(&mut self, severity: Severity, pos: SourcePos, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity,
            message: message.into(),
            pos,
        });
    }

    #[inline]
    pub fn error(&mut self, pos: SourcePos, message: impl Into<String>) {
        self.report(Severity::Error, pos, message);
    }

    #[inline]
    pub fn warning(&mut self, pos: SourcePos, message: impl Into<String>) {
        self.report(Severity::Warning, pos, message);
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A hard failure of the expression parser.
///
/// The parser is total: any finite token sequence either yields a tree or
/// one of these, without unbounded consumption.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, but got {actual} @ {pos}")]
    UnexpectedToken {
        expected: String,
        actual: String,
        pos: SourcePos,
    },
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEof { expected: String },
    #[error("Allocation failed")]
    AllocationFailed(#[from] AllocError),
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sink_preserves_every_entry() {
        let mut diagnostics = Diagnostics::new();
        let pos = SourcePos { line: 3, column: 7 };
        diagnostics.warning(pos, "odd spacing");
        diagnostics.error(pos, "identifier too long");
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_errors());
        let rendered: Vec<String> = diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "warning: odd spacing @ 3:7".to_string(),
                "error: identifier too long @ 3:7".to_string(),
            ]
        );
    }

    #[test]
    fn alloc_failure_converts() {
        let err: ParseError = AllocError.into();
        assert_eq!(err, ParseError::AllocationFailed(AllocError));
        assert_eq!(err.to_string(), "Allocation failed");
    }
}
