use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use tracing::debug;

use crate::token::TextLoc;

/// A fatal MAPINFO error with its source location.
///
/// Displays as two lines: the 1-based location, then the detail message.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Error parsing MAPINFO at {loc}!\n{message}")]
pub struct ParseError {
    pub loc: TextLoc,
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    /// Every parse and query failure is built here.
    pub fn at(loc: TextLoc, message: impl Into<String>, file_id: usize) -> Self {
        let message = message.into();
        debug!(line = loc.line + 1, column = loc.column + 1, %message, "MAPINFO error");
        ParseError {
            loc,
            message,
            span: loc.offset..loc.offset,
            file_id,
        }
    }

    /// Widen the highlighted source range used for rich diagnostics.
    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.loc.line as usize + 1
    }

    /// 1-based column number.
    pub fn column(&self) -> usize {
        self.loc.column as usize + 1
    }

    /// The first line of the rendered message.
    pub fn location_line(&self) -> String {
        format!("Error parsing MAPINFO at {}!", self.loc)
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(vec![self.location_line()])
    }
}
