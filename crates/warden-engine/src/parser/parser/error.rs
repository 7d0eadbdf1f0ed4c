//! Parse errors and their diagnostic rendering.

use crate::parser::lexer::LexError;
use crate::parser::token::Span;
use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::Buffer;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnexpectedToken,
    UnexpectedEof,
    InvalidAssignmentTarget,
    InvalidSyntax,
    /// The lexer rejected the input.
    Lexical,
    ParserLimitExceeded,
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("SyntaxError: {message} ({}:{})", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn unexpected_token(expected: &str, found: String, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedToken,
            format!("Unexpected {}, expected {}", found, expected),
            span,
        )
    }

    pub fn unexpected_eof(expected: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnexpectedEof,
            format!("Unexpected end of input, expected {}", expected),
            span,
        )
    }

    pub fn invalid_assignment_target(span: Span) -> Self {
        Self::new(
            ParseErrorKind::InvalidAssignmentTarget,
            "Invalid left-hand side in assignment",
            span,
        )
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParseErrorKind::InvalidSyntax, message, span)
    }

    pub fn parser_limit_exceeded(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParseErrorKind::ParserLimitExceeded, message, span)
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Render a diagnostic with source context, without colour.
    pub fn render(&self, source: &str, filename: &str) -> String {
        let file = SimpleFile::new(filename, source);
        let end = self.span.end.max(self.span.start).min(source.len());
        let start = self.span.start.min(end);

        let mut diagnostic = Diagnostic::error()
            .with_message(format!("SyntaxError: {}", self.message))
            .with_labels(vec![Label::primary((), start..end)]);
        if let Some(suggestion) = &self.suggestion {
            diagnostic = diagnostic.with_notes(vec![format!("help: {}", suggestion)]);
        }

        let mut buffer = Buffer::no_color();
        let config = term::Config::default();
        match term::emit(&mut buffer, &config, &file, &diagnostic) {
            Ok(()) => String::from_utf8_lossy(buffer.as_slice()).into_owned(),
            Err(_) => format!("{}:{}", filename, self),
        }
    }
}

impl From<LexError> for ParseError {
    fn from(error: LexError) -> Self {
        let mut parse_error = Self::new(ParseErrorKind::Lexical, error.description(), *error.span());
        parse_error.suggestion = error.hint();
        parse_error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_filename_and_message() {
        let source = "let x = ;";
        let error = ParseError::unexpected_token("expression", "';'".to_string(), Span::new(8, 9, 1, 9))
            .with_suggestion("remove the stray semicolon");
        let rendered = error.render(source, "guest.js");

        assert!(rendered.contains("guest.js"));
        assert!(rendered.contains("Unexpected ';'"));
        assert!(rendered.contains("help: remove the stray semicolon"));
    }

    #[test]
    fn test_display_mentions_position() {
        let error = ParseError::invalid_syntax("Illegal break", Span::new(0, 5, 3, 7));
        assert_eq!(error.to_string(), "SyntaxError: Illegal break (3:7)");
    }
}
