//! Recursive-descent parser for guest JavaScript (script goal).
//!
//! The grammar covers what guest scripts use in practice: ES2022 statements
//! and expressions, classes with private names, destructuring, async
//! functions and generators, optional chaining, templates and `import()`.
//! Static `import`/`export` declarations are not part of the script goal.

pub mod error;
pub mod expr;
pub mod guards;
pub mod pattern;
pub mod recovery;
pub mod stmt;

pub use error::{ParseError, ParseErrorKind};

use crate::parser::ast::{Identifier, Program};
use crate::parser::interner::{Interner, Symbol};
use crate::parser::lexer::{LexError, Lexer};
use crate::parser::token::{Span, Token};

/// Contextual keywords, interned once per parse.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContextualNames {
    pub async_: Symbol,
    pub await_: Symbol,
    pub yield_: Symbol,
    pub let_: Symbol,
    pub of: Symbol,
    pub get: Symbol,
    pub set: Symbol,
    pub static_: Symbol,
    pub target: Symbol,
    pub constructor: Symbol,
}

impl ContextualNames {
    fn intern(interner: &mut Interner) -> Self {
        Self {
            async_: interner.intern("async"),
            await_: interner.intern("await"),
            yield_: interner.intern("yield"),
            let_: interner.intern("let"),
            of: interner.intern("of"),
            get: interner.intern("get"),
            set: interner.intern("set"),
            static_: interner.intern("static"),
            target: interner.intern("target"),
            constructor: interner.intern("constructor"),
        }
    }
}

/// Everything a successful parse produces.
///
/// The token stream is kept because the transformer checks every identifier
/// token, including those the tree does not retain as nodes.
#[derive(Debug, Clone)]
pub struct ParsedScript {
    pub program: Program,
    pub tokens: Vec<(Token, Span)>,
    pub interner: Interner,
}

pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(Token, Span)>,
    position: usize,
    interner: Interner,
    pub(crate) names: ContextualNames,
    /// Current recursion depth, checked against `guards::MAX_PARSE_DEPTH`.
    pub(crate) depth: usize,
    /// Inside an async function body: `await` is an operator.
    pub(crate) in_async: bool,
    /// Inside a generator body: `yield` is an operator.
    pub(crate) in_generator: bool,
    /// Parsing a `for` head: a bare `in` ends the expression.
    pub(crate) no_in: bool,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// Create a new parser, lexing `source` up front.
    pub fn new(source: &'a str) -> Result<Self, Vec<LexError>> {
        let (tokens, mut interner) = Lexer::new(source).tokenize()?;
        let names = ContextualNames::intern(&mut interner);
        Ok(Self {
            source,
            tokens,
            position: 0,
            interner,
            names,
            depth: 0,
            in_async: false,
            in_generator: false,
            no_in: false,
            errors: Vec::new(),
        })
    }

    /// Parse the whole script.
    pub fn parse(self) -> Result<(Program, Interner), Vec<ParseError>> {
        self.parse_script()
            .map(|script| (script.program, script.interner))
    }

    /// Parse the whole script, keeping the token stream.
    ///
    /// After an error the parser resynchronises at the next statement
    /// boundary so that one call reports as many errors as it can.
    pub fn parse_script(mut self) -> Result<ParsedScript, Vec<ParseError>> {
        let mut statements = Vec::new();

        while !self.at_eof() {
            let before = self.position;
            match stmt::parse_statement(&mut self) {
                Ok(statement) => statements.push(statement),
                Err(e) => {
                    self.errors.push(e);
                    recovery::sync_to_statement_boundary(&mut self);
                    if self.position == before {
                        self.advance();
                    }
                }
            }
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let end = self.current_span();
        let span = Span::new(0, end.end, 1, 1);
        Ok(ParsedScript {
            program: Program::new(statements, span),
            tokens: self.tokens,
            interner: self.interner,
        })
    }

    /// Lex and parse in one step, reporting lexical errors as parse errors.
    pub fn parse_source(source: &'a str) -> Result<ParsedScript, Vec<ParseError>> {
        let parser = Self::new(source)
            .map_err(|errors| errors.into_iter().map(ParseError::from).collect::<Vec<_>>())?;
        parser.parse_script()
    }

    // ========================================================================
    // Token access
    // ========================================================================

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub(crate) fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    pub(crate) fn resolve(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    pub fn current(&self) -> &Token {
        self.tokens
            .get(self.position)
            .map(|(t, _)| t)
            .unwrap_or(&Token::Eof)
    }

    pub fn current_span(&self) -> Span {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map(|(_, s)| *s)
            .unwrap_or_else(|| Span::new(0, 0, 1, 1))
    }

    /// Token after the current one.
    pub fn peek(&self) -> &Token {
        self.peek_at(1)
    }

    pub fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.position + offset)
            .map(|(t, _)| t)
            .unwrap_or(&Token::Eof)
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn token_at(&self, index: usize) -> &Token {
        self.tokens.get(index).map(|(t, _)| t).unwrap_or(&Token::Eof)
    }

    pub fn previous_span(&self) -> Span {
        self.position
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|(_, s)| *s)
            .unwrap_or_else(|| self.current_span())
    }

    /// Advance and return the consumed token.
    pub fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len().saturating_sub(1) {
            self.position += 1;
        }
        token
    }

    pub fn at_eof(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    /// Compare the current token's kind, ignoring payloads.
    pub fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    /// Consume the current token if it matches.
    pub fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token, returning its span.
    pub fn expect(&mut self, token: Token) -> Result<Span, ParseError> {
        if self.check(&token) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.unexpected_token(&token.to_string()))
        }
    }

    /// Whether a line terminator separates the previous token from the
    /// current one (comments included).
    pub fn newline_before(&self) -> bool {
        self.newline_before_token(self.position)
    }

    /// Whether a line terminator precedes the token at `index`.
    pub(crate) fn newline_before_token(&self, index: usize) -> bool {
        let (Some(prev), Some(cur)) = (
            index.checked_sub(1).and_then(|i| self.tokens.get(i)),
            self.tokens.get(index),
        ) else {
            return false;
        };
        let (prev_end, cur_start) = (prev.1.end, cur.1.start);
        if prev_end >= cur_start {
            return false;
        }
        self.source[prev_end..cur_start]
            .contains(|c: char| matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}'))
    }

    /// Consume a statement terminator, applying automatic semicolon insertion.
    pub fn consume_semicolon(&mut self) -> Result<(), ParseError> {
        if self.eat(&Token::Semicolon) {
            return Ok(());
        }
        if self.check(&Token::RightBrace) || self.at_eof() || self.newline_before() {
            return Ok(());
        }
        Err(self.unexpected_token(";"))
    }

    /// Current token is the contextual keyword `name`.
    pub(crate) fn check_name(&self, name: Symbol) -> bool {
        matches!(self.current(), Token::Identifier(s) if *s == name)
    }

    /// Span from `start` through the previous token.
    pub fn finish(&self, start: &Span) -> Span {
        self.combine_spans(start, &self.previous_span())
    }

    pub fn combine_spans(&self, start: &Span, end: &Span) -> Span {
        Span::new(start.start, end.end.max(start.end), start.line, start.column)
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Parse a binding or reference identifier.
    pub(crate) fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        match self.current().clone() {
            Token::Identifier(name) => {
                let span = self.current_span();
                self.advance();
                Ok(Identifier::new(name, span))
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// Parse a property name after `.`: any identifier or reserved word.
    pub(crate) fn parse_identifier_name(&mut self) -> Result<Identifier, ParseError> {
        let span = self.current_span();
        match self.current().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(Identifier::new(name, span))
            }
            tok => match tok.keyword_text() {
                Some(word) => {
                    let name = self.intern(word);
                    self.advance();
                    Ok(Identifier::new(name, span))
                }
                None => Err(self.unexpected_token("property name")),
            },
        }
    }

    // ========================================================================
    // Errors
    // ========================================================================

    pub fn unexpected_token(&self, expected: &str) -> ParseError {
        let found = self.current().clone();
        if matches!(found, Token::Eof) {
            ParseError::unexpected_eof(expected, self.current_span())
        } else {
            ParseError::unexpected_token(expected, self.describe(&found), self.current_span())
        }
    }

    fn describe(&self, token: &Token) -> String {
        match token {
            Token::Identifier(sym) => format!("identifier '{}'", self.resolve(*sym)),
            Token::String(_) => "string literal".to_string(),
            Token::Number(n) => format!("number {}", n),
            other => format!("'{}'", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_before_sees_through_comments() {
        let mut parser = Parser::new("a /* x\n */ b").expect("should lex");
        parser.advance();
        assert!(parser.newline_before());
    }

    #[test]
    fn test_check_ignores_payload() {
        let parser = Parser::new("foo").expect("should lex");
        let other = Token::Identifier(parser.names.of);
        assert!(parser.check(&other));
    }

    #[test]
    fn test_errors_are_collected_across_statements() {
        let errors = Parser::parse_source("let = ;\nvar ok = 1;\n)").expect_err("should fail");
        assert!(errors.len() >= 2);
    }
}
