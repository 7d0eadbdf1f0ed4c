//! Lexer for guest JavaScript.
//!
//! Regular tokens are recognised by a logos-generated automaton. The parts of
//! the grammar a regular automaton cannot decide on its own are handled by
//! the driver loop around it:
//! - comments and line terminators (including U+2028/U+2029),
//! - regular-expression literals, which depend on the previous token,
//! - template literals, which nest through `${ ... }` substitutions,
//! - identifiers containing non-ASCII characters or `\u` escapes.
//!
//! Every token carries a [`Span`] with byte offsets into the original source.
//! The transformer splices text at those offsets, so spans always refer to
//! the unmodified input.

use crate::parser::interner::Interner;
use crate::parser::token::{Span, TemplateChunk, TemplatePosition, Token};
use logos::Logos;
use unicode_xid::UnicodeXID;

/// Logos-based token enum for the regular part of the grammar.
#[derive(Logos, Debug, Clone, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n\f\v]+", logos::skip)]
    Whitespace,

    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("for")]
    For,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("with")]
    With,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("throw")]
    Throw,
    #[token("import")]
    Import,
    #[token("export")]
    Export,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("extends")]
    Extends,
    #[token("typeof")]
    Typeof,
    #[token("instanceof")]
    Instanceof,
    #[token("in")]
    In,
    #[token("delete")]
    Delete,
    #[token("void")]
    Void,
    #[token("debugger")]
    Debugger,
    #[token("enum")]
    Enum,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,

    #[regex(r"#[a-zA-Z_$][a-zA-Z0-9_$]*")]
    PrivateName,

    #[regex(r"0[xX][0-9a-fA-F](_?[0-9a-fA-F])*n?")]
    #[regex(r"0[oO][0-7](_?[0-7])*n?")]
    #[regex(r"0[bB][01](_?[01])*n?")]
    #[regex(r"[0-9](_?[0-9])*n")]
    #[regex(r"[0-9](_?[0-9])*(\.([0-9](_?[0-9])*)?)?([eE][+-]?[0-9](_?[0-9])*)?")]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?")]
    Numeric,

    #[regex(r#""([^"\\\n\r]|\\(.|\r\n|\n|\r))*""#)]
    #[regex(r"'([^'\\\n\r]|\\(.|\r\n|\n|\r))*'")]
    StringLiteral,

    #[token(">>>=")]
    GreaterGreaterGreaterEqual,
    #[token("===")]
    EqualEqualEqual,
    #[token("!==")]
    BangEqualEqual,
    #[token(">>>")]
    GreaterGreaterGreater,
    #[token("**=")]
    StarStarEqual,
    #[token("<<=")]
    LessLessEqual,
    #[token(">>=")]
    GreaterGreaterEqual,
    #[token("&&=")]
    AmpAmpEqual,
    #[token("||=")]
    PipePipeEqual,
    #[token("??=")]
    QuestionQuestionEqual,
    #[token("...")]
    DotDotDot,
    #[token("**")]
    StarStar,
    #[token("==")]
    EqualEqual,
    #[token("!=")]
    BangEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("??")]
    QuestionQuestion,
    #[token("?.")]
    QuestionDot,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("<<")]
    LessLess,
    #[token(">>")]
    GreaterGreater,
    #[token("=>")]
    Arrow,
    #[token("+=")]
    PlusEqual,
    #[token("-=")]
    MinusEqual,
    #[token("*=")]
    StarEqual,
    #[token("/=")]
    SlashEqual,
    #[token("%=")]
    PercentEqual,
    #[token("&=")]
    AmpEqual,
    #[token("|=")]
    PipeEqual,
    #[token("^=")]
    CaretEqual,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("=")]
    Equal,
    #[token("?")]
    Question,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
}

impl LogosToken {
    /// Tokens spelled like identifiers, which a following non-ASCII or
    /// escaped identifier character extends into a longer identifier.
    fn is_word(&self) -> bool {
        self.keyword().is_some() || matches!(self, LogosToken::Identifier)
    }

    fn keyword(&self) -> Option<Token> {
        let tok = match self {
            LogosToken::Var => Token::Var,
            LogosToken::Const => Token::Const,
            LogosToken::Function => Token::Function,
            LogosToken::Class => Token::Class,
            LogosToken::If => Token::If,
            LogosToken::Else => Token::Else,
            LogosToken::Switch => Token::Switch,
            LogosToken::Case => Token::Case,
            LogosToken::Default => Token::Default,
            LogosToken::For => Token::For,
            LogosToken::While => Token::While,
            LogosToken::Do => Token::Do,
            LogosToken::Break => Token::Break,
            LogosToken::Continue => Token::Continue,
            LogosToken::Return => Token::Return,
            LogosToken::With => Token::With,
            LogosToken::Try => Token::Try,
            LogosToken::Catch => Token::Catch,
            LogosToken::Finally => Token::Finally,
            LogosToken::Throw => Token::Throw,
            LogosToken::Import => Token::Import,
            LogosToken::Export => Token::Export,
            LogosToken::New => Token::New,
            LogosToken::This => Token::This,
            LogosToken::Super => Token::Super,
            LogosToken::Extends => Token::Extends,
            LogosToken::Typeof => Token::Typeof,
            LogosToken::Instanceof => Token::Instanceof,
            LogosToken::In => Token::In,
            LogosToken::Delete => Token::Delete,
            LogosToken::Void => Token::Void,
            LogosToken::Debugger => Token::Debugger,
            LogosToken::Enum => Token::Enum,
            LogosToken::True => Token::True,
            LogosToken::False => Token::False,
            LogosToken::Null => Token::Null,
            _ => return None,
        };
        Some(tok)
    }

    fn punctuator(&self) -> Option<Token> {
        let tok = match self {
            LogosToken::GreaterGreaterGreaterEqual => Token::GreaterGreaterGreaterEqual,
            LogosToken::EqualEqualEqual => Token::EqualEqualEqual,
            LogosToken::BangEqualEqual => Token::BangEqualEqual,
            LogosToken::GreaterGreaterGreater => Token::GreaterGreaterGreater,
            LogosToken::StarStarEqual => Token::StarStarEqual,
            LogosToken::LessLessEqual => Token::LessLessEqual,
            LogosToken::GreaterGreaterEqual => Token::GreaterGreaterEqual,
            LogosToken::AmpAmpEqual => Token::AmpAmpEqual,
            LogosToken::PipePipeEqual => Token::PipePipeEqual,
            LogosToken::QuestionQuestionEqual => Token::QuestionQuestionEqual,
            LogosToken::DotDotDot => Token::DotDotDot,
            LogosToken::StarStar => Token::StarStar,
            LogosToken::EqualEqual => Token::EqualEqual,
            LogosToken::BangEqual => Token::BangEqual,
            LogosToken::LessEqual => Token::LessEqual,
            LogosToken::GreaterEqual => Token::GreaterEqual,
            LogosToken::AmpAmp => Token::AmpAmp,
            LogosToken::PipePipe => Token::PipePipe,
            LogosToken::QuestionQuestion => Token::QuestionQuestion,
            LogosToken::QuestionDot => Token::QuestionDot,
            LogosToken::PlusPlus => Token::PlusPlus,
            LogosToken::MinusMinus => Token::MinusMinus,
            LogosToken::LessLess => Token::LessLess,
            LogosToken::GreaterGreater => Token::GreaterGreater,
            LogosToken::Arrow => Token::Arrow,
            LogosToken::PlusEqual => Token::PlusEqual,
            LogosToken::MinusEqual => Token::MinusEqual,
            LogosToken::StarEqual => Token::StarEqual,
            LogosToken::SlashEqual => Token::SlashEqual,
            LogosToken::PercentEqual => Token::PercentEqual,
            LogosToken::AmpEqual => Token::AmpEqual,
            LogosToken::PipeEqual => Token::PipeEqual,
            LogosToken::CaretEqual => Token::CaretEqual,
            LogosToken::Plus => Token::Plus,
            LogosToken::Minus => Token::Minus,
            LogosToken::Star => Token::Star,
            LogosToken::Slash => Token::Slash,
            LogosToken::Percent => Token::Percent,
            LogosToken::Bang => Token::Bang,
            LogosToken::Tilde => Token::Tilde,
            LogosToken::Less => Token::Less,
            LogosToken::Greater => Token::Greater,
            LogosToken::Amp => Token::Amp,
            LogosToken::Pipe => Token::Pipe,
            LogosToken::Caret => Token::Caret,
            LogosToken::Equal => Token::Equal,
            LogosToken::Question => Token::Question,
            LogosToken::Dot => Token::Dot,
            LogosToken::Colon => Token::Colon,
            LogosToken::LeftParen => Token::LeftParen,
            LogosToken::RightParen => Token::RightParen,
            LogosToken::LeftBrace => Token::LeftBrace,
            LogosToken::RightBrace => Token::RightBrace,
            LogosToken::LeftBracket => Token::LeftBracket,
            LogosToken::RightBracket => Token::RightBracket,
            LogosToken::Semicolon => Token::Semicolon,
            LogosToken::Comma => Token::Comma,
            _ => return None,
        };
        Some(tok)
    }
}

/// Lexer error types.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    UnexpectedCharacter { char: char, span: Span },
    UnterminatedString { span: Span },
    UnterminatedTemplate { span: Span },
    UnterminatedRegExp { span: Span },
    UnterminatedComment { span: Span },
    InvalidNumber { text: String, span: Span },
    InvalidEscape { escape: String, span: Span },
}

/// Main lexer structure.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    tokens: Vec<(Token, Span)>,
    errors: Vec<LexError>,
    interner: Interner,
    /// One entry per open `{` or `${`; `true` marks a template substitution.
    braces: Vec<bool>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
            interner: Interner::with_capacity(256),
            braces: Vec::new(),
        }
    }

    /// Format all errors with source context
    pub fn format_errors(errors: &[LexError], source: &str) -> String {
        errors
            .iter()
            .map(|e| e.format_with_source(source))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn tokenize(mut self) -> Result<(Vec<(Token, Span)>, Interner), Vec<LexError>> {
        self.skip_hashbang();

        loop {
            if let Err(err) = self.skip_trivia() {
                self.errors.push(err);
                break;
            }
            if self.pos >= self.source.len() {
                break;
            }

            let bytes = self.source.as_bytes();
            let byte = bytes[self.pos];

            if byte == b'`' {
                self.lex_template(TemplateStart::Backtick);
                continue;
            }
            if byte == b'}' && self.braces.last() == Some(&true) {
                self.braces.pop();
                self.lex_template(TemplateStart::Substitution);
                continue;
            }
            if byte == b'/' && Token::allows_regexp_after(self.tokens.last().map(|(t, _)| t)) {
                self.lex_regexp();
                continue;
            }
            if byte == b'\\' || byte >= 0x80 {
                self.lex_unicode_word();
                continue;
            }

            self.lex_regular();
        }

        let eof_span = Span::new(self.source.len(), self.source.len(), self.line, self.column);
        self.tokens.push((Token::Eof, eof_span));

        if self.errors.is_empty() {
            Ok((self.tokens, self.interner))
        } else {
            Err(self.errors)
        }
    }

    // ========================================================================
    // Position bookkeeping
    // ========================================================================

    fn span_to(&self, end: usize) -> Span {
        Span::new(self.pos, end, self.line, self.column)
    }

    /// Move to `end`, updating line and column for the consumed text.
    fn bump_to(&mut self, end: usize) {
        let consumed = &self.source[self.pos..end];
        let mut chars = consumed.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' if chars.peek() == Some(&'\n') => {}
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => {
                    self.line += 1;
                    self.column = 1;
                }
                _ => self.column += 1,
            }
        }
        self.pos = end;
    }

    fn push(&mut self, token: Token, end: usize) {
        let span = self.span_to(end);
        self.tokens.push((token, span));
        self.bump_to(end);
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    fn skip_hashbang(&mut self) {
        if self.source.starts_with("#!") {
            let end = self.source.find('\n').unwrap_or(self.source.len());
            self.bump_to(end);
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        while self.pos < self.source.len() {
            let rest = &self.source[self.pos..];
            let Some(c) = rest.chars().next() else { break };

            if is_js_whitespace(c) || is_line_terminator(c) {
                self.bump_to(self.pos + c.len_utf8());
            } else if rest.starts_with("//") {
                let len = rest
                    .find(|ch: char| is_line_terminator(ch))
                    .unwrap_or(rest.len());
                self.bump_to(self.pos + len);
            } else if rest.starts_with("/*") {
                match rest[2..].find("*/") {
                    Some(end) => self.bump_to(self.pos + 2 + end + 2),
                    None => {
                        let span = self.span_to(self.source.len());
                        self.bump_to(self.source.len());
                        return Err(LexError::UnterminatedComment { span });
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Regular tokens
    // ========================================================================

    fn lex_regular(&mut self) {
        let rest = &self.source[self.pos..];
        let mut logos_lexer = LogosToken::lexer(rest);

        let Some(result) = logos_lexer.next() else {
            self.bump_to(self.source.len());
            return;
        };
        let range = logos_lexer.span();
        let start = self.pos + range.start;
        let end = self.pos + range.end;
        if start != self.pos {
            // Only the whitespace rule can skip; trivia was consumed already.
            self.bump_to(start);
        }

        match result {
            Ok(tok) if tok.is_word() && self.continues_word(end) => {
                self.lex_unicode_word();
            }
            Ok(LogosToken::Identifier) => {
                let sym = self.interner.intern(&self.source[start..end]);
                self.push(Token::Identifier(sym), end);
            }
            Ok(LogosToken::PrivateName) => {
                let sym = self.interner.intern(&self.source[start + 1..end]);
                self.push(Token::PrivateName(sym), end);
            }
            Ok(LogosToken::Numeric) => self.lex_numeric(start, end),
            Ok(LogosToken::StringLiteral) => self.lex_string(start, end),
            Ok(LogosToken::QuestionDot)
                if self.source.as_bytes().get(end).is_some_and(u8::is_ascii_digit) =>
            {
                // `a?.5:b` is a conditional, not optional chaining.
                self.push(Token::Question, start + 1);
            }
            Ok(LogosToken::LeftBrace) => {
                self.braces.push(false);
                self.push(Token::LeftBrace, end);
            }
            Ok(LogosToken::RightBrace) => {
                self.braces.pop();
                self.push(Token::RightBrace, end);
            }
            Ok(tok) => {
                if let Some(keyword) = tok.keyword() {
                    self.push(keyword, end);
                } else if let Some(punct) = tok.punctuator() {
                    self.push(punct, end);
                } else {
                    self.bump_to(end);
                }
            }
            Err(_) => {
                let rest = &self.source[start..];
                if rest.starts_with('"') || rest.starts_with('\'') {
                    let span = self.span_to(self.source.len());
                    self.errors.push(LexError::UnterminatedString { span });
                    let line_end = rest
                        .find(|ch: char| is_line_terminator(ch))
                        .map(|i| start + i)
                        .unwrap_or(self.source.len());
                    self.bump_to(line_end);
                } else {
                    let char = rest.chars().next().unwrap_or('\0');
                    let span = self.span_to(start + char.len_utf8().max(1));
                    self.errors.push(LexError::UnexpectedCharacter { char, span });
                    self.bump_to(start + char.len_utf8().max(1));
                }
            }
        }
    }

    fn continues_word(&self, end: usize) -> bool {
        match self.source[end..].chars().next() {
            Some('\\') => true,
            Some(c) if !c.is_ascii() => UnicodeXID::is_xid_continue(c),
            _ => false,
        }
    }

    fn lex_numeric(&mut self, start: usize, end: usize) {
        let text = &self.source[start..end];
        match parse_numeric(text) {
            Some(Numeric::Number(n)) => self.push(Token::Number(n), end),
            Some(Numeric::BigInt(digits)) => {
                let sym = self.interner.intern(&digits);
                self.push(Token::BigInt(sym), end);
            }
            None => {
                let span = self.span_to(end);
                self.errors.push(LexError::InvalidNumber {
                    text: text.to_string(),
                    span,
                });
                self.bump_to(end);
            }
        }
    }

    fn lex_string(&mut self, start: usize, end: usize) {
        let inner = &self.source[start + 1..end - 1];
        match unescape(inner, EscapeMode::String) {
            Ok(text) => {
                let sym = self.interner.intern(&text);
                self.push(Token::String(sym), end);
            }
            Err(escape) => {
                let span = self.span_to(end);
                self.errors.push(LexError::InvalidEscape { escape, span });
                self.bump_to(end);
            }
        }
    }

    // ========================================================================
    // Identifiers with escapes or non-ASCII characters
    // ========================================================================

    fn lex_unicode_word(&mut self) {
        let start = self.pos;
        let mut name = String::new();
        let mut cursor = start;
        let mut first = true;

        while cursor < self.source.len() {
            let rest = &self.source[cursor..];
            let Some(c) = rest.chars().next() else { break };

            let (decoded, len) = if c == '\\' {
                match decode_identifier_escape(rest) {
                    Some(found) => found,
                    None => {
                        let span = self.span_to(cursor + 1);
                        let escape: String = rest.chars().take(6).collect();
                        self.errors.push(LexError::InvalidEscape { escape, span });
                        self.bump_to(cursor + 1);
                        return;
                    }
                }
            } else {
                (c, c.len_utf8())
            };

            let valid = if first {
                is_identifier_start(decoded)
            } else {
                is_identifier_part(decoded)
            };
            if !valid {
                break;
            }
            name.push(decoded);
            cursor += len;
            first = false;
        }

        if cursor == start {
            let rest = &self.source[start..];
            let c = rest.chars().next().unwrap_or('\0');
            let span = self.span_to(start + c.len_utf8().max(1));
            self.errors.push(LexError::UnexpectedCharacter { char: c, span });
            self.bump_to(start + c.len_utf8().max(1));
            return;
        }

        let sym = self.interner.intern(&name);
        self.push(Token::Identifier(sym), cursor);
    }

    // ========================================================================
    // Regular expressions
    // ========================================================================

    fn lex_regexp(&mut self) {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        let mut cursor = start + 1;
        let mut in_class = false;

        loop {
            let Some(&b) = bytes.get(cursor) else {
                let span = self.span_to(self.source.len());
                self.errors.push(LexError::UnterminatedRegExp { span });
                self.bump_to(self.source.len());
                return;
            };
            match b {
                b'\\' => cursor += 2,
                b'[' => {
                    in_class = true;
                    cursor += 1;
                }
                b']' => {
                    in_class = false;
                    cursor += 1;
                }
                b'/' if !in_class => break,
                b'\n' | b'\r' => {
                    let span = self.span_to(cursor);
                    self.errors.push(LexError::UnterminatedRegExp { span });
                    self.bump_to(cursor);
                    return;
                }
                _ => cursor += 1,
            }
        }
        let body_end = cursor.min(self.source.len());
        let pattern = self.interner.intern(&self.source[start + 1..body_end]);

        let flags_start = body_end + 1;
        let flags_len = self.source[flags_start..]
            .find(|c: char| !is_identifier_part(c))
            .unwrap_or(self.source.len() - flags_start);
        let flags_end = flags_start + flags_len;
        let flags = self.interner.intern(&self.source[flags_start..flags_end]);

        self.push(Token::RegExp { pattern, flags }, flags_end);
    }

    // ========================================================================
    // Template literals
    // ========================================================================

    /// Lex one template chunk starting at a backtick or at the `}` closing a
    /// substitution.
    fn lex_template(&mut self, opening: TemplateStart) {
        let bytes = self.source.as_bytes();
        let start = self.pos;
        let mut cursor = start + 1;

        let (raw_end, token_end, closes) = loop {
            let Some(&b) = bytes.get(cursor) else {
                let span = self.span_to(self.source.len());
                self.errors.push(LexError::UnterminatedTemplate { span });
                self.bump_to(self.source.len());
                return;
            };
            match b {
                b'\\' => cursor += 2,
                b'`' => break (cursor, cursor + 1, true),
                b'$' if bytes.get(cursor + 1) == Some(&b'{') => break (cursor, cursor + 2, false),
                _ => cursor += 1,
            }
        };

        let raw = &self.source[start + 1..raw_end.min(self.source.len())];
        let cooked = unescape(raw, EscapeMode::Template)
            .ok()
            .map(|text| self.interner.intern(&text));

        let position = match (opening, closes) {
            (TemplateStart::Backtick, true) => TemplatePosition::Full,
            (TemplateStart::Backtick, false) => TemplatePosition::Head,
            (TemplateStart::Substitution, false) => TemplatePosition::Middle,
            (TemplateStart::Substitution, true) => TemplatePosition::Tail,
        };
        if !closes {
            self.braces.push(true);
        }

        self.push(Token::Template(TemplateChunk { cooked, position }), token_end);
    }
}

#[derive(Debug, Clone, Copy)]
enum TemplateStart {
    Backtick,
    Substitution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeMode {
    String,
    Template,
}

enum Numeric {
    Number(f64),
    BigInt(String),
}

fn parse_numeric(text: &str) -> Option<Numeric> {
    let cleaned = text.replace('_', "");
    if let Some(digits) = cleaned.strip_suffix('n') {
        return Some(Numeric::BigInt(digits.to_string()));
    }

    let radix = |prefix: &[&str], radix: u32| -> Option<f64> {
        let body = prefix.iter().find_map(|p| cleaned.strip_prefix(p))?;
        u64::from_str_radix(body, radix)
            .map(|v| v as f64)
            .or_else(|_| {
                // Too wide for u64: accumulate in floating point.
                body.chars().try_fold(0f64, |acc, c| {
                    c.to_digit(radix).map(|d| acc * radix as f64 + d as f64).ok_or(())
                })
            })
            .ok()
    };

    if let Some(n) = radix(&["0x", "0X"], 16) {
        return Some(Numeric::Number(n));
    }
    if let Some(n) = radix(&["0o", "0O"], 8) {
        return Some(Numeric::Number(n));
    }
    if let Some(n) = radix(&["0b", "0B"], 2) {
        return Some(Numeric::Number(n));
    }

    // Legacy octal: 017 === 15
    if cleaned.len() > 1
        && cleaned.starts_with('0')
        && cleaned.bytes().all(|b| (b'0'..=b'7').contains(&b))
    {
        return u64::from_str_radix(&cleaned[1..], 8)
            .ok()
            .map(|v| Numeric::Number(v as f64));
    }

    cleaned.parse::<f64>().ok().map(Numeric::Number)
}

/// Decode `\uXXXX` or `\u{X...}` at the start of `text`.
///
/// Returns the decoded character and the number of bytes consumed.
fn decode_identifier_escape(text: &str) -> Option<(char, usize)> {
    let rest = text.strip_prefix("\\u")?;
    if let Some(braced) = rest.strip_prefix('{') {
        let close = braced.find('}')?;
        let code = u32::from_str_radix(&braced[..close], 16).ok()?;
        Some((char::from_u32(code)?, 2 + 1 + close + 1))
    } else {
        let hex = rest.get(..4)?;
        let code = u32::from_str_radix(hex, 16).ok()?;
        Some((char::from_u32(code)?, 6))
    }
}

/// Process escape sequences in string literal or template text.
///
/// Returns the offending escape on failure.
fn unescape(s: &str, mode: EscapeMode) -> Result<String, String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\r' && mode == EscapeMode::Template {
            // Template text normalises CRLF and CR to LF.
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            result.push('\n');
            continue;
        }
        if c != '\\' {
            result.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            return Err("\\".to_string());
        };
        match escaped {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'b' => result.push('\u{8}'),
            'f' => result.push('\u{c}'),
            'v' => result.push('\u{b}'),
            '0' if !chars.peek().is_some_and(|d| d.is_ascii_digit()) => result.push('\0'),
            '1'..='9' | '0' => {
                if mode == EscapeMode::Template {
                    return Err(format!("\\{}", escaped));
                }
                // Legacy octal escape, up to three digits.
                let mut value = escaped.to_digit(8).ok_or_else(|| format!("\\{}", escaped))?;
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) if value * 8 + d <= 0o377 => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        _ => break,
                    }
                }
                result.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                let code = u8::from_str_radix(&hex, 16).map_err(|_| format!("\\x{}", hex))?;
                result.push(code as char);
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|&ch| ch != '}').collect();
                    u32::from_str_radix(&hex, 16).map_err(|_| format!("\\u{{{}}}", hex))?
                } else {
                    let hex: String = (0..4).filter_map(|_| chars.next()).collect();
                    u32::from_str_radix(&hex, 16).map_err(|_| format!("\\u{}", hex))?
                };
                push_code_unit(&mut result, &mut chars, code);
            }
            '\r' => {
                // Line continuation
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => result.push(other),
        }
    }

    Ok(result)
}

/// Push a UTF-16 code unit, pairing a high surrogate with a following
/// `\uXXXX` low surrogate when present.
fn push_code_unit(
    result: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    code: u32,
) {
    if (0xD800..0xDC00).contains(&code) {
        let mut lookahead = chars.clone();
        if lookahead.next() == Some('\\') && lookahead.next() == Some('u') {
            let hex: String = (0..4).filter_map(|_| lookahead.next()).collect();
            if let Ok(low) = u32::from_str_radix(&hex, 16) {
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(ch) = char::from_u32(combined) {
                        result.push(ch);
                        *chars = lookahead;
                        return;
                    }
                }
            }
        }
    }
    result.push(char::from_u32(code).unwrap_or('\u{fffd}'));
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        ' ' | '\t' | '\u{b}' | '\u{c}' | '\u{a0}' | '\u{feff}'
    ) || (!c.is_ascii() && c.is_whitespace() && !is_line_terminator(c))
}

fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_ascii_alphabetic() || (!c.is_ascii() && UnicodeXID::is_xid_start(c))
}

fn is_identifier_part(c: char) -> bool {
    c == '$'
        || c == '_'
        || c.is_ascii_alphanumeric()
        || c == '\u{200c}'
        || c == '\u{200d}'
        || (!c.is_ascii() && UnicodeXID::is_xid_continue(c))
}

impl LexError {
    /// Get the span of this error
    pub fn span(&self) -> &Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedTemplate { span }
            | LexError::UnterminatedRegExp { span }
            | LexError::UnterminatedComment { span }
            | LexError::InvalidNumber { span, .. }
            | LexError::InvalidEscape { span, .. } => span,
        }
    }

    /// Get a description of this error
    pub fn description(&self) -> String {
        match self {
            LexError::UnexpectedCharacter { char, .. } => {
                format!("Unexpected character '{}'", char)
            }
            LexError::UnterminatedString { .. } => "Unterminated string literal".to_string(),
            LexError::UnterminatedTemplate { .. } => "Unterminated template literal".to_string(),
            LexError::UnterminatedRegExp { .. } => {
                "Unterminated regular expression".to_string()
            }
            LexError::UnterminatedComment { .. } => "Unterminated comment".to_string(),
            LexError::InvalidNumber { text, .. } => format!("Invalid number '{}'", text),
            LexError::InvalidEscape { escape, .. } => {
                format!("Invalid escape sequence '{}'", escape)
            }
        }
    }

    /// Get a hint for fixing this error
    pub fn hint(&self) -> Option<String> {
        match self {
            LexError::UnterminatedString { .. } => {
                Some("Add a closing quote to terminate the string".to_string())
            }
            LexError::UnterminatedTemplate { .. } => {
                Some("Add a closing backtick (`) to terminate the template literal".to_string())
            }
            LexError::UnterminatedComment { .. } => {
                Some("Close the block comment with */".to_string())
            }
            _ => None,
        }
    }

    /// Format the error with source context
    pub fn format_with_source(&self, source: &str) -> String {
        let span = self.span();
        let mut result = format!(
            "Error at {}:{}: {}\n",
            span.line,
            span.column,
            self.description()
        );

        if let Some(error_line) = source.lines().nth(span.line.saturating_sub(1) as usize) {
            result.push_str("  |\n");
            result.push_str(&format!("{:3} | {}\n", span.line, error_line));
            result.push_str(&format!(
                "  | {}^\n",
                " ".repeat(span.column.saturating_sub(1) as usize)
            ));
        }

        if let Some(hint) = self.hint() {
            result.push_str(&format!("\nHint: {}\n", hint));
        }

        result
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.description(),
            self.span().line,
            self.span().column
        )
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        let (tokens, _) = Lexer::new(source).tokenize().expect("should lex");
        tokens.into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_regexp_after_operator_and_division_after_identifier() {
        let toks = kinds("x = /a[/]b/g; y = a / b / c;");
        assert!(matches!(toks[2], Token::RegExp { .. }));
        let slashes = toks.iter().filter(|t| matches!(t, Token::Slash)).count();
        assert_eq!(slashes, 2);
    }

    #[test]
    fn test_template_with_nested_braces() {
        let toks = kinds("`a${ {b: 1}.b }c`");
        assert!(matches!(
            toks[0],
            Token::Template(TemplateChunk { position: TemplatePosition::Head, .. })
        ));
        assert!(matches!(
            toks.last().map(|_| &toks[toks.len() - 2]),
            Some(Token::Template(TemplateChunk { position: TemplatePosition::Tail, .. }))
        ));
    }

    #[test]
    fn test_escaped_identifier_is_decoded() {
        let (tokens, interner) = Lexer::new("\\u0061bc").tokenize().expect("should lex");
        match &tokens[0].0 {
            Token::Identifier(sym) => assert_eq!(interner.resolve(*sym), "abc"),
            other => panic!("expected identifier, got {:?}", other),
        }
        assert_eq!(tokens[0].1.end, 8);
    }

    #[test]
    fn test_keyword_prefix_extends_into_unicode_identifier() {
        let (tokens, interner) = Lexer::new("iné").tokenize().expect("should lex");
        match &tokens[0].0 {
            Token::Identifier(sym) => assert_eq!(interner.resolve(*sym), "iné"),
            other => panic!("expected identifier, got {:?}", other),
        }
    }

    #[test]
    fn test_optional_chain_before_digit_is_conditional() {
        let toks = kinds("a?.5:1");
        assert_eq!(toks[1], Token::Question);
        assert_eq!(toks[2], Token::Number(0.5));
    }

    #[test]
    fn test_line_tracking_across_comments() {
        let (tokens, _) = Lexer::new("/* a\n b */ x\n// c\ny").tokenize().expect("should lex");
        assert_eq!(tokens[0].1.line, 2);
        assert_eq!(tokens[1].1.line, 4);
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(kinds("0x1F")[0], Token::Number(31.0));
        assert_eq!(kinds("0b101")[0], Token::Number(5.0));
        assert_eq!(kinds("017")[0], Token::Number(15.0));
        assert_eq!(kinds("1_000.5e1")[0], Token::Number(10005.0));
        assert!(matches!(kinds("10n")[0], Token::BigInt(_)));
    }

    #[test]
    fn test_unterminated_string_reports_error() {
        let errors = Lexer::new("'abc").tokenize().expect_err("should fail");
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
    }
}
