//! Token definitions for guest JavaScript.
//!
//! This module defines all tokens the lexer produces: reserved words,
//! punctuators, literals, and template pieces. Contextual keywords
//! (`async`, `of`, `get`, `set`, `static`, `let`, `yield`, `await`) are
//! lexed as identifiers and recognised by the parser where they matter.

use crate::parser::interner::Symbol;
use std::fmt;

/// A token of guest source.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Declarations
    Var,
    Const,
    Function,
    Class,

    // Control flow
    If,
    Else,
    Switch,
    Case,
    Default,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    With,

    // Error handling
    Try,
    Catch,
    Finally,
    Throw,

    // Modules
    Import,
    Export,

    // Objects
    New,
    This,
    Super,
    Extends,

    // Operators spelled as words
    Typeof,
    Instanceof,
    In,
    Delete,
    Void,

    Debugger,
    Enum,

    // Literals
    Number(f64),
    BigInt(Symbol),
    String(Symbol),
    Template(TemplateChunk),
    RegExp { pattern: Symbol, flags: Symbol },
    True,
    False,
    Null,

    // Names
    Identifier(Symbol),
    PrivateName(Symbol),

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    StarStar,

    // Unary
    PlusPlus,
    MinusMinus,
    Bang,
    Tilde,

    // Comparison
    EqualEqual,
    BangEqual,
    EqualEqualEqual,
    BangEqualEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,

    // Logical
    AmpAmp,
    PipePipe,
    QuestionQuestion,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    LessLess,
    GreaterGreater,
    GreaterGreaterGreater,

    // Assignment
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    StarStarEqual,
    AmpEqual,
    PipeEqual,
    CaretEqual,
    LessLessEqual,
    GreaterGreaterEqual,
    GreaterGreaterGreaterEqual,
    AmpAmpEqual,
    PipePipeEqual,
    QuestionQuestionEqual,

    // Other
    Question,
    QuestionDot,
    DotDotDot,
    Dot,
    Colon,
    Arrow,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    // Special
    Eof,
}

/// Position of a template piece within its literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePosition {
    /// `` `text` `` with no substitutions
    Full,
    /// `` `text${ ``
    Head,
    /// `` }text${ ``
    Middle,
    /// `` }text` ``
    Tail,
}

/// One piece of a template literal, between substitutions.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateChunk {
    /// Cooked text; `None` when the raw text holds an invalid escape
    /// (legal only in tagged templates).
    pub cooked: Option<Symbol>,
    pub position: TemplatePosition,
}

/// Source location information for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    pub fn merge(&self, other: &Span) -> Span {
        let (line, column) = if self.start <= other.start {
            (self.line, self.column)
        } else {
            (other.line, other.column)
        };
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = self.keyword_text().or_else(|| self.punctuator_text()) {
            return f.write_str(text);
        }
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::BigInt(_) => f.write_str("<bigint>"),
            Token::String(_) => f.write_str("\"<string>\""),
            Token::Template(_) => f.write_str("`...`"),
            Token::RegExp { .. } => f.write_str("/<regexp>/"),
            Token::Identifier(_) => f.write_str("<identifier>"),
            Token::PrivateName(_) => f.write_str("#<name>"),
            Token::Eof => f.write_str("end of input"),
            _ => Ok(()),
        }
    }
}

impl Token {
    /// The source spelling of a reserved word, or `None` for any other token.
    ///
    /// Reserved words are valid property names (`promise.catch`,
    /// `state.import`), so the parser uses this to recover the name.
    pub fn keyword_text(&self) -> Option<&'static str> {
        let word = match self {
            Token::Var => "var",
            Token::Const => "const",
            Token::Function => "function",
            Token::Class => "class",
            Token::If => "if",
            Token::Else => "else",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Return => "return",
            Token::With => "with",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::Throw => "throw",
            Token::Import => "import",
            Token::Export => "export",
            Token::New => "new",
            Token::This => "this",
            Token::Super => "super",
            Token::Extends => "extends",
            Token::Typeof => "typeof",
            Token::Instanceof => "instanceof",
            Token::In => "in",
            Token::Delete => "delete",
            Token::Void => "void",
            Token::Debugger => "debugger",
            Token::Enum => "enum",
            Token::True => "true",
            Token::False => "false",
            Token::Null => "null",
            _ => return None,
        };
        Some(word)
    }

    /// Source spelling of an operator or punctuator.
    pub fn punctuator_text(&self) -> Option<&'static str> {
        let text = match self {
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::StarStar => "**",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::EqualEqual => "==",
            Token::BangEqual => "!=",
            Token::EqualEqualEqual => "===",
            Token::BangEqualEqual => "!==",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::QuestionQuestion => "??",
            Token::Amp => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::LessLess => "<<",
            Token::GreaterGreater => ">>",
            Token::GreaterGreaterGreater => ">>>",
            Token::Equal => "=",
            Token::PlusEqual => "+=",
            Token::MinusEqual => "-=",
            Token::StarEqual => "*=",
            Token::SlashEqual => "/=",
            Token::PercentEqual => "%=",
            Token::StarStarEqual => "**=",
            Token::AmpEqual => "&=",
            Token::PipeEqual => "|=",
            Token::CaretEqual => "^=",
            Token::LessLessEqual => "<<=",
            Token::GreaterGreaterEqual => ">>=",
            Token::GreaterGreaterGreaterEqual => ">>>=",
            Token::AmpAmpEqual => "&&=",
            Token::PipePipeEqual => "||=",
            Token::QuestionQuestionEqual => "??=",
            Token::Question => "?",
            Token::QuestionDot => "?.",
            Token::DotDotDot => "...",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Arrow => "=>",
            Token::LeftParen => "(",
            Token::RightParen => ")",
            Token::LeftBrace => "{",
            Token::RightBrace => "}",
            Token::LeftBracket => "[",
            Token::RightBracket => "]",
            Token::Semicolon => ";",
            Token::Comma => ",",
            _ => return None,
        };
        Some(text)
    }

    /// Returns true if this token is a reserved word.
    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// Returns true if this token is a literal.
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::Number(_)
                | Token::BigInt(_)
                | Token::String(_)
                | Token::Template(_)
                | Token::RegExp { .. }
                | Token::True
                | Token::False
                | Token::Null
        )
    }

    /// Returns true if this is an assignment operator (`=`, `+=`, ...).
    pub fn is_assignment_operator(&self) -> bool {
        matches!(
            self,
            Token::Equal
                | Token::PlusEqual
                | Token::MinusEqual
                | Token::StarEqual
                | Token::SlashEqual
                | Token::PercentEqual
                | Token::StarStarEqual
                | Token::AmpEqual
                | Token::PipeEqual
                | Token::CaretEqual
                | Token::LessLessEqual
                | Token::GreaterGreaterEqual
                | Token::GreaterGreaterGreaterEqual
                | Token::AmpAmpEqual
                | Token::PipePipeEqual
                | Token::QuestionQuestionEqual
        )
    }

    /// Whether a `/` following this token starts a regular expression
    /// literal rather than a division.
    ///
    /// `None` is the start of input.
    pub fn allows_regexp_after(previous: Option<&Token>) -> bool {
        match previous {
            None => true,
            Some(tok) => !matches!(
                tok,
                Token::Identifier(_)
                    | Token::PrivateName(_)
                    | Token::Number(_)
                    | Token::BigInt(_)
                    | Token::String(_)
                    | Token::RegExp { .. }
                    | Token::True
                    | Token::False
                    | Token::Null
                    | Token::This
                    | Token::Super
                    | Token::RightParen
                    | Token::RightBracket
                    | Token::PlusPlus
                    | Token::MinusMinus
            ) && !matches!(
                tok,
                Token::Template(TemplateChunk {
                    position: TemplatePosition::Full | TemplatePosition::Tail,
                    ..
                })
            ),
        }
    }
}
