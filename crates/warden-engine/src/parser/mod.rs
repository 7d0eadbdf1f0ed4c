//! JavaScript front end for guest scripts: lexer, syntax tree and parser.
//!
//! # Example
//!
//! ```ignore
//! use warden_engine::parser::Parser;
//!
//! let script = Parser::parse_source("try { f() } catch (e) { g(e) }")?;
//! assert_eq!(script.program.len(), 1);
//! ```

pub mod ast;
pub mod interner;
pub mod lexer;
pub mod parser;
pub mod token;

pub use interner::{Interner, Symbol};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, ParseErrorKind, ParsedScript, Parser};
pub use token::{Span, TemplateChunk, TemplatePosition, Token};
