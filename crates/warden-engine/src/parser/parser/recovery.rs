//! Error recovery for the parser.
//!
//! After a statement fails to parse, skip ahead to a point where statement
//! parsing can resume so later errors are reported too.

use super::guards::LoopGuard;
use super::Parser;
use crate::parser::token::Token;

/// Synchronize to the next statement boundary.
pub fn sync_to_statement_boundary(parser: &mut Parser<'_>) {
    let mut guard = LoopGuard::new("statement_recovery");
    let start = parser.position();

    while !parser.at_eof() {
        if guard.check().is_err() {
            return;
        }

        // A newline is a plausible statement end once something was skipped.
        if parser.position() > start && parser.newline_before() {
            return;
        }

        match parser.current() {
            Token::Function
            | Token::Class
            | Token::Var
            | Token::Const
            | Token::If
            | Token::While
            | Token::Do
            | Token::For
            | Token::Switch
            | Token::Try
            | Token::With
            | Token::Return
            | Token::Break
            | Token::Continue
            | Token::Throw
                if parser.position() > start =>
            {
                return;
            }

            Token::Semicolon | Token::RightBrace => {
                parser.advance();
                return;
            }

            _ => {
                parser.advance();
            }
        }
    }
}
