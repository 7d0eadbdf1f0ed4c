//! Parser guards against runaway loops and unbounded recursion.
//!
//! Guest source is untrusted input, so nesting depth is capped well below the
//! point where a debug-build test thread would overflow its stack.

use super::ParseError;
use crate::parser::token::Span;

/// Maximum iterations for any parser loop.
const MAX_LOOP_ITERATIONS: usize = 100_000;

/// Maximum nesting depth of statements, expressions and patterns.
pub const MAX_PARSE_DEPTH: usize = 64;

/// Guard against infinite loops in parser
pub struct LoopGuard {
    name: &'static str,
    count: usize,
    max: usize,
}

impl LoopGuard {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            count: 0,
            max: MAX_LOOP_ITERATIONS,
        }
    }

    #[inline]
    pub fn with_limit(name: &'static str, max: usize) -> Self {
        Self { name, count: 0, max }
    }

    /// Check iteration count, return error if exceeded
    #[inline]
    pub fn check(&mut self) -> Result<(), ParseError> {
        self.count += 1;
        if self.count > self.max {
            return Err(ParseError::parser_limit_exceeded(
                format!("Loop '{}' exceeded {} iterations", self.name, self.max),
                Span::new(0, 0, 0, 0),
            ));
        }
        Ok(())
    }
}

/// Run `f` one nesting level deeper, failing once the depth cap is reached.
///
/// The depth is restored whether `f` succeeds or not.
pub fn nested<'a, T>(
    parser: &mut super::Parser<'a>,
    what: &'static str,
    f: impl FnOnce(&mut super::Parser<'a>) -> Result<T, ParseError>,
) -> Result<T, ParseError> {
    if parser.depth >= MAX_PARSE_DEPTH {
        return Err(ParseError::parser_limit_exceeded(
            format!("Maximum nesting depth ({}) exceeded in {}", MAX_PARSE_DEPTH, what),
            parser.current_span(),
        ));
    }
    parser.depth += 1;
    let result = f(parser);
    parser.depth -= 1;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parser::Parser;

    #[test]
    fn test_loop_guard_exceeds_limit() {
        let mut guard = LoopGuard::with_limit("test", 10);
        for _ in 0..10 {
            assert!(guard.check().is_ok());
        }
        assert!(guard.check().is_err());
    }

    #[test]
    fn test_nested_restores_depth_on_error() {
        let mut parser = Parser::new("x").expect("should lex");
        let result: Result<(), ParseError> = nested(&mut parser, "test", |p| {
            assert_eq!(p.depth, 1);
            Err(ParseError::invalid_syntax("boom", p.current_span()))
        });
        assert!(result.is_err());
        assert_eq!(parser.depth, 0);
    }

    #[test]
    fn test_deeply_nested_source_is_rejected() {
        let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
        let errors = Parser::parse_source(&source).expect_err("should hit depth limit");
        assert!(errors
            .iter()
            .any(|e| e.kind == crate::parser::parser::ParseErrorKind::ParserLimitExceeded));
    }
}
