//! Source transformer for guest scripts.
//!
//! Guest source is parsed, walked once, and patched with small textual
//! insertions so that values the engine hands to script code without any
//! interception point pass through the internal-state singleton first:
//! - caught exceptions (`catch (e)` and destructuring catch parameters),
//! - `with` operands,
//! - `import(...)` expressions.
//!
//! The tree is never printed back out. Insertions contain no line breaks, so
//! every original line keeps its number and stack traces still point at
//! recognisable guest locations.

mod insertion;
mod walker;

pub use insertion::{splice, Attach, Insertion, InsertionList};

use crate::parser::ast::Visitor;
use crate::parser::{ParseError, Parser, Token};
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the internal-state singleton on the guest global object.
pub const INTERNAL_STATE_NAME: &str = "__WARDEN_INTERNAL_STATE_DO_NOT_USE_OR_PROGRAM_WILL_FAIL__";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error(transparent)]
    Syntax(#[from] ParseError),

    #[error("Use of internal state variable '{name}' is not allowed ({line}:{column})")]
    ReservedIdentifier { name: String, line: u32, column: u32 },

    #[error("Async functions are disabled in this sandbox")]
    AsyncDisabled,
}

pub type TransformResult<T> = Result<T, TransformError>;

/// Options that change the transform result; part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformOptions {
    /// When false, sources containing async functions are rejected.
    pub allow_async: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self { allow_async: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Sanitised source, ready to compile in the guest realm.
    pub code: String,
    /// The source declares at least one async function, arrow or method.
    pub has_async: bool,
}

/// Transform with default options.
pub fn transform(source: &str) -> TransformResult<TransformOutput> {
    transform_with(source, &TransformOptions::default())
}

pub fn transform_with(source: &str, options: &TransformOptions) -> TransformResult<TransformOutput> {
    let script = Parser::parse_source(source).map_err(|mut errors| {
        TransformError::Syntax(errors.swap_remove(0))
    })?;

    if let Some(reserved) = script.interner.get(INTERNAL_STATE_NAME) {
        let hit = script.tokens.iter().find(|(token, _)| {
            matches!(token, Token::Identifier(sym) | Token::PrivateName(sym) if *sym == reserved)
        });
        if let Some((_, span)) = hit {
            warn!(line = span.line, column = span.column, "guest source references the internal state name");
            return Err(TransformError::ReservedIdentifier {
                name: INTERNAL_STATE_NAME.to_string(),
                line: span.line,
                column: span.column,
            });
        }
    }

    let mut walker = walker::Walker::new(&script.interner, INTERNAL_STATE_NAME);
    walker.visit_program(&script.program);
    let has_async = walker.has_async;

    if has_async && !options.allow_async {
        return Err(TransformError::AsyncDisabled);
    }

    let count = walker.insertions.len();
    let code = if walker.insertions.is_empty() {
        source.to_string()
    } else {
        splice(source, &walker.insertions.into_sorted())
    };
    debug!(insertions = count, has_async, "transformed guest source");

    Ok(TransformOutput { code, has_async })
}
