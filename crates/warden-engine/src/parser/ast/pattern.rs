//! Binding and assignment patterns

use super::*;
use crate::parser::token::Span;

/// Destructuring target.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    /// `x`
    Identifier(Identifier),

    /// `{ a, b: c, ...rest }`
    Object(ObjectPattern),

    /// `[a, , b, ...rest]`
    Array(ArrayPattern),

    /// `x = 1` (a target with a default)
    Assignment(AssignmentPattern),

    /// `...rest`
    Rest(RestPattern),

    /// `obj.prop` or `arr[i]`; only valid in assignment position.
    Expression(Box<Expression>),
}

impl Pattern {
    pub fn span(&self) -> &Span {
        match self {
            Pattern::Identifier(id) => &id.span,
            Pattern::Object(p) => &p.span,
            Pattern::Array(p) => &p.span,
            Pattern::Assignment(p) => &p.span,
            Pattern::Rest(p) => &p.span,
            Pattern::Expression(e) => e.span(),
        }
    }

    /// Whether this is a plain name rather than a destructuring form.
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Pattern::Identifier(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPattern {
    pub properties: Vec<ObjectPatternProperty>,
    pub rest: Option<Box<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPatternProperty {
    pub key: PropertyKey,
    pub value: Pattern,
    /// `{ a }` rather than `{ a: a }`
    pub shorthand: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayPattern {
    /// `None` marks a hole: `[, b]`
    pub elements: Vec<Option<Pattern>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentPattern {
    pub target: Box<Pattern>,
    pub default: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestPattern {
    pub argument: Box<Pattern>,
    pub span: Span,
}
