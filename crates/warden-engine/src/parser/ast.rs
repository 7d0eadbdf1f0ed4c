//! Syntax tree for guest JavaScript.
//!
//! The tree is produced for analysis only: the transformer never prints it
//! back out, it reads node spans and splices text into the original source.
//! Nodes therefore keep exact spans and enough shape to find catch
//! bindings, `with` operands, dynamic imports and suspend-capable functions.

use crate::parser::interner::Symbol;
use crate::parser::token::Span;

pub mod expression;
pub mod pattern;
pub mod statement;
pub mod visitor;

pub use expression::*;
pub use pattern::*;
pub use statement::*;
pub use visitor::*;

/// Root node: a guest script.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
    pub span: Span,
}

impl Program {
    pub fn new(statements: Vec<Statement>, span: Span) -> Self {
        Self { statements, span }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }
}

/// A binding or reference name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Symbol,
    pub span: Span,
}

impl Identifier {
    pub fn new(name: Symbol, span: Span) -> Self {
        Self { name, span }
    }
}

/// Function declaration, expression, or method body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub id: Option<Identifier>,
    pub params: Vec<Pattern>,
    pub body: BlockStatement,
    pub is_async: bool,
    pub is_generator: bool,
    pub span: Span,
}

/// Arrow function: `(a, b) => a + b`, `async x => { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowFunction {
    pub params: Vec<Pattern>,
    pub body: ArrowBody,
    pub is_async: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrowBody {
    Expression(Box<Expression>),
    Block(BlockStatement),
}

/// Class declaration or expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub id: Option<Identifier>,
    pub super_class: Option<Box<Expression>>,
    pub members: Vec<ClassMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassMember {
    Method {
        key: PropertyKey,
        kind: MethodKind,
        is_static: bool,
        function: Function,
    },
    Field {
        key: PropertyKey,
        value: Option<Expression>,
        is_static: bool,
        span: Span,
    },
    StaticBlock(BlockStatement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
    Constructor,
}

/// Name of a property in an object literal, class body, or pattern.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// `a` in `{ a: 1 }`; reserved words are allowed here.
    Identifier(Identifier),
    String(Symbol, Span),
    Number(f64, Span),
    BigInt(Symbol, Span),
    Computed(Box<Expression>, Span),
    Private(Identifier),
}

impl PropertyKey {
    pub fn span(&self) -> &Span {
        match self {
            PropertyKey::Identifier(id) | PropertyKey::Private(id) => &id.span,
            PropertyKey::String(_, span)
            | PropertyKey::Number(_, span)
            | PropertyKey::BigInt(_, span)
            | PropertyKey::Computed(_, span) => span,
        }
    }
}
