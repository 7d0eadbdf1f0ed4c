//! Expression AST nodes

use super::*;
use crate::parser::interner::Symbol;
use crate::parser::token::Span;

/// Expression (produces a value)
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Number, bigint, string, boolean, null or regexp literal
    Literal(Literal),

    /// Template literal: `a${b}c`
    Template(TemplateLiteral),

    /// Tagged template: tag`a${b}`
    TaggedTemplate(TaggedTemplateExpression),

    Identifier(Identifier),

    This(Span),

    Super(Span),

    /// Array literal: [1, , ...rest]
    Array(ArrayExpression),

    /// Object literal: { a: 1, b, [k]: v, ...o, m() {} }
    Object(ObjectExpression),

    Function(Box<Function>),

    Arrow(Box<ArrowFunction>),

    Class(Box<Class>),

    /// `!x`, `-x`, `typeof x`, `void x`, `delete x.y`
    Unary(UnaryExpression),

    /// `++x`, `x--`
    Update(UpdateExpression),

    Binary(BinaryExpression),

    /// `&&`, `||`, `??`
    Logical(LogicalExpression),

    Assignment(AssignmentExpression),

    /// `a ? b : c`
    Conditional(ConditionalExpression),

    /// `a, b, c`
    Sequence(SequenceExpression),

    Call(CallExpression),

    New(NewExpression),

    Member(MemberExpression),

    /// `...xs` inside array literals and argument lists
    Spread(SpreadElement),

    Yield(YieldExpression),

    Await(AwaitExpression),

    /// `import(specifier)`; the span starts at the `import` keyword.
    ImportCall(ImportCallExpression),

    /// `new.target`
    MetaProperty(MetaProperty),

    Parenthesized(ParenthesizedExpression),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> &Span {
        match self {
            Expression::Literal(e) => &e.span,
            Expression::Template(e) => &e.span,
            Expression::TaggedTemplate(e) => &e.span,
            Expression::Identifier(e) => &e.span,
            Expression::This(span) | Expression::Super(span) => span,
            Expression::Array(e) => &e.span,
            Expression::Object(e) => &e.span,
            Expression::Function(e) => &e.span,
            Expression::Arrow(e) => &e.span,
            Expression::Class(e) => &e.span,
            Expression::Unary(e) => &e.span,
            Expression::Update(e) => &e.span,
            Expression::Binary(e) => &e.span,
            Expression::Logical(e) => &e.span,
            Expression::Assignment(e) => &e.span,
            Expression::Conditional(e) => &e.span,
            Expression::Sequence(e) => &e.span,
            Expression::Call(e) => &e.span,
            Expression::New(e) => &e.span,
            Expression::Member(e) => &e.span,
            Expression::Spread(e) => &e.span,
            Expression::Yield(e) => &e.span,
            Expression::Await(e) => &e.span,
            Expression::ImportCall(e) => &e.span,
            Expression::MetaProperty(e) => &e.span,
            Expression::Parenthesized(e) => &e.span,
        }
    }

    /// Check if this expression is a literal
    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Literal(_) | Expression::Template(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    BigInt(Symbol),
    String(Symbol),
    Boolean(bool),
    Null,
    RegExp { pattern: Symbol, flags: Symbol },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateLiteral {
    /// Cooked text of each chunk; `None` for an invalid escape.
    pub quasis: Vec<Option<Symbol>>,
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedTemplateExpression {
    pub tag: Box<Expression>,
    pub quasi: TemplateLiteral,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayExpression {
    /// `None` marks a hole: `[1, , 3]`
    pub elements: Vec<Option<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectProperty>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectProperty {
    /// `key: value`
    Property { key: PropertyKey, value: Expression, span: Span },

    /// `name`, or `name = default` when the literal is reinterpreted as a
    /// destructuring target.
    Shorthand { name: Identifier, default: Option<Box<Expression>>, span: Span },

    /// `m() {}`, `get x() {}`, `async *gen() {}`
    Method { key: PropertyKey, kind: MethodKind, function: Function },

    /// `...source`
    Spread(Expression, Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Plus,
    Not,
    BitwiseNot,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: UnaryOperator,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOperator {
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateExpression {
    pub operator: UpdateOperator,
    pub prefix: bool,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LeftShift,
    RightShift,
    UnsignedRightShift,
    In,
    Instanceof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    pub operator: LogicalOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    ExponentAssign,
    LeftShiftAssign,
    RightShiftAssign,
    UnsignedRightShiftAssign,
    BitwiseAndAssign,
    BitwiseOrAssign,
    BitwiseXorAssign,
    AndAssign,
    OrAssign,
    CoalesceAssign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpression {
    pub operator: AssignmentOperator,
    pub target: Box<Pattern>,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    /// `f?.()`
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberProperty {
    /// `.name` (reserved words allowed)
    Identifier(Identifier),
    /// `.#name`
    Private(Identifier),
    /// `[expr]`
    Computed(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    /// `a?.b`
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadElement {
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    /// `yield*`
    pub delegate: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AwaitExpression {
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportCallExpression {
    pub source: Box<Expression>,
    pub options: Option<Box<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaProperty {
    pub meta: Identifier,
    pub property: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesizedExpression {
    pub expression: Box<Expression>,
    pub span: Span,
}
