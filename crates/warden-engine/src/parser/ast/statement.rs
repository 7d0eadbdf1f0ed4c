//! Statement AST nodes

use super::*;
use crate::parser::token::Span;

/// Statement (performs an action)
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `var x = 1;`, `let [a, b] = pair;`, `const { y } = obj;`
    VariableDecl(VariableDecl),

    /// `function f() {}`, `async function* g() {}`
    FunctionDecl(Function),

    /// `class A extends B {}`
    ClassDecl(Class),

    Expression(ExpressionStatement),

    Block(BlockStatement),

    Empty(Span),

    If(IfStatement),

    /// `for (init; test; update) body`
    For(ForStatement),

    /// `for (x in o)`, `for (x of xs)`, `for await (x of xs)`
    ForIn(ForInStatement),

    While(WhileStatement),

    DoWhile(DoWhileStatement),

    Return(ReturnStatement),

    Break(JumpStatement),

    Continue(JumpStatement),

    Throw(ThrowStatement),

    Try(TryStatement),

    Switch(SwitchStatement),

    /// `outer: for (...) {}`
    Labeled(LabeledStatement),

    /// `with (obj) body`
    With(WithStatement),

    Debugger(Span),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> &Span {
        match self {
            Statement::VariableDecl(s) => &s.span,
            Statement::FunctionDecl(s) => &s.span,
            Statement::ClassDecl(s) => &s.span,
            Statement::Expression(s) => &s.span,
            Statement::Block(s) => &s.span,
            Statement::Empty(span) => span,
            Statement::If(s) => &s.span,
            Statement::For(s) => &s.span,
            Statement::ForIn(s) => &s.span,
            Statement::While(s) => &s.span,
            Statement::DoWhile(s) => &s.span,
            Statement::Return(s) => &s.span,
            Statement::Break(s) => &s.span,
            Statement::Continue(s) => &s.span,
            Statement::Throw(s) => &s.span,
            Statement::Try(s) => &s.span,
            Statement::Switch(s) => &s.span,
            Statement::Labeled(s) => &s.span,
            Statement::With(s) => &s.span,
            Statement::Debugger(span) => span,
        }
    }

    /// Check if this is a declaration statement
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            Statement::VariableDecl(_) | Statement::FunctionDecl(_) | Statement::ClassDecl(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDecl {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarator {
    pub target: Pattern,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

/// `{ ... }`; the span covers both braces.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub condition: Expression,
    pub then_branch: Box<Statement>,
    pub else_branch: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    VariableDecl(VariableDecl),
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForInKind {
    In,
    Of,
    AwaitOf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForInTarget {
    VariableDecl(VariableDecl),
    Pattern(Pattern),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForInStatement {
    pub kind: ForInKind,
    pub left: ForInTarget,
    pub right: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub condition: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub span: Span,
}

/// `break label;` or `continue label;`
#[derive(Debug, Clone, PartialEq)]
pub struct JumpStatement {
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStatement {
    pub value: Expression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    pub span: Span,
}

/// `catch (param) { body }`; the span starts at the `catch` keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub param: Option<Pattern>,
    pub body: BlockStatement,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// `None` for `default:`
    pub test: Option<Expression>,
    pub consequent: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}
