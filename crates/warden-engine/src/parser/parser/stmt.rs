//! Statement parsing

use super::expr::{
    parse_assignment, parse_assignment_allow_in, parse_class, parse_expression,
    parse_expression_allow_in, parse_function,
};
use super::guards::{nested, LoopGuard};
use super::pattern::{expression_to_pattern, parse_binding_pattern};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parse a statement.
pub fn parse_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    nested(parser, "statement", parse_statement_inner)
}

fn parse_statement_inner(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    match parser.current() {
        Token::LeftBrace => Ok(Statement::Block(parse_block(parser)?)),
        Token::Var => parse_variable_statement(parser, VariableKind::Var),
        Token::Const => parse_variable_statement(parser, VariableKind::Const),
        Token::Identifier(name) if *name == parser.names.let_ && let_starts_declaration(parser) => {
            parse_variable_statement(parser, VariableKind::Let)
        }
        Token::Function => Ok(Statement::FunctionDecl(parse_function(parser, false, true)?)),
        Token::Identifier(_) if parser.check_function_after_async() => {
            Ok(Statement::FunctionDecl(parse_function(parser, true, true)?))
        }
        Token::Class => Ok(Statement::ClassDecl(parse_class(parser, true)?)),
        Token::If => parse_if_statement(parser),
        Token::For => parse_for_statement(parser),
        Token::While => parse_while_statement(parser),
        Token::Do => parse_do_while_statement(parser),
        Token::Return => parse_return_statement(parser),
        Token::Break => parse_jump_statement(parser).map(Statement::Break),
        Token::Continue => parse_jump_statement(parser).map(Statement::Continue),
        Token::Throw => parse_throw_statement(parser),
        Token::Try => parse_try_statement(parser),
        Token::Switch => parse_switch_statement(parser),
        Token::With => parse_with_statement(parser),
        Token::Debugger => {
            let span = parser.current_span();
            parser.advance();
            parser.consume_semicolon()?;
            Ok(Statement::Debugger(span))
        }
        Token::Semicolon => {
            let span = parser.current_span();
            parser.advance();
            Ok(Statement::Empty(span))
        }
        Token::Identifier(_) if matches!(parser.peek(), Token::Colon) => {
            parse_labeled_statement(parser)
        }
        _ => parse_expression_statement(parser),
    }
}

/// `let` starts a declaration only when a binding follows; otherwise it is
/// an ordinary identifier (`let = 1`, `let.x`).
fn let_starts_declaration(parser: &Parser<'_>) -> bool {
    matches!(
        parser.peek(),
        Token::Identifier(_) | Token::LeftBracket | Token::LeftBrace
    )
}

/// Parse `{ statements }`.
pub fn parse_block(parser: &mut Parser<'_>) -> Result<BlockStatement, ParseError> {
    let start = parser.expect(Token::LeftBrace)?;
    let mut statements = Vec::new();
    let mut guard = LoopGuard::new("block");

    while !parser.check(&Token::RightBrace) && !parser.at_eof() {
        guard.check()?;
        statements.push(parse_statement(parser)?);
    }

    parser.expect(Token::RightBrace)?;
    Ok(BlockStatement {
        statements,
        span: parser.finish(&start),
    })
}

fn parse_expression_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let expression = parse_expression(parser)?;
    parser.consume_semicolon()?;
    Ok(Statement::Expression(ExpressionStatement {
        expression,
        span: parser.finish(&start),
    }))
}

// ============================================================================
// Variable Declarations
// ============================================================================

/// Parse the declarators of `var`/`let`/`const`, without a terminator.
fn parse_variable_declaration(
    parser: &mut Parser<'_>,
    kind: VariableKind,
) -> Result<VariableDecl, ParseError> {
    let start = parser.current_span();
    parser.advance();

    let mut declarations = Vec::new();
    let mut guard = LoopGuard::new("declarators");
    loop {
        guard.check()?;
        let decl_start = parser.current_span();
        let target = parse_binding_pattern(parser)?;
        let init = if parser.eat(&Token::Equal) {
            Some(parse_assignment(parser)?)
        } else {
            None
        };
        declarations.push(VariableDeclarator {
            target,
            init,
            span: parser.finish(&decl_start),
        });
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    Ok(VariableDecl {
        kind,
        declarations,
        span: parser.finish(&start),
    })
}

fn parse_variable_statement(
    parser: &mut Parser<'_>,
    kind: VariableKind,
) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let mut decl = parse_variable_declaration(parser, kind)?;
    parser.consume_semicolon()?;
    decl.span = parser.finish(&start);
    Ok(Statement::VariableDecl(decl))
}

// ============================================================================
// Control Flow
// ============================================================================

fn parse_parenthesized(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    parser.expect(Token::LeftParen)?;
    let expr = parse_expression_allow_in(parser)?;
    parser.expect(Token::RightParen)?;
    Ok(expr)
}

fn parse_if_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::If)?;
    let condition = parse_parenthesized(parser)?;
    let then_branch = Box::new(parse_statement(parser)?);
    let else_branch = if parser.eat(&Token::Else) {
        Some(Box::new(parse_statement(parser)?))
    } else {
        None
    };

    Ok(Statement::If(IfStatement {
        condition,
        then_branch,
        else_branch,
        span: parser.finish(&start),
    }))
}

enum ForHead {
    Declaration(VariableDecl),
    Expression(Expression),
}

fn parse_for_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::For)?;
    let is_await = parser.in_async && parser.check_name(parser.names.await_);
    if is_await {
        parser.advance();
    }
    parser.expect(Token::LeftParen)?;

    let head = if parser.check(&Token::Semicolon) {
        None
    } else {
        let saved = std::mem::replace(&mut parser.no_in, true);
        let head = match parser.current() {
            Token::Var => parse_variable_declaration(parser, VariableKind::Var).map(ForHead::Declaration),
            Token::Const => {
                parse_variable_declaration(parser, VariableKind::Const).map(ForHead::Declaration)
            }
            Token::Identifier(name)
                if *name == parser.names.let_ && let_starts_declaration(parser) =>
            {
                parse_variable_declaration(parser, VariableKind::Let).map(ForHead::Declaration)
            }
            _ => parse_expression(parser).map(ForHead::Expression),
        };
        parser.no_in = saved;
        Some(head?)
    };

    if let Some(head) = head {
        let kind = if parser.check(&Token::In) {
            Some(ForInKind::In)
        } else if parser.check_name(parser.names.of) {
            Some(if is_await { ForInKind::AwaitOf } else { ForInKind::Of })
        } else {
            None
        };

        if let Some(kind) = kind {
            parser.advance();
            let left = match head {
                ForHead::Declaration(decl) => {
                    if decl.declarations.len() != 1 {
                        return Err(ParseError::invalid_syntax(
                            "Invalid left-hand side in for-loop: must have a single binding",
                            decl.span,
                        ));
                    }
                    ForInTarget::VariableDecl(decl)
                }
                ForHead::Expression(expr) => ForInTarget::Pattern(expression_to_pattern(expr)?),
            };
            let right = if kind == ForInKind::In {
                parse_expression_allow_in(parser)?
            } else {
                parse_assignment_allow_in(parser)?
            };
            parser.expect(Token::RightParen)?;
            let body = Box::new(parse_statement(parser)?);
            return Ok(Statement::ForIn(ForInStatement {
                kind,
                left,
                right,
                body,
                span: parser.finish(&start),
            }));
        }

        return parse_for_rest(
            parser,
            start,
            Some(match head {
                ForHead::Declaration(decl) => ForInit::VariableDecl(decl),
                ForHead::Expression(expr) => ForInit::Expression(expr),
            }),
        );
    }

    parse_for_rest(parser, start, None)
}

/// `; test; update) body` of a classic `for` loop.
fn parse_for_rest(
    parser: &mut Parser<'_>,
    start: crate::parser::token::Span,
    init: Option<ForInit>,
) -> Result<Statement, ParseError> {
    parser.expect(Token::Semicolon)?;
    let test = if parser.check(&Token::Semicolon) {
        None
    } else {
        Some(parse_expression_allow_in(parser)?)
    };
    parser.expect(Token::Semicolon)?;
    let update = if parser.check(&Token::RightParen) {
        None
    } else {
        Some(parse_expression_allow_in(parser)?)
    };
    parser.expect(Token::RightParen)?;
    let body = Box::new(parse_statement(parser)?);

    Ok(Statement::For(ForStatement {
        init,
        test,
        update,
        body,
        span: parser.finish(&start),
    }))
}

fn parse_while_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::While)?;
    let condition = parse_parenthesized(parser)?;
    let body = Box::new(parse_statement(parser)?);
    Ok(Statement::While(WhileStatement {
        condition,
        body,
        span: parser.finish(&start),
    }))
}

fn parse_do_while_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::Do)?;
    let body = Box::new(parse_statement(parser)?);
    parser.expect(Token::While)?;
    let condition = parse_parenthesized(parser)?;
    // The semicolon after do-while is always optional.
    parser.eat(&Token::Semicolon);
    Ok(Statement::DoWhile(DoWhileStatement {
        body,
        condition,
        span: parser.finish(&start),
    }))
}

/// Whether a restricted production (`return`, `break`, ...) ends here.
fn at_statement_end(parser: &Parser<'_>) -> bool {
    parser.check(&Token::Semicolon)
        || parser.check(&Token::RightBrace)
        || parser.at_eof()
        || parser.newline_before()
}

fn parse_return_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::Return)?;
    let value = if at_statement_end(parser) {
        None
    } else {
        Some(parse_expression_allow_in(parser)?)
    };
    parser.consume_semicolon()?;
    Ok(Statement::Return(ReturnStatement {
        value,
        span: parser.finish(&start),
    }))
}

fn parse_jump_statement(parser: &mut Parser<'_>) -> Result<JumpStatement, ParseError> {
    let start = parser.current_span();
    parser.advance();
    let label = if !at_statement_end(parser) && matches!(parser.current(), Token::Identifier(_)) {
        Some(parser.parse_identifier()?)
    } else {
        None
    };
    parser.consume_semicolon()?;
    Ok(JumpStatement {
        label,
        span: parser.finish(&start),
    })
}

fn parse_throw_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::Throw)?;
    if parser.newline_before() {
        return Err(ParseError::invalid_syntax("Illegal newline after throw", start));
    }
    let value = parse_expression_allow_in(parser)?;
    parser.consume_semicolon()?;
    Ok(Statement::Throw(ThrowStatement {
        value,
        span: parser.finish(&start),
    }))
}

fn parse_try_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::Try)?;
    let block = parse_block(parser)?;

    let handler = if parser.check(&Token::Catch) {
        let catch_start = parser.current_span();
        parser.advance();
        let param = if parser.eat(&Token::LeftParen) {
            let param = parse_binding_pattern(parser)?;
            parser.expect(Token::RightParen)?;
            Some(param)
        } else {
            None
        };
        let body = parse_block(parser)?;
        Some(CatchClause {
            param,
            body,
            span: parser.finish(&catch_start),
        })
    } else {
        None
    };

    let finalizer = if parser.eat(&Token::Finally) {
        Some(parse_block(parser)?)
    } else {
        None
    };

    if handler.is_none() && finalizer.is_none() {
        return Err(ParseError::invalid_syntax("Missing catch or finally after try", start)
            .with_suggestion("add a catch or finally block"));
    }

    Ok(Statement::Try(TryStatement {
        block,
        handler,
        finalizer,
        span: parser.finish(&start),
    }))
}

fn parse_switch_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::Switch)?;
    let discriminant = parse_parenthesized(parser)?;
    parser.expect(Token::LeftBrace)?;

    let mut cases = Vec::new();
    let mut guard = LoopGuard::new("switch_cases");
    while !parser.check(&Token::RightBrace) {
        guard.check()?;
        let case_start = parser.current_span();
        let test = if parser.eat(&Token::Case) {
            Some(parse_expression_allow_in(parser)?)
        } else {
            parser.expect(Token::Default)?;
            None
        };
        parser.expect(Token::Colon)?;

        let mut consequent = Vec::new();
        while !matches!(
            parser.current(),
            Token::Case | Token::Default | Token::RightBrace | Token::Eof
        ) {
            guard.check()?;
            consequent.push(parse_statement(parser)?);
        }
        cases.push(SwitchCase {
            test,
            consequent,
            span: parser.finish(&case_start),
        });
    }

    parser.expect(Token::RightBrace)?;
    Ok(Statement::Switch(SwitchStatement {
        discriminant,
        cases,
        span: parser.finish(&start),
    }))
}

fn parse_with_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.expect(Token::With)?;
    let object = parse_parenthesized(parser)?;
    let body = Box::new(parse_statement(parser)?);
    Ok(Statement::With(WithStatement {
        object,
        body,
        span: parser.finish(&start),
    }))
}

fn parse_labeled_statement(parser: &mut Parser<'_>) -> Result<Statement, ParseError> {
    let start = parser.current_span();
    let label = parser.parse_identifier()?;
    parser.expect(Token::Colon)?;
    let body = Box::new(parse_statement(parser)?);
    Ok(Statement::Labeled(LabeledStatement {
        label,
        body,
        span: parser.finish(&start),
    }))
}
