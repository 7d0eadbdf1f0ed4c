//! Expression parsing
//!
//! Precedence climbing for binary operators; everything above it (arrow
//! functions, assignment, conditional) and below it (unary, postfix, call
//! chains, primaries) is plain recursive descent.

use super::guards::{nested, LoopGuard};
use super::pattern::{expression_to_pattern, is_simple_target, parse_parameters};
use super::{stmt, ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::{Span, TemplatePosition, Token};

/// Parse a full expression, including the comma operator.
pub fn parse_expression(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let first = parse_assignment(parser)?;
    if !parser.check(&Token::Comma) {
        return Ok(first);
    }

    let mut expressions = vec![first];
    let mut guard = LoopGuard::new("sequence");
    while parser.eat(&Token::Comma) {
        guard.check()?;
        expressions.push(parse_assignment(parser)?);
    }
    let span = parser.finish(&start);
    Ok(Expression::Sequence(SequenceExpression { expressions, span }))
}

/// Parse an expression where `in` is always the operator, even inside a
/// `for` head (parenthesised and bracketed contexts).
pub fn parse_expression_allow_in(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let saved = std::mem::replace(&mut parser.no_in, false);
    let result = parse_expression(parser);
    parser.no_in = saved;
    result
}

pub fn parse_assignment_allow_in(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let saved = std::mem::replace(&mut parser.no_in, false);
    let result = parse_assignment(parser);
    parser.no_in = saved;
    result
}

/// Parse an assignment expression (no comma operator).
pub fn parse_assignment(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    nested(parser, "expression", parse_assignment_inner)
}

fn parse_assignment_inner(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    if let Some(is_async) = arrow_ahead(parser) {
        return parse_arrow_function(parser, is_async);
    }
    if parser.in_generator && parser.check_name(parser.names.yield_) {
        return parse_yield(parser);
    }

    let start = parser.current_span();
    let left = parse_conditional(parser)?;

    let Some(operator) = assignment_operator(parser.current()) else {
        return Ok(left);
    };
    if operator != AssignmentOperator::Assign && !is_simple_target(&left) {
        return Err(ParseError::invalid_assignment_target(*left.span()));
    }
    let target = expression_to_pattern(left)?;
    parser.advance();
    let value = parse_assignment(parser)?;
    let span = parser.finish(&start);

    Ok(Expression::Assignment(AssignmentExpression {
        operator,
        target: Box::new(target),
        value: Box::new(value),
        span,
    }))
}

fn assignment_operator(token: &Token) -> Option<AssignmentOperator> {
    let op = match token {
        Token::Equal => AssignmentOperator::Assign,
        Token::PlusEqual => AssignmentOperator::AddAssign,
        Token::MinusEqual => AssignmentOperator::SubtractAssign,
        Token::StarEqual => AssignmentOperator::MultiplyAssign,
        Token::SlashEqual => AssignmentOperator::DivideAssign,
        Token::PercentEqual => AssignmentOperator::ModuloAssign,
        Token::StarStarEqual => AssignmentOperator::ExponentAssign,
        Token::LessLessEqual => AssignmentOperator::LeftShiftAssign,
        Token::GreaterGreaterEqual => AssignmentOperator::RightShiftAssign,
        Token::GreaterGreaterGreaterEqual => AssignmentOperator::UnsignedRightShiftAssign,
        Token::AmpEqual => AssignmentOperator::BitwiseAndAssign,
        Token::PipeEqual => AssignmentOperator::BitwiseOrAssign,
        Token::CaretEqual => AssignmentOperator::BitwiseXorAssign,
        Token::AmpAmpEqual => AssignmentOperator::AndAssign,
        Token::PipePipeEqual => AssignmentOperator::OrAssign,
        Token::QuestionQuestionEqual => AssignmentOperator::CoalesceAssign,
        _ => return None,
    };
    Some(op)
}

// ============================================================================
// Arrow functions
// ============================================================================

/// Detect an arrow function at the current position without consuming
/// anything. Returns whether it is `async`.
fn arrow_ahead(parser: &Parser<'_>) -> Option<bool> {
    let at = parser.position();
    let simple_param = |index: usize| {
        matches!(parser.token_at(index), Token::Identifier(_))
            && matches!(parser.token_at(index + 1), Token::Arrow)
            && !parser.newline_before_token(index + 1)
    };
    let paren_params = |index: usize| {
        matches!(parser.token_at(index), Token::LeftParen)
            && matching_paren(parser, index).is_some_and(|close| {
                matches!(parser.token_at(close + 1), Token::Arrow)
                    && !parser.newline_before_token(close + 1)
            })
    };

    if parser.check_name(parser.names.async_) && !parser.newline_before_token(at + 1) {
        if simple_param(at + 1) || paren_params(at + 1) {
            return Some(true);
        }
    }
    if simple_param(at) || paren_params(at) {
        return Some(false);
    }
    None
}

/// Index of the `)` closing the `(` at `open`.
fn matching_paren(parser: &Parser<'_>, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut index = open;
    loop {
        match parser.token_at(index) {
            Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
            Token::Template(chunk) if chunk.position == TemplatePosition::Head => depth += 1,
            Token::Template(chunk) if chunk.position == TemplatePosition::Tail => {
                depth = depth.checked_sub(1)?;
            }
            tok @ (Token::RightParen | Token::RightBracket | Token::RightBrace) => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return matches!(tok, Token::RightParen).then_some(index);
                }
            }
            Token::Eof => return None,
            _ => {}
        }
        index += 1;
    }
}

fn parse_arrow_function(parser: &mut Parser<'_>, is_async: bool) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    if is_async {
        parser.advance();
    }

    let saved = (parser.in_async, parser.in_generator);
    parser.in_async = is_async;
    parser.in_generator = false;
    let result = parse_arrow_rest(parser, is_async, start);
    (parser.in_async, parser.in_generator) = saved;
    result
}

fn parse_arrow_rest(
    parser: &mut Parser<'_>,
    is_async: bool,
    start: Span,
) -> Result<Expression, ParseError> {
    let params = if parser.check(&Token::LeftParen) {
        parse_parameters(parser)?
    } else {
        vec![Pattern::Identifier(parser.parse_identifier()?)]
    };
    parser.expect(Token::Arrow)?;

    let body = if parser.check(&Token::LeftBrace) {
        let saved = std::mem::replace(&mut parser.no_in, false);
        let block = stmt::parse_block(parser);
        parser.no_in = saved;
        ArrowBody::Block(block?)
    } else {
        ArrowBody::Expression(Box::new(parse_assignment(parser)?))
    };

    let span = parser.finish(&start);
    Ok(Expression::Arrow(Box::new(ArrowFunction {
        params,
        body,
        is_async,
        span,
    })))
}

fn parse_yield(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    parser.advance();

    let ends_here = parser.newline_before()
        || matches!(
            parser.current(),
            Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
                | Token::Comma
                | Token::Semicolon
                | Token::Colon
                | Token::Eof
        )
        || matches!(
            parser.current(),
            Token::Template(chunk)
                if matches!(chunk.position, TemplatePosition::Middle | TemplatePosition::Tail)
        );
    if ends_here {
        return Ok(Expression::Yield(YieldExpression {
            argument: None,
            delegate: false,
            span: start,
        }));
    }

    let delegate = parser.eat(&Token::Star);
    let argument = parse_assignment(parser)?;
    let span = parser.finish(&start);
    Ok(Expression::Yield(YieldExpression {
        argument: Some(Box::new(argument)),
        delegate,
        span,
    }))
}

// ============================================================================
// Conditional and binary operators
// ============================================================================

fn parse_conditional(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let test = parse_binary(parser, 0)?;
    if !parser.eat(&Token::Question) {
        return Ok(test);
    }

    let consequent = parse_assignment_allow_in(parser)?;
    parser.expect(Token::Colon)?;
    let alternate = parse_assignment(parser)?;
    let span = parser.finish(&start);

    Ok(Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
        span,
    }))
}

#[derive(Clone, Copy)]
enum BinaryOp {
    Binary(BinaryOperator),
    Logical(LogicalOperator),
}

/// Binary operator and its precedence (higher binds tighter).
fn binary_operator(token: &Token, no_in: bool) -> Option<(u8, BinaryOp)> {
    use BinaryOp::{Binary, Logical};
    let entry = match token {
        Token::QuestionQuestion => (1, Logical(LogicalOperator::Coalesce)),
        Token::PipePipe => (2, Logical(LogicalOperator::Or)),
        Token::AmpAmp => (3, Logical(LogicalOperator::And)),
        Token::Pipe => (4, Binary(BinaryOperator::BitwiseOr)),
        Token::Caret => (5, Binary(BinaryOperator::BitwiseXor)),
        Token::Amp => (6, Binary(BinaryOperator::BitwiseAnd)),
        Token::EqualEqual => (7, Binary(BinaryOperator::Equal)),
        Token::BangEqual => (7, Binary(BinaryOperator::NotEqual)),
        Token::EqualEqualEqual => (7, Binary(BinaryOperator::StrictEqual)),
        Token::BangEqualEqual => (7, Binary(BinaryOperator::StrictNotEqual)),
        Token::Less => (8, Binary(BinaryOperator::LessThan)),
        Token::LessEqual => (8, Binary(BinaryOperator::LessEqual)),
        Token::Greater => (8, Binary(BinaryOperator::GreaterThan)),
        Token::GreaterEqual => (8, Binary(BinaryOperator::GreaterEqual)),
        Token::Instanceof => (8, Binary(BinaryOperator::Instanceof)),
        Token::In if !no_in => (8, Binary(BinaryOperator::In)),
        Token::LessLess => (9, Binary(BinaryOperator::LeftShift)),
        Token::GreaterGreater => (9, Binary(BinaryOperator::RightShift)),
        Token::GreaterGreaterGreater => (9, Binary(BinaryOperator::UnsignedRightShift)),
        Token::Plus => (10, Binary(BinaryOperator::Add)),
        Token::Minus => (10, Binary(BinaryOperator::Subtract)),
        Token::Star => (11, Binary(BinaryOperator::Multiply)),
        Token::Slash => (11, Binary(BinaryOperator::Divide)),
        Token::Percent => (11, Binary(BinaryOperator::Modulo)),
        Token::StarStar => (12, Binary(BinaryOperator::Exponent)),
        _ => return None,
    };
    Some(entry)
}

fn parse_binary(parser: &mut Parser<'_>, min_precedence: u8) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let mut left = parse_unary(parser)?;
    let mut guard = LoopGuard::new("binary");

    while let Some((precedence, op)) = binary_operator(parser.current(), parser.no_in) {
        guard.check()?;
        if precedence < min_precedence {
            break;
        }
        parser.advance();
        // `**` is right-associative.
        let next_min = if matches!(op, BinaryOp::Binary(BinaryOperator::Exponent)) {
            precedence
        } else {
            precedence + 1
        };
        let right = parse_binary(parser, next_min)?;
        let span = parser.finish(&start);
        left = match op {
            BinaryOp::Binary(operator) => Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                span,
            }),
            BinaryOp::Logical(operator) => Expression::Logical(LogicalExpression {
                operator,
                left: Box::new(left),
                right: Box::new(right),
                span,
            }),
        };
    }

    Ok(left)
}

// ============================================================================
// Unary and postfix
// ============================================================================

fn unary_operator(token: &Token) -> Option<UnaryOperator> {
    let op = match token {
        Token::Bang => UnaryOperator::Not,
        Token::Tilde => UnaryOperator::BitwiseNot,
        Token::Plus => UnaryOperator::Plus,
        Token::Minus => UnaryOperator::Minus,
        Token::Typeof => UnaryOperator::Typeof,
        Token::Void => UnaryOperator::Void,
        Token::Delete => UnaryOperator::Delete,
        _ => return None,
    };
    Some(op)
}

fn parse_unary(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();

    if let Some(operator) = unary_operator(parser.current()) {
        parser.advance();
        let argument = nested(parser, "unary expression", parse_unary)?;
        let span = parser.finish(&start);
        return Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
            span,
        }));
    }

    if matches!(parser.current(), Token::PlusPlus | Token::MinusMinus) {
        let operator = if parser.check(&Token::PlusPlus) {
            UpdateOperator::Increment
        } else {
            UpdateOperator::Decrement
        };
        parser.advance();
        let argument = nested(parser, "unary expression", parse_unary)?;
        if !is_simple_target(&argument) {
            return Err(ParseError::invalid_assignment_target(*argument.span()));
        }
        let span = parser.finish(&start);
        return Ok(Expression::Update(UpdateExpression {
            operator,
            prefix: true,
            argument: Box::new(argument),
            span,
        }));
    }

    if parser.in_async && parser.check_name(parser.names.await_) {
        parser.advance();
        let argument = nested(parser, "await expression", parse_unary)?;
        let span = parser.finish(&start);
        return Ok(Expression::Await(AwaitExpression {
            argument: Box::new(argument),
            span,
        }));
    }

    parse_postfix(parser)
}

fn parse_postfix(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let expr = parse_left_hand_side(parser)?;

    if matches!(parser.current(), Token::PlusPlus | Token::MinusMinus) && !parser.newline_before()
    {
        if !is_simple_target(&expr) {
            return Err(ParseError::invalid_assignment_target(*expr.span()));
        }
        let operator = if parser.check(&Token::PlusPlus) {
            UpdateOperator::Increment
        } else {
            UpdateOperator::Decrement
        };
        parser.advance();
        let span = parser.finish(&start);
        return Ok(Expression::Update(UpdateExpression {
            operator,
            prefix: false,
            argument: Box::new(expr),
            span,
        }));
    }

    Ok(expr)
}

// ============================================================================
// Calls and member access
// ============================================================================

/// Parse a call/member chain: `a.b[c](d)?.e`
pub fn parse_left_hand_side(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.current_span();
    let mut expr = match parser.current() {
        Token::New => parse_new(parser)?,
        Token::Super => {
            parser.advance();
            Expression::Super(start)
        }
        Token::Import => parse_import(parser)?,
        _ => parse_primary(parser)?,
    };

    let mut guard = LoopGuard::new("call_chain");
    loop {
        guard.check()?;
        expr = match parser.current() {
            Token::Dot => {
                parser.advance();
                let property = parse_member_name(parser)?;
                member(parser, &start, expr, property, false)
            }
            Token::QuestionDot => {
                parser.advance();
                match parser.current() {
                    Token::LeftParen => {
                        let arguments = parse_arguments(parser)?;
                        call(parser, &start, expr, arguments, true)
                    }
                    Token::LeftBracket => {
                        let property = parse_computed_member(parser)?;
                        member(parser, &start, expr, property, true)
                    }
                    _ => {
                        let property = parse_member_name(parser)?;
                        member(parser, &start, expr, property, true)
                    }
                }
            }
            Token::LeftBracket => {
                let property = parse_computed_member(parser)?;
                member(parser, &start, expr, property, false)
            }
            Token::LeftParen => {
                let arguments = parse_arguments(parser)?;
                call(parser, &start, expr, arguments, false)
            }
            _ if opens_template(parser.current()) => tagged_template(parser, &start, expr)?,
            _ => break,
        };
    }

    Ok(expr)
}

/// A template piece that begins a literal. Middle and tail pieces belong to
/// the literal whose substitution is being parsed.
fn opens_template(token: &Token) -> bool {
    matches!(
        token,
        Token::Template(chunk)
            if matches!(chunk.position, TemplatePosition::Full | TemplatePosition::Head)
    )
}

fn member(
    parser: &Parser<'_>,
    start: &Span,
    object: Expression,
    property: MemberProperty,
    optional: bool,
) -> Expression {
    Expression::Member(MemberExpression {
        object: Box::new(object),
        property,
        optional,
        span: parser.finish(start),
    })
}

fn call(
    parser: &Parser<'_>,
    start: &Span,
    callee: Expression,
    arguments: Vec<Expression>,
    optional: bool,
) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments,
        optional,
        span: parser.finish(start),
    })
}

fn tagged_template(
    parser: &mut Parser<'_>,
    start: &Span,
    tag: Expression,
) -> Result<Expression, ParseError> {
    let quasi = parse_template(parser)?;
    Ok(Expression::TaggedTemplate(TaggedTemplateExpression {
        tag: Box::new(tag),
        quasi,
        span: parser.finish(start),
    }))
}

fn parse_member_name(parser: &mut Parser<'_>) -> Result<MemberProperty, ParseError> {
    if let Token::PrivateName(name) = parser.current().clone() {
        let span = parser.current_span();
        parser.advance();
        return Ok(MemberProperty::Private(Identifier::new(name, span)));
    }
    Ok(MemberProperty::Identifier(parser.parse_identifier_name()?))
}

fn parse_computed_member(parser: &mut Parser<'_>) -> Result<MemberProperty, ParseError> {
    parser.expect(Token::LeftBracket)?;
    let property = parse_expression_allow_in(parser)?;
    parser.expect(Token::RightBracket)?;
    Ok(MemberProperty::Computed(Box::new(property)))
}

/// Parse `( args )`, including spread arguments.
pub fn parse_arguments(parser: &mut Parser<'_>) -> Result<Vec<Expression>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut arguments = Vec::new();
    let mut guard = LoopGuard::new("arguments");

    while !parser.check(&Token::RightParen) {
        guard.check()?;
        arguments.push(parse_spread_or_assignment(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(arguments)
}

fn parse_spread_or_assignment(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    if !parser.check(&Token::DotDotDot) {
        return parse_assignment_allow_in(parser);
    }
    let start = parser.current_span();
    parser.advance();
    let argument = parse_assignment_allow_in(parser)?;
    let span = parser.finish(&start);
    Ok(Expression::Spread(SpreadElement {
        argument: Box::new(argument),
        span,
    }))
}

/// `new X(args)`, `new X`, `new.target`
fn parse_new(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    nested(parser, "new expression", |parser| {
        let start = parser.expect(Token::New)?;

        if parser.eat(&Token::Dot) {
            let meta_name = parser.intern("new");
            let meta = Identifier::new(meta_name, start);
            let property = parser.parse_identifier_name()?;
            if property.name != parser.names.target {
                return Err(ParseError::invalid_syntax(
                    "The only valid meta property for new is new.target",
                    property.span,
                ));
            }
            return Ok(Expression::MetaProperty(MetaProperty {
                meta,
                property,
                span: parser.finish(&start),
            }));
        }

        let callee_start = parser.current_span();
        let mut callee = match parser.current() {
            Token::New => parse_new(parser)?,
            Token::Import => {
                return Err(ParseError::invalid_syntax(
                    "Cannot use new with import",
                    parser.current_span(),
                ))
            }
            _ => parse_primary(parser)?,
        };

        // Member accesses bind to the callee; the first `(` is the argument list.
        let mut guard = LoopGuard::new("new_callee");
        loop {
            guard.check()?;
            callee = match parser.current() {
                Token::Dot => {
                    parser.advance();
                    let property = parse_member_name(parser)?;
                    member(parser, &callee_start, callee, property, false)
                }
                Token::LeftBracket => {
                    let property = parse_computed_member(parser)?;
                    member(parser, &callee_start, callee, property, false)
                }
                _ if opens_template(parser.current()) => {
                    tagged_template(parser, &callee_start, callee)?
                }
                _ => break,
            };
        }

        let arguments = if parser.check(&Token::LeftParen) {
            parse_arguments(parser)?
        } else {
            Vec::new()
        };

        Ok(Expression::New(NewExpression {
            callee: Box::new(callee),
            arguments,
            span: parser.finish(&start),
        }))
    })
}

/// `import(specifier)` or `import.meta`
fn parse_import(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.expect(Token::Import)?;

    if parser.eat(&Token::Dot) {
        let meta_name = parser.intern("import");
        let meta = Identifier::new(meta_name, start);
        let property = parser.parse_identifier_name()?;
        return Ok(Expression::MetaProperty(MetaProperty {
            meta,
            property,
            span: parser.finish(&start),
        }));
    }

    if !parser.check(&Token::LeftParen) {
        return Err(ParseError::invalid_syntax(
            "Cannot use import statement outside a module",
            start,
        ));
    }
    parser.advance();
    let source = parse_assignment_allow_in(parser)?;
    let options = if parser.eat(&Token::Comma) && !parser.check(&Token::RightParen) {
        Some(Box::new(parse_assignment_allow_in(parser)?))
    } else {
        None
    };
    parser.eat(&Token::Comma);
    parser.expect(Token::RightParen)?;

    Ok(Expression::ImportCall(ImportCallExpression {
        source: Box::new(source),
        options,
        span: parser.finish(&start),
    }))
}

// ============================================================================
// Primary expressions
// ============================================================================

fn parse_primary(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let span = parser.current_span();
    let literal = |value| Expression::Literal(Literal { value, span });

    let expr = match parser.current().clone() {
        Token::This => {
            parser.advance();
            Expression::This(span)
        }
        Token::Identifier(name) => {
            if name == parser.names.async_
                && parser.check_function_after_async()
            {
                return Ok(Expression::Function(Box::new(parse_function(parser, true, false)?)));
            }
            parser.advance();
            Expression::Identifier(Identifier::new(name, span))
        }
        Token::Number(n) => {
            parser.advance();
            literal(LiteralValue::Number(n))
        }
        Token::BigInt(digits) => {
            parser.advance();
            literal(LiteralValue::BigInt(digits))
        }
        Token::String(s) => {
            parser.advance();
            literal(LiteralValue::String(s))
        }
        Token::True => {
            parser.advance();
            literal(LiteralValue::Boolean(true))
        }
        Token::False => {
            parser.advance();
            literal(LiteralValue::Boolean(false))
        }
        Token::Null => {
            parser.advance();
            literal(LiteralValue::Null)
        }
        Token::RegExp { pattern, flags } => {
            parser.advance();
            literal(LiteralValue::RegExp { pattern, flags })
        }
        Token::Template(_) => Expression::Template(parse_template(parser)?),
        Token::LeftParen => {
            parser.advance();
            let expression = parse_expression_allow_in(parser)?;
            parser.expect(Token::RightParen)?;
            Expression::Parenthesized(ParenthesizedExpression {
                expression: Box::new(expression),
                span: parser.finish(&span),
            })
        }
        Token::LeftBracket => parse_array_literal(parser)?,
        Token::LeftBrace => parse_object_literal(parser)?,
        Token::Function => Expression::Function(Box::new(parse_function(parser, false, false)?)),
        Token::Class => Expression::Class(Box::new(parse_class(parser, false)?)),
        _ => return Err(parser.unexpected_token("expression")),
    };

    Ok(expr)
}

fn parse_template(parser: &mut Parser<'_>) -> Result<TemplateLiteral, ParseError> {
    let start = parser.current_span();
    let Token::Template(head) = parser.advance() else {
        return Err(ParseError::invalid_syntax("Expected template literal", start));
    };

    let mut quasis = vec![head.cooked];
    let mut expressions = Vec::new();

    if head.position == TemplatePosition::Head {
        let mut guard = LoopGuard::new("template");
        loop {
            guard.check()?;
            expressions.push(parse_expression_allow_in(parser)?);
            let chunk_span = parser.current_span();
            match parser.advance() {
                Token::Template(chunk) if chunk.position == TemplatePosition::Middle => {
                    quasis.push(chunk.cooked);
                }
                Token::Template(chunk) if chunk.position == TemplatePosition::Tail => {
                    quasis.push(chunk.cooked);
                    break;
                }
                _ => {
                    return Err(ParseError::invalid_syntax(
                        "Unterminated template substitution",
                        chunk_span,
                    ))
                }
            }
        }
    }

    Ok(TemplateLiteral {
        quasis,
        expressions,
        span: parser.finish(&start),
    })
}

fn parse_array_literal(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.expect(Token::LeftBracket)?;
    let mut elements = Vec::new();
    let mut guard = LoopGuard::new("array_literal");

    while !parser.check(&Token::RightBracket) {
        guard.check()?;
        if parser.eat(&Token::Comma) {
            elements.push(None);
            continue;
        }
        elements.push(Some(parse_spread_or_assignment(parser)?));
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBracket)?;
    Ok(Expression::Array(ArrayExpression {
        elements,
        span: parser.finish(&start),
    }))
}

/// Tokens that end a property name, so a preceding `get`, `set`, `async`
/// or `static` is the name itself rather than a modifier.
fn ends_property_name(token: &Token) -> bool {
    matches!(
        token,
        Token::LeftParen
            | Token::Comma
            | Token::Colon
            | Token::RightBrace
            | Token::Equal
            | Token::Semicolon
            | Token::Eof
    )
}

/// Method modifiers shared by object literals and class bodies.
struct MethodPrefix {
    is_async: bool,
    is_generator: bool,
    kind: MethodKind,
}

impl MethodPrefix {
    fn any(&self) -> bool {
        self.is_async || self.is_generator || self.kind != MethodKind::Method
    }
}

fn parse_method_prefix(parser: &mut Parser<'_>) -> MethodPrefix {
    let mut prefix = MethodPrefix {
        is_async: false,
        is_generator: false,
        kind: MethodKind::Method,
    };

    let next = parser.position() + 1;
    if parser.check_name(parser.names.async_)
        && !ends_property_name(parser.peek())
        && !parser.newline_before_token(next)
    {
        parser.advance();
        prefix.is_async = true;
    }
    if parser.eat(&Token::Star) {
        prefix.is_generator = true;
    }
    if !prefix.is_async && !prefix.is_generator && !ends_property_name(parser.peek()) {
        if parser.check_name(parser.names.get) {
            parser.advance();
            prefix.kind = MethodKind::Getter;
        } else if parser.check_name(parser.names.set) {
            parser.advance();
            prefix.kind = MethodKind::Setter;
        }
    }
    prefix
}

fn parse_object_literal(parser: &mut Parser<'_>) -> Result<Expression, ParseError> {
    let start = parser.expect(Token::LeftBrace)?;
    let mut properties = Vec::new();
    let mut guard = LoopGuard::new("object_literal");

    while !parser.check(&Token::RightBrace) {
        guard.check()?;
        properties.push(parse_object_property(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBrace)?;
    Ok(Expression::Object(ObjectExpression {
        properties,
        span: parser.finish(&start),
    }))
}

fn parse_object_property(parser: &mut Parser<'_>) -> Result<ObjectProperty, ParseError> {
    let start = parser.current_span();

    if parser.eat(&Token::DotDotDot) {
        let argument = parse_assignment_allow_in(parser)?;
        return Ok(ObjectProperty::Spread(argument, parser.finish(&start)));
    }

    let prefix = parse_method_prefix(parser);
    let is_plain_name = matches!(parser.current(), Token::Identifier(_));
    let key = parse_property_key(parser)?;

    if prefix.any() || parser.check(&Token::LeftParen) {
        let function = parse_method(parser, start, prefix.is_async, prefix.is_generator)?;
        return Ok(ObjectProperty::Method {
            key,
            kind: prefix.kind,
            function,
        });
    }

    if parser.eat(&Token::Colon) {
        let value = parse_assignment_allow_in(parser)?;
        return Ok(ObjectProperty::Property {
            key,
            value,
            span: parser.finish(&start),
        });
    }

    match key {
        PropertyKey::Identifier(name) if is_plain_name => {
            let default = if parser.eat(&Token::Equal) {
                Some(Box::new(parse_assignment_allow_in(parser)?))
            } else {
                None
            };
            Ok(ObjectProperty::Shorthand {
                name,
                default,
                span: parser.finish(&start),
            })
        }
        _ => Err(parser.unexpected_token("':'")),
    }
}

/// Parse a property name: identifier, reserved word, string, number,
/// `[computed]` or `#private`.
pub fn parse_property_key(parser: &mut Parser<'_>) -> Result<PropertyKey, ParseError> {
    let span = parser.current_span();
    let key = match parser.current().clone() {
        Token::Identifier(name) => PropertyKey::Identifier(Identifier::new(name, span)),
        Token::String(s) => PropertyKey::String(s, span),
        Token::Number(n) => PropertyKey::Number(n, span),
        Token::BigInt(digits) => PropertyKey::BigInt(digits, span),
        Token::PrivateName(name) => PropertyKey::Private(Identifier::new(name, span)),
        Token::LeftBracket => {
            parser.advance();
            let expr = parse_assignment_allow_in(parser)?;
            parser.expect(Token::RightBracket)?;
            return Ok(PropertyKey::Computed(Box::new(expr), parser.finish(&span)));
        }
        tok => match tok.keyword_text() {
            Some(word) => {
                let name = parser.intern(word);
                PropertyKey::Identifier(Identifier::new(name, span))
            }
            None => return Err(parser.unexpected_token("property name")),
        },
    };
    parser.advance();
    Ok(key)
}

// ============================================================================
// Functions and classes
// ============================================================================

/// Parse `[async] function [*] [name] (params) { body }`.
pub fn parse_function(
    parser: &mut Parser<'_>,
    is_async: bool,
    name_required: bool,
) -> Result<Function, ParseError> {
    let start = parser.current_span();
    if is_async {
        parser.advance();
    }
    parser.expect(Token::Function)?;
    let is_generator = parser.eat(&Token::Star);

    let id = if matches!(parser.current(), Token::Identifier(_)) {
        Some(parser.parse_identifier()?)
    } else if name_required {
        return Err(parser.unexpected_token("function name"));
    } else {
        None
    };

    let (params, body) = parse_function_parts(parser, is_async, is_generator)?;
    Ok(Function {
        id,
        params,
        body,
        is_async,
        is_generator,
        span: parser.finish(&start),
    })
}

fn parse_method(
    parser: &mut Parser<'_>,
    start: Span,
    is_async: bool,
    is_generator: bool,
) -> Result<Function, ParseError> {
    let (params, body) = parse_function_parts(parser, is_async, is_generator)?;
    Ok(Function {
        id: None,
        params,
        body,
        is_async,
        is_generator,
        span: parser.finish(&start),
    })
}

/// Parameters and body, with `await`/`yield` set up for this function.
fn parse_function_parts(
    parser: &mut Parser<'_>,
    is_async: bool,
    is_generator: bool,
) -> Result<(Vec<Pattern>, BlockStatement), ParseError> {
    let saved = (parser.in_async, parser.in_generator, parser.no_in);
    parser.in_async = is_async;
    parser.in_generator = is_generator;
    parser.no_in = false;

    let result = parse_parameters(parser)
        .and_then(|params| stmt::parse_block(parser).map(|body| (params, body)));

    (parser.in_async, parser.in_generator, parser.no_in) = saved;
    result
}

/// Parse `class [name] [extends Base] { members }`.
pub fn parse_class(parser: &mut Parser<'_>, name_required: bool) -> Result<Class, ParseError> {
    let start = parser.expect(Token::Class)?;

    let id = if matches!(parser.current(), Token::Identifier(_)) {
        Some(parser.parse_identifier()?)
    } else if name_required {
        return Err(parser.unexpected_token("class name"));
    } else {
        None
    };

    let super_class = if parser.eat(&Token::Extends) {
        Some(Box::new(parse_left_hand_side(parser)?))
    } else {
        None
    };

    parser.expect(Token::LeftBrace)?;
    let mut members = Vec::new();
    let mut guard = LoopGuard::new("class_body");
    while !parser.check(&Token::RightBrace) {
        guard.check()?;
        if parser.eat(&Token::Semicolon) {
            continue;
        }
        members.push(parse_class_member(parser)?);
    }
    parser.expect(Token::RightBrace)?;

    Ok(Class {
        id,
        super_class,
        members,
        span: parser.finish(&start),
    })
}

fn parse_class_member(parser: &mut Parser<'_>) -> Result<ClassMember, ParseError> {
    let start = parser.current_span();

    let mut is_static = false;
    if parser.check_name(parser.names.static_) && !ends_property_name(parser.peek()) {
        parser.advance();
        if parser.check(&Token::LeftBrace) {
            let saved = (parser.in_async, parser.in_generator);
            (parser.in_async, parser.in_generator) = (false, false);
            let block = stmt::parse_block(parser);
            (parser.in_async, parser.in_generator) = saved;
            return Ok(ClassMember::StaticBlock(block?));
        }
        is_static = true;
    }

    let prefix = parse_method_prefix(parser);
    let key = parse_property_key(parser)?;

    if prefix.any() || parser.check(&Token::LeftParen) {
        let is_constructor = !is_static
            && prefix.kind == MethodKind::Method
            && matches!(&key, PropertyKey::Identifier(id) if id.name == parser.names.constructor);
        let kind = if is_constructor {
            MethodKind::Constructor
        } else {
            prefix.kind
        };
        let function = parse_method(parser, start, prefix.is_async, prefix.is_generator)?;
        return Ok(ClassMember::Method {
            key,
            kind,
            is_static,
            function,
        });
    }

    let value = if parser.eat(&Token::Equal) {
        let saved = (parser.in_async, parser.in_generator);
        (parser.in_async, parser.in_generator) = (false, false);
        let value = parse_assignment_allow_in(parser);
        (parser.in_async, parser.in_generator) = saved;
        Some(value?)
    } else {
        None
    };
    parser.consume_semicolon()?;

    Ok(ClassMember::Field {
        key,
        value,
        is_static,
        span: parser.finish(&start),
    })
}

impl Parser<'_> {
    /// `async function` with no line break between the two words.
    pub(crate) fn check_function_after_async(&self) -> bool {
        self.check_name(self.names.async_)
            && matches!(self.peek(), Token::Function)
            && !self.newline_before_token(self.position() + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expression(source: &str) -> Expression {
        let script = Parser::parse_source(source).expect("should parse");
        match script.program.statements.into_iter().next() {
            Some(Statement::Expression(s)) => s.expression,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        let Expression::Binary(add) = expression("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
        assert!(matches!(*add.right, Expression::Binary(ref m) if m.operator == BinaryOperator::Multiply));

        let Expression::Binary(pow) = expression("2 ** 3 ** 2") else {
            panic!("expected binary");
        };
        assert!(matches!(*pow.right, Expression::Binary(_)));
    }

    #[test]
    fn test_arrow_functions() {
        assert!(matches!(expression("x => x"), Expression::Arrow(ref a) if !a.is_async));
        assert!(matches!(expression("(a, {b}) => a"), Expression::Arrow(ref a) if a.params.len() == 2));
        assert!(matches!(expression("async (a) => { await a; }"), Expression::Arrow(ref a) if a.is_async));
        assert!(matches!(expression("async x => x"), Expression::Arrow(ref a) if a.is_async));
        // A call to a function named `async` is not an arrow.
        assert!(matches!(expression("async(a)"), Expression::Call(_)));
    }

    #[test]
    fn test_dynamic_import_span_starts_at_keyword() {
        let Expression::ImportCall(import) = expression("import('fs')") else {
            panic!("expected import call");
        };
        assert_eq!(import.span.start, 0);
    }

    #[test]
    fn test_optional_chaining_and_calls() {
        let Expression::Call(call) = expression("a?.b.c?.(1, ...rest)") else {
            panic!("expected call");
        };
        assert!(call.optional);
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn test_object_literal_members() {
        let Expression::Parenthesized(p) =
            expression("({ a, b: 1, [c]: 2, get d() { return 1; }, async *e() {}, get: 3, ...f })")
        else {
            panic!("expected parenthesized");
        };
        let Expression::Object(object) = *p.expression else {
            panic!("expected object");
        };
        assert_eq!(object.properties.len(), 7);
        assert!(matches!(
            object.properties[3],
            ObjectProperty::Method { kind: MethodKind::Getter, .. }
        ));
        assert!(matches!(
            object.properties[4],
            ObjectProperty::Method { ref function, .. } if function.is_async && function.is_generator
        ));
        assert!(matches!(object.properties[5], ObjectProperty::Property { .. }));
    }

    #[test]
    fn test_keywords_as_property_names() {
        let Expression::Call(call) = expression("promise.catch(handler).finally(done)") else {
            panic!("expected call");
        };
        assert!(matches!(*call.callee, Expression::Member(_)));
    }

    #[test]
    fn test_await_is_identifier_outside_async() {
        assert!(matches!(expression("await"), Expression::Identifier(_)));
    }

    #[test]
    fn test_new_with_member_callee() {
        let Expression::New(new) = expression("new a.B(1)") else {
            panic!("expected new");
        };
        assert!(matches!(*new.callee, Expression::Member(_)));
        assert_eq!(new.arguments.len(), 1);
    }

    #[test]
    fn test_template_with_substitutions() {
        let Expression::Template(t) = expression("`a${b}c${d}e`") else {
            panic!("expected template");
        };
        assert_eq!(t.quasis.len(), 3);
        assert_eq!(t.expressions.len(), 2);
        assert!(matches!(t.expressions[0], Expression::Identifier(_)));
    }

    #[test]
    fn test_substitution_ending_in_member_or_call() {
        let Expression::Template(t) = expression("`x${a.b}y${f(1)}z`") else {
            panic!("expected template");
        };
        assert!(matches!(t.expressions[0], Expression::Member(_)));
        assert!(matches!(t.expressions[1], Expression::Call(_)));

        let Expression::Call(call) = expression("f(`${b}`)") else {
            panic!("expected call");
        };
        assert!(matches!(call.arguments[0], Expression::Template(_)));
    }

    #[test]
    fn test_tagged_templates() {
        let Expression::TaggedTemplate(tagged) = expression("tag`a${b}c`") else {
            panic!("expected tagged template");
        };
        assert_eq!(tagged.quasi.expressions.len(), 1);

        let Expression::Template(outer) = expression("`${inner`x`}!`") else {
            panic!("expected template");
        };
        assert!(matches!(outer.expressions[0], Expression::TaggedTemplate(_)));

        let Expression::New(new) = expression("new Tag`x${y}`") else {
            panic!("expected new");
        };
        assert!(matches!(*new.callee, Expression::TaggedTemplate(_)));
    }
}
