//! Pattern parsing (for destructuring and parameter bindings)

use super::guards::{nested, LoopGuard};
use super::{ParseError, Parser};
use crate::parser::ast::*;
use crate::parser::token::Token;

/// Parse a binding pattern: identifier or destructuring form.
pub fn parse_binding_pattern(parser: &mut Parser<'_>) -> Result<Pattern, ParseError> {
    nested(parser, "pattern", |parser| match parser.current() {
        Token::LeftBracket => parse_array_binding(parser),
        Token::LeftBrace => parse_object_binding(parser),
        _ => Ok(Pattern::Identifier(parser.parse_identifier()?)),
    })
}

/// Parse a binding pattern with an optional `= default`.
pub fn parse_binding_element(parser: &mut Parser<'_>) -> Result<Pattern, ParseError> {
    let start = parser.current_span();
    let target = parse_binding_pattern(parser)?;
    if parser.eat(&Token::Equal) {
        let default = super::expr::parse_assignment_allow_in(parser)?;
        let span = parser.finish(&start);
        return Ok(Pattern::Assignment(AssignmentPattern {
            target: Box::new(target),
            default: Box::new(default),
            span,
        }));
    }
    Ok(target)
}

/// Parse a parenthesised parameter list, including the parentheses.
pub fn parse_parameters(parser: &mut Parser<'_>) -> Result<Vec<Pattern>, ParseError> {
    parser.expect(Token::LeftParen)?;
    let mut params = Vec::new();
    let mut guard = LoopGuard::new("parameters");

    while !parser.check(&Token::RightParen) {
        guard.check()?;
        if parser.check(&Token::DotDotDot) {
            params.push(parse_rest(parser)?);
            break;
        }
        params.push(parse_binding_element(parser)?);
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightParen)?;
    Ok(params)
}

fn parse_rest(parser: &mut Parser<'_>) -> Result<Pattern, ParseError> {
    let start = parser.expect(Token::DotDotDot)?;
    let argument = parse_binding_pattern(parser)?;
    let span = parser.finish(&start);
    Ok(Pattern::Rest(RestPattern {
        argument: Box::new(argument),
        span,
    }))
}

fn parse_array_binding(parser: &mut Parser<'_>) -> Result<Pattern, ParseError> {
    let start = parser.expect(Token::LeftBracket)?;
    let mut elements = Vec::new();
    let mut guard = LoopGuard::new("array_pattern");

    while !parser.check(&Token::RightBracket) {
        guard.check()?;
        if parser.eat(&Token::Comma) {
            elements.push(None);
            continue;
        }
        if parser.check(&Token::DotDotDot) {
            elements.push(Some(parse_rest(parser)?));
            break;
        }
        elements.push(Some(parse_binding_element(parser)?));
        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBracket)?;
    let span = parser.finish(&start);
    Ok(Pattern::Array(ArrayPattern { elements, span }))
}

fn parse_object_binding(parser: &mut Parser<'_>) -> Result<Pattern, ParseError> {
    let start = parser.expect(Token::LeftBrace)?;
    let mut properties = Vec::new();
    let mut rest = None;
    let mut guard = LoopGuard::new("object_pattern");

    while !parser.check(&Token::RightBrace) {
        guard.check()?;
        if parser.check(&Token::DotDotDot) {
            rest = Some(Box::new(parse_rest(parser)?));
            break;
        }

        let prop_start = parser.current_span();
        let is_plain_name = matches!(parser.current(), Token::Identifier(_));
        let key = super::expr::parse_property_key(parser)?;

        let (value, shorthand) = if parser.eat(&Token::Colon) {
            (parse_binding_element(parser)?, false)
        } else {
            let PropertyKey::Identifier(id) = &key else {
                return Err(parser.unexpected_token("':'"));
            };
            if !is_plain_name {
                return Err(ParseError::invalid_syntax(
                    "Reserved word cannot be used as a binding",
                    id.span,
                ));
            }
            let target = Pattern::Identifier(*id);
            let value = if parser.eat(&Token::Equal) {
                let default = super::expr::parse_assignment_allow_in(parser)?;
                let span = parser.finish(&prop_start);
                Pattern::Assignment(AssignmentPattern {
                    target: Box::new(target),
                    default: Box::new(default),
                    span,
                })
            } else {
                target
            };
            (value, true)
        };

        let span = parser.finish(&prop_start);
        properties.push(ObjectPatternProperty {
            key,
            value,
            shorthand,
            span,
        });

        if !parser.eat(&Token::Comma) {
            break;
        }
    }

    parser.expect(Token::RightBrace)?;
    let span = parser.finish(&start);
    Ok(Pattern::Object(ObjectPattern {
        properties,
        rest,
        span,
    }))
}

/// Reinterpret an already-parsed expression as an assignment target.
///
/// Used for `[a, b] = pair`, `({ x } = obj)` and `for (a.b in o)`, where the
/// left-hand side is only known to be a pattern once `=` or `in` is seen.
pub fn expression_to_pattern(expr: Expression) -> Result<Pattern, ParseError> {
    match expr {
        Expression::Identifier(id) => Ok(Pattern::Identifier(id)),
        Expression::Member(m) if !m.optional => {
            Ok(Pattern::Expression(Box::new(Expression::Member(m))))
        }
        Expression::Parenthesized(p) => match *p.expression {
            inner @ (Expression::Identifier(_) | Expression::Member(_)) => {
                expression_to_pattern(inner)
            }
            _ => Err(ParseError::invalid_assignment_target(p.span)),
        },
        Expression::Array(array) => {
            let mut elements = Vec::with_capacity(array.elements.len());
            let count = array.elements.len();
            for (i, element) in array.elements.into_iter().enumerate() {
                let pattern = match element {
                    None => None,
                    Some(Expression::Spread(spread)) => {
                        if i + 1 != count {
                            return Err(ParseError::invalid_syntax(
                                "Rest element must be last element",
                                spread.span,
                            ));
                        }
                        Some(Pattern::Rest(RestPattern {
                            argument: Box::new(expression_to_pattern(*spread.argument)?),
                            span: spread.span,
                        }))
                    }
                    Some(e) => Some(element_to_pattern(e)?),
                };
                elements.push(pattern);
            }
            Ok(Pattern::Array(ArrayPattern {
                elements,
                span: array.span,
            }))
        }
        Expression::Object(object) => {
            let mut properties = Vec::with_capacity(object.properties.len());
            let mut rest = None;
            for prop in object.properties {
                match prop {
                    ObjectProperty::Property { key, value, span } => {
                        properties.push(ObjectPatternProperty {
                            key,
                            value: element_to_pattern(value)?,
                            shorthand: false,
                            span,
                        });
                    }
                    ObjectProperty::Shorthand { name, default, span } => {
                        let target = Pattern::Identifier(name);
                        let value = match default {
                            Some(default) => Pattern::Assignment(AssignmentPattern {
                                target: Box::new(target),
                                default,
                                span,
                            }),
                            None => target,
                        };
                        properties.push(ObjectPatternProperty {
                            key: PropertyKey::Identifier(name),
                            value,
                            shorthand: true,
                            span,
                        });
                    }
                    ObjectProperty::Spread(argument, span) => {
                        rest = Some(Box::new(Pattern::Rest(RestPattern {
                            argument: Box::new(expression_to_pattern(argument)?),
                            span,
                        })));
                    }
                    ObjectProperty::Method { function, .. } => {
                        return Err(ParseError::invalid_assignment_target(function.span));
                    }
                }
            }
            Ok(Pattern::Object(ObjectPattern {
                properties,
                rest,
                span: object.span,
            }))
        }
        other => Err(ParseError::invalid_assignment_target(*other.span())),
    }
}

/// Like [`expression_to_pattern`], also accepting `target = default`.
fn element_to_pattern(expr: Expression) -> Result<Pattern, ParseError> {
    match expr {
        Expression::Assignment(assign) if assign.operator == AssignmentOperator::Assign => {
            Ok(Pattern::Assignment(AssignmentPattern {
                target: assign.target,
                default: assign.value,
                span: assign.span,
            }))
        }
        other => expression_to_pattern(other),
    }
}

/// Targets allowed for compound assignment and update operators.
pub fn is_simple_target(expr: &Expression) -> bool {
    match expr {
        Expression::Identifier(_) => true,
        Expression::Member(m) => !m.optional,
        Expression::Parenthesized(p) => is_simple_target(&p.expression),
        _ => false,
    }
}
