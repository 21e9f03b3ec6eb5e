//! Expression parsing: classical operator-precedence recursive descent
//! (precedence climbing) over a flat token slice.
//!
//! Binding powers, lowest to highest, mirror the table in §4.2: `or` <
//! `and` < comparison (`== != < > <= >=`, plus `in`/`not in`) < additive
//! < multiplicative < unary < postfix < primary.

use template_lex::{Token, TokenKind};
use template_util::Span;

use crate::ast::{BinOp, Expression, LiteralValue, UnOp};
use crate::error::ParseError;

/// Binding-power constants for the infix operator levels. Left-binding
/// power `l` and right-binding power `r` satisfy `r = l + 1` for every
/// left-associative level, which is all of them here — §4.2 specifies
/// no right-associative binary operator.
mod bp {
    pub const OR: (u8, u8) = (1, 2);
    pub const AND: (u8, u8) = (3, 4);
    pub const COMPARISON: (u8, u8) = (5, 6);
    pub const ADDITIVE: (u8, u8) = (7, 8);
    pub const MULTIPLICATIVE: (u8, u8) = (9, 10);
    /// Binding power unary prefix operators parse their operand at;
    /// higher than every infix level so `-a + b` parses as `(-a) + b`.
    pub const UNARY: u8 = 11;
}

/// Parses expressions out of a token slice (the interior of a `{{ }}`
/// output, a tag's argument list, a subscript, or a parenthesized
/// group). Also exposes small lexical helpers (`expect_identifier`,
/// `eat_symbol`, ...) that the statement parser reuses for tag-specific
/// grammar fragments like `for X, Y in EXPR`.
pub struct ExprParser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> ExprParser<'t> {
    pub fn new(tokens: &'t [Token]) -> Self {
        ExprParser { tokens, pos: 0 }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .or_else(|| self.tokens.last().map(|t| t.span))
            .unwrap_or(Span::START)
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Requires that every token in this slice has been consumed.
    pub fn expect_exhausted(&self) -> Result<(), ParseError> {
        if self.is_at_end() {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: self.peek().map(|t| t.value.clone()).unwrap_or_default(),
            })
        }
    }

    pub fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::Identifier => {
                let value = t.value.clone();
                self.advance();
                Ok(value)
            }
            other => Err(ParseError::ExpectedIdentifier {
                span: self.current_span(),
                found: other.map(|t| t.value.clone()).unwrap_or_default(),
            }),
        }
    }

    /// Consumes an identifier equal to `keyword`, or errors.
    pub fn expect_keyword(&mut self, keyword: &str) -> Result<(), ParseError> {
        match self.peek() {
            Some(t) if t.is_ident(keyword) => {
                self.advance();
                Ok(())
            }
            _ if keyword == "in" => Err(ParseError::ExpectedInKeyword {
                span: self.current_span(),
            }),
            other => Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: other.map(|t| t.value.clone()).unwrap_or_default(),
            }),
        }
    }

    pub fn eat_symbol(&mut self, symbol: &str) -> bool {
        if matches!(self.peek(), Some(t) if t.is_symbol(symbol)) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub fn expect_symbol(&mut self, symbol: &str) -> Result<(), ParseError> {
        if self.eat_symbol(symbol) {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: self.peek().map(|t| t.value.clone()).unwrap_or_default(),
            })
        }
    }

    pub fn eat_comma(&mut self) -> bool {
        self.eat_symbol(",")
    }

    /// Parses a full expression at the lowest binding power.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_bp(0)
    }

    fn parse_bp(&mut self, min_bp: u8) -> Result<Expression, ParseError> {
        let mut lhs = self.parse_prefix()?;
        loop {
            let Some((op, l_bp, r_bp, consumed)) = self.peek_infix_op() else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            let span = lhs.span();
            for _ in 0..consumed {
                self.advance();
            }
            let rhs = self.parse_bp(r_bp)?;
            lhs = Expression::BinaryOp {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
                span,
            };
        }
        Ok(lhs)
    }

    /// Looks ahead for an infix operator, returning the operator, its
    /// (left, right) binding power, and how many tokens it spans (1,
    /// except `not in` which spans 2).
    fn peek_infix_op(&self) -> Option<(BinOp, u8, u8, usize)> {
        let t = self.peek()?;
        let (op, (l, r), consumed) = match (t.kind, t.value.as_str()) {
            (TokenKind::Identifier, "or") => (BinOp::Or, bp::OR, 1),
            (TokenKind::Symbol, "||") => (BinOp::Or, bp::OR, 1),
            (TokenKind::Identifier, "and") => (BinOp::And, bp::AND, 1),
            (TokenKind::Symbol, "&&") => (BinOp::And, bp::AND, 1),
            (TokenKind::Symbol, "==") => (BinOp::Eq, bp::COMPARISON, 1),
            (TokenKind::Symbol, "!=") => (BinOp::Ne, bp::COMPARISON, 1),
            (TokenKind::Symbol, "<") => (BinOp::Lt, bp::COMPARISON, 1),
            (TokenKind::Symbol, ">") => (BinOp::Gt, bp::COMPARISON, 1),
            (TokenKind::Symbol, "<=") => (BinOp::Le, bp::COMPARISON, 1),
            (TokenKind::Symbol, ">=") => (BinOp::Ge, bp::COMPARISON, 1),
            (TokenKind::Identifier, "in") => (BinOp::In, bp::COMPARISON, 1),
            (TokenKind::Identifier, "not") => {
                if matches!(self.tokens.get(self.pos + 1), Some(n) if n.is_ident("in")) {
                    (BinOp::NotIn, bp::COMPARISON, 2)
                } else {
                    return None;
                }
            }
            (TokenKind::Symbol, "+") => (BinOp::Add, bp::ADDITIVE, 1),
            (TokenKind::Symbol, "-") => (BinOp::Sub, bp::ADDITIVE, 1),
            (TokenKind::Symbol, "*") => (BinOp::Mul, bp::MULTIPLICATIVE, 1),
            (TokenKind::Symbol, "/") => (BinOp::Div, bp::MULTIPLICATIVE, 1),
            (TokenKind::Symbol, "%") => (BinOp::Mod, bp::MULTIPLICATIVE, 1),
            _ => return None,
        };
        Some((op, l, r, consumed))
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let Some(t) = self.peek() else {
            return Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: String::new(),
            });
        };
        let op = match (t.kind, t.value.as_str()) {
            (TokenKind::Identifier, "not") => Some(UnOp::Not),
            (TokenKind::Symbol, "!") => Some(UnOp::Not),
            (TokenKind::Symbol, "-") => Some(UnOp::Neg),
            (TokenKind::Symbol, "+") => Some(UnOp::Plus),
            _ => None,
        };
        if let Some(op) = op {
            let span = t.span;
            self.advance();
            let operand = self.parse_bp(bp::UNARY)?;
            return Ok(Expression::UnaryOp {
                op,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expression, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_symbol(".") {
                let span = expr.span();
                if matches!(self.peek(), Some(t) if t.kind == TokenKind::Number) {
                    let tok = self.advance().expect("checked number");
                    let index: i64 = tok.value.parse().map_err(|_| ParseError::UnexpectedToken {
                        span: tok.span,
                        found: tok.value.clone(),
                    })?;
                    expr = Expression::Subscript {
                        object: Box::new(expr),
                        index: Box::new(Expression::Literal {
                            value: LiteralValue::Int(index),
                            span: tok.span,
                        }),
                        span,
                    };
                } else if matches!(self.peek(), Some(t) if t.kind == TokenKind::Identifier) {
                    let name = self.expect_identifier()?;
                    expr = Expression::PropertyAccess {
                        object: Box::new(expr),
                        name,
                        span,
                    };
                } else {
                    return Err(ParseError::ExpectedPropertyName {
                        span: self.current_span(),
                    });
                }
            } else if self.eat_symbol("[") {
                let span = expr.span();
                let index = self.parse_expression()?;
                if !self.eat_symbol("]") {
                    return Err(ParseError::ExpectedCloseBracket {
                        span: self.current_span(),
                    });
                }
                expr = Expression::Subscript {
                    object: Box::new(expr),
                    index: Box::new(index),
                    span,
                };
            } else if self.eat_symbol("|") {
                let span = expr.span();
                let filter_name = self
                    .expect_identifier()
                    .map_err(|_| ParseError::ExpectedFilterName {
                        span: self.current_span(),
                    })?;
                let args = if self.eat_symbol(":") {
                    let mut args = vec![self.parse_simple_arg()?];
                    while self.eat_comma() {
                        args.push(self.parse_simple_arg()?);
                    }
                    args
                } else {
                    Vec::new()
                };
                expr = Expression::FilterApply {
                    expr: Box::new(expr),
                    filter_name,
                    args,
                    span,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// Parses a filter-argument expression: a literal, `null`/`none`, or
    /// a bare identifier treated as a variable reference. Anything else
    /// at this position is a parse error (§4.2).
    fn parse_simple_arg(&mut self) -> Result<Expression, ParseError> {
        let Some(t) = self.peek().cloned() else {
            return Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: String::new(),
            });
        };
        match t.kind {
            TokenKind::String | TokenKind::Number => self.parse_primary(),
            TokenKind::Identifier if matches!(t.value.as_str(), "true" | "false" | "null" | "none") => {
                self.parse_primary()
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expression::Variable {
                    name: t.value,
                    span: t.span,
                })
            }
            _ => Err(ParseError::UnexpectedToken {
                span: t.span,
                found: t.value,
            }),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        let Some(t) = self.advance().cloned() else {
            return Err(ParseError::UnexpectedToken {
                span: self.current_span(),
                found: String::new(),
            });
        };
        match t.kind {
            TokenKind::Number => {
                let value = if t.value.contains('.') {
                    LiteralValue::Float(t.value.parse().map_err(|_| ParseError::UnexpectedToken {
                        span: t.span,
                        found: t.value.clone(),
                    })?)
                } else {
                    LiteralValue::Int(t.value.parse().map_err(|_| ParseError::UnexpectedToken {
                        span: t.span,
                        found: t.value.clone(),
                    })?)
                };
                Ok(Expression::Literal { value, span: t.span })
            }
            TokenKind::String => Ok(Expression::Literal {
                value: LiteralValue::Str(t.value),
                span: t.span,
            }),
            TokenKind::Identifier => match t.value.as_str() {
                "true" => Ok(Expression::Literal {
                    value: LiteralValue::Bool(true),
                    span: t.span,
                }),
                "false" => Ok(Expression::Literal {
                    value: LiteralValue::Bool(false),
                    span: t.span,
                }),
                "null" | "none" => Ok(Expression::Literal {
                    value: LiteralValue::Nil,
                    span: t.span,
                }),
                name => Ok(Expression::Variable {
                    name: name.to_string(),
                    span: t.span,
                }),
            },
            TokenKind::Symbol if t.value == "(" => {
                let inner = self.parse_expression()?;
                if !self.eat_symbol(")") {
                    return Err(ParseError::ExpectedCloseParen {
                        span: self.current_span(),
                    });
                }
                Ok(inner)
            }
            _ => Err(ParseError::UnexpectedToken {
                span: t.span,
                found: t.value,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_lex::tokenize;

    fn parse_tag_args(src: &str) -> Expression {
        let tokens = tokenize(&format!("{{% x {src} %}}")).unwrap();
        // tokens: TagBegin, "x", <src tokens...>, TagEnd, Eof
        let interior = &tokens[2..tokens.len() - 2];
        ExprParser::new(interior).parse_expression().unwrap()
    }

    #[test]
    fn or_binds_looser_than_and() {
        // a or b and c  ==  a or (b and c)
        let expr = parse_tag_args("a or b and c");
        match expr {
            Expression::BinaryOp { op: BinOp::Or, right, .. } => {
                assert!(matches!(*right, Expression::BinaryOp { op: BinOp::And, .. }));
            }
            other => panic!("expected top-level Or, got {other:?}"),
        }
    }

    #[test]
    fn not_binds_tighter_than_and() {
        // not a and b == (not a) and b
        let expr = parse_tag_args("not a and b");
        match expr {
            Expression::BinaryOp { op: BinOp::And, left, .. } => {
                assert!(matches!(*left, Expression::UnaryOp { op: UnOp::Not, .. }));
            }
            other => panic!("expected top-level And, got {other:?}"),
        }
    }

    #[test]
    fn comparison_mixes_with_and_or_as_specified() {
        // a == b or c == d and e  ==  (a == b) or ((c == d) and e)
        let expr = parse_tag_args("a == b or c == d and e");
        let Expression::BinaryOp { op: BinOp::Or, left, right, .. } = expr else {
            panic!("expected top-level Or");
        };
        assert!(matches!(*left, Expression::BinaryOp { op: BinOp::Eq, .. }));
        assert!(matches!(*right, Expression::BinaryOp { op: BinOp::And, .. }));
    }

    #[test]
    fn property_index_desugars_to_subscript_with_int_literal() {
        let expr = parse_tag_args("items.0");
        let Expression::Subscript { index, .. } = expr else {
            panic!("expected Subscript");
        };
        assert!(matches!(*index, Expression::Literal { value: LiteralValue::Int(0), .. }));
    }

    #[test]
    fn filter_chain_parses_left_to_right() {
        let expr = parse_tag_args("name | upper | truncate: 3");
        let Expression::FilterApply { filter_name, expr: inner, args, .. } = expr else {
            panic!("expected FilterApply");
        };
        assert_eq!(filter_name, "truncate");
        assert_eq!(args.len(), 1);
        assert!(matches!(*inner, Expression::FilterApply { .. }));
    }

    #[test]
    fn filter_argument_must_be_simple() {
        let tokens = tokenize("{% x name | f: (1 + 2) %}").unwrap();
        let interior = &tokens[2..tokens.len() - 2];
        let err = ExprParser::new(interior).parse_expression().unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
