//! Statement parser: token stream -> template AST, dispatching block
//! tags through the tag registry.

use template_lex::{Token, TokenKind};
use template_util::Span;

use crate::ast::{Statement, Template};
use crate::error::ParseError;
use crate::expr::ExprParser;
use crate::registry::{TagRegistry, TAG_REGISTRY};

/// The signature every tag parser must have. Registered under a tag
/// name, invoked with the document parser (for nested-body parsing via
/// [`Parser::parse_until`]), the tag-name token (for position), and an
/// [`ExprParser`] scoped to the tag's own interior tokens.
pub type TagParserFn =
    fn(&mut Parser<'_>, &Token, &mut ExprParser<'_>) -> Result<Statement, ParseError>;

/// Recursion cap for nested tag bodies (§9: "recommended: 128").
const MAX_NESTING_DEPTH: u32 = 128;

/// Parses a flat token stream into a [`Template`].
///
/// `VarBegin ... VarEnd` and `TagBegin ... TagEnd` regions never nest
/// lexically (the lexer cannot re-enter text mode until it sees the
/// matching close delimiter), so locating a tag's interior is a single
/// linear scan for the next `VarEnd`/`TagEnd`.
pub struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    registry: &'t TagRegistry,
    depth: u32,
}

impl<'t> Parser<'t> {
    /// Creates a parser using the process-wide tag registry.
    pub fn new(tokens: &'t [Token]) -> Self {
        Parser::with_registry(tokens, &TAG_REGISTRY)
    }

    /// Creates a parser against an explicit registry (used by tests that
    /// need isolation from the global, process-wide one).
    pub fn with_registry(tokens: &'t [Token], registry: &'t TagRegistry) -> Self {
        Parser {
            tokens,
            pos: 0,
            registry,
            depth: 0,
        }
    }

    /// Parses the whole token stream into a template.
    pub fn parse(&mut self) -> Result<Template, ParseError> {
        let (statements, closing) = self.parse_statements(&[])?;
        debug_assert!(closing.is_none());
        Ok(Template { statements })
    }

    /// Parses statements until a `{% tag %}` whose name is in
    /// `close_tags` is encountered, then returns the body, the closing
    /// tag's name, and an [`ExprParser`] over any tokens in that closing
    /// tag (e.g. `elif COND`).
    pub fn parse_until(
        &mut self,
        close_tags: &[&str],
    ) -> Result<(Vec<Statement>, String, ExprParser<'t>), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                span: self.current_span(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        let result = self.parse_statements(close_tags);
        self.depth -= 1;
        let (statements, closing) = result?;
        let (name, args) = closing.expect("close_tags is non-empty, so a close tag was required");
        Ok((statements, name, args))
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|t| t.span)
            .or_else(|| self.tokens.last().map(|t| t.span))
            .unwrap_or(Span::START)
    }

    fn parse_statements(
        &mut self,
        close_tags: &[&str],
    ) -> Result<(Vec<Statement>, Option<(String, ExprParser<'t>)>), ParseError> {
        let mut statements = Vec::new();
        loop {
            match self.tokens.get(self.pos) {
                None => {
                    return if close_tags.is_empty() {
                        Ok((statements, None))
                    } else {
                        Err(ParseError::UnexpectedToken {
                            span: self.current_span(),
                            found: String::new(),
                        })
                    };
                }
                Some(t) if t.kind == TokenKind::Eof => {
                    return if close_tags.is_empty() {
                        Ok((statements, None))
                    } else {
                        Err(ParseError::UnexpectedToken {
                            span: t.span,
                            found: String::new(),
                        })
                    };
                }
                Some(t) if t.kind == TokenKind::Text => {
                    statements.push(Statement::Text {
                        value: t.value.clone(),
                        span: t.span,
                    });
                    self.pos += 1;
                }
                Some(t) if t.kind == TokenKind::VarBegin => {
                    let span = t.span;
                    self.pos += 1;
                    let start = self.pos;
                    while !matches!(self.tokens.get(self.pos), Some(tt) if tt.kind == TokenKind::VarEnd)
                    {
                        self.pos += 1;
                    }
                    let interior = &self.tokens[start..self.pos];
                    self.pos += 1; // consume VarEnd
                    let mut expr_parser = ExprParser::new(interior);
                    let expr = expr_parser.parse_expression()?;
                    expr_parser.expect_exhausted()?;
                    statements.push(Statement::Output { expr, span });
                }
                Some(t) if t.kind == TokenKind::TagBegin => {
                    let tag_span = t.span;
                    self.pos += 1;
                    let start = self.pos;
                    while !matches!(self.tokens.get(self.pos), Some(tt) if tt.kind == TokenKind::TagEnd)
                    {
                        self.pos += 1;
                    }
                    let interior = &self.tokens[start..self.pos];
                    self.pos += 1; // consume TagEnd

                    let Some((name_tok, rest)) = interior.split_first() else {
                        return Err(ParseError::ExpectedIdentifier {
                            span: tag_span,
                            found: String::new(),
                        });
                    };
                    let name = name_tok.value.as_str();

                    if close_tags.contains(&name) {
                        let args_parser = ExprParser::new(rest);
                        return Ok((statements, Some((name.to_string(), args_parser))));
                    }
                    if let Some(parser_fn) = self.registry.lookup(name) {
                        let mut args_parser = ExprParser::new(rest);
                        let stmt = parser_fn(self, name_tok, &mut args_parser)?;
                        statements.push(stmt);
                    } else if matches!(name, "elif" | "else" | "endif" | "endfor") {
                        return Err(ParseError::UnknownTag {
                            span: tag_span,
                            name: name.to_string(),
                            hint: format!(" (`{name}` must be used inside a matching block)"),
                        });
                    } else {
                        return Err(ParseError::UnknownTag {
                            span: tag_span,
                            name: name.to_string(),
                            hint: String::new(),
                        });
                    }
                }
                Some(_) => unreachable!("only Text/VarBegin/TagBegin/Eof appear at statement position"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_lex::tokenize;

    #[test]
    fn pass_through_for_text_only_template() {
        let tokens = tokenize("just some text").unwrap();
        let template = Parser::new(&tokens).parse().unwrap();
        assert_eq!(template.statements.len(), 1);
        assert!(matches!(&template.statements[0], Statement::Text { value, .. } if value == "just some text"));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let tokens = tokenize("{% bogus %}").unwrap();
        let err = Parser::new(&tokens).parse().unwrap_err();
        assert!(matches!(err, ParseError::UnknownTag { .. }));
    }

    #[test]
    fn stray_endif_hints_at_missing_if() {
        let tokens = tokenize("{% endif %}").unwrap();
        let err = Parser::new(&tokens).parse().unwrap_err();
        match err {
            ParseError::UnknownTag { name, hint, .. } => {
                assert_eq!(name, "endif");
                assert!(!hint.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
