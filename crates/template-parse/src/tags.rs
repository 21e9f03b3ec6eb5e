//! Built-in tag parsers: `if`/`elif`/`else`/`endif`, `for`/`endfor`,
//! `break`, `continue` (§4.4).

use template_lex::Token;

use crate::ast::{Branch, ForVars, Statement};
use crate::error::ParseError;
use crate::expr::ExprParser;
use crate::parser::Parser;
use crate::registry::TagRegistry;

pub(crate) fn install_builtins(registry: &TagRegistry) {
    registry.register("if", parse_if_tag);
    registry.register("for", parse_for_tag);
    registry.register("break", parse_break_tag);
    registry.register("continue", parse_continue_tag);
}

fn require_no_args(args: &ExprParser<'_>, tag: &str) -> Result<(), ParseError> {
    args.expect_exhausted()
        .map_err(|_| ParseError::NoArgsAllowed {
            span: args.current_span(),
            tag: tag.to_string(),
        })
}

fn parse_if_tag(
    doc: &mut Parser<'_>,
    start: &Token,
    args: &mut ExprParser<'_>,
) -> Result<Statement, ParseError> {
    let condition = args.parse_expression()?;
    args.expect_exhausted()?;

    let mut branches = Vec::new();
    let body_span_start = start.span;
    let (body, mut closing_name, mut closing_args) = doc.parse_until(&["elif", "else", "endif"])?;
    branches.push(Branch { condition, body });

    loop {
        match closing_name.as_str() {
            "elif" => {
                let cond = closing_args.parse_expression()?;
                closing_args.expect_exhausted()?;
                let (body, name, next_args) = doc.parse_until(&["elif", "else", "endif"])?;
                branches.push(Branch {
                    condition: cond,
                    body,
                });
                closing_name = name;
                closing_args = next_args;
            }
            "else" => {
                require_no_args(&closing_args, "else")?;
                let (else_body, name, end_args) = doc.parse_until(&["endif"])?;
                debug_assert_eq!(name, "endif");
                require_no_args(&end_args, "endif")?;
                return Ok(Statement::If {
                    branches,
                    else_body: Some(else_body),
                    span: body_span_start,
                });
            }
            "endif" => {
                require_no_args(&closing_args, "endif")?;
                return Ok(Statement::If {
                    branches,
                    else_body: None,
                    span: body_span_start,
                });
            }
            _ => unreachable!("parse_until only returns names from the requested close_tags set"),
        }
    }
}

fn parse_for_tag(
    doc: &mut Parser<'_>,
    start: &Token,
    args: &mut ExprParser<'_>,
) -> Result<Statement, ParseError> {
    let first = args.expect_identifier()?;
    let vars = if args.eat_comma() {
        let second = args.expect_identifier()?;
        ForVars::Pair(first, second)
    } else {
        ForVars::Single(first)
    };
    args.expect_keyword("in")?;
    let collection = args.parse_expression()?;
    args.expect_exhausted()?;

    let (body, closing_name, closing_args) = doc.parse_until(&["endfor"])?;
    debug_assert_eq!(closing_name, "endfor");
    require_no_args(&closing_args, "endfor")?;

    Ok(Statement::For {
        vars,
        collection,
        body,
        span: start.span,
    })
}

fn parse_break_tag(
    _doc: &mut Parser<'_>,
    start: &Token,
    args: &mut ExprParser<'_>,
) -> Result<Statement, ParseError> {
    require_no_args(args, "break")?;
    Ok(Statement::Break { span: start.span })
}

fn parse_continue_tag(
    _doc: &mut Parser<'_>,
    start: &Token,
    args: &mut ExprParser<'_>,
) -> Result<Statement, ParseError> {
    require_no_args(args, "continue")?;
    Ok(Statement::Continue { span: start.span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use template_lex::tokenize;

    #[test]
    fn if_else_endif_round_trips() {
        let tokens = tokenize("{% if a %}yes{% else %}no{% endif %}").unwrap();
        let template = Parser::new(&tokens).parse().unwrap();
        assert_eq!(template.statements.len(), 1);
        assert!(matches!(&template.statements[0], Statement::If { else_body: Some(_), .. }));
    }

    #[test]
    fn if_elif_endif_collects_all_branches() {
        let tokens = tokenize("{% if a %}1{% elif b %}2{% elif c %}3{% endif %}").unwrap();
        let template = Parser::new(&tokens).parse().unwrap();
        let Statement::If { branches, else_body, .. } = &template.statements[0] else {
            panic!("expected If");
        };
        assert_eq!(branches.len(), 3);
        assert!(else_body.is_none());
    }

    #[test]
    fn for_single_var_and_endfor() {
        let tokens = tokenize("{% for x in items %}{{ x }}{% endfor %}").unwrap();
        let template = Parser::new(&tokens).parse().unwrap();
        assert!(matches!(&template.statements[0], Statement::For { vars: ForVars::Single(name), .. } if name == "x"));
    }

    #[test]
    fn for_two_var_form() {
        let tokens = tokenize("{% for k, v in items %}{% endfor %}").unwrap();
        let template = Parser::new(&tokens).parse().unwrap();
        assert!(matches!(
            &template.statements[0],
            Statement::For { vars: ForVars::Pair(k, v), .. } if k == "k" && v == "v"
        ));
    }

    #[test]
    fn break_with_arguments_is_rejected() {
        let tokens = tokenize("{% for x in items %}{% break x %}{% endfor %}").unwrap();
        let err = Parser::new(&tokens).parse().unwrap_err();
        assert!(matches!(err, ParseError::NoArgsAllowed { .. }));
    }
}
