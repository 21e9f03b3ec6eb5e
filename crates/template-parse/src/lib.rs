//! template-parse - Expression and statement parsing for the template
//! engine.
//!
//! Two parsers share one token stream: [`ExprParser`] implements the
//! precedence-climbing expression grammar (§4.2), and [`Parser`] walks
//! the top-level statement structure, dispatching block tags through
//! the extensible tag registry (§3.5, §4.3).

pub mod ast;
mod error;
mod expr;
mod parser;
mod registry;
mod tags;

pub use ast::{BinOp, Branch, Expression, ForVars, LiteralValue, Statement, Template, UnOp};
pub use error::ParseError;
pub use expr::ExprParser;
pub use parser::{Parser, TagParserFn};
pub use registry::{has_tag, list_tags, lookup_tag, register_tag, unregister_tag, TagRegistry};

use template_lex::Token;

/// Parses a token stream (typically the output of `template_lex::tokenize`)
/// into a [`Template`] using the process-wide tag registry.
///
/// # Examples
///
/// ```
/// use template_lex::tokenize;
/// use template_parse::parse;
///
/// let tokens = tokenize("{% if a %}yes{% endif %}").unwrap();
/// let template = parse(&tokens).unwrap();
/// assert_eq!(template.statements.len(), 1);
/// ```
pub fn parse(tokens: &[Token]) -> Result<Template, ParseError> {
    Parser::new(tokens).parse()
}
