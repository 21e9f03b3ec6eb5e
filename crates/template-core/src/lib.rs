//! template-core - Public facade over the template engine pipeline.
//!
//! Wires the lexer, parser, and evaluator crates into the two
//! operations described in §6.2: [`compile`] turns source text into a
//! [`Template`], and [`render`] (or the [`Template::render`] shortcut)
//! walks it against an [`ExecutionContext`] to produce output. This
//! crate carries no source-loading, caching, or CLI surface of its own
//! (those are explicit Non-goals) — it is a thin, dependency-ordering
//! facade, the same role `faxc-drv` plays over the compiler crates it
//! was adapted from, minus the driver's file I/O and code generation.

use thiserror::Error;

pub use template_eval::{
    has_filter, list_filters, lookup_filter, register_filter, unregister_filter, EvalError,
    ExecutionContext, FilterError, FilterFn, Record, RenderError, TimeLike, Value,
};
pub use template_lex::{tokenize, LexError, Token, TokenKind};
pub use template_parse::{
    has_tag, list_tags, lookup_tag, register_tag, unregister_tag, BinOp, Branch, Expression,
    ForVars, LiteralValue, ParseError, Statement, TagParserFn, UnOp,
};
pub use template_util::Span;

/// A parsed template, ready to render against any number of
/// [`ExecutionContext`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct Template(template_parse::Template);

impl Template {
    /// Renders this template against `ctx`.
    pub fn render(&self, ctx: ExecutionContext) -> Result<String, RenderError> {
        template_eval::render(&self.0, ctx)
    }
}

/// Either stage of [`compile`] can fail; this wraps both into one error
/// type so callers don't need to match on which phase failed to report
/// it, while `#[source]` preserves the original for formatting.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Compiles template source into a [`Template`]: lexes, then parses,
/// propagating whichever phase fails first.
///
/// # Examples
///
/// ```
/// use template_core::{compile, ExecutionContext, Value};
///
/// let template = compile("Hello, {{ name }}!").unwrap();
/// let mut ctx = ExecutionContext::new();
/// ctx.set("name", Value::Str("world".into()));
/// assert_eq!(template.render(ctx).unwrap(), "Hello, world!");
/// ```
pub fn compile(source: &str) -> Result<Template, CompileError> {
    let tokens = tokenize(source)?;
    let parsed = template_parse::parse(&tokens)?;
    Ok(Template(parsed))
}

/// Convenience one-shot: compiles and renders in a single call.
pub fn render(source: &str, ctx: ExecutionContext) -> Result<String, RenderFailure> {
    let template = compile(source)?;
    Ok(template.render(ctx)?)
}

/// Either phase of [`render`] can fail: compiling the source, or
/// evaluating the compiled template.
#[derive(Debug, Error)]
pub enum RenderFailure {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Eval(#[from] RenderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_then_render_round_trips_text() {
        let template = compile("plain text, no tags").unwrap();
        let output = template.render(ExecutionContext::new()).unwrap();
        assert_eq!(output, "plain text, no tags");
    }

    #[test]
    fn compile_is_idempotent() {
        let a = compile("{{ 1 + 2 }}").unwrap();
        let b = compile("{{ 1 + 2 }}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn bad_syntax_reports_a_parse_error() {
        let err = compile("{% if %}").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
    }

    #[test]
    fn one_shot_render_helper_compiles_and_evaluates() {
        let mut ctx = ExecutionContext::new();
        ctx.set("name", Value::Str("Ada".into()));
        let output = render("Hi {{ name }}", ctx).unwrap();
        assert_eq!(output, "Hi Ada");
    }
}
