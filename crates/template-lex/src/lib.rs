//! template-lex - Lexical analysis for the template engine.
//!
//! Transforms template source text into a flat stream of structural and
//! expression tokens with precise line/column positions. The lexer is
//! two-level: outer scanning distinguishes literal text from `{{ }}`,
//! `{% %}`, and `{# #}` regions; once inside a `{{` or `{%` region,
//! interior scanning recognises strings, numbers, identifiers, and
//! symbols.

mod cursor;
mod error;
mod lexer;
mod token;

pub use cursor::Cursor;
pub use error::LexError;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};

/// Tokenizes a template source string.
///
/// This is the primary entry point of the crate; it drives a [`Lexer`]
/// to completion and returns every token including the trailing `Eof`.
///
/// # Examples
///
/// ```
/// use template_lex::{tokenize, TokenKind};
///
/// let tokens = tokenize("Hi {{ name }}!").unwrap();
/// assert_eq!(tokens[0].kind, TokenKind::Text);
/// assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
/// ```
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).tokenize()
}
