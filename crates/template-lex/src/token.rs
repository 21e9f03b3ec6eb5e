//! Token kinds produced by the lexer.

use template_util::Span;

/// The category of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Contiguous literal text between tags.
    Text,
    /// `{{`
    VarBegin,
    /// `}}`
    VarEnd,
    /// `{%`
    TagBegin,
    /// `%}`
    TagEnd,
    /// Letters/digits/underscore, starting with a letter or underscore.
    /// Keywords (`if`, `for`, `and`, `true`, ...) are emitted as
    /// `Identifier`; the parser distinguishes them by value.
    Identifier,
    /// Decimal integer or fractional literal.
    Number,
    /// Quoted string literal with escapes already decoded.
    String,
    /// One- or two-character operator/punctuation.
    Symbol,
    /// Terminal sentinel at end of input.
    Eof,
}

/// A single lexical token: its kind, literal text (escapes decoded for
/// strings), and source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            value: value.into(),
            span,
        }
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// Whether this token is an `Identifier` with the given text.
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Identifier && self.value == text
    }

    /// Whether this token is a `Symbol` with the given text.
    pub fn is_symbol(&self, text: &str) -> bool {
        self.kind == TokenKind::Symbol && self.value == text
    }
}
