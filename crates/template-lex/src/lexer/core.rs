//! Core lexer state machine and top-level token dispatch.

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Token, TokenKind};

/// Which closing delimiter the lexer is currently scanning towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagDelim {
    /// `{{ ... }}`
    Var,
    /// `{% ... %}`
    Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Text,
    Tag(TagDelim),
}

/// Transforms template source into a stream of [`Token`]s.
///
/// The lexer is two-level: in [`Mode::Text`] it accumulates literal text
/// and watches for `{{`, `{%`, `{#`; once inside a tag it switches to
/// [`Mode::Tag`] and scans strings, numbers, identifiers, and symbols
/// until the matching closing delimiter.
///
/// # Examples
///
/// ```
/// use template_lex::Lexer;
///
/// let tokens = Lexer::new("{{ 1 + 2 }}").tokenize().unwrap();
/// // VarBegin, 1, +, 2, VarEnd, Eof
/// assert_eq!(tokens.len(), 6);
/// ```
pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) mode: Mode,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer over `source`, starting in text mode.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            mode: Mode::Text,
        }
    }

    /// Runs the lexer to completion, returning every token including the
    /// trailing `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    /// Produces the next token, dispatching on the current mode.
    fn next_token(&mut self) -> Result<Token, LexError> {
        match self.mode {
            Mode::Text => self.next_text_token(),
            Mode::Tag(delim) => self.next_tag_token(delim),
        }
    }

    fn next_text_token(&mut self) -> Result<Token, LexError> {
        // Comments produce no tokens; consume any number of them before
        // deciding what the next real token is.
        while self.try_skip_comment()? {}

        if self.cursor.is_eof() {
            return Ok(Token::new(TokenKind::Eof, "", self.cursor.span()));
        }

        let start = self.cursor.span();
        if self.cursor.starts_with("{{") {
            self.cursor.eat_str("{{");
            self.mode = Mode::Tag(TagDelim::Var);
            return Ok(Token::new(TokenKind::VarBegin, "{{", start));
        }
        if self.cursor.starts_with("{%") {
            self.cursor.eat_str("{%");
            self.mode = Mode::Tag(TagDelim::Block);
            return Ok(Token::new(TokenKind::TagBegin, "{%", start));
        }

        let mut text = String::new();
        while !self.cursor.is_eof()
            && !self.cursor.starts_with("{{")
            && !self.cursor.starts_with("{%")
            && !self.cursor.starts_with("{#")
        {
            text.push(self.cursor.advance().expect("checked not eof"));
        }
        Ok(Token::new(TokenKind::Text, text, start))
    }

    fn next_tag_token(&mut self, delim: TagDelim) -> Result<Token, LexError> {
        self.skip_tag_whitespace();

        let start = self.cursor.span();
        let (close, kind) = match delim {
            TagDelim::Var => ("}}", TokenKind::VarEnd),
            TagDelim::Block => ("%}", TokenKind::TagEnd),
        };
        if self.cursor.starts_with(close) {
            self.cursor.eat_str(close);
            self.mode = Mode::Text;
            return Ok(Token::new(kind, close, start));
        }

        let Some(c) = self.cursor.current_char() else {
            return Err(match delim {
                TagDelim::Var => LexError::UnclosedVariableTag { span: start },
                TagDelim::Block => LexError::UnclosedBlockTag { span: start },
            });
        };

        if c == '"' || c == '\'' {
            return self.lex_string();
        }
        if c.is_ascii_digit() {
            return Ok(self.lex_number());
        }
        if c.is_alphabetic() || c == '_' {
            return Ok(self.lex_identifier());
        }
        self.lex_symbol()
    }

    fn skip_tag_whitespace(&mut self) {
        while matches!(self.cursor.current_char(), Some(c) if c.is_whitespace()) {
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_only_source_is_pass_through() {
        let tokens = Lexer::new("hello world").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].value, "hello world");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn var_tag_round_trips_delimiters() {
        let tokens = Lexer::new("{{ x }}").tokenize().unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::VarBegin,
                TokenKind::Identifier,
                TokenKind::VarEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unclosed_var_tag_is_an_error() {
        let err = Lexer::new("{{ x").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnclosedVariableTag { .. }));
    }

    #[test]
    fn comments_produce_no_tokens() {
        let tokens = Lexer::new("a{# skip me #}b").tokenize().unwrap();
        let text: String = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Text)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(text, "ab");
    }
}
