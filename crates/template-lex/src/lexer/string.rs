//! Quoted string literal scanning and escape decoding.

use crate::error::LexError;
use crate::lexer::core::Lexer;
use crate::token::{Token, TokenKind};

impl<'a> Lexer<'a> {
    /// Lexes a `"..."` or `'...'` string literal, decoding the escape
    /// sequences the engine supports: `\"`, `\'`, `\\`, `\n`, `\t`, `\r`.
    /// Any other escape is [`LexError::UnknownEscape`]; a literal newline
    /// inside the string is [`LexError::NewlineInString`]; running off
    /// the end of input before the closing quote is
    /// [`LexError::UnclosedString`].
    pub(crate) fn lex_string(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.span();
        let quote = self.cursor.advance().expect("caller checked quote char");

        let mut value = String::new();
        loop {
            match self.cursor.current_char() {
                None => return Err(LexError::UnclosedString { span: start }),
                Some('\n') => {
                    return Err(LexError::NewlineInString {
                        span: self.cursor.span(),
                    })
                }
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    let escape_span = self.cursor.span();
                    self.cursor.advance();
                    let Some(escaped) = self.cursor.current_char() else {
                        return Err(LexError::UnclosedString { span: start });
                    };
                    let decoded = match escaped {
                        '"' => '"',
                        '\'' => '\'',
                        '\\' => '\\',
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => {
                            return Err(LexError::UnknownEscape {
                                span: escape_span,
                                escape: other,
                            })
                        }
                    };
                    value.push(decoded);
                    self.cursor.advance();
                }
                Some(c) => {
                    value.push(c);
                    self.cursor.advance();
                }
            }
        }
        Ok(Token::new(TokenKind::String, value, start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_one(src: &str) -> Result<Token, LexError> {
        let mut lexer = Lexer::new(src);
        lexer.lex_string()
    }

    #[test]
    fn decodes_supported_escapes() {
        let token = lex_one(r#""a\nb\tc\\d\"e""#).unwrap();
        assert_eq!(token.value, "a\nb\tc\\d\"e");
    }

    #[test]
    fn single_quotes_are_supported() {
        let token = lex_one("'hi'").unwrap();
        assert_eq!(token.value, "hi");
    }

    #[test]
    fn unknown_escape_is_rejected() {
        let err = lex_one(r#""\x41""#).unwrap_err();
        assert!(matches!(err, LexError::UnknownEscape { escape: 'x', .. }));
    }

    #[test]
    fn literal_newline_is_rejected() {
        let err = lex_one("\"a\nb\"").unwrap_err();
        assert!(matches!(err, LexError::NewlineInString { .. }));
    }

    #[test]
    fn missing_closing_quote_is_unclosed() {
        let err = lex_one("\"abc").unwrap_err();
        assert!(matches!(err, LexError::UnclosedString { .. }));
    }
}
