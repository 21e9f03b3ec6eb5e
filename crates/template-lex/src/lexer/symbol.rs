//! Operator/punctuation symbol scanning.

use crate::error::LexError;
use crate::lexer::core::Lexer;
use crate::token::{Token, TokenKind};

/// Two-character symbols, tried before any one-character fallback.
const TWO_CHAR: &[&str] = &["==", "!=", "<=", ">=", "&&", "||"];

/// One-character symbols accepted when no two-character form matches.
const ONE_CHAR: &str = "+-*/%<>!=:,.|()[]";

impl<'a> Lexer<'a> {
    /// Lexes a single operator/punctuation symbol, preferring the
    /// longest match from the fixed two-character table.
    pub(crate) fn lex_symbol(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.span();

        for two in TWO_CHAR {
            if self.cursor.starts_with(two) {
                self.cursor.eat_str(two);
                return Ok(Token::new(TokenKind::Symbol, *two, start));
            }
        }

        let c = self
            .cursor
            .current_char()
            .expect("caller checked not EOF");
        if ONE_CHAR.contains(c) {
            self.cursor.advance();
            return Ok(Token::new(TokenKind::Symbol, c.to_string(), start));
        }

        Err(LexError::UnexpectedCharacter {
            span: start,
            character: c,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_two_character_operators() {
        let token = Lexer::new("==x").lex_symbol().unwrap();
        assert_eq!(token.value, "==");
    }

    #[test]
    fn falls_back_to_one_character() {
        let token = Lexer::new("=x").lex_symbol().unwrap();
        assert_eq!(token.value, "=");
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        let err = Lexer::new("^x").lex_symbol().unwrap_err();
        assert!(matches!(err, LexError::UnexpectedCharacter { character: '^', .. }));
    }
}
