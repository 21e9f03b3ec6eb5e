//! `{# ... #}` comment skipping.

use crate::error::LexError;
use crate::lexer::core::Lexer;

impl<'a> Lexer<'a> {
    /// If the cursor sits at `{#`, consumes through the matching `#}` and
    /// returns `true`. Comments never emit tokens; callers loop this to
    /// skip any number of adjacent comments.
    pub(crate) fn try_skip_comment(&mut self) -> Result<bool, LexError> {
        if !self.cursor.starts_with("{#") {
            return Ok(false);
        }
        let start = self.cursor.span();
        self.cursor.eat_str("{#");

        loop {
            if self.cursor.eat_str("#}") {
                return Ok(true);
            }
            match self.cursor.current_char() {
                None => return Err(LexError::UnclosedComment { span: start }),
                Some('\n') => {
                    return Err(LexError::NewlineInComment {
                        span: self.cursor.span(),
                    })
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_inside_comment_is_rejected() {
        let mut lexer = Lexer::new("{# a\nb #}");
        let err = lexer.try_skip_comment().unwrap_err();
        assert!(matches!(err, LexError::NewlineInComment { .. }));
    }

    #[test]
    fn unclosed_comment_reports_start_position() {
        let mut lexer = Lexer::new("{# never closed");
        let err = lexer.try_skip_comment().unwrap_err();
        match err {
            LexError::UnclosedComment { span } => assert_eq!(span.col, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
