//! Lexical error taxonomy.

use template_util::Span;
use thiserror::Error;

/// Errors the lexer can raise. Every variant carries the [`Span`] where
/// the problem was detected so the caller can report
/// `"Lex error at line L, col C: ..."` without re-deriving position.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LexError {
    #[error("Lex error at {span}: unclosed comment, missing `#}}`")]
    UnclosedComment { span: Span },

    #[error("Lex error at {span}: unclosed variable tag, missing `}}}}`")]
    UnclosedVariableTag { span: Span },

    #[error("Lex error at {span}: unclosed block tag, missing `%}}`")]
    UnclosedBlockTag { span: Span },

    #[error("Lex error at {span}: unclosed string literal")]
    UnclosedString { span: Span },

    #[error("Lex error at {span}: unknown escape sequence `\\{escape}`")]
    UnknownEscape { span: Span, escape: char },

    #[error("Lex error at {span}: newline in string literal")]
    NewlineInString { span: Span },

    #[error("Lex error at {span}: newline in comment")]
    NewlineInComment { span: Span },

    #[error("Lex error at {span}: unexpected character `{character}`")]
    UnexpectedCharacter { span: Span, character: char },
}

impl LexError {
    /// The position at which this error was detected.
    pub fn span(&self) -> Span {
        match self {
            LexError::UnclosedComment { span }
            | LexError::UnclosedVariableTag { span }
            | LexError::UnclosedBlockTag { span }
            | LexError::UnclosedString { span }
            | LexError::UnknownEscape { span, .. }
            | LexError::NewlineInString { span }
            | LexError::NewlineInComment { span }
            | LexError::UnexpectedCharacter { span, .. } => *span,
        }
    }
}
