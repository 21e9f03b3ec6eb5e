//! Property-based tests for the lexer's universal invariants.

use proptest::prelude::*;
use template_lex::{tokenize, TokenKind};

proptest! {
    /// Pass-through: a template with no tags renders back to itself, so
    /// the lexer must tokenize text-only source as a single `Text` token
    /// (plus `Eof`) whose value equals the input verbatim.
    #[test]
    fn text_only_source_is_a_single_text_token(s in "[^{}]{0,64}") {
        let tokens = tokenize(&s).unwrap();
        prop_assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        if !s.is_empty() {
            prop_assert_eq!(tokens[0].kind, TokenKind::Text);
            prop_assert_eq!(&tokens[0].value, &s);
        }
    }

    /// Position integrity: every token's recorded column is at least 1
    /// and lines only ever increase as later tokens are produced.
    #[test]
    fn positions_are_monotonic(s in "[^{}]{0,64}") {
        let tokens = tokenize(&s).unwrap();
        let mut last_line = 0;
        for token in &tokens {
            prop_assert!(token.span.col >= 1);
            prop_assert!(token.span.line >= last_line);
            last_line = token.span.line;
        }
    }
}

#[test]
fn idempotence_of_tokenize() {
    let source = "Hello {{ name | upper }}! {% if x > 1 %}y{% endif %}";
    let first = tokenize(source).unwrap();
    let second = tokenize(source).unwrap();
    assert_eq!(first, second);
}
