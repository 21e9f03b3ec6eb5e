//! template-util - Shared primitives for the template engine crates.
//!
//! This crate holds the position/span type used by every other phase
//! (lexer, parser, evaluator) to report where in a template source a
//! token, node, or error originated.

mod span;

pub use span::Span;
