//! Evaluation and filter error taxonomy (§7).

use template_util::Span;
use thiserror::Error;

/// Errors a filter implementation can report. `InputInvalid` and
/// `InputNotNumeric` let a filter reject a value it doesn't handle
/// without inventing a one-off error type; `Custom` covers anything
/// filter-specific, which the engine wraps with the filter's name.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("filter input is not valid for this operation")]
    InputInvalid,
    #[error("filter input is not numeric")]
    InputNotNumeric,
    #[error("insufficient arguments: expected at least {expected}, got {got}")]
    InsufficientArgs { expected: usize, got: usize },
    #[error("{0}")]
    Custom(String),
}

/// Errors raised while evaluating an AST against an [`crate::ExecutionContext`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("Evaluate error at {span}: division by zero")]
    DivisionByZero { span: Span },
    #[error("Evaluate error at {span}: modulo by zero")]
    ModuloByZero { span: Span },
    #[error("Evaluate error at {span}: cannot add {left} and {right}")]
    AddTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: cannot subtract {right} from {left}")]
    SubtractTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: cannot multiply {left} and {right}")]
    MultiplyTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: cannot divide {left} by {right}")]
    DivideTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: cannot compute {left} modulo {right}")]
    ModuloTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: cannot compare {left} and {right}")]
    CompareTypes {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: unsupported operator for {left} and {right}")]
    UnsupportedOperator {
        span: Span,
        left: &'static str,
        right: &'static str,
    },
    #[error("Evaluate error at {span}: unsupported unary operator on {operand}")]
    UnsupportedUnaryOp { span: Span, operand: &'static str },
    #[error("Evaluate error at {span}: cannot negate a {operand}")]
    CannotNegate { span: Span, operand: &'static str },
    #[error("Evaluate error at {span}: cannot apply unary `+` to a {operand}")]
    CannotApplyUnaryPlus { span: Span, operand: &'static str },
    #[error("Evaluate error at {span}: integer overflow")]
    IntegerOverflow { span: Span },
    #[error("Evaluate error at {span}: unsupported host value type `{type_name}`")]
    UnsupportedType { span: Span, type_name: String },
    #[error("Evaluate error at {span}: cannot iterate a {type_name}")]
    UnsupportedCollection { span: Span, type_name: &'static str },
    #[error("Evaluate error at {span}: index {index} out of range (length {length})")]
    IndexOutOfRange {
        span: Span,
        index: i64,
        length: usize,
    },
    #[error("Evaluate error at {span}: key `{key}` not found")]
    KeyNotFound { span: Span, key: String },
    #[error("Evaluate error at {span}: `break` used outside of a loop")]
    BreakOutsideLoop { span: Span },
    #[error("Evaluate error at {span}: `continue` used outside of a loop")]
    ContinueOutsideLoop { span: Span },
    #[error("Evaluate error at {span}: filter `{name}` is not registered")]
    FilterNotFound { span: Span, name: String },
    #[error("Evaluate error at {span}: filter `{name}` failed: {source}")]
    Filter {
        span: Span,
        name: String,
        #[source]
        source: FilterError,
    },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::DivisionByZero { span }
            | EvalError::ModuloByZero { span }
            | EvalError::AddTypes { span, .. }
            | EvalError::SubtractTypes { span, .. }
            | EvalError::MultiplyTypes { span, .. }
            | EvalError::DivideTypes { span, .. }
            | EvalError::ModuloTypes { span, .. }
            | EvalError::CompareTypes { span, .. }
            | EvalError::UnsupportedOperator { span, .. }
            | EvalError::UnsupportedUnaryOp { span, .. }
            | EvalError::CannotNegate { span, .. }
            | EvalError::CannotApplyUnaryPlus { span, .. }
            | EvalError::IntegerOverflow { span }
            | EvalError::UnsupportedType { span, .. }
            | EvalError::UnsupportedCollection { span, .. }
            | EvalError::IndexOutOfRange { span, .. }
            | EvalError::KeyNotFound { span, .. }
            | EvalError::BreakOutsideLoop { span }
            | EvalError::ContinueOutsideLoop { span }
            | EvalError::FilterNotFound { span, .. }
            | EvalError::Filter { span, .. } => *span,
        }
    }
}

/// Raised by `render`. Carries the partial output accumulated before
/// the failure alongside the error, per the "fail open" propagation
/// policy in §5/§7.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct RenderError {
    pub partial: String,
    #[source]
    pub source: EvalError,
}
