//! template-eval - Runtime value model and tree-walking evaluator for
//! the template engine.
//!
//! Consumes the AST produced by `template-parse` and an
//! [`ExecutionContext`] of host-supplied data, and produces rendered
//! output per §4.5-§4.8.

mod context;
mod error;
mod eval;
mod registry;
mod value;

pub use context::ExecutionContext;
pub use error::{EvalError, FilterError, RenderError};
pub use eval::render;
pub use registry::{
    has_filter, list_filters, lookup_filter, register_filter, unregister_filter, FilterFn,
};
pub use value::{Record, TimeLike, Value};
