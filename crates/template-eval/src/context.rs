//! Scoped execution context (§3.4).

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::value::Value;

/// A chain of frames, innermost last. `Get` searches innermost to
/// outermost; `Set` always writes the innermost frame. A `For` loop
/// pushes a frame for its body and pops it on exit, including via
/// `Break`.
pub struct ExecutionContext {
    frames: Vec<HashMap<String, Value>>,
    strict: bool,
}

impl ExecutionContext {
    /// An empty context with no bound names.
    pub fn new() -> Self {
        ExecutionContext {
            frames: vec![HashMap::new()],
            strict: false,
        }
    }

    /// A context whose root frame is seeded from `data` (typically a
    /// `Value::Map` produced by the host, e.g. via `Value::try_from` on
    /// a `serde_json::Value`).
    pub fn with_data(data: Value) -> Self {
        let mut ctx = ExecutionContext::new();
        if let Value::Map(map) = data {
            ctx.frames[0] = map.into_iter().collect();
        }
        ctx
    }

    /// Enables strict mode: missing map/record keys become `KeyNotFound`
    /// errors instead of `Nil`.
    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Looks up `name`, searching innermost frame to outermost. An
    /// undefined name yields `Nil` rather than an error (§4.5).
    pub fn get(&self, name: &str) -> Value {
        for frame in self.frames.iter().rev() {
            if let Some(value) = frame.get(name) {
                return value.clone();
            }
        }
        Value::Nil
    }

    /// Binds `name` to `value` in the innermost frame.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.frames
            .last_mut()
            .expect("root frame always present")
            .insert(name.into(), value);
    }

    pub(crate) fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
        debug_assert!(!self.frames.is_empty(), "root frame must never be popped");
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the reserved `loop` metadata record for for-loop iteration
/// `index` (0-based) out of `length` total iterations, chaining to the
/// enclosing loop's own metadata (or `Nil` at the outermost loop).
pub(crate) fn loop_metadata(index: usize, length: usize, parent: Value) -> Value {
    let mut record = IndexMap::new();
    record.insert("index".to_string(), Value::Int(index as i64));
    record.insert("counter".to_string(), Value::Int(index as i64 + 1));
    record.insert(
        "revindex".to_string(),
        Value::Int((length - 1 - index) as i64),
    );
    record.insert("revcounter".to_string(), Value::Int((length - index) as i64));
    record.insert("first".to_string(), Value::Bool(index == 0));
    record.insert("last".to_string(), Value::Bool(index + 1 == length));
    record.insert("length".to_string(), Value::Int(length as i64));
    record.insert("parent".to_string(), parent);
    Value::Map(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_name_is_nil() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.get("missing"), Value::Nil);
    }

    #[test]
    fn inner_frame_shadows_outer() {
        let mut ctx = ExecutionContext::new();
        ctx.set("x", Value::Int(1));
        ctx.push_frame();
        ctx.set("x", Value::Int(2));
        assert_eq!(ctx.get("x"), Value::Int(2));
        ctx.pop_frame();
        assert_eq!(ctx.get("x"), Value::Int(1));
    }

    #[test]
    fn loop_metadata_first_and_last() {
        let first = loop_metadata(0, 3, Value::Nil);
        let Value::Map(m) = &first else { panic!() };
        assert_eq!(m.get("first"), Some(&Value::Bool(true)));
        assert_eq!(m.get("last"), Some(&Value::Bool(false)));
        assert_eq!(m.get("counter"), Some(&Value::Int(1)));

        let last = loop_metadata(2, 3, Value::Nil);
        let Value::Map(m) = &last else { panic!() };
        assert_eq!(m.get("first"), Some(&Value::Bool(false)));
        assert_eq!(m.get("last"), Some(&Value::Bool(true)));
        assert_eq!(m.get("revindex"), Some(&Value::Int(0)));
    }
}
