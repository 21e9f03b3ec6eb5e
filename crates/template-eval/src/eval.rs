//! Tree-walking evaluator (§4.5).

use template_parse::{BinOp, Branch, Expression, ForVars, LiteralValue, Statement, Template, UnOp};
use template_util::Span;
use tracing::trace;

use crate::context::{loop_metadata, ExecutionContext};
use crate::error::{EvalError, RenderError};
use crate::registry::lookup_filter;
use crate::value::Value;

/// Control-flow outcome of executing a statement or block. `break`/
/// `continue` are signals threaded back up through block execution
/// rather than raised as errors, per the design notes — only a `Break`
/// or `Continue` that escapes every enclosing loop becomes an
/// [`EvalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    None,
    Break(Span),
    Continue(Span),
}

/// Walks a [`Template`] against an [`ExecutionContext`], producing its
/// rendered output.
pub struct Evaluator {
    ctx: ExecutionContext,
    output: String,
}

impl Evaluator {
    pub fn new(ctx: ExecutionContext) -> Self {
        Evaluator {
            ctx,
            output: String::new(),
        }
    }

    fn execute_block(&mut self, body: &[Statement]) -> Result<Signal, EvalError> {
        for stmt in body {
            match self.execute_statement(stmt)? {
                Signal::None => {}
                signal => return Ok(signal),
            }
        }
        Ok(Signal::None)
    }

    fn execute_statement(&mut self, stmt: &Statement) -> Result<Signal, EvalError> {
        match stmt {
            Statement::Text { value, .. } => {
                self.output.push_str(value);
                Ok(Signal::None)
            }
            Statement::Output { expr, .. } => {
                let value = self.eval_expr(expr)?;
                self.output.push_str(&value.display_string());
                Ok(Signal::None)
            }
            Statement::If {
                branches,
                else_body,
                ..
            } => self.execute_if(branches, else_body.as_deref()),
            Statement::For {
                vars,
                collection,
                body,
                ..
            } => self.execute_for(vars, collection, body),
            Statement::Break { span } => Ok(Signal::Break(*span)),
            Statement::Continue { span } => Ok(Signal::Continue(*span)),
        }
    }

    fn execute_if(
        &mut self,
        branches: &[Branch],
        else_body: Option<&[Statement]>,
    ) -> Result<Signal, EvalError> {
        for branch in branches {
            if self.eval_expr(&branch.condition)?.truthy() {
                return self.execute_block(&branch.body);
            }
        }
        match else_body {
            Some(body) => self.execute_block(body),
            None => Ok(Signal::None),
        }
    }

    fn execute_for(
        &mut self,
        vars: &ForVars,
        collection: &Expression,
        body: &[Statement],
    ) -> Result<Signal, EvalError> {
        let span = collection.span();
        let collection_value = self.eval_expr(collection)?;
        let is_map = matches!(collection_value, Value::Map(_));
        let pairs = collection_value
            .iter_pairs()
            .map_err(|type_name| EvalError::UnsupportedCollection { span, type_name })?;
        let length = pairs.len();
        let parent_loop = self.ctx.get("loop");

        self.ctx.push_frame();
        let mut result = Signal::None;
        for (index, (key, value)) in pairs.into_iter().enumerate() {
            match vars {
                ForVars::Single(name) => {
                    self.ctx.set(name.clone(), if is_map { key } else { value });
                }
                ForVars::Pair(key_name, value_name) => {
                    self.ctx.set(key_name.clone(), key);
                    self.ctx.set(value_name.clone(), value);
                }
            }
            self.ctx.set(
                "loop",
                loop_metadata(index, length, parent_loop.clone()),
            );
            trace!(index, length, "for-loop iteration");

            match self.execute_block(body)? {
                Signal::None => {}
                Signal::Continue(_) => continue,
                Signal::Break(_) => {
                    result = Signal::None;
                    break;
                }
            }
        }
        self.ctx.pop_frame();
        Ok(result)
    }

    fn eval_expr(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        match expr {
            Expression::Literal { value, .. } => Ok(literal_to_value(value)),
            Expression::Variable { name, .. } => Ok(self.ctx.get(name)),
            Expression::BinaryOp {
                op, left, right, span,
            } => self.eval_binary(*op, left, right, *span),
            Expression::UnaryOp { op, operand, span } => self.eval_unary(*op, operand, *span),
            Expression::PropertyAccess { object, name, span } => {
                let object = self.eval_expr(object)?;
                resolve_property(&object, name, *span, self.ctx.is_strict())
            }
            Expression::Subscript { object, index, span } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                resolve_subscript(&object, &index, *span, self.ctx.is_strict())
            }
            Expression::FilterApply {
                expr,
                filter_name,
                args,
                span,
            } => {
                let input = self.eval_expr(expr)?;
                let mut arg_strings = Vec::with_capacity(args.len());
                for arg in args {
                    arg_strings.push(self.eval_expr(arg)?.display_string());
                }
                let filter = lookup_filter(filter_name).ok_or_else(|| EvalError::FilterNotFound {
                    span: *span,
                    name: filter_name.clone(),
                })?;
                trace!(filter = %filter_name, "applying filter");
                filter(&input, &arg_strings).map_err(|source| EvalError::Filter {
                    span: *span,
                    name: filter_name.clone(),
                    source,
                })
            }
        }
    }

    fn eval_unary(&mut self, op: UnOp, operand: &Expression, span: Span) -> Result<Value, EvalError> {
        let value = self.eval_expr(operand)?;
        match op {
            UnOp::Not => Ok(Value::Bool(!value.truthy())),
            UnOp::Neg => match value {
                Value::Int(i) => i
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or(EvalError::IntegerOverflow { span }),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::CannotNegate {
                    span,
                    operand: other.type_name(),
                }),
            },
            UnOp::Plus => match value {
                Value::Int(_) | Value::Float(_) => Ok(value),
                other => Err(EvalError::CannotApplyUnaryPlus {
                    span,
                    operand: other.type_name(),
                }),
            },
        }
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: &Expression,
        right: &Expression,
        span: Span,
    ) -> Result<Value, EvalError> {
        // `and`/`or` short-circuit: the right operand is only evaluated
        // when it can affect the result (§4.5).
        match op {
            BinOp::Or => {
                let lhs = self.eval_expr(left)?;
                if lhs.truthy() {
                    return Ok(lhs);
                }
                return self.eval_expr(right);
            }
            BinOp::And => {
                let lhs = self.eval_expr(left)?;
                if !lhs.truthy() {
                    return Ok(lhs);
                }
                return self.eval_expr(right);
            }
            _ => {}
        }
        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;
        apply_binop(op, &lhs, &rhs, span)
    }
}

fn literal_to_value(value: &LiteralValue) -> Value {
    match value {
        LiteralValue::Nil => Value::Nil,
        LiteralValue::Bool(b) => Value::Bool(*b),
        LiteralValue::Int(i) => Value::Int(*i),
        LiteralValue::Float(f) => Value::Float(*f),
        LiteralValue::Str(s) => Value::Str(s.clone()),
    }
}

/// Numeric promotion: two ints stay ints; a float on either side
/// promotes both to float.
enum Numeric {
    Int(i64, i64),
    Float(f64, f64),
}

fn promote(left: &Value, right: &Value) -> Option<Numeric> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(Numeric::Int(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some(Numeric::Float(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some(Numeric::Float(*a, *b as f64)),
        (Value::Float(a), Value::Float(b)) => Some(Numeric::Float(*a, *b)),
        _ => None,
    }
}

fn apply_binop(op: BinOp, left: &Value, right: &Value, span: Span) -> Result<Value, EvalError> {
    use BinOp::*;
    match op {
        Eq => Ok(Value::Bool(left == right)),
        Ne => Ok(Value::Bool(left != right)),
        Lt | Gt | Le | Ge => compare(op, left, right, span),
        In | NotIn => membership(op, left, right, span),
        Add => match (left, right) {
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
            _ => match promote(left, right) {
                Some(Numeric::Int(a, b)) => {
                    a.checked_add(b).map(Value::Int).ok_or(EvalError::IntegerOverflow { span })
                }
                Some(Numeric::Float(a, b)) => Ok(Value::Float(a + b)),
                None => Err(EvalError::AddTypes {
                    span,
                    left: left.type_name(),
                    right: right.type_name(),
                }),
            },
        },
        Sub => match promote(left, right) {
            Some(Numeric::Int(a, b)) => {
                a.checked_sub(b).map(Value::Int).ok_or(EvalError::IntegerOverflow { span })
            }
            Some(Numeric::Float(a, b)) => Ok(Value::Float(a - b)),
            None => Err(EvalError::SubtractTypes {
                span,
                left: left.type_name(),
                right: right.type_name(),
            }),
        },
        Mul => match promote(left, right) {
            Some(Numeric::Int(a, b)) => {
                a.checked_mul(b).map(Value::Int).ok_or(EvalError::IntegerOverflow { span })
            }
            Some(Numeric::Float(a, b)) => Ok(Value::Float(a * b)),
            None => Err(EvalError::MultiplyTypes {
                span,
                left: left.type_name(),
                right: right.type_name(),
            }),
        },
        // `/` always yields a float, even for two ints (§4.5/§4.7).
        Div => match promote(left, right) {
            Some(Numeric::Int(_, 0)) => Err(EvalError::DivisionByZero { span }),
            Some(Numeric::Int(a, b)) => Ok(Value::Float(a as f64 / b as f64)),
            Some(Numeric::Float(_, b)) if b == 0.0 => Err(EvalError::DivisionByZero { span }),
            Some(Numeric::Float(a, b)) => Ok(Value::Float(a / b)),
            None => Err(EvalError::DivideTypes {
                span,
                left: left.type_name(),
                right: right.type_name(),
            }),
        },
        Mod => match promote(left, right) {
            Some(Numeric::Int(_, 0)) => Err(EvalError::ModuloByZero { span }),
            Some(Numeric::Int(a, b)) => Ok(Value::Int(a % b)),
            Some(Numeric::Float(_, b)) if b == 0.0 => Err(EvalError::ModuloByZero { span }),
            Some(Numeric::Float(a, b)) => Ok(Value::Float(a % b)),
            None => Err(EvalError::ModuloTypes {
                span,
                left: left.type_name(),
                right: right.type_name(),
            }),
        },
        Or | And => unreachable!("short-circuited before apply_binop"),
    }
}

fn compare(op: BinOp, left: &Value, right: &Value, span: Span) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        _ => match promote(left, right) {
            Some(Numeric::Int(a, b)) => a.partial_cmp(&b),
            Some(Numeric::Float(a, b)) => a.partial_cmp(&b),
            None => None,
        },
    };
    let Some(ordering) = ordering else {
        return Err(EvalError::CompareTypes {
            span,
            left: left.type_name(),
            right: right.type_name(),
        });
    };
    use std::cmp::Ordering::*;
    let result = match op {
        BinOp::Lt => ordering == Less,
        BinOp::Gt => ordering == Greater,
        BinOp::Le => ordering != Greater,
        BinOp::Ge => ordering != Less,
        _ => unreachable!(),
    };
    Ok(Value::Bool(result))
}

fn membership(op: BinOp, left: &Value, right: &Value, span: Span) -> Result<Value, EvalError> {
    let found = match right {
        Value::Seq(items) => items.contains(left),
        Value::Map(map) => match left {
            Value::Str(key) => map.contains_key(key),
            _ => false,
        },
        Value::Str(haystack) => match left {
            Value::Str(needle) => haystack.contains(needle.as_str()),
            _ => false,
        },
        other => {
            return Err(EvalError::UnsupportedCollection {
                span,
                type_name: other.type_name(),
            })
        }
    };
    Ok(Value::Bool(if op == BinOp::In { found } else { !found }))
}

/// Resolves `object.name` per §4.7's field-lookup fallback chain for
/// `Map`/`Record`: exact match, then declared alias, then
/// case-insensitive match, else `Nil` (or `KeyNotFound` in strict mode).
fn resolve_property(
    object: &Value,
    name: &str,
    span: Span,
    strict: bool,
) -> Result<Value, EvalError> {
    match object {
        Value::Map(map) => {
            if let Some(value) = map.get(name) {
                return Ok(value.clone());
            }
            if let Some((_, value)) = map.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                return Ok(value.clone());
            }
            missing_key(name, span, strict)
        }
        Value::Record(record) => {
            if let Some(value) = record.field(name) {
                return Ok(value);
            }
            if let Some((_, canonical)) = record.aliases().iter().find(|(alias, _)| *alias == name) {
                if let Some(value) = record.field(canonical) {
                    return Ok(value);
                }
            }
            if let Some(canonical) = record
                .field_names()
                .into_iter()
                .find(|f| f.eq_ignore_ascii_case(name))
            {
                if let Some(value) = record.field(canonical) {
                    return Ok(value);
                }
            }
            missing_key(name, span, strict)
        }
        Value::Nil => Ok(Value::Nil),
        other => Err(EvalError::UnsupportedType {
            span,
            type_name: other.type_name().to_string(),
        }),
    }
}

fn missing_key(name: &str, span: Span, strict: bool) -> Result<Value, EvalError> {
    if strict {
        Err(EvalError::KeyNotFound {
            span,
            key: name.to_string(),
        })
    } else {
        Ok(Value::Nil)
    }
}

/// Resolves `object[index]`: integer index into `Seq`/`Str`, string key
/// into `Map`/`Record` (delegating to the same lookup chain as property
/// access).
fn resolve_subscript(
    object: &Value,
    index: &Value,
    span: Span,
    strict: bool,
) -> Result<Value, EvalError> {
    match (object, index) {
        (Value::Seq(items), Value::Int(i)) => {
            index_seq(items.len(), *i, span).map(|idx| items[idx].clone())
        }
        (Value::Str(s), Value::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            index_seq(chars.len(), *i, span).map(|idx| Value::Str(chars[idx].to_string()))
        }
        (Value::Map(_) | Value::Record(_), Value::Str(key)) => {
            resolve_property(object, key, span, strict)
        }
        (Value::Nil, _) => Ok(Value::Nil),
        (other, idx) => Err(EvalError::UnsupportedType {
            span,
            type_name: format!("{}[{}]", other.type_name(), idx.type_name()),
        }),
    }
}

fn index_seq(length: usize, index: i64, span: Span) -> Result<usize, EvalError> {
    let resolved = if index < 0 {
        index + length as i64
    } else {
        index
    };
    if resolved < 0 || resolved as usize >= length {
        Err(EvalError::IndexOutOfRange {
            span,
            index,
            length,
        })
    } else {
        Ok(resolved as usize)
    }
}

/// Renders a parsed [`Template`] against `ctx`, returning the full
/// output or a [`RenderError`] carrying whatever output had been
/// produced before the failure.
pub fn render(template: &Template, ctx: ExecutionContext) -> Result<String, RenderError> {
    let mut evaluator = Evaluator::new(ctx);
    match evaluator.execute_block(&template.statements) {
        Ok(Signal::None) => Ok(evaluator.output),
        Ok(Signal::Break(span)) => Err(RenderError {
            partial: evaluator.output,
            source: EvalError::BreakOutsideLoop { span },
        }),
        Ok(Signal::Continue(span)) => Err(RenderError {
            partial: evaluator.output,
            source: EvalError::ContinueOutsideLoop { span },
        }),
        Err(source) => Err(RenderError {
            partial: evaluator.output,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template_lex::tokenize;
    use template_parse::parse;

    fn render_source(source: &str, ctx: ExecutionContext) -> String {
        let tokens = tokenize(source).unwrap();
        let template = parse(&tokens).unwrap();
        render(&template, ctx).unwrap()
    }

    #[test]
    fn text_passes_through_unchanged() {
        let out = render_source("hello world", ExecutionContext::new());
        assert_eq!(out, "hello world");
    }

    #[test]
    fn output_evaluates_expression() {
        let mut ctx = ExecutionContext::new();
        ctx.set("x", Value::Int(2));
        let out = render_source("{{ x + 3 }}", ctx);
        assert_eq!(out, "5");
    }

    #[test]
    fn if_else_picks_the_right_branch() {
        let mut ctx = ExecutionContext::new();
        ctx.set("flag", Value::Bool(false));
        let out = render_source("{% if flag %}yes{% else %}no{% endif %}", ctx);
        assert_eq!(out, "no");
    }

    #[test]
    fn integer_division_always_yields_a_float() {
        let out = render_source("{{ 7 / 2 }}", ExecutionContext::new());
        assert_eq!(out, "3.5");
    }

    #[test]
    fn sequence_addition_is_not_supported() {
        let mut ctx = ExecutionContext::new();
        ctx.set("a", Value::Seq(vec![Value::Int(1)]));
        ctx.set("b", Value::Seq(vec![Value::Int(2)]));
        let tokens = tokenize("{{ a + b }}").unwrap();
        let template = parse(&tokens).unwrap();
        let err = render(&template, ctx).unwrap_err();
        assert!(matches!(err.source, EvalError::AddTypes { .. }));
    }

    #[test]
    fn for_loop_concatenates_values() {
        let mut ctx = ExecutionContext::new();
        ctx.set("items", Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let out = render_source("{% for i in items %}{{ i }},{% endfor %}", ctx);
        assert_eq!(out, "1,2,3,");
    }

    #[test]
    fn break_stops_the_loop_early() {
        let mut ctx = ExecutionContext::new();
        ctx.set("items", Value::Seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let out = render_source(
            "{% for i in items %}{% if i == 2 %}{% break %}{% endif %}{{ i }}{% endfor %}",
            ctx,
        );
        assert_eq!(out, "1");
    }

    #[test]
    fn undefined_variable_renders_as_empty_string() {
        let out = render_source("[{{ missing }}]", ExecutionContext::new());
        assert_eq!(out, "[]");
    }

    #[test]
    fn short_circuit_and_skips_right_side_property_access() {
        let mut ctx = ExecutionContext::new();
        ctx.set("user", Value::Nil);
        let out = render_source("{% if user and user.name %}yes{% else %}no{% endif %}", ctx);
        assert_eq!(out, "no");
    }

    #[test]
    fn division_by_zero_reports_partial_output() {
        let tokens = tokenize("before{{ 1 / 0 }}after").unwrap();
        let template = parse(&tokens).unwrap();
        let err = render(&template, ExecutionContext::new()).unwrap_err();
        assert_eq!(err.partial, "before");
        assert!(matches!(err.source, EvalError::DivisionByZero { .. }));
    }

    #[test]
    fn property_index_chain_reads_nested_sequence() {
        let mut ctx = ExecutionContext::new();
        ctx.set(
            "items",
            Value::Seq(vec![Value::Seq(vec![Value::Int(10), Value::Int(20)])]),
        );
        let out = render_source("{{ items.0.1 }}", ctx);
        assert_eq!(out, "20");
    }
}
