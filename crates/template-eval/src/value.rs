//! The dynamic runtime `Value` model (§3.3, §4.7, §4.8).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// An opaque host-supplied composite with field lookup by name.
///
/// This is the "reflection shim" described in the design notes: the
/// only seam where the core is allowed to ask a host type about its own
/// fields. A host implements this trait once for each struct it wants
/// to expose as a template `Record`, rather than the engine attempting
/// generic reflection over arbitrary Rust types.
pub trait Record: fmt::Debug + Send + Sync {
    /// Looks up a field by its exact declared Rust name.
    fn field(&self, name: &str) -> Option<Value>;

    /// Every field name this record exposes, used for the
    /// case-insensitive fallback match in §4.7.
    fn field_names(&self) -> Vec<&'static str>;

    /// Serialisation aliases (e.g. `json:"name"`-style tags), mapping
    /// alias -> canonical field name. Empty by default.
    fn aliases(&self) -> &[(&'static str, &'static str)] {
        &[]
    }

    /// Calendar fields for a time-like record. A host type representing
    /// a timestamp implements this so it stringifies as
    /// `YYYY-MM-DD HH:MM:SS` (§4.8) instead of the generic field-map
    /// form. `None` by default.
    fn as_time_like(&self) -> Option<TimeLike> {
        None
    }
}

/// Decomposed calendar fields used for the default time-like display
/// pattern `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLike {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl TimeLike {
    fn format(&self) -> String {
        format!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// The dynamic tagged union every template expression evaluates to.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
    Record(Arc<dyn Record>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Int(a), Float(b)) | (Float(b), Int(a)) => *a as f64 == *b,
            (Str(a), Str(b)) => a == b,
            (Seq(a), Seq(b)) => a == b,
            (Map(a), Map(b)) => a == b,
            (Record(a), Record(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// A stable, lowercase name for error messages (`AddTypes`, etc).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    /// Truthiness per §4.7: `Nil` false, numeric non-zero, string/seq/map
    /// non-empty, `Record` always true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Seq(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Record(_) => true,
        }
    }

    /// Iterates this value as `(key_or_index, element)` pairs, per the
    /// iteration rules in §4.7. `Seq` yields `(Int(index), item)`; `Map`
    /// yields `(Str(key), value)`; `Str` yields `(Int(index), char)`.
    /// `Record` is not iterable.
    pub fn iter_pairs(&self) -> Result<Vec<(Value, Value)>, &'static str> {
        match self {
            Value::Seq(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, v)| (Value::Int(i as i64), v.clone()))
                .collect()),
            Value::Map(map) => Ok(map
                .iter()
                .map(|(k, v)| (Value::Str(k.clone()), v.clone()))
                .collect()),
            Value::Str(s) => Ok(s
                .chars()
                .enumerate()
                .map(|(i, c)| (Value::Int(i as i64), Value::Str(c.to_string())))
                .collect()),
            other => Err(other.type_name()),
        }
    }

    /// The §4.8 string form used when writing a value to output, and
    /// when converting filter arguments to the strings filters receive.
    pub fn display_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, ""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            Value::Str(s) => write!(f, "{s}"),
            Value::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write_json_like(f, item)?;
                }
                write!(f, "]")
            }
            Value::Map(_) => {
                write!(f, "{{")?;
                write_map_like(f, self)?;
                write!(f, "}}")
            }
            Value::Record(record) => match record.as_time_like() {
                Some(t) => write!(f, "{}", t.format()),
                None => {
                    write!(f, "{{")?;
                    write_map_like(f, self)?;
                    write!(f, "}}")
                }
            },
        }
    }
}

fn write_json_like(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Str(s) => write!(f, "\"{s}\""),
        Value::Map(_) => {
            write!(f, "{{")?;
            write_map_like(f, value)?;
            write!(f, "}}")
        }
        Value::Record(record) => match record.as_time_like() {
            Some(t) => write!(f, "\"{}\"", t.format()),
            None => {
                write!(f, "{{")?;
                write_map_like(f, value)?;
                write!(f, "}}")
            }
        },
        other => write!(f, "{other}"),
    }
}

fn write_map_like(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Map(map) => {
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "\"{k}\":")?;
                write_json_like(f, v)?;
            }
            Ok(())
        }
        Value::Record(record) => {
            for (i, name) in record.field_names().iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                let field = record.field(name).unwrap_or(Value::Nil);
                write!(f, "\"{name}\":")?;
                write_json_like(f, &field)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(feature = "json")]
impl TryFrom<serde_json::Value> for Value {
    type Error = &'static str;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        Ok(match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.as_u64().is_some() {
                    // Fits u64 but not i64: genuinely out of signed
                    // 64-bit range, not just a formatting quirk. Don't
                    // fall through to `as_f64`, which would silently
                    // round it into an approximate float.
                    return Err("integer overflow: unsigned value exceeds signed 64-bit range");
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    return Err("number out of range");
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Value::try_from(item)?);
                }
                Value::Seq(out)
            }
            serde_json::Value::Object(map) => {
                let mut out = IndexMap::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k, Value::try_from(v)?);
                }
                Value::Map(out)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_floats_print_without_decimal_point() {
        assert_eq!(Value::Float(5.0).to_string(), "5");
        assert_eq!(Value::Float(5.5).to_string(), "5.5");
    }

    #[test]
    fn nil_only_equals_nil() {
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Nil, Value::Bool(false));
        assert_ne!(Value::Nil, Value::Int(0));
    }

    #[test]
    fn int_float_equality_uses_numeric_promotion() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn truthiness_rules() {
        assert!(!Value::Nil.truthy());
        assert!(!Value::Int(0).truthy());
        assert!(Value::Int(1).truthy());
        assert!(!Value::Str(String::new()).truthy());
        assert!(Value::Str("x".into()).truthy());
        assert!(!Value::Seq(vec![]).truthy());
    }

    #[test]
    fn map_output_is_json_like() {
        let mut map = IndexMap::new();
        map.insert("a".to_string(), Value::Int(1));
        map.insert("b".to_string(), Value::Str("x".into()));
        assert_eq!(Value::Map(map).to_string(), "{\"a\":1,\"b\":\"x\"}");
    }

    #[cfg(feature = "json")]
    #[test]
    fn converts_from_serde_json() {
        let json = serde_json::json!({"name": "alice", "age": 30, "tags": ["a","b"]});
        let value = Value::try_from(json).unwrap();
        let Value::Map(map) = value else { panic!("expected map") };
        assert_eq!(map.get("name"), Some(&Value::Str("alice".into())));
        assert_eq!(map.get("age"), Some(&Value::Int(30)));
    }

    #[cfg(feature = "json")]
    #[test]
    fn unsigned_integer_beyond_i64_range_is_rejected() {
        let json = serde_json::json!(u64::MAX);
        assert!(Value::try_from(json).is_err());
    }

    #[derive(Debug)]
    struct Timestamp;

    impl Record for Timestamp {
        fn field(&self, _name: &str) -> Option<Value> {
            None
        }

        fn field_names(&self) -> Vec<&'static str> {
            Vec::new()
        }

        fn as_time_like(&self) -> Option<TimeLike> {
            Some(TimeLike {
                year: 2024,
                month: 1,
                day: 2,
                hour: 3,
                minute: 4,
                second: 5,
            })
        }
    }

    #[test]
    fn time_like_record_uses_the_default_display_pattern() {
        let value = Value::Record(Arc::new(Timestamp));
        assert_eq!(value.to_string(), "2024-01-02 03:04:05");
    }
}
