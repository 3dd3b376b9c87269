//! Dynamically-typed bound values.
//!
//! The binder walks a [`Shape`](crate::shape::Shape) and produces a [`Value`]
//! tree; [`Bindable::from_value`](crate::shape::Bindable::from_value) then
//! turns that tree into the concrete Rust type. Keeping the intermediate form
//! untyped is what lets validators inspect any bound value.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::ConfError;
use crate::shape::Bindable;

/// The output of a registered converter, together with the text it came from.
pub struct CustomValue {
    raw: String,
    inner: Box<dyn Any + Send + Sync>,
}

impl CustomValue {
    pub fn new(raw: impl Into<String>, inner: Box<dyn Any + Send + Sync>) -> Self {
        Self {
            raw: raw.into(),
            inner,
        }
    }

    /// The property text the converter was given.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValue")
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// Bound fields of a record, by field name.
#[derive(Debug)]
pub struct RecordValue {
    type_name: &'static str,
    fields: HashMap<&'static str, Value>,
}

impl RecordValue {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: &'static str, value: Value) {
        self.fields.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Remove and convert one field. A field that was never bound (a filter
    /// skipped it) comes back as `T::default()`.
    pub fn take<T: Bindable>(&mut self, name: &str) -> Result<T, ConfError> {
        match self.fields.remove(name) {
            Some(value) => T::from_value(value),
            None => Ok(T::default()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Debug)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Custom(CustomValue),
    Seq(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Record(RecordValue),
}

impl Value {
    /// Short name of the variant, used in type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::Uint(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Custom(_) => "custom value",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(u) => Some(*u),
            Value::Int(i) => u64::try_from(*i).ok(),
            _ => None,
        }
    }

    /// Any numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            _ => None,
        }
    }

    /// String values, and the raw text behind custom values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            Value::Custom(c) => Some(c.raw()),
            _ => None,
        }
    }

    /// Unwrap a record produced for `T`'s shape.
    pub fn into_record<T: Any>(self) -> Result<RecordValue, ConfError> {
        match self {
            Value::Record(r) => Ok(r),
            other => Err(ConfError::TypeMismatch {
                expected: type_name::<T>(),
                found: other.kind_name(),
            }),
        }
    }

    /// Take the converter output out of a [`Value::Custom`].
    pub fn downcast<T: Any>(self) -> Result<T, ConfError> {
        let found = self.kind_name();
        match self {
            Value::Custom(c) => c.inner.downcast::<T>().map(|b| *b).map_err(|_| {
                ConfError::TypeMismatch {
                    expected: type_name::<T>(),
                    found: "custom value of another type",
                }
            }),
            _ => Err(ConfError::TypeMismatch {
                expected: type_name::<T>(),
                found,
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Custom(c) => f.write_str(c.raw()),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Record(r) => {
                let mut names: Vec<_> = r.fields.keys().copied().collect();
                names.sort_unstable();
                f.write_str("{")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {}", r.fields[name])?;
                }
                f.write_str("}")
            }
        }
    }
}
