//! Static descriptions of bindable types.
//!
//! Every target type describes itself once through [`Bindable::shape`]: a
//! scalar with a parse strategy, a sequence, a string-keyed map, or a record
//! whose fields each carry a binding tag. The binder only ever looks at the
//! shape, so adding a type never touches binder code.
//!
//! ```ignore
//! #[derive(Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Bindable for Server {
//!     fn shape() -> Shape {
//!         Shape::record::<Self>()
//!             .field::<String>("host", "${host:=localhost}")
//!             .field::<u16>("port", "${port:=8080}")
//!             .validate("$>0")
//!             .build()
//!     }
//!
//!     fn from_value(value: Value) -> Result<Self, ConfError> {
//!         let mut r = value.into_record::<Self>()?;
//!         Ok(Self {
//!             host: r.take("host")?,
//!             port: r.take("port")?,
//!         })
//!     }
//! }
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::error::ConfError;
use crate::value::Value;

/// How the binder turns a scalar's text into a [`Value`] when no converter is
/// registered for the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    Str,
    /// Only a registered converter can produce this type.
    Custom,
}

#[derive(Debug, Clone)]
pub enum Shape {
    Scalar {
        type_id: TypeId,
        type_name: &'static str,
        kind: ScalarKind,
    },
    Sequence {
        type_name: &'static str,
        elem: Box<Shape>,
    },
    Map {
        type_name: &'static str,
        value: Box<Shape>,
    },
    Record(RecordShape),
}

impl Shape {
    pub fn scalar<T: Any>(kind: ScalarKind) -> Self {
        Shape::Scalar {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            kind,
        }
    }

    /// A scalar bound exclusively through a registered converter.
    pub fn custom<T: Any>() -> Self {
        Self::scalar::<T>(ScalarKind::Custom)
    }

    pub fn sequence<T: Any>(elem: Shape) -> Self {
        Shape::Sequence {
            type_name: type_name::<T>(),
            elem: Box::new(elem),
        }
    }

    pub fn map<T: Any>(value: Shape) -> Self {
        Shape::Map {
            type_name: type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// Start describing a record type.
    pub fn record<T: Any>() -> RecordBuilder {
        RecordBuilder {
            shape: RecordShape {
                type_name: type_name::<T>(),
                fields: Vec::new(),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Scalar { type_name, .. }
            | Shape::Sequence { type_name, .. }
            | Shape::Map { type_name, .. } => type_name,
            Shape::Record(r) => r.type_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordShape {
    pub type_name: &'static str,
    pub fields: Vec<FieldShape>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldBinding {
    /// Bound through an explicit tag such as `${port:=8080}`.
    Tagged(String),
    /// An embedded record whose fields bind at the parent's key.
    Embedded,
    /// Bound under the field name, lower-cased with `_` read as `.`.
    Implicit,
}

#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub binding: FieldBinding,
    pub shape: Shape,
    pub validate: Option<String>,
}

impl FieldShape {
    /// The tag this field binds through, if it binds through one.
    pub fn tag(&self) -> Option<String> {
        match &self.binding {
            FieldBinding::Tagged(tag) => Some(tag.clone()),
            FieldBinding::Implicit => Some(implicit_tag(self.name)),
            FieldBinding::Embedded => None,
        }
    }
}

/// `max_conns` binds as `${max.conns}`.
pub fn implicit_tag(name: &str) -> String {
    format!("${{{}}}", name.to_lowercase().replace('_', "."))
}

pub struct RecordBuilder {
    shape: RecordShape,
}

impl RecordBuilder {
    pub fn field<F: Bindable>(self, name: &'static str, tag: &str) -> Self {
        self.push(name, FieldBinding::Tagged(tag.to_string()), F::shape())
    }

    pub fn embed<F: Bindable>(self, name: &'static str) -> Self {
        self.push(name, FieldBinding::Embedded, F::shape())
    }

    pub fn implicit<F: Bindable>(self, name: &'static str) -> Self {
        self.push(name, FieldBinding::Implicit, F::shape())
    }

    /// Attach a validation expression to the most recently added field.
    pub fn validate(mut self, expr: &str) -> Self {
        if let Some(field) = self.shape.fields.last_mut() {
            field.validate = Some(expr.to_string());
        }
        self
    }

    pub fn build(self) -> Shape {
        Shape::Record(self.shape)
    }

    fn push(mut self, name: &'static str, binding: FieldBinding, shape: Shape) -> Self {
        self.shape.fields.push(FieldShape {
            name,
            binding,
            shape,
            validate: None,
        });
        self
    }
}

/// A type the binder can produce.
///
/// `Default` supplies the value of a field that a filter skipped.
pub trait Bindable: Default + 'static {
    fn shape() -> Shape;

    fn from_value(value: Value) -> Result<Self, ConfError>;
}

fn mismatch<T>(value: &Value) -> ConfError {
    ConfError::TypeMismatch {
        expected: type_name::<T>(),
        found: value.kind_name(),
    }
}

fn out_of_range<T>() -> ConfError {
    ConfError::TypeMismatch {
        expected: type_name::<T>(),
        found: "out-of-range integer",
    }
}

macro_rules! bindable_int {
    ($($ty:ty => $kind:ident),* $(,)?) => {$(
        impl Bindable for $ty {
            fn shape() -> Shape {
                Shape::scalar::<$ty>(ScalarKind::$kind)
            }

            fn from_value(value: Value) -> Result<Self, ConfError> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| out_of_range::<$ty>()),
                    Value::Uint(u) => <$ty>::try_from(u).map_err(|_| out_of_range::<$ty>()),
                    other => other.downcast(),
                }
            }
        }
    )*};
}

bindable_int! {
    i8 => I8, i16 => I16, i32 => I32, i64 => I64, isize => Isize,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64, usize => Usize,
}

impl Bindable for f32 {
    fn shape() -> Shape {
        Shape::scalar::<f32>(ScalarKind::F32)
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Float(f) => Ok(f as f32),
            other => other.downcast(),
        }
    }
}

impl Bindable for f64 {
    fn shape() -> Shape {
        Shape::scalar::<f64>(ScalarKind::F64)
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Float(f) => Ok(f),
            other => other.downcast(),
        }
    }
}

impl Bindable for bool {
    fn shape() -> Shape {
        Shape::scalar::<bool>(ScalarKind::Bool)
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => other.downcast(),
        }
    }
}

impl Bindable for String {
    fn shape() -> Shape {
        Shape::scalar::<String>(ScalarKind::Str)
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Str(s) => Ok(s),
            other => other.downcast(),
        }
    }
}

impl<T: Bindable> Bindable for Vec<T> {
    fn shape() -> Shape {
        Shape::sequence::<Self>(T::shape())
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Bindable> Bindable for BTreeMap<String, T> {
    fn shape() -> Shape {
        Shape::map::<Self>(T::shape())
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

impl<T: Bindable> Bindable for HashMap<String, T> {
    fn shape() -> Shape {
        Shape::map::<Self>(T::shape())
    }

    fn from_value(value: Value) -> Result<Self, ConfError> {
        match value {
            Value::Map(map) => map
                .into_iter()
                .map(|(k, v)| Ok((k, T::from_value(v)?)))
                .collect(),
            other => Err(mismatch::<Self>(&other)),
        }
    }
}

macro_rules! bindable_custom {
    ($($ty:ty),* $(,)?) => {$(
        impl Bindable for $ty {
            fn shape() -> Shape {
                Shape::custom::<$ty>()
            }

            fn from_value(value: Value) -> Result<Self, ConfError> {
                value.downcast()
            }
        }
    )*};
}

bindable_custom!(Duration);

#[cfg(feature = "chrono")]
bindable_custom!(
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
);
