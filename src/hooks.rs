//! Extension points consulted while binding: converters for custom scalar
//! types, named splitters for delimited lists, and an optional validator.
//!
//! A registry is assembled up front with `&mut` methods and then shared
//! read-only (usually behind an `Arc`). There is no global mutable registry;
//! [`HookRegistry::shared`] is a lazily built, immutable default.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::convert;
use crate::value::Value;

pub type ConverterFn =
    Arc<dyn Fn(&str) -> Result<Box<dyn Any + Send + Sync>, String> + Send + Sync>;

pub type SplitterFn = Arc<dyn Fn(&str) -> Result<Vec<String>, String> + Send + Sync>;

/// Evaluates a field's validation expression against its bound value.
///
/// `Ok(false)` means the value was rejected; `Err` means the expression
/// itself could not be evaluated.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Value, expr: &str) -> Result<bool, String>;
}

impl<F> Validator for F
where
    F: Fn(&Value, &str) -> Result<bool, String> + Send + Sync,
{
    fn validate(&self, value: &Value, expr: &str) -> Result<bool, String> {
        self(value, expr)
    }
}

#[derive(Clone)]
pub struct HookRegistry {
    converters: HashMap<TypeId, ConverterFn>,
    splitters: HashMap<String, SplitterFn>,
    validator: Option<Arc<dyn Validator>>,
}

static SHARED: LazyLock<HookRegistry> = LazyLock::new(HookRegistry::default);

impl Default for HookRegistry {
    /// A registry seeded with the built-in converters (`Duration`, and the
    /// chrono date/time types when that feature is on).
    fn default() -> Self {
        let mut hooks = Self::new();
        convert::register_builtins(&mut hooks);
        hooks
    }
}

impl HookRegistry {
    /// An empty registry with no built-ins.
    pub fn new() -> Self {
        Self {
            converters: HashMap::new(),
            splitters: HashMap::new(),
            validator: None,
        }
    }

    /// The process-wide default registry.
    pub fn shared() -> &'static HookRegistry {
        &SHARED
    }

    /// Register how to build a `T` from property text. Replaces any previous
    /// converter for `T`, including built-ins and primitives.
    pub fn register_converter<T, E, F>(&mut self, f: F) -> &mut Self
    where
        T: Any + Send + Sync,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        let erased: ConverterFn = Arc::new(move |s: &str| {
            f(s).map(|v| Box::new(v) as Box<dyn Any + Send + Sync>)
                .map_err(|e| e.to_string())
        });
        self.converters.insert(TypeId::of::<T>(), erased);
        self
    }

    pub fn register_splitter<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&str) -> Result<Vec<String>, String> + Send + Sync + 'static,
    {
        self.splitters.insert(name.to_string(), Arc::new(f));
        self
    }

    pub fn set_validator<V: Validator + 'static>(&mut self, validator: V) -> &mut Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn converter(&self, type_id: TypeId) -> Option<&ConverterFn> {
        self.converters.get(&type_id)
    }

    pub fn splitter(&self, name: &str) -> Option<&SplitterFn> {
        self.splitters.get(name)
    }

    pub fn validator(&self) -> Option<&dyn Validator> {
        self.validator.as_deref()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut splitters: Vec<_> = self.splitters.keys().collect();
        splitters.sort();
        f.debug_struct("HookRegistry")
            .field("converters", &self.converters.len())
            .field("splitters", &splitters)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// The splitter used when a tag names none: split on `,` and trim each part.
pub(crate) fn split_comma(s: &str) -> Vec<String> {
    s.split(',').map(|part| part.trim().to_string()).collect()
}
