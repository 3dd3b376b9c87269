//! Populate typed values from a [`Properties`] store.
//!
//! Binding walks a target's [`Shape`] alongside the property tree:
//!
//! - **Scalars** resolve their tag (placeholders and defaults included) and
//!   convert the text, preferring a registered converter over the built-in
//!   parse for the scalar's kind.
//! - **Sequences** bind element-wise from `key[0]`, `key[1]`, ... while those
//!   keys exist. Without indexed children the tag is resolved to a single
//!   string and split, either on commas or with a named splitter.
//! - **Maps** bind one entry per immediate child of the key.
//! - **Records** bind each field under the key its tag names. Embedded records
//!   bind at the parent's key; implicit fields derive a key from their name.
//!
//! Every failure is wrapped once per level with the display path and target
//! type, so the outermost message reads like a breadcrumb trail down to the
//! root cause.

use std::any::TypeId;
use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::trace;

use crate::convert::parse_bool;
use crate::error::ConfError;
use crate::hooks::{HookRegistry, split_comma};
use crate::path::{child_key, index_key};
use crate::resolve::resolve_key;
use crate::shape::{Bindable, FieldBinding, FieldShape, RecordShape, ScalarKind, Shape, implicit_tag};
use crate::store::Properties;
use crate::tag::{BindParam, ParsedTag};
use crate::value::{CustomValue, RecordValue, Value};

/// What a [`BindFilter`] wants done with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Continue,
    /// Leave the field at its `Default` value.
    Skip,
}

/// Consulted before each tagged or implicit record field is bound.
pub trait BindFilter {
    fn intercept(&self, field: &FieldShape, param: &BindParam) -> Result<FilterAction, ConfError>;
}

impl<F> BindFilter for F
where
    F: Fn(&FieldShape, &BindParam) -> Result<FilterAction, ConfError>,
{
    fn intercept(&self, field: &FieldShape, param: &BindParam) -> Result<FilterAction, ConfError> {
        self(field, param)
    }
}

#[derive(Clone, Copy)]
pub struct Binder<'a> {
    props: &'a Properties,
    hooks: &'a HookRegistry,
    filter: Option<&'a dyn BindFilter>,
}

impl<'a> Binder<'a> {
    pub fn new(props: &'a Properties, hooks: &'a HookRegistry) -> Self {
        Self {
            props,
            hooks,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: &'a dyn BindFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn properties(&self) -> &'a Properties {
        self.props
    }

    pub fn hooks(&self) -> &'a HookRegistry {
        self.hooks
    }

    /// Bind a `T` from the root through `tag`, e.g. `${server}` or `${ROOT}`.
    pub fn bind<T: Bindable>(&self, tag: &str) -> Result<T, ConfError> {
        let param = BindParam::root(short_type_name(std::any::type_name::<T>()))
            .bind_tag(tag, None)?;
        self.bind_param(&param)
    }

    /// Bind a `T` for an already-built param, running its validation.
    pub fn bind_param<T: Bindable>(&self, param: &BindParam) -> Result<T, ConfError> {
        let shape = T::shape();
        let value = self.bind_value(&shape, param)?;
        self.validate(param, &value)
            .map_err(|e| wrap(param, &shape, e))?;
        T::from_value(value).map_err(|e| wrap(param, &shape, e))
    }

    /// Bind the untyped value described by `shape`.
    pub fn bind_value(&self, shape: &Shape, param: &BindParam) -> Result<Value, ConfError> {
        trace!(key = %param.key, path = %param.path, "binding");
        let result = match shape {
            Shape::Scalar { type_id, type_name, kind } => {
                self.bind_scalar(*type_id, type_name, *kind, param)
            }
            Shape::Sequence { elem, .. } => self.bind_sequence(elem, param),
            Shape::Map { value, .. } => self.bind_map(value, param),
            Shape::Record(record) => self.bind_record(record, param),
        };
        result.map_err(|e| wrap(param, shape, e))
    }

    fn bind_scalar(
        &self,
        type_id: TypeId,
        type_name: &str,
        kind: ScalarKind,
        param: &BindParam,
    ) -> Result<Value, ConfError> {
        let raw = self.resolve(param)?;
        let conversion = |message: String| ConfError::Conversion {
            path: param.path.clone(),
            target: short_type_name(type_name),
            value: raw.clone(),
            message,
        };

        if let Some(convert) = self.hooks.converter(type_id) {
            let inner = convert(raw.as_str()).map_err(conversion)?;
            return Ok(Value::Custom(CustomValue::new(raw.as_str(), inner)));
        }

        let value = match kind {
            ScalarKind::Bool => parse_bool(&raw).map(Value::Bool),
            ScalarKind::I8 => parse::<i8>(&raw).map(|v| Value::Int(v.into())),
            ScalarKind::I16 => parse::<i16>(&raw).map(|v| Value::Int(v.into())),
            ScalarKind::I32 => parse::<i32>(&raw).map(|v| Value::Int(v.into())),
            ScalarKind::I64 => parse::<i64>(&raw).map(Value::Int),
            ScalarKind::Isize => parse::<isize>(&raw).map(|v| Value::Int(v as i64)),
            ScalarKind::U8 => parse::<u8>(&raw).map(|v| Value::Uint(v.into())),
            ScalarKind::U16 => parse::<u16>(&raw).map(|v| Value::Uint(v.into())),
            ScalarKind::U32 => parse::<u32>(&raw).map(|v| Value::Uint(v.into())),
            ScalarKind::U64 => parse::<u64>(&raw).map(Value::Uint),
            ScalarKind::Usize => parse::<usize>(&raw).map(|v| Value::Uint(v as u64)),
            ScalarKind::F32 => parse::<f32>(&raw).map(|v| Value::Float(v.into())),
            ScalarKind::F64 => parse::<f64>(&raw).map(Value::Float),
            ScalarKind::Str => Ok(Value::Str(raw.clone())),
            ScalarKind::Custom => {
                return Err(ConfError::NoConverter {
                    target: short_type_name(type_name),
                });
            }
        };
        value.map_err(conversion)
    }

    fn bind_sequence(&self, elem: &Shape, param: &BindParam) -> Result<Value, ConfError> {
        if self.props.has(&index_key(&param.key, 0)) {
            return self.bind_indexed(elem, param);
        }

        let raw = self.resolve(param)?;
        if raw.is_empty() {
            return Ok(Value::Seq(Vec::new()));
        }
        let parts = self.split(&raw, &param.tag.splitter)?;

        // The parts become a root array in a scratch store so elements bind
        // exactly like indexed properties.
        let mut scratch = Properties::new();
        for (i, part) in parts.iter().enumerate() {
            scratch.set(&index_key("", i), part, 0)?;
        }
        let scratch_param = BindParam {
            key: String::new(),
            ..param.clone()
        };
        Binder {
            props: &scratch,
            hooks: self.hooks,
            filter: self.filter,
        }
        .bind_indexed(elem, &scratch_param)
    }

    fn bind_indexed(&self, elem: &Shape, param: &BindParam) -> Result<Value, ConfError> {
        let mut items = Vec::new();
        for i in 0.. {
            let key = index_key(&param.key, i);
            if !self.props.has(&key) {
                break;
            }
            let item = BindParam {
                key,
                path: format!("{}[{i}]", param.path),
                tag: ParsedTag::default(),
                validate: None,
            };
            items.push(self.bind_value(elem, &item)?);
        }
        Ok(Value::Seq(items))
    }

    fn split(&self, raw: &str, name: &str) -> Result<Vec<String>, ConfError> {
        if name.is_empty() {
            return Ok(split_comma(raw));
        }
        let splitter = self
            .hooks
            .splitter(name)
            .ok_or_else(|| ConfError::UnknownSplitter {
                name: name.to_string(),
            })?;
        splitter(raw).map_err(|message| ConfError::Splitter {
            name: name.to_string(),
            value: raw.to_string(),
            message,
        })
    }

    fn bind_map(&self, value: &Shape, param: &BindParam) -> Result<Value, ConfError> {
        if param.tag.has_default && !param.tag.default.is_empty() {
            return Err(ConfError::MapDefaultNotAllowed {
                path: param.path.clone(),
            });
        }
        if !self.props.has(&param.key) {
            if param.tag.has_default {
                return Ok(Value::Map(BTreeMap::new()));
            }
            return Err(ConfError::NotExist {
                key: param.key.clone(),
            });
        }

        let indexed = self.props.is_array(&param.key);
        let mut map = BTreeMap::new();
        for sub in self.props.sub_keys(&param.key)? {
            let key = if indexed {
                format!("{}[{sub}]", param.key)
            } else {
                child_key(&param.key, &sub)
            };
            let entry = BindParam {
                key,
                path: format!("{}[{sub}]", param.path),
                tag: ParsedTag::default(),
                validate: None,
            };
            let bound = self.bind_value(value, &entry)?;
            map.insert(sub, bound);
        }
        Ok(Value::Map(map))
    }

    fn bind_record(&self, record: &RecordShape, param: &BindParam) -> Result<Value, ConfError> {
        if param.tag.has_default && !param.tag.default.is_empty() {
            return Err(ConfError::StructDefaultNotAllowed {
                path: param.path.clone(),
            });
        }

        let mut out = RecordValue::new(record.type_name);
        for field in &record.fields {
            let validate = field.validate.as_deref();
            let sub = match &field.binding {
                FieldBinding::Embedded => BindParam {
                    validate: validate.map(str::to_string),
                    ..param.clone()
                }
                .at(field.name),
                FieldBinding::Tagged(tag) => param.bind_tag(tag, validate)?.at(field.name),
                FieldBinding::Implicit => {
                    param.bind_tag(&implicit_tag(field.name), validate)?.at(field.name)
                }
            };

            if field.binding != FieldBinding::Embedded {
                if let Some(filter) = self.filter {
                    if filter.intercept(field, &sub)? == FilterAction::Skip {
                        trace!(path = %sub.path, "field skipped by filter");
                        continue;
                    }
                }
            }

            let value = self.bind_value(&field.shape, &sub)?;
            self.validate(&sub, &value)
                .map_err(|e| wrap(&sub, &field.shape, e))?;
            out.insert(field.name, value);
        }
        Ok(Value::Record(out))
    }

    fn validate(&self, param: &BindParam, value: &Value) -> Result<(), ConfError> {
        let Some(expr) = &param.validate else {
            return Ok(());
        };
        let validator = self.hooks.validator().ok_or_else(|| ConfError::NoValidator {
            expr: expr.clone(),
        })?;
        match validator.validate(value, expr) {
            Ok(true) => Ok(()),
            Ok(false) => Err(ConfError::ValidationFailed {
                expr: expr.clone(),
                value: value.to_string(),
            }),
            Err(message) => Err(ConfError::InvalidExpression {
                expr: expr.clone(),
                message,
            }),
        }
    }

    fn resolve(&self, param: &BindParam) -> Result<String, ConfError> {
        let default = param.tag.has_default.then_some(param.tag.default.as_str());
        resolve_key(self.props, &param.key, default)
    }
}

fn parse<T>(raw: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| e.to_string())
}

fn wrap(param: &BindParam, shape: &Shape, source: ConfError) -> ConfError {
    ConfError::Bind {
        path: param.path.clone(),
        type_name: short_type_name(shape.type_name()),
        source: Box::new(source),
    }
}

/// Strip module paths from a type name: `alloc::vec::Vec<alloc::string::String>`
/// becomes `Vec<String>`.
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }
    out
}

impl Properties {
    /// Bind a `T` using the shared default hooks.
    pub fn bind<T: Bindable>(&self, tag: &str) -> Result<T, ConfError> {
        Binder::new(self, HookRegistry::shared()).bind(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{Common, Endpoint, Server, Tls, props};
    use std::collections::HashMap;
    use std::time::Duration;

    fn cause(err: &ConfError) -> &ConfError {
        err.root_cause()
    }

    fn greater_than_validator() -> HookRegistry {
        let mut hooks = HookRegistry::default();
        hooks.set_validator(|value: &Value, expr: &str| -> Result<bool, String> {
            let bound = expr
                .strip_prefix("$>")
                .ok_or_else(|| format!("unsupported expression '{expr}'"))?;
            let bound: f64 = bound.trim().parse().map_err(|_| "bad bound".to_string())?;
            let actual = value.as_f64().ok_or("not a number")?;
            Ok(actual > bound)
        });
        hooks
    }

    #[test]
    fn short_type_names() {
        assert_eq!(short_type_name("alloc::string::String"), "String");
        assert_eq!(
            short_type_name("alloc::vec::Vec<alloc::string::String>"),
            "Vec<String>"
        );
        assert_eq!(
            short_type_name("std::collections::hash::map::HashMap<alloc::string::String, u8>"),
            "HashMap<String, u8>"
        );
        assert_eq!(short_type_name("u16"), "u16");
    }

    #[test]
    fn scalars_and_defaults() {
        let p = props(&[("port", "9090"), ("debug", "T"), ("ratio", "0.5")]);
        assert_eq!(p.bind::<u16>("${port}").unwrap(), 9090);
        assert_eq!(p.bind::<u16>("${missing:=80}").unwrap(), 80);
        assert!(p.bind::<bool>("${debug}").unwrap());
        assert_eq!(p.bind::<f64>("${ratio}").unwrap(), 0.5);
        assert_eq!(p.bind::<String>("${:=literal}").unwrap(), "literal");
    }

    #[test]
    fn scalar_range_and_syntax_errors() {
        let p = props(&[("small", "300"), ("word", "abc")]);
        let err = p.bind::<u8>("${small}").unwrap_err();
        match cause(&err) {
            ConfError::Conversion { target, value, .. } => {
                assert_eq!(target, "u8");
                assert_eq!(value, "300");
            }
            other => panic!("Expected Conversion, got: {other:?}"),
        }
        assert!(matches!(
            cause(&p.bind::<i32>("${word}").unwrap_err()),
            ConfError::Conversion { .. }
        ));
        assert!(p.bind::<u16>("${absent}").unwrap_err().is_not_exist());
    }

    #[test]
    fn scalar_resolves_placeholders() {
        let p = props(&[("base", "80"), ("port", "${base}80")]);
        assert_eq!(p.bind::<u32>("${port}").unwrap(), 8080);
    }

    #[test]
    fn duration_through_builtin_converter() {
        let p = props(&[("timeout", "1m30s")]);
        assert_eq!(
            p.bind::<Duration>("${timeout}").unwrap(),
            Duration::from_secs(90)
        );
        assert_eq!(
            p.bind::<Duration>("${other:=250ms}").unwrap(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn custom_type_without_converter() {
        let p = props(&[("timeout", "5s")]);
        let hooks = HookRegistry::new();
        let err = Binder::new(&p, &hooks)
            .bind::<Duration>("${timeout}")
            .unwrap_err();
        assert!(matches!(cause(&err), ConfError::NoConverter { .. }));
    }

    #[test]
    fn converter_overrides_primitive_parse() {
        let p = props(&[("flag", "yes")]);
        let mut hooks = HookRegistry::new();
        hooks.register_converter::<bool, _, _>(|s: &str| match s {
            "yes" => Ok(true),
            "no" => Ok(false),
            _ => Err("expected yes/no"),
        });
        assert!(Binder::new(&p, &hooks).bind::<bool>("${flag}").unwrap());
    }

    #[test]
    fn sequence_stops_at_first_missing_index() {
        let p = props(&[("v[0]", "1"), ("v[1]", "2"), ("v[3]", "4")]);
        assert_eq!(p.bind::<Vec<u32>>("${v}").unwrap(), [1, 2]);
    }

    #[test]
    fn sequence_from_delimited_string() {
        let p = props(&[("hosts", "a, b ,c")]);
        assert_eq!(p.bind::<Vec<String>>("${hosts}").unwrap(), ["a", "b", "c"]);
        assert_eq!(
            p.bind::<Vec<u8>>("${nums:=1,2,3}").unwrap(),
            [1, 2, 3]
        );
    }

    #[test]
    fn empty_default_is_empty_sequence() {
        let p = Properties::new();
        assert!(p.bind::<Vec<String>>("${v:=}").unwrap().is_empty());
        assert!(p.bind::<Vec<String>>("${v}").unwrap_err().is_not_exist());
    }

    #[test]
    fn sequence_element_error_carries_index() {
        let p = props(&[("v[0]", "1"), ("v[1]", "x")]);
        let err = p.bind::<Vec<u8>>("${v}").unwrap_err();
        assert!(err.to_string().contains("Vec<u8>[1]"), "{err}");
        assert!(matches!(cause(&err), ConfError::Conversion { .. }));
    }

    #[test]
    fn named_splitter() {
        let p = props(&[("path", "/bin:/usr/bin")]);
        let mut hooks = HookRegistry::new();
        hooks.register_splitter("colon", |s| Ok(s.split(':').map(str::to_string).collect()));
        let binder = Binder::new(&p, &hooks);
        assert_eq!(
            binder.bind::<Vec<String>>("${path}>>colon").unwrap(),
            ["/bin", "/usr/bin"]
        );
        assert!(matches!(
            cause(&binder.bind::<Vec<String>>("${path}>>semi").unwrap_err()),
            ConfError::UnknownSplitter { .. }
        ));
    }

    #[test]
    fn failing_splitter() {
        let p = props(&[("v", "a")]);
        let mut hooks = HookRegistry::new();
        hooks.register_splitter("never", |_| Err("refused".to_string()));
        let err = Binder::new(&p, &hooks)
            .bind::<Vec<String>>("${v}>>never")
            .unwrap_err();
        assert!(matches!(cause(&err), ConfError::Splitter { .. }));
    }

    #[test]
    fn maps_bind_each_child() {
        let p = props(&[("limits.read", "10"), ("limits.write", "5")]);
        let limits = p.bind::<BTreeMap<String, u32>>("${limits}").unwrap();
        assert_eq!(limits.len(), 2);
        assert_eq!(limits["read"], 10);

        let nested = props(&[("db.main.port", "1"), ("db.replica.port", "2")]);
        let dbs = nested
            .bind::<HashMap<String, BTreeMap<String, u16>>>("${db}")
            .unwrap();
        assert_eq!(dbs["replica"]["port"], 2);
    }

    #[test]
    fn map_absence_versus_empty_default() {
        let p = Properties::new();
        assert!(
            p.bind::<BTreeMap<String, String>>("${m}")
                .unwrap_err()
                .is_not_exist()
        );
        assert!(
            p.bind::<BTreeMap<String, String>>("${m:=}")
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            cause(&p.bind::<BTreeMap<String, String>>("${m:=x}").unwrap_err()),
            ConfError::MapDefaultNotAllowed { .. }
        ));
    }

    #[test]
    fn stored_empty_binds_empty_collections() {
        let p = props(&[("m", ""), ("v", "")]);
        assert!(p.bind::<BTreeMap<String, String>>("${m}").unwrap().is_empty());
        assert!(p.bind::<Vec<String>>("${v}").unwrap().is_empty());
    }

    #[test]
    fn empty_table_from_source_binds_empty_map() {
        let p = Properties::from_serialize(&serde_json::json!({"tags": {}, "name": "x"})).unwrap();
        assert!(
            p.bind::<BTreeMap<String, String>>("${tags}")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn map_over_array_node() {
        let p = props(&[("list[0]", "a"), ("list[1]", "b")]);
        let m = p.bind::<BTreeMap<String, String>>("${list}").unwrap();
        assert_eq!(m["0"], "a");
        assert_eq!(m["1"], "b");
    }

    #[test]
    fn record_with_every_binding_kind() {
        let p = props(&[
            ("server.host", "example.org"),
            ("server.port", "443"),
            ("server.tags", "x,y"),
            ("server.limits.conn", "100"),
            ("server.tls.cert", "/etc/cert.pem"),
            ("server.name", "edge"),
            ("server.max.conns", "64"),
        ]);
        let server = Binder::new(&p, &greater_than_validator())
            .bind::<Server>("${server}")
            .unwrap();
        assert_eq!(
            server,
            Server {
                host: "example.org".into(),
                port: 443,
                tags: vec!["x".into(), "y".into()],
                limits: [("conn".to_string(), 100)].into(),
                tls: Tls {
                    cert: "/etc/cert.pem".into(),
                    verify: true,
                },
                common: Common {
                    name: "edge".into(),
                    timeout: Duration::from_secs(30),
                },
                max_conns: 64,
            }
        );
    }

    #[test]
    fn record_defaults_apply_under_key() {
        let p = props(&[("app.name", "x"), ("app.max.conns", "1"), ("app.tls.cert", "c")]);
        let server = Binder::new(&p, &greater_than_validator())
            .bind::<Server>("${app}")
            .unwrap();
        assert_eq!(server.host, "localhost");
        assert_eq!(server.port, 8080);
        assert!(server.tags.is_empty());
        assert!(server.limits.is_empty());
    }

    #[test]
    fn validation_scenario() {
        let hooks = greater_than_validator();
        let low = props(&[("port", "1")]);
        let err = Binder::new(&low, &hooks)
            .bind::<Endpoint>("${ROOT}")
            .unwrap_err();
        match cause(&err) {
            ConfError::ValidationFailed { expr, value } => {
                assert_eq!(expr, "$>9");
                assert_eq!(value, "1");
            }
            other => panic!("Expected ValidationFailed, got: {other:?}"),
        }

        let ok = props(&[("port", "10")]);
        let endpoint = Binder::new(&ok, &hooks).bind::<Endpoint>("${ROOT}").unwrap();
        assert_eq!(endpoint.port, 10);
    }

    #[test]
    fn validation_needs_a_validator() {
        let p = props(&[("port", "10")]);
        let hooks = HookRegistry::new();
        let err = Binder::new(&p, &hooks)
            .bind::<Endpoint>("${ROOT}")
            .unwrap_err();
        assert!(matches!(cause(&err), ConfError::NoValidator { .. }));
    }

    #[test]
    fn bad_validation_expression() {
        let mut hooks = HookRegistry::new();
        hooks.set_validator(|_: &Value, expr: &str| -> Result<bool, String> {
            Err(format!("cannot parse '{expr}'"))
        });
        let p = props(&[("port", "10")]);
        let err = Binder::new(&p, &hooks)
            .bind::<Endpoint>("${ROOT}")
            .unwrap_err();
        assert!(matches!(cause(&err), ConfError::InvalidExpression { .. }));
    }

    #[test]
    fn record_default_rejected() {
        let p = props(&[("port", "10")]);
        let err = p.bind::<Endpoint>("${ep:=x}").unwrap_err();
        assert!(matches!(cause(&err), ConfError::StructDefaultNotAllowed { .. }));
    }

    #[test]
    fn sequence_of_records() {
        let p = props(&[("eps[0].port", "10"), ("eps[1].port", "11")]);
        let eps = Binder::new(&p, &greater_than_validator())
            .bind::<Vec<Endpoint>>("${eps}")
            .unwrap();
        assert_eq!(eps.iter().map(|e| e.port).collect::<Vec<_>>(), [10, 11]);
    }

    #[test]
    fn error_path_names_every_level() {
        let p = props(&[("server.port", "443"), ("server.tls.cert", "c")]);
        let err = Binder::new(&p, &greater_than_validator())
            .bind::<Server>("${server}")
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Server.common.name"), "{msg}");
        assert!(err.is_not_exist());
        match cause(&err) {
            ConfError::NotExist { key } => assert_eq!(key, "server.name"),
            other => panic!("Expected NotExist, got: {other:?}"),
        }
    }

    #[test]
    fn filter_skips_fields() {
        let p = props(&[
            ("server.tls.cert", "c"),
            ("server.name", "n"),
            ("server.max.conns", "2"),
        ]);
        let hooks = greater_than_validator();
        let skip_tls = |field: &FieldShape, _: &BindParam| -> Result<FilterAction, ConfError> {
            Ok(if field.name == "tls" {
                FilterAction::Skip
            } else {
                FilterAction::Continue
            })
        };
        let server = Binder::new(&p, &hooks)
            .with_filter(&skip_tls)
            .bind::<Server>("${server}")
            .unwrap();
        assert_eq!(server.tls, Tls::default());
        assert_eq!(server.common.name, "n");
    }

    #[test]
    fn filter_errors_propagate() {
        let p = props(&[("port", "10")]);
        let hooks = greater_than_validator();
        let reject = |_: &FieldShape, param: &BindParam| -> Result<FilterAction, ConfError> {
            Err(ConfError::Filter {
                path: param.path.clone(),
                message: "no".into(),
            })
        };
        let err = Binder::new(&p, &hooks)
            .with_filter(&reject)
            .bind::<Endpoint>("${ROOT}")
            .unwrap_err();
        assert!(matches!(cause(&err), ConfError::Filter { .. }));
    }

    #[test]
    fn subtree_bound_as_scalar_is_not_simple() {
        let p = props(&[("db.url", "x")]);
        assert!(matches!(
            cause(&p.bind::<String>("${db}").unwrap_err()),
            ConfError::NotSimpleValue { .. }
        ));
    }
}
