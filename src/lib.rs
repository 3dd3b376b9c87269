//! Hierarchical properties, placeholder resolution, and typed binding with
//! live refresh.
//!
//! Confbind keeps configuration as a flat set of canonical keys
//! (`server.tls.cert`, `hosts[0]`), lets values reference each other with
//! `${key:=default}` placeholders, and binds any part of the tree into typed
//! Rust values. A [`RefreshRegistry`] can swap the whole store at runtime and
//! re-bind exactly the values whose keys changed.
//!
//! ```ignore
//! let props = confbind::source::from_file(Path::new("app.toml"))?;
//! let registry = RefreshRegistry::new(props);
//!
//! let pool = Arc::new(Dync::<PoolConfig>::default());
//! registry.watch(pool.clone(), "${db.pool}")?;
//!
//! // later, after the file changed on disk
//! registry.refresh(confbind::source::from_file(Path::new("app.toml"))?)?;
//! println!("pool size is now {}", pool.value().size);
//! ```
//!
//! # Keys and storage
//!
//! A key is a sequence of segments. Named segments are joined with `.`,
//! indices are written as `[n]`:
//!
//! | Key | Segments |
//! |-----|----------|
//! | `a.b.c` | `a`, `b`, `c` |
//! | `a[0].b` | `a`, `[0]`, `b` |
//! | `a[0][1]` | `a`, `[0]`, `[1]` |
//!
//! [`Properties`] stores leaves under their canonical key and keeps a shadow
//! tree to reject shapes that cannot coexist. Once `db.url` exists, `db`
//! cannot hold a value, and once `list[0]` exists, `list.name` cannot. Every
//! such clash is a [`ConfError::PropertyConflict`].
//!
//! Stores are usually built from TOML or JSON through the [`source`] module,
//! or from any `Serialize` value with [`Properties::from_serialize`]. Each
//! source is remembered by name so [`Properties::file_of`] can tell where a
//! value came from.
//!
//! # Placeholders
//!
//! Any stored value, and any string passed to [`Properties::resolve`], may
//! embed references:
//!
//! ```text
//! url  = "http://${host}:${port:=8080}"
//! path = "${data.dir:=${home}/data}"
//! ```
//!
//! References are resolved left to right and recursively, so a value may
//! point at another value that itself contains references. A reference to a
//! subtree (a key with children but no value) is an error rather than a
//! silent fallback to its default.
//!
//! # Binding
//!
//! A target type implements [`Bindable`] by describing its [`Shape`]. Records
//! are built with [`Shape::record`]; each field names its tag, and may carry
//! a validation expression evaluated by the registered [`Validator`]:
//!
//! ```ignore
//! Shape::record::<Self>()
//!     .field::<String>("host", "${host:=localhost}")
//!     .field::<u16>("port", "${port:=8080}")
//!     .validate("$>0")
//!     .field::<Vec<String>>("peers", "${peers:=}")
//!     .embed::<Common>("common")
//!     .build()
//! ```
//!
//! Sequences bind from `key[0]`, `key[1]`, ... when those keys exist, and
//! otherwise from a single delimited string (comma by default, or a named
//! splitter: `${path}>>colon`). Maps bind one entry per child key. Scalars
//! go through a registered converter when there is one for their type and
//! through the built-in parser otherwise. `Duration` and, with the `chrono`
//! feature, `DateTime<Utc>`, `NaiveDate` and `NaiveDateTime` have converters
//! out of the box.
//!
//! Converters, splitters and the validator live in a [`HookRegistry`] that is
//! assembled before binding and shared read-only afterwards.
//!
//! # Refresh
//!
//! [`RefreshRegistry::refresh`] swaps in a new store, computes which keys
//! changed, and calls every watcher whose key is on a changed path, in
//! registration order. Failures and panics are collected rather than aborting
//! the refresh; the new store stays in place either way. [`Dync`] is the
//! ready-made watcher: it holds the latest successfully bound value.
//!
//! # Errors
//!
//! Everything returns [`ConfError`]. Binding failures are wrapped once per
//! level with the display path, so a message reads from the outermost target
//! down to the cause:
//!
//! ```text
//! bind Server (Server): bind Server.tls (Tls): bind Server.tls.cert (String):
//! Property 'server.tls.cert' does not exist
//! ```
//!
//! Use [`ConfError::root_cause`] to match on the underlying error.

pub mod bind;
pub mod convert;
pub mod dync;
pub mod error;
pub mod hooks;
pub mod path;
pub mod refresh;
pub mod shape;
pub mod source;
pub mod store;
pub mod tag;
pub mod value;

mod flatten;
mod resolve;

#[cfg(test)]
mod fixtures;

pub use bind::{BindFilter, Binder, FilterAction};
pub use dync::Dync;
pub use error::ConfError;
pub use hooks::{HookRegistry, Validator};
pub use path::{PathSegment, SegmentKind, join_path, split_path};
pub use refresh::{RefreshRegistry, Refreshable};
pub use resolve::{resolve_string, resolve_tag};
pub use shape::{Bindable, FieldBinding, FieldShape, RecordShape, ScalarKind, Shape};
pub use store::{Properties, ValueInfo};
pub use tag::{BindParam, ParsedTag, ROOT_KEY};
pub use value::{CustomValue, RecordValue, Value};
