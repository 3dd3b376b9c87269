//! A swappable property store with change-driven re-binding.
//!
//! [`RefreshRegistry`] owns the current [`Properties`] behind a read/write
//! lock. Readers bind against a consistent snapshot. A [`refresh`] swaps in a
//! new store, diffs it against the old one, and re-binds only the watchers
//! whose key lies on a changed path.
//!
//! Watchers run one at a time, in registration order, while the write lock is
//! held; a watcher that fails or panics does not stop the others, and every
//! failure is reported together once all have run.
//!
//! [`refresh`]: RefreshRegistry::refresh

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::{debug, error, info, warn};

use crate::bind::{BindFilter, Binder};
use crate::error::ConfError;
use crate::hooks::HookRegistry;
use crate::path::is_within;
use crate::shape::Bindable;
use crate::store::Properties;
use crate::tag::{BindParam, ROOT_KEY};

/// Something that re-binds itself when the properties under its key change.
pub trait Refreshable: Send + Sync {
    fn on_refresh(&self, binder: &Binder<'_>, param: &BindParam) -> Result<(), ConfError>;
}

struct Watcher {
    target: Arc<dyn Refreshable>,
    param: BindParam,
}

struct State {
    props: Arc<Properties>,
    watchers: Vec<Watcher>,
}

pub struct RefreshRegistry {
    state: RwLock<State>,
    hooks: Arc<HookRegistry>,
}

impl RefreshRegistry {
    /// Wrap `props` using the default hooks.
    pub fn new(props: Properties) -> Self {
        Self::with_hooks(props, Arc::new(HookRegistry::default()))
    }

    pub fn with_hooks(props: Properties, hooks: Arc<HookRegistry>) -> Self {
        Self {
            state: RwLock::new(State {
                props: Arc::new(props),
                watchers: Vec::new(),
            }),
            hooks,
        }
    }

    /// The current store. The snapshot stays valid across later refreshes.
    pub fn data(&self) -> Arc<Properties> {
        Arc::clone(&self.state.read().props)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn has(&self, key: &str) -> bool {
        self.state.read().props.has(key)
    }

    pub fn get(&self, key: &str) -> Result<String, ConfError> {
        self.state.read().props.get(key).map(str::to_string)
    }

    pub fn resolve(&self, s: &str) -> Result<String, ConfError> {
        self.state.read().props.resolve(s)
    }

    pub fn sub_keys(&self, prefix: &str) -> Result<Vec<String>, ConfError> {
        self.state.read().props.sub_keys(prefix)
    }

    /// One-off bind against the current store.
    pub fn bind<T: Bindable>(&self, tag: &str) -> Result<T, ConfError> {
        let state = self.state.read();
        Binder::new(&state.props, &self.hooks).bind(tag)
    }

    pub fn bind_with_filter<T: Bindable>(
        &self,
        tag: &str,
        filter: &dyn BindFilter,
    ) -> Result<T, ConfError> {
        let state = self.state.read();
        Binder::new(&state.props, &self.hooks)
            .with_filter(filter)
            .bind(tag)
    }

    /// Bind `target` now and re-bind it whenever properties under `tag`'s key
    /// change.
    pub fn watch(&self, target: Arc<dyn Refreshable>, tag: &str) -> Result<(), ConfError> {
        let mut param = BindParam::default().bind_tag(tag, None)?;
        param.path = if param.key.is_empty() {
            ROOT_KEY.to_string()
        } else {
            param.key.clone()
        };
        self.watch_param(target, param)
    }

    /// Like [`watch`](Self::watch) for a prepared param. The target is not
    /// registered if its initial bind fails.
    pub fn watch_param(
        &self,
        target: Arc<dyn Refreshable>,
        param: BindParam,
    ) -> Result<(), ConfError> {
        let state = self.state.upgradable_read();
        target.on_refresh(&Binder::new(&state.props, &self.hooks), &param)?;

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        debug!(key = %param.key, watchers = state.watchers.len() + 1, "watcher registered");
        state.watchers.push(Watcher { target, param });
        Ok(())
    }

    pub fn watcher_count(&self) -> usize {
        self.state.read().watchers.len()
    }

    /// Replace the store and re-bind every watcher affected by the change.
    ///
    /// The new store is kept even when watchers fail; the error lists each
    /// failed watcher.
    pub fn refresh(&self, props: Properties) -> Result<(), ConfError> {
        let mut state = self.state.write();
        let props = Arc::new(props);
        let old = std::mem::replace(&mut state.props, Arc::clone(&props));

        let changed = changed_keys(&old, &props);
        if changed.is_empty() {
            debug!("refresh found no changed keys");
            return Ok(());
        }

        let binder = Binder::new(&props, &self.hooks);
        let mut refreshed = 0;
        let mut failures = Vec::new();
        for watcher in state
            .watchers
            .iter()
            .filter(|w| changed.iter().any(|key| is_within(key, &w.param.key)))
        {
            refreshed += 1;
            if let Err(e) = run_watcher(watcher, &binder) {
                warn!(key = %watcher.param.key, path = %watcher.param.path, error = %e, "watcher refresh failed");
                failures.push(ConfError::RefreshFailed {
                    key: watcher.param.key.clone(),
                    path: watcher.param.path.clone(),
                    source: Box::new(e),
                });
            }
        }

        info!(
            changed = changed.len(),
            refreshed,
            failed = failures.len(),
            "properties refreshed"
        );
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConfError::Refresh(failures))
        }
    }
}

fn run_watcher(watcher: &Watcher, binder: &Binder<'_>) -> Result<(), ConfError> {
    match panic::catch_unwind(AssertUnwindSafe(|| {
        watcher.target.on_refresh(binder, &watcher.param)
    })) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(key = %watcher.param.key, %message, "watcher panicked during refresh");
            Err(ConfError::Panicked { message })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Keys whose leaf value differs between the two stores, including keys
/// present in only one of them.
fn changed_keys(old: &Properties, new: &Properties) -> BTreeSet<String> {
    old.keys()
        .into_iter()
        .chain(new.keys())
        .filter(|key| old.leaf(key) != new.leaf(key))
        .collect()
}
