//! A value that tracks the current properties.

use std::fmt;

use parking_lot::RwLock;

use crate::bind::Binder;
use crate::error::ConfError;
use crate::refresh::Refreshable;
use crate::shape::Bindable;
use crate::tag::BindParam;

/// Holds the latest successfully bound `T`.
///
/// Register it with [`RefreshRegistry::watch`](crate::RefreshRegistry::watch);
/// afterwards [`value`](Self::value) always returns a complete `T` from one
/// store snapshot. A failed re-bind leaves the previous value in place.
pub struct Dync<T> {
    value: RwLock<T>,
}

impl<T: Bindable> Default for Dync<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Dync<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: RwLock::new(initial),
        }
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.value.read())
    }
}

impl<T: Clone> Dync<T> {
    pub fn value(&self) -> T {
        self.value.read().clone()
    }
}

impl<T: Bindable + Send + Sync> Refreshable for Dync<T> {
    fn on_refresh(&self, binder: &Binder<'_>, param: &BindParam) -> Result<(), ConfError> {
        let fresh = binder.bind_param::<T>(param)?;
        *self.value.write() = fresh;
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for Dync<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dync").field(&*self.value.read()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::props;
    use crate::hooks::HookRegistry;

    #[test]
    fn binds_on_refresh() {
        let p = props(&[("n", "7")]);
        let hooks = HookRegistry::new();
        let d = Dync::<u32>::default();
        assert_eq!(d.value(), 0);

        let param = BindParam::root("n").bind_tag("${n}", None).unwrap();
        d.on_refresh(&Binder::new(&p, &hooks), &param).unwrap();
        assert_eq!(d.value(), 7);
        assert_eq!(d.with(|v| v * 2), 14);
    }

    #[test]
    fn failed_bind_keeps_value() {
        let hooks = HookRegistry::new();
        let d = Dync::new(3u32);
        let param = BindParam::root("n").bind_tag("${n}", None).unwrap();
        let bad = props(&[("n", "x")]);
        assert!(d.on_refresh(&Binder::new(&bad, &hooks), &param).is_err());
        assert_eq!(d.value(), 3);
        assert_eq!(format!("{d:?}"), "Dync(3)");
    }
}
