//! Proxies: handles to a value that may not be resolved yet.
//!
//! A proxy can be handed out before any provider is registered. It
//! resolves its entry on first use, remembers the result and forwards
//! every later access to that same value. Access is typed: callers name
//! the type they expect and get an error if the value is something else.
//!
//! ```rust
//! use lazywire_container::prelude::*;
//! use std::collections::HashMap;
//!
//! let manager = DependencyManager::new();
//! let proxy = manager.get_proxy("svc");
//!
//! manager.provide_value("svc", HashMap::from([("a".to_string(), 1)]));
//!
//! let a = proxy.with(|map: &HashMap<String, i32>| map["a"]).unwrap();
//! assert_eq!(a, 1);
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::dependency::Dependency;
use crate::entry::DependencyEntry;
use crate::error::{InjectError, Result};

/// A lazily resolving handle to one entry's value.
///
/// Cloning is cheap; clones share the resolved value.
#[derive(Clone)]
pub struct DependencyProxy {
    entry: Arc<DependencyEntry>,
    value: Arc<OnceCell<Dependency>>,
}

impl DependencyProxy {
    pub(crate) fn new(entry: Arc<DependencyEntry>, value: Arc<OnceCell<Dependency>>) -> Self {
        Self { entry, value }
    }

    /// Name of the entry behind this proxy.
    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn entry(&self) -> &Arc<DependencyEntry> {
        &self.entry
    }

    /// Returns `true` once the proxy has a value to forward to.
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// Resolves the entry on first use and returns the cached value.
    ///
    /// # Errors
    /// Returns [`InjectError::ProxyUnresolved`] if the entry has no value.
    /// Nothing is cached in that case, so a later call can still succeed.
    pub fn value(&self) -> Result<Dependency> {
        if let Some(value) = self.value.get() {
            return Ok(value.clone());
        }

        // Resolve outside the cell: a factory may use this proxy re-entrantly.
        let resolved = self
            .entry
            .try_value()
            .map_err(|source| InjectError::ProxyUnresolved {
                name: self.entry.name().to_string(),
                source: Box::new(source),
            })?;

        trace!(entry = %self.entry.name(), "Proxy resolved");
        Ok(self.value.get_or_init(|| resolved).clone())
    }

    /// Returns the value as a `T`.
    ///
    /// # Errors
    /// - [`InjectError::ProxyUnresolved`] if the entry has no value
    /// - [`InjectError::TypeMismatch`] if the value is not a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let value = self.value()?;
        value
            .downcast::<T>()
            .ok_or_else(|| InjectError::TypeMismatch {
                name: self.entry.name().to_string(),
                expected: type_name::<T>(),
                found: value.type_name(),
            })
    }

    /// Runs `f` against the value, forwarding the access.
    ///
    /// Values meant to be changed through a proxy carry their own interior
    /// mutability (atomics, `Mutex`, ...).
    pub fn with<T, R>(&self, f: impl FnOnce(&T) -> R) -> Result<R>
    where
        T: Any + Send + Sync,
    {
        let value = self.downcast::<T>()?;
        Ok(f(&*value))
    }

    /// Returns `true` if both proxies belong to the same entry.
    pub fn ptr_eq(&self, other: &DependencyProxy) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for DependencyProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyProxy")
            .field("name", &self.entry.name())
            .field("value", &self.value.get())
            .finish()
    }
}
