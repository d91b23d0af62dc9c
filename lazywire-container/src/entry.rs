//! Dependency entries, one named slot per dependency.
//!
//! An entry owns an ordered list of providers and the value they resolved
//! to. Resolution is lazy and walks the providers newest first:
//!
//! ```text
//! add_provider(P1) ─┐
//! add_provider(P2) ─┤  value()  ──>  P2 ──fail──>  P1 ──ok──>  cached
//!                   ┘
//! ```
//!
//! The first success is cached for the entry's lifetime. A resolution in
//! which every provider fails is not cached, so the next request tries
//! again (and sees providers added in between).

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tracing::{debug, error, info, trace, warn};

use crate::dependency::Dependency;
use crate::error::{
    CircularDependencyError, InjectError, ProviderFailure, Result, UnresolvedError,
};
use crate::provider::{NameLookupProvider, Provider};
use crate::proxy::DependencyProxy;
use crate::registry::SharedSymbols;

thread_local! {
    /// Entries currently being resolved on this thread, outermost first.
    /// Keyed by entry address, since names are only unique per manager.
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an entry as "being resolved" on the current thread until dropped.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(entry: &DependencyEntry) -> Result<Self> {
        let id = entry as *const DependencyEntry as usize;
        RESOLVING.with_borrow_mut(|stack| {
            if stack.iter().any(|(resolving, _)| *resolving == id) {
                let mut chain: Vec<String> = stack.iter().map(|(_, name)| name.clone()).collect();
                chain.push(entry.name.clone());
                return Err(InjectError::CircularDependency(CircularDependencyError {
                    chain,
                }));
            }
            stack.push((id, entry.name.clone()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with_borrow_mut(|stack| {
            stack.pop();
        });
    }
}

/// A named dependency slot.
///
/// Created by [`DependencyManager::get_entry`](crate::container::DependencyManager::get_entry);
/// there is exactly one entry per name and manager.
pub struct DependencyEntry {
    name: String,
    providers: RwLock<Vec<Arc<dyn Provider>>>,
    value: OnceCell<Dependency>,
    all_values: OnceCell<Vec<Option<Dependency>>>,
    proxy_value: Arc<OnceCell<Dependency>>,
}

impl DependencyEntry {
    /// Creates an entry without any provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            providers: RwLock::new(Vec::new()),
            value: OnceCell::new(),
            all_values: OnceCell::new(),
            proxy_value: Arc::new(OnceCell::new()),
        }
    }

    /// Creates an entry seeded with a [`NameLookupProvider`] for its own
    /// name, so asking for `"pkg.module.Symbol"` finds that symbol without
    /// any explicit registration.
    pub fn with_default_lookup(name: impl Into<String>, symbols: SharedSymbols) -> Self {
        let entry = Self::new(name);
        entry.add_provider(Arc::new(NameLookupProvider::new(entry.name.clone(), symbols)));
        entry
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a provider. Providers added later are tried first.
    pub fn add_provider(&self, provider: Arc<dyn Provider>) {
        debug!(entry = %self.name, provider = %provider.description(), "Added provider");
        self.providers.write().push(provider);
    }

    pub fn provider_count(&self) -> usize {
        self.providers.read().len()
    }

    /// Descriptions of the providers, in insertion order.
    pub fn provider_descriptions(&self) -> Vec<String> {
        self.providers
            .read()
            .iter()
            .map(|provider| provider.description())
            .collect()
    }

    /// Returns `true` once a value has been cached.
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// The resolved value, or `None` if no provider can produce one.
    ///
    /// Never fails: provider errors are logged and turned into `None`.
    /// Use [`try_value`](Self::try_value) to see why resolution failed.
    pub fn value(&self) -> Option<Dependency> {
        self.try_value().ok()
    }

    /// The resolved value, or the reason no provider produced one.
    ///
    /// # Errors
    /// - [`InjectError::Unresolved`]: every provider failed
    /// - [`InjectError::CircularDependency`]: the entry is already being
    ///   resolved further up the current call stack
    pub fn try_value(&self) -> Result<Dependency> {
        if let Some(value) = self.value.get() {
            trace!(entry = %self.name, "Using cached value");
            return Ok(value.clone());
        }

        let _guard = ResolutionGuard::enter(self).inspect_err(|err| {
            error!(entry = %self.name, error = %err, "Failed to get dependency value");
        })?;

        self.value.get_or_try_init(|| self.resolve()).cloned()
    }

    /// Every provider's value, in insertion order.
    ///
    /// Unlike [`value`](Self::value) this asks every provider, and a failing
    /// provider shows up as `None`. Computed once; later calls return the
    /// same list.
    pub fn all_values(&self) -> &[Option<Dependency>] {
        if let Some(values) = self.all_values.get() {
            return values;
        }

        let Ok(_guard) = ResolutionGuard::enter(self).inspect_err(|err| {
            error!(entry = %self.name, error = %err, "Failed to get all dependency values");
        }) else {
            return &[];
        };

        self.all_values.get_or_init(|| {
            let providers = self.providers.read().clone();
            providers
                .iter()
                .map(|provider| provider.get_value(&self.name).ok())
                .collect()
        })
    }

    /// A proxy for this entry's value.
    ///
    /// Every proxy returned for one entry shares a single cache, so they
    /// all see the same value.
    pub fn proxy(self: &Arc<Self>) -> DependencyProxy {
        DependencyProxy::new(Arc::clone(self), Arc::clone(&self.proxy_value))
    }

    fn resolve(&self) -> Result<Dependency> {
        info!(entry = %self.name, "Looking up value for dependency");

        // Snapshot so no lock is held while providers run.
        let providers = self.providers.read().clone();
        let mut failures = Vec::new();

        for provider in providers.iter().rev() {
            match provider.get_value(&self.name) {
                Ok(value) => {
                    info!(
                        entry = %self.name,
                        provider = %provider.description(),
                        value = ?value,
                        "Value for dependency found"
                    );
                    return Ok(value);
                }
                Err(error) => failures.push(ProviderFailure {
                    provider: provider.description(),
                    error,
                }),
            }
        }

        warn!(
            entry = %self.name,
            tried = failures.len(),
            "No provider produced a value for dependency"
        );
        Err(InjectError::Unresolved(UnresolvedError {
            name: self.name.clone(),
            failures,
        }))
    }
}

impl fmt::Debug for DependencyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyEntry")
            .field("name", &self.name)
            .field("providers", &self.provider_descriptions())
            .field("value", &self.value.get())
            .finish()
    }
}
