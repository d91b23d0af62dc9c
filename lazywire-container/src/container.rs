//! # The Manager — heart of lazywire
//!
//! The registry that maps dependency names to entries, and the entry point
//! for registering providers and asking for values.
//!
//! # Architecture
//! ```text
//! ManagerBuilder ──build()──> DependencyManager
//!                                   │
//!                         get_entry("app.Db")  (created on first use)
//!                                   │
//!                                   ▼
//!                            DependencyEntry ──proxy()──> DependencyProxy
//!                                   │
//!                         providers, newest first
//! ```
//!
//! # Examples
//! ```rust
//! use lazywire_container::prelude::*;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! let manager = DependencyManager::builder()
//!     .symbol("app.db.Database", |args: &Arguments| {
//!         let url = args.keyword::<&str>("url").ok_or("missing url")?;
//!         Ok(Dependency::new(Database { url: url.to_string() }))
//!     })
//!     .build()
//!     .expect("valid symbol paths");
//!
//! manager.provide(
//!     "database",
//!     Provision::lookup("app.db.Database")
//!         .with_args(Arguments::new().kwarg("url", "postgres://localhost")),
//! );
//!
//! let db: std::sync::Arc<Database> = manager.resolve("database").expect("resolved");
//! assert_eq!(db.url, "postgres://localhost");
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info, instrument, trace};

use crate::dependency::{Arguments, Dependency};
use crate::entry::DependencyEntry;
use crate::error::{BoxError, InjectError, Result};
use crate::provider::{FunctionProvider, NameLookupProvider, Provider, ValueProvider};
use crate::proxy::DependencyProxy;
use crate::registry::{SharedSymbols, SymbolRegistry};
use crate::settings::ManagerSettings;

// ============================================================
// Provision
// ============================================================

/// What [`DependencyManager::provide`] should register.
///
/// Strings always become name lookups, so a literal string can never be
/// injected through `provide`; use
/// [`provide_value`](DependencyManager::provide_value) for that.
pub enum Provision {
    /// Look the factory up by dotted name and call it with `args`.
    Lookup { path: String, args: Arguments },
    /// Yield this value as is.
    Value(Dependency),
}

impl Provision {
    pub fn lookup(path: impl Into<String>) -> Self {
        Provision::Lookup {
            path: path.into(),
            args: Arguments::new(),
        }
    }

    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Provision::Value(Dependency::new(value))
    }

    /// Sets the arguments passed to a looked up factory.
    ///
    /// Values take no arguments; they are left unchanged.
    pub fn with_args(self, args: Arguments) -> Self {
        match self {
            Provision::Lookup { path, .. } => Provision::Lookup { path, args },
            value @ Provision::Value(_) => value,
        }
    }
}

impl From<&str> for Provision {
    fn from(path: &str) -> Self {
        Provision::lookup(path)
    }
}

impl From<String> for Provision {
    fn from(path: String) -> Self {
        Provision::lookup(path)
    }
}

impl From<Dependency> for Provision {
    fn from(value: Dependency) -> Self {
        Provision::Value(value)
    }
}

// ============================================================
// ManagerBuilder
// ============================================================

/// Builds a [`DependencyManager`] with its settings and initial symbols.
///
/// # Examples
/// ```rust,ignore
/// let manager = DependencyManager::builder()
///     .default_lookup(false)
///     .symbol("app.Config", |_| Ok(Dependency::new(Config::load())))
///     .build()?;
/// ```
pub struct ManagerBuilder {
    settings: ManagerSettings,
    symbols: SymbolRegistry,
    pending_error: Option<InjectError>,
}

impl ManagerBuilder {
    fn new() -> Self {
        Self {
            settings: ManagerSettings::default(),
            symbols: SymbolRegistry::new(),
            pending_error: None,
        }
    }

    /// Replaces all settings at once.
    pub fn settings(mut self, settings: ManagerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Seed new entries with a lookup of their own name (default: on).
    pub fn default_lookup(mut self, enabled: bool) -> Self {
        self.settings.default_lookup = enabled;
        self
    }

    /// Import `inventory`-submitted symbols on build (default: on).
    pub fn collect_submitted(mut self, enabled: bool) -> Self {
        self.settings.collect_submitted = enabled;
        self
    }

    /// Registers a symbol. An invalid path is reported by [`build`](Self::build).
    pub fn symbol<F>(mut self, path: &str, factory: F) -> Self
    where
        F: Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        if let Err(err) = self.symbols.register(path, factory) {
            self.pending_error.get_or_insert(InjectError::LookupFailed(err));
        }
        self
    }

    /// Adds every symbol of an existing registry.
    pub fn symbols(mut self, symbols: SymbolRegistry) -> Self {
        if self.symbols.is_empty() {
            self.symbols = symbols;
        } else {
            self.symbols.merge(&symbols);
        }
        self
    }

    /// Build the manager.
    ///
    /// # Errors
    /// Returns the first error from [`symbol`](Self::symbol).
    #[instrument(skip(self), name = "manager_build")]
    pub fn build(self) -> Result<DependencyManager> {
        if let Some(err) = self.pending_error {
            return Err(err);
        }

        let mut symbols = self.symbols;
        if self.settings.collect_submitted {
            // Explicit registrations take precedence over submitted ones.
            let mut merged = SymbolRegistry::with_submitted();
            merged.merge(&symbols);
            symbols = merged;
        }

        info!(
            symbols = symbols.len(),
            default_lookup = self.settings.default_lookup,
            "Dependency manager built"
        );
        Ok(DependencyManager::from_parts(symbols, self.settings))
    }
}

// ═══════════════════════════════════════════
// DependencyManager
// ═══════════════════════════════════════════

/// Registry of named dependency entries.
///
/// Pass one manager to whatever needs dependency resolution; tests get
/// isolation by building a fresh one. [`reset`](Self::reset) is available
/// for the [global](crate::global) manager.
pub struct DependencyManager {
    entries: DashMap<String, Arc<DependencyEntry>>,
    symbols: SharedSymbols,
    settings: ManagerSettings,
}

impl DependencyManager {
    /// Creates a manager with default settings and every submitted symbol.
    pub fn new() -> Self {
        let settings = ManagerSettings::default();
        let symbols = if settings.collect_submitted {
            SymbolRegistry::with_submitted()
        } else {
            SymbolRegistry::new()
        };
        Self::from_parts(symbols, settings)
    }

    /// Create a new builder.
    pub fn builder() -> ManagerBuilder {
        ManagerBuilder::new()
    }

    fn from_parts(symbols: SymbolRegistry, settings: ManagerSettings) -> Self {
        Self {
            entries: DashMap::new(),
            symbols: Arc::new(RwLock::new(symbols)),
            settings,
        }
    }

    pub fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    /// The symbol registry consulted by this manager's name lookups.
    pub fn symbols(&self) -> &SharedSymbols {
        &self.symbols
    }

    /// Registers a symbol after the manager was built.
    ///
    /// Lookups that have not produced a value yet will see it.
    pub fn register_symbol<F>(&self, path: &str, factory: F) -> Result<()>
    where
        F: Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        self.symbols
            .write()
            .register(path, factory)
            .map_err(InjectError::LookupFailed)
    }

    /// Returns the entry for `name`, creating it on first use.
    pub fn get_entry(&self, name: &str) -> Arc<DependencyEntry> {
        if let Some(entry) = self.entries.get(name) {
            trace!(entry = name, "Found existing entry");
            return Arc::clone(entry.value());
        }

        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert_with(|| {
                debug!(entry = name, "Creating entry");
                Arc::new(self.new_entry(name))
            });
        Arc::clone(entry.value())
    }

    /// Shorthand for `get_entry(name).proxy()`.
    pub fn get_proxy(&self, name: &str) -> DependencyProxy {
        self.get_entry(name).proxy()
    }

    /// Registers `provider` for `name` and hands it back.
    pub fn add_provider<P: Provider + 'static>(&self, name: &str, provider: P) -> Arc<P> {
        let provider = Arc::new(provider);
        self.get_entry(name)
            .add_provider(Arc::clone(&provider) as Arc<dyn Provider>);
        provider
    }

    /// Registers a name lookup or a value for `name`.
    ///
    /// ```rust
    /// use lazywire_container::prelude::*;
    ///
    /// let manager = DependencyManager::new();
    /// let lookup = manager.provide("key", "some.dotted.Path");
    /// assert_eq!(lookup.description(), "NameLookupProvider(\"some.dotted.Path\")");
    ///
    /// let value = manager.provide("answer", Provision::value(42));
    /// assert_eq!(manager.resolve::<i32>("answer").unwrap().as_ref(), &42);
    /// # let _ = value;
    /// ```
    #[instrument(skip(self, provision), level = "debug")]
    pub fn provide(&self, name: &str, provision: impl Into<Provision>) -> Arc<dyn Provider> {
        let provider: Arc<dyn Provider> = match provision.into() {
            Provision::Lookup { path, args } => Arc::new(NameLookupProvider::with_args(
                path,
                args,
                Arc::clone(&self.symbols),
            )),
            Provision::Value(value) => Arc::new(ValueProvider::new(value)),
        };
        self.get_entry(name).add_provider(Arc::clone(&provider));
        provider
    }

    /// Registers a fixed value for `name`. Unlike [`provide`](Self::provide),
    /// strings are injected as they are.
    pub fn provide_value<T: Any + Send + Sync>(&self, name: &str, value: T) -> Arc<ValueProvider> {
        self.add_provider(name, ValueProvider::of(value))
    }

    /// Registers a factory for `name`, called with `args` on first use.
    pub fn provider<F>(&self, name: &str, args: Arguments, factory: F) -> Arc<FunctionProvider>
    where
        F: Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        self.add_provider(name, FunctionProvider::with_args(factory, args))
    }

    /// Resolves `name` and returns its value as a `T`.
    ///
    /// # Errors
    /// - [`InjectError::Unresolved`] if no provider produced a value
    /// - [`InjectError::TypeMismatch`] if the value is not a `T`
    pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let value = self.get_entry(name).try_value()?;
        value.downcast::<T>().ok_or_else(|| InjectError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>(),
            found: value.type_name(),
        })
    }

    /// Returns `true` if an entry exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names of all entries, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards every entry, with its providers and cached values.
    ///
    /// Proxies handed out earlier keep their old entry alive; only new
    /// lookups see fresh entries. Symbols are kept.
    pub fn reset(&self) {
        let discarded = self.entries.len();
        self.entries.clear();
        info!(discarded, "Dependency manager reset");
    }

    fn new_entry(&self, name: &str) -> DependencyEntry {
        if self.settings.default_lookup {
            DependencyEntry::with_default_lookup(name, Arc::clone(&self.symbols))
        } else {
            DependencyEntry::new(name)
        }
    }
}

impl Default for DependencyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DependencyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyManager")
            .field("entries", &self.entries.len())
            .field("symbols", &self.symbols.read().len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{DependencyManager, ManagerBuilder, Provision};
    pub use crate::dependency::{Arguments, Dependency};
    pub use crate::entry::DependencyEntry;
    pub use crate::error::{BoxError, InjectError, Result};
    pub use crate::provider::{FunctionProvider, NameLookupProvider, Provider, ValueProvider};
    pub use crate::proxy::DependencyProxy;
    pub use crate::registry::{Symbol, SymbolRegistry};
    pub use crate::settings::ManagerSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn manager() -> DependencyManager {
        DependencyManager::builder()
            .collect_submitted(false)
            .build()
            .unwrap()
    }

    #[test]
    fn one_entry_per_name() {
        let manager = manager();
        let a = manager.get_entry("svc");
        let b = manager.get_entry("svc");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn unknown_name_resolves_to_none() {
        let manager = manager();
        let entry = manager.get_entry("not.a.registered.Path");
        assert_eq!(entry.provider_count(), 1);
        assert!(entry.value().is_none());

        let bare = manager.get_entry("");
        assert!(bare.value().is_none());
    }

    #[test]
    fn newest_provider_is_tried_first() {
        let manager = manager();
        manager.provider("N", Arguments::new(), |_| Err("P1 has nothing".into()));
        manager.provide_value("N", "X");

        let value = manager.get_entry("N").value().unwrap();
        assert_eq!(value.downcast_ref::<&str>(), Some(&"X"));
    }

    #[test]
    fn cached_value_skips_providers() {
        let counter = Arc::new(AtomicU32::new(0));
        let manager = manager();
        manager.provider("svc", Arguments::new(), {
            let counter = Arc::clone(&counter);
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Dependency::new(String::from("built")))
            }
        });

        let entry = manager.get_entry("svc");
        let a = entry.value().unwrap();
        let b = entry.value().unwrap();
        assert!(a.ptr_eq(&b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provide_string_registers_lookup() {
        let manager = manager();
        let provider = manager.provide("key", "some.dotted.Path");
        assert_eq!(
            provider.description(),
            "NameLookupProvider(\"some.dotted.Path\")"
        );
        assert!(manager.get_entry("key").value().is_none());

        manager
            .register_symbol("some.dotted.Path", |_| Ok(Dependency::new(7u8)))
            .unwrap();
        assert_eq!(*manager.resolve::<u8>("key").unwrap(), 7);
    }

    #[test]
    fn provide_value_registers_value() {
        let manager = manager();
        let provider = manager.provide("key", Provision::value(42i32));
        assert!(provider.description().starts_with("ValueProvider"));
        assert_eq!(*manager.resolve::<i32>("key").unwrap(), 42);
    }

    #[test]
    fn provide_lookup_with_args() {
        let manager = DependencyManager::builder()
            .collect_submitted(false)
            .symbol("app.Greeter", |args| {
                let name = args.positional::<&str>(0).ok_or("no name")?;
                Ok(Dependency::new(format!("hello {name}")))
            })
            .build()
            .unwrap();

        manager.provide(
            "greeting",
            Provision::lookup("app.Greeter").with_args(Arguments::new().arg("bob")),
        );
        let greeting = manager.resolve::<String>("greeting").unwrap();
        assert_eq!(greeting.as_str(), "hello bob");
    }

    #[test]
    fn resolve_reports_type_mismatch() {
        let manager = manager();
        manager.provide_value("n", 1u64);
        assert!(matches!(
            manager.resolve::<String>("n"),
            Err(InjectError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn reset_discards_entries() {
        let manager = manager();
        manager.provide_value("svc", 1i32);
        let before = manager.get_entry("svc");
        assert_eq!(before.provider_count(), 2);

        manager.reset();
        assert!(manager.is_empty());

        let after = manager.get_entry("svc");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.provider_count(), 1);
        assert!(after.value().is_none());
    }

    #[test]
    fn proxy_reads_map_value() {
        let manager = manager();
        manager.provide_value("svc", HashMap::from([("a".to_string(), 1)]));

        let proxy = manager.get_proxy("svc");
        let a = proxy.with(|map: &HashMap<String, i32>| map["a"]).unwrap();
        assert_eq!(a, 1);
    }

    #[test]
    fn without_default_lookup_entries_start_empty() {
        let manager = DependencyManager::builder()
            .collect_submitted(false)
            .default_lookup(false)
            .build()
            .unwrap();
        assert_eq!(manager.get_entry("svc").provider_count(), 0);
    }

    #[test]
    fn invalid_symbol_fails_build() {
        let result = DependencyManager::builder()
            .symbol("broken..path", |_| Ok(Dependency::new(())))
            .build();
        assert!(matches!(result, Err(InjectError::LookupFailed(_))));
    }

    #[test]
    fn builder_merges_symbol_registries() {
        let mut extra = SymbolRegistry::new();
        extra
            .register("app.Extra", |_: &Arguments| Ok(Dependency::new(2u8)))
            .unwrap();

        let manager = DependencyManager::builder()
            .collect_submitted(false)
            .symbol("app.First", |_| Ok(Dependency::new(1u8)))
            .symbols(extra)
            .build()
            .unwrap();

        let first = manager.get_entry("app.First").value().unwrap();
        let extra = manager.get_entry("app.Extra").value().unwrap();
        assert_eq!(first.downcast_ref::<u8>(), Some(&1));
        assert_eq!(extra.downcast_ref::<u8>(), Some(&2));
    }

    #[test]
    fn overlay_manager_falls_back_to_base_entry() {
        let base = Arc::new(manager());
        base.provide_value("db", "base-db");

        let overlay = manager();
        overlay.provider("db", Arguments::new(), {
            let base = Arc::clone(&base);
            move |_| Ok(base.get_entry("db").try_value()?)
        });

        let value = overlay.get_entry("db").try_value().unwrap();
        assert_eq!(value.downcast_ref::<&str>(), Some(&"base-db"));
    }

    #[test]
    fn proxy_from_before_reset_resolves_inside_new_entry() {
        let manager = Arc::new(manager());
        manager.provide_value("db", 1u8);
        let stale = manager.get_proxy("db");

        manager.reset();
        manager.provider("db", Arguments::new(), move |_| {
            let old = stale.downcast::<u8>()?;
            Ok(Dependency::new(*old + 1))
        });

        let value = manager.resolve::<u8>("db").unwrap();
        assert_eq!(*value, 2);
    }

    #[test]
    fn names_are_sorted() {
        let manager = manager();
        manager.get_entry("b");
        manager.get_entry("a");
        assert_eq!(manager.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(manager.contains("a"));
        assert!(!manager.contains("c"));
    }

    #[test]
    fn debug_display() {
        let manager = manager();
        manager.get_entry("one");
        let debug = format!("{manager:?}");
        assert!(debug.contains("DependencyManager"));
        assert!(debug.contains("entries: 1"));
    }
}
