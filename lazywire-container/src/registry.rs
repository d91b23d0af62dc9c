//! Symbol registry: dotted names mapped to factory functions.
//!
//! This is what a [`NameLookupProvider`](crate::provider::NameLookupProvider)
//! consults to turn `"pkg.module.Symbol"` into something it can call. A
//! dotted name is split into a namespace (`"pkg.module"`) and a symbol
//! (`"Symbol"`); names without a dot live in the builtin namespace.
//!
//! Symbols are registered at startup, either explicitly through
//! [`SymbolRegistry::register`] or statically with [`inventory`]:
//!
//! ```rust,ignore
//! fn make_printer(_: &Arguments) -> Result<Dependency, BoxError> {
//!     Ok(Dependency::new(Printer::default()))
//! }
//!
//! inventory::submit! { Symbol::new("app.printer.Printer", make_printer) }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazywire_support::rendering::suggest_similar;
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::dependency::{Arguments, Dependency};
use crate::error::{BoxError, LookupError, LookupErrorKind};
use crate::key::SymbolPath;

/// Type alias for factory functions.
///
/// A factory receives the arguments its provider was configured with and
/// returns a new value or an error.
pub type FactoryFn =
    Arc<dyn Fn(&Arguments) -> Result<Dependency, BoxError> + Send + Sync>;

/// Registry shared between a manager and the lookup providers it creates.
pub type SharedSymbols = Arc<RwLock<SymbolRegistry>>;

const MAX_SUGGESTIONS: usize = 3;

/// A statically submitted symbol, collected with [`inventory`].
pub struct Symbol {
    path: &'static str,
    factory: fn(&Arguments) -> Result<Dependency, BoxError>,
}

impl Symbol {
    pub const fn new(
        path: &'static str,
        factory: fn(&Arguments) -> Result<Dependency, BoxError>,
    ) -> Self {
        Self { path, factory }
    }

    pub fn path(&self) -> &'static str {
        self.path
    }
}

inventory::collect!(Symbol);

/// The symbols registered under one namespace path.
#[derive(Clone, Default)]
pub struct Namespace {
    symbols: HashMap<String, FactoryFn>,
}

impl Namespace {
    /// Fetches a symbol, or `None` if absent.
    pub fn get(&self, symbol: &str) -> Option<FactoryFn> {
        self.symbols.get(symbol).cloned()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.symbols.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/// Stores every registered symbol, grouped by namespace.
#[derive(Clone, Default, Debug)]
pub struct SymbolRegistry {
    namespaces: HashMap<String, Namespace>,
    builtins: Namespace,
}

impl SymbolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every symbol submitted with
    /// `inventory::submit!`.
    pub fn with_submitted() -> Self {
        let mut registry = Self::new();
        registry.collect_submitted();
        registry
    }

    /// Imports every symbol submitted with `inventory::submit!`.
    ///
    /// Submissions with an invalid path are skipped with a warning.
    /// Returns how many symbols were imported.
    pub fn collect_submitted(&mut self) -> usize {
        let mut imported = 0;
        for symbol in inventory::iter::<Symbol> {
            match self.register(symbol.path, symbol.factory) {
                Ok(()) => imported += 1,
                Err(err) => warn!(path = symbol.path, error = %err, "Skipping submitted symbol"),
            }
        }
        debug!(imported, "Collected submitted symbols");
        imported
    }

    /// Registers a factory under a dotted name.
    ///
    /// A later registration under the same name replaces the earlier one.
    ///
    /// # Errors
    /// Returns [`LookupErrorKind::InvalidPath`] if `path` is not a valid
    /// dotted name.
    pub fn register<F>(&mut self, path: &str, factory: F) -> Result<(), LookupError>
    where
        F: Fn(&Arguments) -> Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        self.register_factory(path, Arc::new(factory))
    }

    /// Registers an already shared factory under a dotted name.
    pub fn register_factory(&mut self, path: &str, factory: FactoryFn) -> Result<(), LookupError> {
        let parsed = SymbolPath::parse(path)?;
        let namespace = match parsed.namespace() {
            Some(namespace) => self.namespaces.entry(namespace.to_string()).or_default(),
            None => &mut self.builtins,
        };

        if namespace
            .symbols
            .insert(parsed.symbol().to_string(), factory)
            .is_some()
        {
            debug!(path, "Replaced registered symbol");
        } else {
            debug!(path, "Registered symbol");
        }
        Ok(())
    }

    /// Copies every symbol of `other` into this registry, replacing symbols
    /// registered under the same path. Returns how many were copied.
    pub fn merge(&mut self, other: &SymbolRegistry) -> usize {
        let mut merged = 0;
        for (path, namespace) in &other.namespaces {
            let target = self.namespaces.entry(path.clone()).or_default();
            merged += namespace.len();
            target.symbols.extend(
                namespace
                    .symbols
                    .iter()
                    .map(|(symbol, factory)| (symbol.clone(), Arc::clone(factory))),
            );
        }
        merged += other.builtins.len();
        self.builtins.symbols.extend(
            other
                .builtins
                .symbols
                .iter()
                .map(|(symbol, factory)| (symbol.clone(), Arc::clone(factory))),
        );
        debug!(merged, "Merged symbol registry");
        merged
    }

    /// Loads a namespace by path, or `None` if nothing is registered there.
    pub fn load(&self, namespace: &str) -> Option<&Namespace> {
        self.namespaces.get(namespace)
    }

    /// The namespace consulted for names without a dot.
    pub fn builtins(&self) -> &Namespace {
        &self.builtins
    }

    /// Resolves a dotted name to its factory.
    ///
    /// # Errors
    /// Returns a [`LookupError`] describing which step failed, with
    /// suggestions from the registered names.
    pub fn lookup(&self, path: &str) -> Result<FactoryFn, LookupError> {
        let parsed = SymbolPath::parse(path)?;
        trace!(path = %parsed, "Looking up symbol");

        let Some(namespace_path) = parsed.namespace() else {
            return self.builtins.get(parsed.symbol()).ok_or_else(|| {
                self.with_suggestions(LookupError::new(path, LookupErrorKind::BuiltinNotFound))
            });
        };

        let namespace = self.load(namespace_path).ok_or_else(|| {
            self.with_suggestions(LookupError::new(
                path,
                LookupErrorKind::NamespaceNotFound(namespace_path.to_string()),
            ))
        })?;

        namespace.get(parsed.symbol()).ok_or_else(|| {
            self.with_suggestions(LookupError::new(
                path,
                LookupErrorKind::SymbolNotFound {
                    namespace: namespace_path.to_string(),
                    symbol: parsed.symbol().to_string(),
                },
            ))
        })
    }

    /// Returns true if `path` resolves to a factory.
    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_ok()
    }

    /// Every registered dotted name, sorted.
    pub fn registered_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .namespaces
            .iter()
            .flat_map(|(namespace, symbols)| {
                symbols
                    .symbols
                    .keys()
                    .map(move |symbol| format!("{namespace}.{symbol}"))
            })
            .chain(self.builtins.symbols.keys().cloned())
            .collect();
        paths.sort_unstable();
        paths
    }

    /// Returns the number of registered symbols.
    pub fn len(&self) -> usize {
        self.builtins.len() + self.namespaces.values().map(Namespace::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_suggestions(&self, error: LookupError) -> LookupError {
        let paths = self.registered_paths();
        let available: Vec<&str> = paths.iter().map(String::as_str).collect();
        let suggestions = suggest_similar(&error.path, &available, MAX_SUGGESTIONS);
        error.with_suggestions(suggestions)
    }
}
