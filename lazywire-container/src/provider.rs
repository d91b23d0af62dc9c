//! The provider trait: a strategy for producing a dependency on demand.
//!
//! An entry asks its providers for a value, newest first, until one
//! succeeds. Three strategies ship with the crate:
//!
//! - [`ValueProvider`]: a fixed, already built value
//! - [`FunctionProvider`]: calls a factory with fixed arguments
//! - [`NameLookupProvider`]: finds the factory by dotted name in a
//!   [`SymbolRegistry`](crate::registry::SymbolRegistry), then calls it
//!
//! Each provider remembers the first value it produced and never calls its
//! factory again afterwards. Failures are not remembered, so a failing
//! provider is retried on the next request.

use std::any::type_name;
use std::sync::Arc;

use lazywire_support::rendering::{obj_repr, safe_repr, shorten_type_name};
use once_cell::sync::OnceCell;
use tracing::{debug, error};

use crate::dependency::{Arguments, Dependency};
use crate::error::{BoxError, InjectError, LookupErrorKind, Result};
use crate::registry::{FactoryFn, SharedSymbols};

/// Produces the value of a dependency entry.
///
/// Implement this trait for custom strategies; the built-in providers cover
/// fixed values, factories and name lookups.
pub trait Provider: Send + Sync {
    /// Produce a value for the entry called `entry`.
    ///
    /// # Errors
    /// Returns why this provider has no value right now. The entry treats
    /// any error as "try the next provider".
    fn get_value(&self, entry: &str) -> Result<Dependency>;

    /// Human-readable description used in logs and errors.
    fn description(&self) -> String {
        obj_repr(type_name::<Self>(), &[], &[])
    }
}

/// Always yields the value it was built with.
#[derive(Debug, Clone)]
pub struct ValueProvider {
    value: Dependency,
    repr: Option<String>,
}

impl ValueProvider {
    pub fn new(value: Dependency) -> Self {
        Self { value, repr: None }
    }

    /// Wraps an owned value.
    pub fn of<T: std::any::Any + Send + Sync>(value: T) -> Self {
        Self::new(Dependency::new(value))
    }

    /// Wraps an owned value and keeps its `Debug` rendering for
    /// [`description`](Provider::description).
    pub fn described<T: std::any::Any + Send + Sync + std::fmt::Debug>(value: T) -> Self {
        let repr = safe_repr(&value);
        Self {
            value: Dependency::new(value),
            repr: Some(repr),
        }
    }
}

impl Provider for ValueProvider {
    fn get_value(&self, _entry: &str) -> Result<Dependency> {
        Ok(self.value.clone())
    }

    fn description(&self) -> String {
        match &self.repr {
            Some(repr) => format!("{}({repr})", shorten_type_name(type_name::<Self>())),
            None => obj_repr(type_name::<Self>(), &[&self.value], &[]),
        }
    }
}

/// Calls a factory with fixed arguments.
///
/// The first successful result is kept; later requests return it without
/// calling the factory again.
///
/// # Examples
/// ```
/// use lazywire_container::prelude::*;
///
/// let provider = FunctionProvider::with_args(
///     |args: &Arguments| {
///         let port = *args.positional::<u16>(0).ok_or("missing port")?;
///         Ok(Dependency::new(format!("localhost:{port}")))
///     },
///     Arguments::new().arg(8080u16),
/// );
///
/// let value = provider.get_value("server.address").unwrap();
/// assert_eq!(value.downcast_ref::<String>().unwrap(), "localhost:8080");
/// ```
pub struct FunctionProvider {
    function: FactoryFn,
    label: String,
    args: Arguments,
    cache: OnceCell<Dependency>,
}

impl FunctionProvider {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        Self::with_args(function, Arguments::new())
    }

    pub fn with_args<F>(function: F, args: Arguments) -> Self
    where
        F: Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static,
    {
        Self::from_factory(shorten_type_name(type_name::<F>()), Arc::new(function), args)
    }

    /// Builds a provider around a shared factory, described by `label`.
    pub fn from_factory(label: impl Into<String>, function: FactoryFn, args: Arguments) -> Self {
        Self {
            function,
            label: label.into(),
            args,
            cache: OnceCell::new(),
        }
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }
}

impl Provider for FunctionProvider {
    fn get_value(&self, entry: &str) -> Result<Dependency> {
        self.cache
            .get_or_try_init(|| {
                invoke(&self.function, &self.args, entry, || self.description())
            })
            .cloned()
    }

    fn description(&self) -> String {
        self.args
            .describe(type_name::<Self>(), &format_args!("{}", self.label))
    }
}

impl std::fmt::Debug for FunctionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

/// Finds its factory by dotted name, then behaves like [`FunctionProvider`].
///
/// The name is looked up every time the provider has no value yet, so a
/// symbol registered after the provider was created is still found.
pub struct NameLookupProvider {
    path: String,
    args: Arguments,
    symbols: SharedSymbols,
    cache: OnceCell<Dependency>,
}

impl NameLookupProvider {
    pub fn new(path: impl Into<String>, symbols: SharedSymbols) -> Self {
        Self::with_args(path, Arguments::new(), symbols)
    }

    pub fn with_args(path: impl Into<String>, args: Arguments, symbols: SharedSymbols) -> Self {
        Self {
            path: path.into(),
            args,
            symbols,
            cache: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn args(&self) -> &Arguments {
        &self.args
    }

    /// Resolves the dotted name to a factory.
    fn factory(&self, entry: &str) -> Result<FactoryFn> {
        let lookup = self.symbols.read().lookup(&self.path);
        lookup.map_err(|err| {
            match err.kind {
                LookupErrorKind::NamespaceNotFound(_) => error!(
                    entry,
                    path = %self.path,
                    error = %err,
                    "Error occurred while looking up symbols for dependency"
                ),
                _ => debug!(entry, path = %self.path, error = %err, "Symbol not found"),
            }
            InjectError::LookupFailed(err)
        })
    }
}

impl Provider for NameLookupProvider {
    fn get_value(&self, entry: &str) -> Result<Dependency> {
        self.cache
            .get_or_try_init(|| {
                let function = self.factory(entry)?;
                invoke(&function, &self.args, entry, || self.description())
            })
            .cloned()
    }

    fn description(&self) -> String {
        self.args.describe(type_name::<Self>(), &self.path)
    }
}

impl std::fmt::Debug for NameLookupProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description())
    }
}

/// Calls a factory, logging and wrapping its failure.
fn invoke(
    function: &FactoryFn,
    args: &Arguments,
    entry: &str,
    description: impl FnOnce() -> String,
) -> Result<Dependency> {
    function(args).map_err(|source| {
        let provider = description();
        error!(
            entry,
            provider = %provider,
            error = %source,
            "Factory failed while looking up dependency"
        );
        InjectError::InvocationFailed {
            entry: entry.to_string(),
            provider,
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SymbolRegistry;
    use parking_lot::RwLock;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn symbols() -> SharedSymbols {
        Arc::new(RwLock::new(SymbolRegistry::new()))
    }

    fn counting_factory(
        counter: &Arc<AtomicU32>,
    ) -> impl Fn(&Arguments) -> std::result::Result<Dependency, BoxError> + Send + Sync + 'static
    {
        let counter = Arc::clone(counter);
        move |_: &Arguments| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Ok(Dependency::new(n))
        }
    }

    #[test]
    fn value_provider_yields_falsy_values() {
        let provider = ValueProvider::of(0i32);
        let value = provider.get_value("zero").unwrap();
        assert_eq!(value.downcast_ref::<i32>(), Some(&0));
    }

    #[test]
    fn function_provider_memoizes_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let provider = FunctionProvider::new(counting_factory(&counter));

        let a = provider.get_value("n").unwrap();
        let b = provider.get_value("n").unwrap();

        assert!(a.ptr_eq(&b));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn function_provider_retries_after_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = FunctionProvider::new({
            let calls = Arc::clone(&calls);
            move |_: &Arguments| {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err("not ready".into())
                } else {
                    Ok(Dependency::new("ready"))
                }
            }
        });

        match provider.get_value("flaky") {
            Err(InjectError::InvocationFailed { entry, .. }) => assert_eq!(entry, "flaky"),
            other => panic!("Expected InvocationFailed, got: {other:?}"),
        }
        assert!(provider.get_value("flaky").is_ok());
        assert!(provider.get_value("flaky").is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn function_provider_passes_arguments() {
        let provider = FunctionProvider::with_args(
            |args: &Arguments| {
                let greeting = args.keyword::<&str>("greeting").ok_or("no greeting")?;
                let name = args.positional::<String>(0).ok_or("no name")?;
                Ok(Dependency::new(format!("{greeting}, {name}")))
            },
            Arguments::new()
                .arg("world".to_string())
                .kwarg("greeting", "hello"),
        );

        let value = provider.get_value("greeting").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "hello, world");
    }

    #[test]
    fn name_lookup_finds_registered_symbol() {
        let symbols = symbols();
        symbols
            .write()
            .register("app.config.Port", |_: &Arguments| Ok(Dependency::new(8080u16)))
            .unwrap();

        let provider = NameLookupProvider::new("app.config.Port", symbols);
        let value = provider.get_value("port").unwrap();
        assert_eq!(value.downcast_ref::<u16>(), Some(&8080));
    }

    #[test]
    fn name_lookup_sees_late_registration() {
        let symbols = symbols();
        let provider = NameLookupProvider::new("app.Late", Arc::clone(&symbols));

        assert!(matches!(
            provider.get_value("late"),
            Err(InjectError::LookupFailed(_))
        ));

        symbols
            .write()
            .register("app.Late", |_: &Arguments| Ok(Dependency::new(1u8)))
            .unwrap();
        assert!(provider.get_value("late").is_ok());
    }

    #[test]
    fn name_lookup_forwards_arguments() {
        let symbols = symbols();
        symbols
            .write()
            .register("app.Doubler", |args: &Arguments| {
                let n = args.positional::<i64>(0).ok_or("missing")?;
                Ok(Dependency::new(n * 2))
            })
            .unwrap();

        let provider =
            NameLookupProvider::with_args("app.Doubler", Arguments::new().arg(21i64), symbols);
        let value = provider.get_value("doubled").unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&42));
    }

    #[test]
    fn descriptions_include_arguments() {
        let lookup = NameLookupProvider::with_args(
            "app.Db",
            Arguments::new().arg(5).kwarg("pool", 10),
            symbols(),
        );
        assert_eq!(lookup.description(), "NameLookupProvider(\"app.Db\", 5, pool=10)");

        let bare = NameLookupProvider::new("app.Db", symbols());
        assert_eq!(bare.description(), "NameLookupProvider(\"app.Db\")");

        let value = ValueProvider::of(1u8);
        assert_eq!(value.description(), "ValueProvider(Dependency<u8>)");

        let described = ValueProvider::described(vec!["a", "b"]);
        assert_eq!(described.description(), "ValueProvider([\"a\", \"b\"])");
        assert_eq!(
            described.get_value("list").unwrap().downcast_ref::<Vec<&'static str>>(),
            Some(&vec!["a", "b"])
        );
    }

    #[test]
    fn function_description_names_the_factory() {
        fn build(_: &Arguments) -> std::result::Result<Dependency, BoxError> {
            Ok(Dependency::new(()))
        }

        let provider = FunctionProvider::new(build);
        assert!(provider.description().starts_with("FunctionProvider("));
        assert!(provider.description().contains("build"));
    }
}
