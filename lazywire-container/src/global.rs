//! The process-wide default manager and free functions over it.
//!
//! Prefer passing a [`DependencyManager`] explicitly; these functions exist
//! for code that cannot thread one through. The manager is created on first
//! use with default settings, so every `inventory`-submitted symbol is
//! available.
//!
//! ```rust
//! use lazywire_container::global;
//! use lazywire_container::prelude::*;
//!
//! global::provide("docs.answer", Provision::value(42u32));
//! let answer = global::dependency("docs.answer").value().unwrap();
//! assert_eq!(answer.downcast_ref::<u32>(), Some(&42));
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::container::{DependencyManager, Provision};
use crate::dependency::{Arguments, Dependency};
use crate::entry::DependencyEntry;
use crate::error::BoxError;
use crate::provider::{FunctionProvider, Provider};
use crate::proxy::DependencyProxy;

// Created on its first access in a thread-safe manner.
static MANAGER: Lazy<DependencyManager> = Lazy::new(DependencyManager::new);

/// The default manager used by the free functions in this module.
pub fn manager() -> &'static DependencyManager {
    &MANAGER
}

/// [`DependencyManager::provide`] on the default manager.
pub fn provide(name: &str, provision: impl Into<Provision>) -> Arc<dyn Provider> {
    MANAGER.provide(name, provision)
}

/// Registers `factory` for `name` on the default manager.
pub fn provider<F>(name: &str, args: Arguments, factory: F) -> Arc<FunctionProvider>
where
    F: Fn(&Arguments) -> Result<Dependency, BoxError> + Send + Sync + 'static,
{
    MANAGER.provider(name, args, factory)
}

/// The default manager's entry for `name`.
pub fn dependency(name: &str) -> Arc<DependencyEntry> {
    MANAGER.get_entry(name)
}

/// A proxy for `name` on the default manager.
pub fn proxy(name: &str) -> DependencyProxy {
    MANAGER.get_proxy(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The default manager is shared by every test in the process, so each
    // test uses its own names and never calls reset().

    #[test]
    fn free_functions_share_one_manager() {
        provide("global_tests.shared", Provision::value(5u8));
        assert!(manager().contains("global_tests.shared"));
        assert!(Arc::ptr_eq(
            &dependency("global_tests.shared"),
            &manager().get_entry("global_tests.shared")
        ));
    }

    #[test]
    fn provider_registers_factory() {
        provider("global_tests.factory", Arguments::new().arg(3u32), |args| {
            let n = args.positional::<u32>(0).ok_or("missing")?;
            Ok(Dependency::new(n + 1))
        });

        let value = dependency("global_tests.factory").value().unwrap();
        assert_eq!(value.downcast_ref::<u32>(), Some(&4));
    }

    #[test]
    fn proxy_resolves_lazily() {
        let handle = proxy("global_tests.proxy");
        provide("global_tests.proxy", Provision::value(String::from("late")));

        let value = handle.downcast::<String>().unwrap();
        assert_eq!(value.as_str(), "late");
    }
}
