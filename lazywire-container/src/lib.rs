//! Core container implementation for lazywire.

pub mod container;
pub mod dependency;
pub mod entry;
pub mod error;
pub mod global;
pub mod key;
pub mod provider;
pub mod proxy;
pub mod registry;
pub mod settings;

pub use container::{DependencyManager, Provision, prelude};
pub use dependency::{Arguments, Dependency};
pub use error::{InjectError, Result};
pub use key::SymbolPath;
pub use registry::Symbol;
