//! # Lazywire — named, lazily resolved dependencies
//!
//! Register providers against a dotted name, hand out proxies early and
//! let the first request decide which provider wins.
//!
//! ```rust
//! use lazywire::prelude::*;
//!
//! let manager = DependencyManager::new();
//! let proxy = manager.get_proxy("app.Greeting");
//!
//! manager.provide_value("app.Greeting", String::from("hello"));
//! assert_eq!(proxy.with(|s: &String| s.len()).unwrap(), 5);
//! ```

pub use lazywire_container::*;
pub use lazywire_support::*;
