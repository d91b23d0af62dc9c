//! Manager settings.
//!
//! Deserializable so applications can keep them next to the rest of their
//! configuration; every field has a default.

use serde::Deserialize;

/// Knobs applied when a [`DependencyManager`](crate::container::DependencyManager)
/// is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    /// Seed every new entry with a name lookup for the entry's own name.
    pub default_lookup: bool,
    /// Import the symbols submitted with `inventory::submit!` at build time.
    pub collect_submitted: bool,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            default_lookup: true,
            collect_submitted: true,
        }
    }
}
