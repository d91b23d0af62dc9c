//! Dotted-name lookup keys.
//!
//! [`SymbolPath`] splits a name like `"pkg.module.ClassName"` into the
//! namespace (`"pkg.module"`) and the symbol inside it (`"ClassName"`).
//! A name without dots refers to a builtin symbol.

use std::fmt;

use crate::error::{LookupError, LookupErrorKind};

/// A parsed dotted name.
///
/// # Examples
/// ```
/// use lazywire_container::key::SymbolPath;
///
/// let path = SymbolPath::parse("app.services.UserService").unwrap();
/// assert_eq!(path.namespace(), Some("app.services"));
/// assert_eq!(path.symbol(), "UserService");
///
/// let builtin = SymbolPath::parse("Printer").unwrap();
/// assert!(builtin.is_builtin());
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SymbolPath {
    namespace: Option<String>,
    symbol: String,
}

impl SymbolPath {
    /// Parses a dotted name.
    ///
    /// # Errors
    /// Returns a [`LookupErrorKind::InvalidPath`] error if the name is empty
    /// or any of its segments is empty (`"a..b"`, `".a"`, `"a."`).
    pub fn parse(path: &str) -> Result<Self, LookupError> {
        if path.split('.').any(str::is_empty) {
            return Err(LookupError::new(path, LookupErrorKind::InvalidPath));
        }

        Ok(match path.rsplit_once('.') {
            Some((namespace, symbol)) => Self {
                namespace: Some(namespace.to_string()),
                symbol: symbol.to_string(),
            },
            None => Self {
                namespace: None,
                symbol: path.to_string(),
            },
        })
    }

    /// Returns the namespace part, or `None` for builtins.
    #[inline]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns the last segment.
    #[inline]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns `true` if the name had a single segment.
    #[inline]
    pub fn is_builtin(&self) -> bool {
        self.namespace.is_none()
    }
}

impl fmt::Debug for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolPath({self})")
    }
}

impl fmt::Display for SymbolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.symbol),
            None => write!(f, "{}", self.symbol),
        }
    }
}
