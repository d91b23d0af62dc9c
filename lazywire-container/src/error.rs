//! Error types for lazywire resolution.
//!
//! Providers report failures as [`InjectError`] values. The entry collects
//! them, so a failed lookup explains every provider it tried instead of
//! just returning nothing.

use std::fmt;

use lazywire_support::rendering::render_chain;

/// Error type returned by factory functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all lazywire operations.
#[derive(Debug, thiserror::Error)]
pub enum InjectError {
    /// A dotted name could not be resolved to a registered factory.
    #[error("{}", .0)]
    LookupFailed(LookupError),

    /// A factory returned an error while producing a value.
    #[error("Provider {provider} failed while resolving '{entry}': {source}")]
    InvocationFailed {
        entry: String,
        provider: String,
        #[source]
        source: BoxError,
    },

    /// Every provider of an entry failed.
    #[error("{}", .0)]
    Unresolved(UnresolvedError),

    /// An entry was requested again while it was being resolved.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A proxy was used but its entry has no value to forward to.
    #[error("Dependency '{name}' has no value to forward to: {source}")]
    ProxyUnresolved {
        name: String,
        #[source]
        source: Box<InjectError>,
    },

    /// The resolved value is not of the requested type.
    #[error("Type mismatch for '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Why a dotted name lookup failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// The name is empty or has an empty segment.
    InvalidPath,
    /// A one-segment name that is not a registered builtin.
    BuiltinNotFound,
    /// No namespace is registered under this path.
    NamespaceNotFound(String),
    /// The namespace exists but does not contain the symbol.
    SymbolNotFound { namespace: String, symbol: String },
}

/// Error when a dotted name does not lead to a factory.
///
/// Carries "did you mean?" suggestions from the registered names.
#[derive(Debug)]
pub struct LookupError {
    /// The name that was looked up.
    pub path: String,
    pub kind: LookupErrorKind,
    /// Registered names that look similar.
    pub suggestions: Vec<String>,
}

impl LookupError {
    pub fn new(path: impl Into<String>, kind: LookupErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LookupErrorKind::InvalidPath => {
                write!(f, "Invalid dotted name: {:?}", self.path)?;
            }
            LookupErrorKind::BuiltinNotFound => {
                write!(f, "No builtin symbol named {:?}", self.path)?;
            }
            LookupErrorKind::NamespaceNotFound(namespace) => {
                write!(
                    f,
                    "Cannot look up {:?}: namespace {namespace:?} is not registered",
                    self.path
                )?;
            }
            LookupErrorKind::SymbolNotFound { namespace, symbol } => {
                write!(
                    f,
                    "Cannot look up {:?}: namespace {namespace:?} has no symbol {symbol:?}",
                    self.path
                )?;
            }
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// One provider's failure inside an [`UnresolvedError`].
#[derive(Debug)]
pub struct ProviderFailure {
    /// Description of the provider, e.g. `NameLookupProvider("app.Db")`.
    pub provider: String,
    pub error: InjectError,
}

/// Error when no provider of an entry produced a value.
///
/// Failures are listed in the order they were tried (most recently added
/// provider first).
#[derive(Debug)]
pub struct UnresolvedError {
    pub name: String,
    pub failures: Vec<ProviderFailure>,
}

impl fmt::Display for UnresolvedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No value found for dependency '{}'", self.name)?;

        if self.failures.is_empty() {
            return write!(f, "\n  Hint: no providers are registered for it");
        }

        for failure in &self.failures {
            let message = failure.error.to_string();
            let mut lines = message.lines();
            write!(
                f,
                "\n  {}: {}",
                failure.provider,
                lines.next().unwrap_or_default()
            )?;
            for line in lines {
                write!(f, "\n    {line}")?;
            }
        }

        Ok(())
    }
}

/// Error when resolving an entry requires the entry itself.
///
/// Shows the full chain so you can see WHERE the cycle is.
#[derive(Debug)]
pub struct CircularDependencyError {
    /// Example: ["a", "b", "a"]
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: hold a proxy and resolve it after construction instead"
        )
    }
}

/// Convenient Result type for lazywire operations.
pub type Result<T> = std::result::Result<T, InjectError>;
