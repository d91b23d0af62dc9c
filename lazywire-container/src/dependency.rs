//! Resolved values and factory arguments.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use lazywire_support::rendering::{obj_repr, shorten_type_name};

/// A resolved, type-erased dependency value.
///
/// Cloning is cheap: all clones share one allocation.
///
/// # Examples
/// ```
/// use lazywire_container::dependency::Dependency;
///
/// let dep = Dependency::new(42i32);
/// assert_eq!(dep.downcast_ref::<i32>(), Some(&42));
/// assert!(dep.downcast::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Dependency {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Dependency {
    /// Wraps an owned value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an already shared value without copying it.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: type_name::<T>(),
        }
    }

    /// Full type name of the wrapped value.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns a shared handle to the value if it is a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns `true` if both handles point at the same value.
    pub fn ptr_eq(&self, other: &Dependency) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.value), Arc::as_ptr(&other.value))
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency<{}>", shorten_type_name(self.type_name))
    }
}

/// A value that can be passed to a factory.
///
/// Implemented for every `Debug + Send + Sync + 'static` type, so arguments
/// show up in provider descriptions.
pub trait ArgValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> ArgValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Argument = Arc<dyn ArgValue>;

/// Positional and keyword arguments handed to a factory on invocation.
///
/// # Examples
/// ```
/// use lazywire_container::dependency::Arguments;
///
/// let args = Arguments::new().arg(8080u16).kwarg("host", "localhost");
/// assert_eq!(args.positional::<u16>(0), Some(&8080));
/// assert_eq!(args.keyword::<&str>("host"), Some(&"localhost"));
/// assert_eq!(args.keyword::<u16>("host"), None);
/// ```
#[derive(Clone, Default)]
pub struct Arguments {
    positional: Vec<Argument>,
    keyword: Vec<(String, Argument)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg<T: ArgValue>(mut self, value: T) -> Self {
        self.positional.push(Arc::new(value));
        self
    }

    /// Sets a keyword argument, replacing an earlier one with the same name.
    pub fn kwarg<T: ArgValue>(mut self, name: impl Into<String>, value: T) -> Self {
        let name = name.into();
        let value: Argument = Arc::new(value);
        match self.keyword.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.keyword.push((name, value)),
        }
        self
    }

    /// Returns the positional argument at `index` if it is a `T`.
    pub fn positional<T: Any>(&self, index: usize) -> Option<&T> {
        let arg: &dyn ArgValue = &**self.positional.get(index)?;
        arg.as_any().downcast_ref::<T>()
    }

    /// Returns the keyword argument `name` if it is a `T`.
    pub fn keyword<T: Any>(&self, name: &str) -> Option<&T> {
        let (_, arg) = self.keyword.iter().find(|(existing, _)| existing == name)?;
        let arg: &dyn ArgValue = &**arg;
        arg.as_any().downcast_ref::<T>()
    }

    pub fn positional_len(&self) -> usize {
        self.positional.len()
    }

    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        self.keyword.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Renders `TypeName(subject, args..., key=value...)`.
    ///
    /// Arguments are left out entirely when there are none.
    pub(crate) fn describe(&self, type_name: &str, subject: &dyn fmt::Debug) -> String {
        let mut positional: Vec<&dyn fmt::Debug> = vec![subject];
        positional.extend(self.positional.iter().map(|arg| arg as &dyn fmt::Debug));
        let keyword: Vec<(&str, &dyn fmt::Debug)> = self
            .keyword
            .iter()
            .map(|(name, arg)| (name.as_str(), arg as &dyn fmt::Debug))
            .collect();
        obj_repr(type_name, &positional, &keyword)
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        list.entries(self.positional.iter());
        for (name, value) in &self.keyword {
            list.entry(&format_args!("{name}={value:?}"));
        }
        list.finish()
    }
}
