//! Text rendering utilities for human-friendly descriptions.
//!
//! Providers and entries describe themselves in log lines and error
//! messages as `TypeName(arg, arg, key=value)`. The helpers here build
//! those strings and never fail, whatever the arguments' `Debug` impls do.

use std::fmt::{self, Debug, Write};

use tracing::warn;

/// Placeholder written when a value's `Debug` impl reports an error.
pub const REPR_ERROR: &str = "<repr-error>";

/// Renders a value with its `Debug` impl, falling back to [`REPR_ERROR`].
///
/// ```
/// use lazywire_support::rendering::safe_repr;
///
/// assert_eq!(safe_repr(&"hello"), "\"hello\"");
/// assert_eq!(safe_repr(&13), "13");
/// ```
pub fn safe_repr(value: &dyn Debug) -> String {
    let mut out = String::new();
    match write!(out, "{value:?}") {
        Ok(()) => out,
        Err(fmt::Error) => {
            warn!("Debug formatting failed while rendering a description");
            REPR_ERROR.to_string()
        }
    }
}

/// Renders positional then keyword arguments, comma separated.
///
/// ```
/// use lazywire_support::rendering::args_repr;
///
/// let rendered = args_repr(&[&1, &"two"], &[("three", &3)]);
/// assert_eq!(rendered, "1, \"two\", three=3");
/// ```
pub fn args_repr(positional: &[&dyn Debug], keyword: &[(&str, &dyn Debug)]) -> String {
    positional
        .iter()
        .map(|arg| safe_repr(*arg))
        .chain(
            keyword
                .iter()
                .map(|(name, arg)| format!("{name}={}", safe_repr(*arg))),
        )
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders an object description as `ShortTypeName(args)`.
///
/// `type_name` is usually [`std::any::type_name`] of the described type;
/// its module path is stripped.
///
/// ```
/// use lazywire_support::rendering::obj_repr;
///
/// let rendered = obj_repr("my_app::providers::ValueProvider", &[&42], &[]);
/// assert_eq!(rendered, "ValueProvider(42)");
/// ```
pub fn obj_repr(
    type_name: &str,
    positional: &[&dyn Debug],
    keyword: &[(&str, &dyn Debug)],
) -> String {
    format!(
        "{}({})",
        shorten_type_name(type_name),
        args_repr(positional, keyword)
    )
}

/// Renders a dependency chain as a readable string.
///
/// ```
/// use lazywire_support::rendering::render_chain;
///
/// let chain = vec!["app.Service", "app.Repo", "app.Service"];
/// assert_eq!(render_chain(&chain), "app.Service → app.Repo → app.Service");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use lazywire_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// Last segment of a dotted name (`"pkg.mod.Symbol"` → `"Symbol"`).
pub fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

/// Generates "did you mean?" suggestions for a dotted name.
///
/// Compares the requested name against the available ones and returns at
/// most `max_suggestions` close matches, best first.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = last_segment(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = last_segment(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
