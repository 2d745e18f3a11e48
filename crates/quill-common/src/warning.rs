//! Inliner warnings, de-duplicated and emitted through the `log` facade.
//!
//! A stylesheet that uses `:hover` on forty rules should produce one warning,
//! not forty. The CSS crate reports every dropped selector, unsupported
//! at-rule and ineligible media block here; the host decides where the
//! output goes by installing a logger.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Global set of warnings we've already emitted (to deduplicate)
static WARNED: Mutex<Option<HashSet<String>>> = Mutex::new(None);

/// Warn about unsupported input (emitted once per unique message).
///
/// The `component` becomes the log target, so hosts can filter with e.g.
/// `RUST_LOG=css=warn`.
///
/// Returns `true` if the warning was emitted, `false` if it had already been
/// seen since the last [`clear_warnings`].
///
/// # Example
/// ```
/// use quill_common::warning::warn_once;
///
/// let first = warn_once("css", "unsupported pseudo-class ':hover' in 'a:hover'");
/// let second = warn_once("css", "unsupported pseudo-class ':hover' in 'a:hover'");
/// assert!(first);
/// assert!(!second);
/// ```
pub fn warn_once(component: &str, message: &str) -> bool {
    let key = format!("[{component}] {message}");
    let should_emit = WARNED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(HashSet::new)
        .insert(key);

    if should_emit {
        log::warn!(target: component, "{message}");
    }
    should_emit
}

/// Clear all recorded warnings (call before inlining a new document)
pub fn clear_warnings() {
    let mut guard = WARNED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(set) = guard.as_mut() {
        set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distinct_messages_are_each_emitted() {
        assert!(warn_once("test-distinct", "first"));
        assert!(warn_once("test-distinct", "second"));
        assert!(!warn_once("test-distinct", "first"));
    }

    #[test]
    fn test_component_is_part_of_the_key() {
        assert!(warn_once("test-component-a", "same message"));
        assert!(warn_once("test-component-b", "same message"));
    }
}
