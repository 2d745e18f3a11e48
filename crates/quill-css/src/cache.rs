//! Memoization shared across inlining runs.
//!
//! Parsing declaration blocks, compiling selectors and compiling whole
//! stylesheets are pure functions of their text, so their results are kept
//! here and handed out as [`Rc`]s. A cache belongs to one [`Inliner`]; move
//! it between inliners with [`Inliner::with_cache`] and
//! [`Inliner::into_cache`].
//!
//! [`Inliner`]: crate::Inliner
//! [`Inliner::with_cache`]: crate::Inliner::with_cache
//! [`Inliner::into_cache`]: crate::Inliner::into_cache

use std::hash::{Hash, Hasher};
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHasher};

use crate::declaration::DeclarationMap;
use crate::error::SelectorError;
use crate::selector::{CompiledQuery, Specificity, normalize_selector};
use crate::stylesheet::CompiledStylesheet;

/// Memo tables for declaration blocks, selectors and stylesheets.
#[derive(Debug, Default)]
pub struct StyleCache {
    /// Parsed declaration blocks, keyed by the exact block text.
    declarations: FxHashMap<String, Rc<DeclarationMap>>,
    /// Compiled queries (or the reason compilation failed), keyed by the
    /// whitespace-normalized selector.
    queries: FxHashMap<String, Result<Rc<CompiledQuery>, SelectorError>>,
    /// Specificities, keyed by the whitespace-normalized selector.
    specificities: FxHashMap<String, Specificity>,
    /// Compiled stylesheets, keyed by a hash of the stylesheet text.
    stylesheets: FxHashMap<u64, Rc<CompiledStylesheet>>,
}

impl StyleCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration block, or return the earlier parse of the same text.
    pub fn declarations(&mut self, text: &str) -> Rc<DeclarationMap> {
        if let Some(map) = self.declarations.get(text) {
            return Rc::clone(map);
        }
        let map = Rc::new(DeclarationMap::parse(text));
        let _ = self.declarations.insert(text.to_string(), Rc::clone(&map));
        map
    }

    /// Compile a selector. Failures are cached too, so a bad selector is
    /// only parsed once.
    ///
    /// # Errors
    ///
    /// The [`SelectorError`] from [`CompiledQuery::compile`].
    pub fn query(&mut self, selector: &str) -> Result<Rc<CompiledQuery>, SelectorError> {
        let key = normalize_selector(selector);
        if let Some(entry) = self.queries.get(&key) {
            return entry.clone();
        }
        let entry = CompiledQuery::compile(&key).map(Rc::new);
        let _ = self.queries.insert(key, entry.clone());
        entry
    }

    /// Specificity of a selector.
    ///
    /// # Errors
    ///
    /// The [`SelectorError`] from compiling the selector.
    pub fn specificity(&mut self, selector: &str) -> Result<Specificity, SelectorError> {
        let key = normalize_selector(selector);
        if let Some(&specificity) = self.specificities.get(&key) {
            return Ok(specificity);
        }
        let specificity = self.query(&key)?.specificity;
        let _ = self.specificities.insert(key, specificity);
        Ok(specificity)
    }

    /// Compile a stylesheet, or return the earlier compilation of identical text.
    pub fn stylesheet(&mut self, css: &str) -> Rc<CompiledStylesheet> {
        let key = content_hash(css);
        if let Some(sheet) = self.stylesheets.get(&key) {
            log::trace!("stylesheet cache hit ({key:016x})");
            return Rc::clone(sheet);
        }
        let sheet = Rc::new(CompiledStylesheet::compile(css, self));
        let _ = self.stylesheets.insert(key, Rc::clone(&sheet));
        sheet
    }

    /// Number of compiled stylesheets held.
    #[must_use]
    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    /// Number of selectors compiled (successfully or not).
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    /// Drop every memoized result.
    pub fn clear(&mut self) {
        self.declarations.clear();
        self.queries.clear();
        self.specificities.clear();
        self.stylesheets.clear();
    }
}

fn content_hash(css: &str) -> u64 {
    let mut hasher = FxHasher::default();
    css.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declarations_are_shared() {
        let mut cache = StyleCache::new();
        let a = cache.declarations("color: red");
        let b = cache.declarations("color: red");
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.get("color"), Some("red"));
    }

    #[test]
    fn test_query_key_ignores_whitespace_runs() {
        let mut cache = StyleCache::new();
        let a = cache.query("div   >  p").unwrap();
        let b = cache.query(" div > p ").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.query_count(), 1);
    }

    #[test]
    fn test_failures_are_cached() {
        let mut cache = StyleCache::new();
        assert!(cache.query("a:hover").is_err());
        assert!(cache.query("a:hover").is_err());
        assert_eq!(cache.query_count(), 1);
        assert!(cache.specificity("a:hover").is_err());
    }

    #[test]
    fn test_specificity() {
        let mut cache = StyleCache::new();
        assert_eq!(cache.specificity("#a .b p"), Ok(Specificity(111)));
        assert_eq!(cache.specificity("#a  .b  p"), Ok(Specificity(111)));
    }

    #[test]
    fn test_identical_stylesheets_compile_once() {
        let mut cache = StyleCache::new();
        let a = cache.stylesheet("p { color: red }");
        let b = cache.stylesheet("p { color: red }");
        let c = cache.stylesheet("p { color: blue }");
        assert!(Rc::ptr_eq(&a, &b));
        assert!(!Rc::ptr_eq(&a, &c));
        assert_eq!(cache.stylesheet_count(), 2);

        cache.clear();
        assert_eq!(cache.stylesheet_count(), 0);
        assert_eq!(cache.query_count(), 0);
    }
}
