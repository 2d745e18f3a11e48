//! The cascade engine: stylesheet rules into `style` attributes.
//!
//! [CSS Cascading and Inheritance Level 4 § 6](https://www.w3.org/TR/css-cascade-4/#cascading)
//! "The cascade takes an unordered list of declared values for a given
//! property on a given element, sorts them by their declaration's
//! precedence ... and outputs a single cascaded value."
//!
//! Here the sort happens once per stylesheet ([`CompiledStylesheet`] keeps
//! rules in ascending `(specificity, source order)`), and the "output" is
//! produced by applying every rule in that order and letting later writes
//! win. A run moves through these stages:
//!
//! ```text
//! Initialized -> RulesCompiled -> Applied -> VariablesResolved -> MediaFiltered -> Done
//! ```
//!
//! Rules that cannot be written into attributes (`@media` blocks, dynamic
//! pseudo-classes, `@font-face`, ...) end up in the residual stylesheet of
//! the returned [`InlineOutcome`].

use std::fmt;

use quill_common::warning::{clear_warnings, warn_once};
use quill_dom::{DomTree, NodeId};
use rustc_hash::FxHashSet;

use crate::cache::StyleCache;
use crate::concat::CssConcatenator;
use crate::config::InlinerConfig;
use crate::declaration::{DeclarationMap, is_important};
use crate::selector::{is_inlinable, strip_dynamic_pseudos};
use crate::stylesheet::{CompiledStylesheet, MediaBlock, UninlinableRule, compile_media_rules};
use crate::variables::resolve_variables;

/// Progress of one [`Inliner::emogrify`] run, logged at `debug`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Initialized,
    RulesCompiled,
    Applied,
    VariablesResolved,
    MediaFiltered,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

fn enter(stage: Stage) {
    log::debug!("emogrify: {stage}");
}

/// What an inlining run produced besides the mutated tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineOutcome {
    /// CSS that could not be inlined, compacted. Empty if everything was
    /// inlined or dropped.
    pub residual_css: String,
    /// Number of rules (one per selector) that matched at least one element.
    pub inlined_rules: usize,
    /// Number of distinct elements whose `style` attribute was written.
    pub styled_elements: usize,
}

/// Applies stylesheets to document trees.
///
/// An `Inliner` owns its [`StyleCache`], so inlining many documents against
/// the same stylesheet compiles it once.
#[derive(Debug, Default)]
pub struct Inliner {
    config: InlinerConfig,
    cache: StyleCache,
}

impl Inliner {
    /// An inliner with an empty cache.
    #[must_use]
    pub fn new(config: InlinerConfig) -> Self {
        Self::with_cache(config, StyleCache::new())
    }

    /// An inliner reusing an existing cache.
    #[must_use]
    pub const fn with_cache(config: InlinerConfig, cache: StyleCache) -> Self {
        Self { config, cache }
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &InlinerConfig {
        &self.config
    }

    /// Give the cache back, e.g. to hand it to an inliner with another
    /// configuration.
    #[must_use]
    pub fn into_cache(self) -> StyleCache {
        self.cache
    }

    /// Inline `css` (plus the document's own `<style>` blocks, if enabled)
    /// into the `style` attributes of `tree`.
    ///
    /// Never fails: selectors that cannot be compiled, unsupported at-rules
    /// and stray text are logged once and skipped.
    pub fn emogrify(&mut self, tree: &mut DomTree, css: &str) -> InlineOutcome {
        clear_warnings();
        enter(Stage::Initialized);

        let css = if self.config.parse_style_blocks {
            let harvested = harvest_style_blocks(tree);
            if harvested.is_empty() {
                css.to_string()
            } else {
                format!("{css}\n{harvested}")
            }
        } else {
            css.to_string()
        };

        let sheet = self.cache.stylesheet(&css);
        enter(Stage::RulesCompiled);
        log::debug!(
            "{} rule(s), {} uninlinable, {} @media block(s)",
            sheet.rules.len(),
            sheet.uninlinable.len(),
            sheet.media_blocks.len()
        );

        let excluded = self.excluded_elements(tree);
        let mut outcome = self.apply_rules(tree, &sheet, &excluded);
        enter(Stage::Applied);

        let rewritten = resolve_variables(tree);
        enter(Stage::VariablesResolved);
        log::debug!("var() substituted in {rewritten} element(s)");

        outcome.residual_css = self.residual_stylesheet(tree, &sheet);
        enter(Stage::MediaFiltered);

        enter(Stage::Done);
        outcome
    }

    /// Elements matched by any excluded selector.
    fn excluded_elements(&mut self, tree: &DomTree) -> FxHashSet<NodeId> {
        let mut excluded = FxHashSet::default();
        for selector in &self.config.excluded_selectors {
            match self.cache.query(selector) {
                Ok(query) => excluded.extend(query.select(tree)),
                Err(err) => {
                    let _ = warn_once(
                        "css",
                        &format!("ignoring excluded selector '{selector}': {err}"),
                    );
                }
            }
        }
        excluded
    }

    fn apply_rules(
        &mut self,
        tree: &mut DomTree,
        sheet: &CompiledStylesheet,
        excluded: &FxHashSet<NodeId>,
    ) -> InlineOutcome {
        let mut outcome = InlineOutcome::default();
        let mut styled = FxHashSet::default();

        for rule in &sheet.rules {
            let query = match self.cache.query(&rule.selector) {
                Ok(query) => query,
                Err(err) => {
                    let _ = warn_once(
                        "css",
                        &format!("dropping selector '{}': {err}", rule.selector),
                    );
                    continue;
                }
            };

            let mut applied = 0;
            for id in query.select(tree) {
                if excluded.contains(&id) {
                    continue;
                }
                let Some(element) = tree.as_element_mut(id) else {
                    continue;
                };
                let existing = self.cache.declarations(element.style().unwrap_or_default());
                let combined = merge_declarations(&existing, &rule.declarations);
                element.set_style(&combined.to_style_string());
                let _ = styled.insert(id);
                applied += 1;
            }

            log::trace!(
                "'{}' (specificity {}) applied to {applied} element(s)",
                rule.selector,
                rule.specificity.0
            );
            if applied > 0 {
                outcome.inlined_rules += 1;
            }
        }

        outcome.styled_elements = styled.len();
        outcome
    }

    /// Pass-through at-rules, then the relevant `@media` blocks and
    /// uninlinable rules in stylesheet order.
    fn residual_stylesheet(&mut self, tree: &DomTree, sheet: &CompiledStylesheet) -> String {
        enum Residual<'a> {
            Media(&'a MediaBlock),
            Uninlinable(&'a UninlinableRule),
        }

        let mut pending: Vec<(usize, Residual<'_>)> = sheet
            .media_blocks
            .iter()
            .map(|block| (block.source_order, Residual::Media(block)))
            .collect();
        if self.config.keep_uninlinable_rules {
            pending.extend(
                sheet
                    .uninlinable
                    .iter()
                    .map(|rule| (rule.source_order, Residual::Uninlinable(rule))),
            );
        }
        pending.sort_by_key(|(source_order, _)| *source_order);

        let mut concat = CssConcatenator::new();
        for (_, residual) in pending {
            match residual {
                Residual::Media(block) => {
                    if !block.is_eligible(&self.config.allowed_media_types) {
                        let _ = warn_once(
                            "css",
                            &format!("dropping '{}': media type not allowed", block.media),
                        );
                        continue;
                    }
                    if !self.is_media_block_relevant(tree, block) {
                        log::trace!("dropping '{}': no element matches", block.media);
                        continue;
                    }
                    for rule_block in block.rule_blocks() {
                        let selectors: Vec<&str> =
                            rule_block.selectors.iter().map(String::as_str).collect();
                        concat.append(&selectors, &rule_block.declarations, &block.media);
                    }
                }
                Residual::Uninlinable(rule) => {
                    if self.concerns_document(tree, &rule.selector) {
                        concat.append(&[rule.selector.as_str()], &rule.declarations, "");
                    }
                }
            }
        }

        let mut residual = sheet.passthrough.concat();
        residual.push_str(&concat.serialize());
        residual
    }

    /// A media block is kept whole if any of its selectors matches
    /// somewhere in the document. Exclusions do not apply.
    fn is_media_block_relevant(&mut self, tree: &DomTree, block: &MediaBlock) -> bool {
        let any_rule_matches = compile_media_rules(block, &mut self.cache)
            .iter()
            .any(|rule| {
                self.cache
                    .query(&rule.selector)
                    .is_ok_and(|query| query.matches_any(tree))
            });
        any_rule_matches
            || block
                .rule_blocks()
                .iter()
                .flat_map(|rule_block| rule_block.selectors.iter())
                .filter(|selector| !is_inlinable(selector))
                .any(|selector| self.concerns_document(tree, selector))
    }

    /// Whether a selector, stripped of its dynamic pseudo-classes, matches
    /// an element.
    fn concerns_document(&mut self, tree: &DomTree, selector: &str) -> bool {
        let stripped = strip_dynamic_pseudos(selector);
        self.cache
            .query(&stripped)
            .is_ok_and(|query| query.matches_any(tree))
    }
}

/// Overlay `new` on `existing`, except that an `!important` value already
/// in `existing` survives.
///
/// Only the existing side's marker is consulted: a new `!important`
/// value still replaces an existing plain one, and an existing
/// `!important` wins even against a new `!important`.
#[must_use]
pub fn merge_declarations(existing: &DeclarationMap, new: &DeclarationMap) -> DeclarationMap {
    let mut combined = existing.clone();
    for (name, value) in new.iter() {
        if existing.get(name).is_some_and(is_important) {
            continue;
        }
        combined.insert(name, value);
    }
    combined
}

/// Collect the text of every `<style>` element in document order and
/// remove those elements from the tree.
fn harvest_style_blocks(tree: &mut DomTree) -> String {
    let style_elements: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| {
            tree.as_element(id)
                .is_some_and(|element| element.tag_name.eq_ignore_ascii_case("style"))
        })
        .collect();

    let mut css = String::new();
    for id in style_elements {
        // A <style> nested in a removed <style> is already detached.
        let Some(parent) = tree.parent(id) else {
            continue;
        };
        css.push_str(&tree.text_content(id));
        css.push('\n');
        tree.remove_child(parent, id);
    }
    if !css.is_empty() {
        log::debug!("harvested {} byte(s) of CSS from <style> elements", css.len());
    }
    css
}

/// Inline `css` into `tree` with the default configuration and a fresh cache.
pub fn inline_css(tree: &mut DomTree, css: &str) -> InlineOutcome {
    Inliner::new(InlinerConfig::default()).emogrify(tree, css)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(tree: &DomTree, id: NodeId) -> Option<&str> {
        tree.as_element(id).and_then(|e| e.style())
    }

    #[test]
    fn test_merge_overlays_new_values() {
        let existing = DeclarationMap::parse("color: red; margin: 0");
        let new = DeclarationMap::parse("color: blue; padding: 1px");
        assert_eq!(
            merge_declarations(&existing, &new).to_style_string(),
            "color: blue; margin: 0; padding: 1px;"
        );
    }

    #[test]
    fn test_merge_keeps_existing_important() {
        let existing = DeclarationMap::parse("color:red!important");
        let new = DeclarationMap::parse("color: blue");
        assert_eq!(
            merge_declarations(&existing, &new).to_style_string(),
            "color: red!important;"
        );
    }

    #[test]
    fn test_merge_is_asymmetric_for_important() {
        let existing = DeclarationMap::parse("color: red");
        let new = DeclarationMap::parse("color: blue !important");
        assert_eq!(
            merge_declarations(&existing, &new).get("color"),
            Some("blue !important")
        );

        let existing = DeclarationMap::parse("color: red !important");
        let new = DeclarationMap::parse("color: blue !important");
        assert_eq!(
            merge_declarations(&existing, &new).get("color"),
            Some("red !important")
        );
    }

    #[test]
    fn test_harvest_removes_style_elements() {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, "html", &[]);
        let head = tree.append_element(html, "head", &[]);
        let style = tree.append_element(head, "style", &[]);
        let _ = tree.append_text(style, "p { color: red }");
        let body = tree.append_element(html, "body", &[]);
        let style2 = tree.append_element(body, "STYLE", &[]);
        let _ = tree.append_text(style2, "a { x: 1 }");

        let css = harvest_style_blocks(&mut tree);
        assert_eq!(css, "p { color: red }\na { x: 1 }\n");
        assert!(tree.children(head).is_empty());
        assert!(tree.children(body).is_empty());
    }

    #[test]
    fn test_emogrify_applies_in_precedence_order() {
        let mut tree = DomTree::new();
        let p = tree.append_element(NodeId::ROOT, "p", &[("id", "a"), ("class", "b")]);
        let outcome = inline_css(&mut tree, "#a { color: green } .b { color: blue } p { color: red; margin: 0 }");
        assert_eq!(style_of(&tree, p), Some("color: green; margin: 0;"));
        assert_eq!(outcome.inlined_rules, 3);
        assert_eq!(outcome.styled_elements, 1);
        assert_eq!(outcome.residual_css, "");
    }

    #[test]
    fn test_excluded_elements_are_untouched() {
        let mut tree = DomTree::new();
        let kept = tree.append_element(NodeId::ROOT, "p", &[]);
        let skipped = tree.append_element(NodeId::ROOT, "p", &[("class", "raw")]);
        let mut inliner = Inliner::new(InlinerConfig::default().exclude_selector(".raw"));
        let outcome = inliner.emogrify(&mut tree, "p { color: red }");
        assert_eq!(style_of(&tree, kept), Some("color: red;"));
        assert_eq!(style_of(&tree, skipped), None);
        assert_eq!(outcome.styled_elements, 1);
    }

    #[test]
    fn test_stylesheet_is_compiled_once_per_inliner() {
        let mut inliner = Inliner::default();
        for _ in 0..3 {
            let mut tree = DomTree::new();
            let _ = tree.append_element(NodeId::ROOT, "p", &[]);
            let _ = inliner.emogrify(&mut tree, "p { color: red }");
        }
        assert_eq!(inliner.into_cache().stylesheet_count(), 1);
    }
}
