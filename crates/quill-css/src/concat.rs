//! Residual stylesheet assembly.
//!
//! Rules that stay out of `style` attributes are appended here one at a time
//! and serialized without whitespace. Adjacent appends that share a media
//! text share one `@media` wrapper, and adjacent rules merge when they have
//! the same declarations (selectors are unioned) or the same selector set
//! (declarations are concatenated). Only the last group and the last block
//! are ever merged into.

use std::collections::BTreeSet;

/// A run of rules under one media text. An empty media text means the rules
/// are not wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MediaGroup {
    media: String,
    blocks: Vec<RuleBlock>,
}

/// One `selector,selector{declarations}` block.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RuleBlock {
    selectors: Vec<String>,
    declarations: String,
}

impl RuleBlock {
    fn new(selectors: &[&str], declarations: &str) -> Self {
        let mut block = Self {
            selectors: Vec::with_capacity(selectors.len()),
            declarations: declarations.to_string(),
        };
        block.add_selectors(selectors);
        block
    }

    fn add_selectors(&mut self, selectors: &[&str]) {
        for &selector in selectors {
            if !self.selectors.iter().any(|s| s == selector) {
                self.selectors.push(selector.to_string());
            }
        }
    }

    fn has_selector_set(&self, selectors: &[&str]) -> bool {
        let ours: BTreeSet<&str> = self.selectors.iter().map(String::as_str).collect();
        let theirs: BTreeSet<&str> = selectors.iter().copied().collect();
        ours == theirs
    }

    fn append_declarations(&mut self, declarations: &str) {
        if !self.declarations.is_empty() && !self.declarations.ends_with(';') {
            self.declarations.push(';');
        }
        self.declarations.push_str(declarations);
    }

    fn write_to(&self, out: &mut String) {
        out.push_str(&self.selectors.join(","));
        out.push('{');
        out.push_str(&self.declarations);
        out.push('}');
    }
}

/// Builds compact CSS from individually appended rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssConcatenator {
    groups: Vec<MediaGroup>,
}

impl CssConcatenator {
    /// An empty concatenator.
    #[must_use]
    pub const fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Append one rule.
    ///
    /// `media` is the full at-rule prelude (`@media print`) or empty for an
    /// unconditional rule.
    pub fn append(&mut self, selectors: &[&str], declarations: &str, media: &str) {
        if self.groups.last().is_none_or(|group| group.media != media) {
            self.groups.push(MediaGroup {
                media: media.to_string(),
                blocks: Vec::new(),
            });
        }
        let Some(group) = self.groups.last_mut() else {
            return;
        };

        if let Some(last) = group.blocks.last_mut() {
            if last.declarations == declarations {
                last.add_selectors(selectors);
                return;
            }
            if last.has_selector_set(selectors) {
                last.append_declarations(declarations);
                return;
            }
        }
        group.blocks.push(RuleBlock::new(selectors, declarations));
    }

    /// Whether nothing has been appended.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of rule blocks across all media groups.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.groups.iter().map(|g| g.blocks.len()).sum()
    }

    /// Render as `media{selectors{declarations}...}...`.
    #[must_use]
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for group in &self.groups {
            let wrapped = !group.media.is_empty();
            if wrapped {
                out.push_str(&group.media);
                out.push('{');
            }
            for block in &group.blocks {
                block.write_to(&mut out);
            }
            if wrapped {
                out.push('}');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_rule() {
        let mut concat = CssConcatenator::new();
        concat.append(&["p"], "color:red", "");
        assert_eq!(concat.serialize(), "p{color:red}");
    }

    #[test]
    fn test_identical_declarations_union_selectors() {
        let mut concat = CssConcatenator::new();
        concat.append(&["p"], "color:red", "");
        concat.append(&["h1", "p"], "color:red", "");
        assert_eq!(concat.serialize(), "p,h1{color:red}");
    }

    #[test]
    fn test_equal_selector_sets_concatenate_declarations() {
        let mut concat = CssConcatenator::new();
        concat.append(&["a", "b"], "color:red", "");
        concat.append(&["b", "a"], "margin:0;", "");
        concat.append(&["a", "b"], "padding:0", "");
        assert_eq!(concat.serialize(), "a,b{color:red;margin:0;padding:0}");
    }

    #[test]
    fn test_only_the_last_block_is_considered() {
        let mut concat = CssConcatenator::new();
        concat.append(&["p"], "color:red", "");
        concat.append(&[".x"], "z:0", "");
        concat.append(&["p"], "color:red", "");
        assert_eq!(concat.block_count(), 3);
        assert_eq!(concat.serialize(), "p{color:red}.x{z:0}p{color:red}");
    }

    #[test]
    fn test_media_groups_wrap_adjacent_rules() {
        let mut concat = CssConcatenator::new();
        concat.append(&["p"], "color:red", "@media print");
        concat.append(&["div"], "x:1", "@media print");
        concat.append(&["a"], "y:2", "");
        concat.append(&["b"], "z:3", "@media print");
        assert_eq!(
            concat.serialize(),
            "@media print{p{color:red}div{x:1}}a{y:2}@media print{b{z:3}}"
        );
    }

    #[test]
    fn test_empty() {
        let concat = CssConcatenator::new();
        assert!(concat.is_empty());
        assert_eq!(concat.serialize(), "");
    }
}
