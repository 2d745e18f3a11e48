//! Inliner configuration.

use serde::{Deserialize, Serialize};

/// Media types whose `@media` blocks are considered for the residual
/// stylesheet when nothing else is configured.
pub const DEFAULT_MEDIA_TYPES: [&str; 3] = ["all", "screen", "print"];

/// Options consumed by the [`Inliner`](crate::Inliner).
///
/// Every field has a default, so a partial JSON document such as
/// `{"excluded_selectors": [".keep"]}` deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InlinerConfig {
    /// Elements matched by any of these selectors receive no inlined styles.
    pub excluded_selectors: Vec<String>,

    /// `@media` types eligible for the residual stylesheet, compared ASCII
    /// case-insensitively. Blocks naming only other types are dropped.
    pub allowed_media_types: Vec<String>,

    /// Read `<style>` elements from the document, append their text to the
    /// given CSS and remove them from the tree.
    pub parse_style_blocks: bool,

    /// Carry rules with dynamic pseudo-classes (`a:hover`) into the residual
    /// stylesheet when their element exists in the document.
    pub keep_uninlinable_rules: bool,
}

impl Default for InlinerConfig {
    fn default() -> Self {
        Self {
            excluded_selectors: Vec::new(),
            allowed_media_types: DEFAULT_MEDIA_TYPES.map(String::from).to_vec(),
            parse_style_blocks: true,
            keep_uninlinable_rules: true,
        }
    }
}

impl InlinerConfig {
    /// Exclude elements matching `selector` from inlining.
    #[must_use]
    pub fn exclude_selector(mut self, selector: &str) -> Self {
        let selector = selector.trim();
        if !selector.is_empty() && !self.excluded_selectors.iter().any(|s| s == selector) {
            self.excluded_selectors.push(selector.to_string());
        }
        self
    }

    /// Add a media type to the allowed list.
    #[must_use]
    pub fn allow_media_type(mut self, media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();
        if !self.is_media_type_allowed(&media_type) {
            self.allowed_media_types.push(media_type);
        }
        self
    }

    /// Remove a media type from the allowed list.
    #[must_use]
    pub fn disallow_media_type(mut self, media_type: &str) -> Self {
        let media_type = media_type.trim();
        self.allowed_media_types
            .retain(|allowed| !allowed.eq_ignore_ascii_case(media_type));
        self
    }

    /// Whether `media_type` is in the allowed list.
    #[must_use]
    pub fn is_media_type_allowed(&self, media_type: &str) -> bool {
        self.allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = InlinerConfig::default();
        assert!(config.excluded_selectors.is_empty());
        assert_eq!(config.allowed_media_types, vec!["all", "screen", "print"]);
        assert!(config.parse_style_blocks);
        assert!(config.keep_uninlinable_rules);
    }

    #[test]
    fn test_builders() {
        let config = InlinerConfig::default()
            .exclude_selector(" .keep ")
            .exclude_selector(".keep")
            .allow_media_type("Speech")
            .disallow_media_type("PRINT");
        assert_eq!(config.excluded_selectors, vec![".keep"]);
        assert!(config.is_media_type_allowed("speech"));
        assert!(!config.is_media_type_allowed("print"));
        assert!(config.is_media_type_allowed("SCREEN"));
    }
}
