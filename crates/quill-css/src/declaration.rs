//! Declaration blocks: the `property: value; ...` text found both inside
//! stylesheet rule bodies and in `style` attributes.
//!
//! [CSS Style Attributes § 3](https://www.w3.org/TR/css-style-attr/#syntax)
//! "The value of the style attribute must match the syntax of the contents of
//! a CSS declaration block (excluding the delimiting braces)"
//!
//! Parsing is forgiving: anything that is not a
//! `name: value` pair is skipped, never reported.

use std::fmt;

/// The `!important` marker, compared ASCII case-insensitively.
const IMPORTANT: &str = "!important";

/// Segments after a `;` that belong to the value rather than starting a new
/// declaration, e.g. `url(data:image/png;base64,...)`.
const DATA_URL_PARAMETERS: [&str; 2] = ["base64", "charset"];

/// Ordered property-to-value mapping parsed from a declaration block.
///
/// Property names are ASCII-lowercased, except custom properties (`--*`),
/// which are case-sensitive:
///
/// [CSS Variables § 2](https://www.w3.org/TR/css-variables-1/#defining-variables)
/// "Custom properties are ordinary properties ... their names are case-sensitive."
///
/// Re-assigning a name keeps its original position and replaces the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationMap {
    entries: Vec<(String, String)>,
}

impl DeclarationMap {
    /// An empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parse a declaration block.
    ///
    /// The text is split on `;` (except where the `;` introduces a data-URL
    /// `base64`/`charset` parameter), each segment is trimmed and must read
    /// `name : value`, where the name is one or more ASCII letters, digits,
    /// `-` or `_` and the value is the non-empty remainder (newlines included).
    /// Other segments are discarded. The last occurrence of a name wins.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut map = Self::new();
        for segment in split_declarations(text) {
            if let Some((name, value)) = parse_declaration(segment.trim()) {
                map.insert(name, value);
            }
        }
        map
    }

    /// Set `name` to `value`, normalizing the name.
    pub fn insert(&mut self, name: &str, value: &str) {
        let name = normalize_property_name(name);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name, value.to_string())),
        }
    }

    /// Look up a value by property name (normalized before comparison).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize_property_name(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether a property is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a property, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = normalize_property_name(name);
        let index = self.entries.iter().position(|(n, _)| *n == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Iterate over `--*` custom property definitions.
    pub fn custom_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(name, _)| is_custom_property(name))
    }

    /// Number of declarations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no declarations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as `name: value; name: value;`, the form written back into
    /// `style` attributes.
    #[must_use]
    pub fn to_style_string(&self) -> String {
        let mut out = String::new();
        for (name, value) in self.iter() {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("; ");
        }
        out.trim().to_string()
    }
}

impl fmt::Display for DeclarationMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_style_string())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for DeclarationMap {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

/// Whether `name` is a custom property name (`--*`).
#[must_use]
pub fn is_custom_property(name: &str) -> bool {
    name.starts_with("--")
}

/// Lowercase a property name unless it names a custom property.
#[must_use]
pub fn normalize_property_name(name: &str) -> String {
    if is_custom_property(name) {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Whether a raw value carries a trailing `!important` marker.
#[must_use]
pub fn is_important(value: &str) -> bool {
    let value = value.trim_end();
    value.len() >= IMPORTANT.len()
        && value.is_char_boundary(value.len() - IMPORTANT.len())
        && value[value.len() - IMPORTANT.len()..].eq_ignore_ascii_case(IMPORTANT)
}

/// Split on `;` unless the text right after it is a data-URL parameter.
fn split_declarations(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(';') {
        let rest = &text[index + 1..];
        if DATA_URL_PARAMETERS.iter().any(|p| rest.starts_with(p)) {
            continue;
        }
        segments.push(&text[start..index]);
        start = index + 1;
    }
    segments.push(&text[start..]);
    segments
}

/// Match a trimmed segment against `name \s* : \s* value`.
fn parse_declaration(segment: &str) -> Option<(&str, &str)> {
    let name_end = segment
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(segment.len());
    if name_end == 0 {
        return None;
    }
    let (name, rest) = segment.split_at(name_end);
    let value = rest.trim_start().strip_prefix(':')?.trim_start();
    if value.is_empty() {
        return None;
    }
    Some((name, value))
}
