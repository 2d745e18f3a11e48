//! Stylesheet compilation: raw CSS text to an ordered list of [`Rule`]s.
//!
//! [CSS Syntax § 5.3.3](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
//! is followed loosely. The stylesheet is scanned at the top level into
//! statements (`@import ...;`), at-rule blocks (`@media ... { ... }`) and
//! qualified rules (`selectors { declarations }`). Anything that does not fit
//! is skipped; compilation never fails.
//!
//! Rules are expanded per selector, so `h1, .title { ... }` yields two
//! [`Rule`]s sharing one [`DeclarationMap`], each sorted by its own
//! specificity.

use std::rc::Rc;

use quill_common::warning::warn_once;

use crate::cache::StyleCache;
use crate::declaration::DeclarationMap;
use crate::selector::{Specificity, is_inlinable, normalize_selector};

/// One selector of a qualified rule, ready to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Selector text, trimmed.
    pub selector: String,
    /// Specificity of `selector`.
    pub specificity: Specificity,
    /// Index of the enclosing block in the stylesheet. Selectors of the same
    /// block share it.
    pub source_order: usize,
    /// Declarations of the enclosing block.
    pub declarations: Rc<DeclarationMap>,
    /// The `@media ...` prelude when the rule was nested in a media block.
    pub containing_at_rule: Option<String>,
}

/// A selector that cannot be inlined because it carries a dynamic
/// pseudo-class or pseudo-element, kept with its declaration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninlinableRule {
    /// Selector text, whitespace-normalized.
    pub selector: String,
    /// Declaration block text, trimmed and otherwise untouched.
    pub declarations: String,
    /// Index of the enclosing block in the stylesheet.
    pub source_order: usize,
}

/// A qualified rule as written: its selector list and declaration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRuleBlock {
    /// Selectors, whitespace-normalized, in source order.
    pub selectors: Vec<String>,
    /// Declaration block text, trimmed and otherwise untouched.
    pub declarations: String,
}

/// An `@media` block, kept whole until its relevance is decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBlock {
    /// The prelude with whitespace collapsed, e.g. `@media only screen and (max-width: 600px)`.
    pub media: String,
    /// The media query list after the `@media` keyword.
    pub queries: String,
    /// Text between the braces.
    pub body: String,
    /// Index of the block in the stylesheet.
    pub source_order: usize,
}

impl MediaBlock {
    /// [Media Queries § 2](https://www.w3.org/TR/mediaqueries-4/#media)
    ///
    /// A block is eligible if any query in its comma-separated list names an
    /// allowed media type (after an optional `only`/`not`), or names no type
    /// at all (`(max-width: 600px)` implies `all`).
    #[must_use]
    pub fn is_eligible(&self, allowed_media_types: &[String]) -> bool {
        split_top_level_commas(&self.queries)
            .into_iter()
            .any(|query| {
                let query = query.trim().to_ascii_lowercase();
                let query = query
                    .strip_prefix("only ")
                    .or_else(|| query.strip_prefix("not "))
                    .unwrap_or(&query)
                    .trim_start();
                if query.is_empty() || query.starts_with('(') {
                    return true;
                }
                let media_type = query
                    .split(|c: char| c.is_ascii_whitespace() || c == '(')
                    .next()
                    .unwrap_or_default();
                allowed_media_types
                    .iter()
                    .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
            })
    }

    /// The qualified rules nested in this block, as written.
    #[must_use]
    pub fn rule_blocks(&self) -> Vec<RawRuleBlock> {
        split_top_level(&self.body)
            .into_iter()
            .filter_map(|item| match item {
                TopLevelItem::Qualified { prelude, body } if !body.trim().is_empty() => {
                    Some(RawRuleBlock {
                        selectors: split_selectors(prelude)
                            .into_iter()
                            .map(normalize_selector)
                            .filter(|s| !s.is_empty())
                            .collect(),
                        declarations: body.trim().to_string(),
                    })
                }
                _ => None,
            })
            .filter(|block| !block.selectors.is_empty())
            .collect()
    }
}

/// The result of compiling one stylesheet text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledStylesheet {
    /// Inlinable rules, stably sorted by `(specificity, source_order)`.
    pub rules: Vec<Rule>,
    /// Rules with dynamic pseudo-classes, in source order.
    pub uninlinable: Vec<UninlinableRule>,
    /// `@media` blocks, in source order.
    pub media_blocks: Vec<MediaBlock>,
    /// `@charset`/`@import` statements followed by `@font-face` blocks,
    /// verbatim, for the head of the residual stylesheet.
    pub passthrough: Vec<String>,
}

impl CompiledStylesheet {
    /// Compile a full stylesheet.
    ///
    /// Comments are stripped first. Top-level qualified rules become
    /// [`Rule`]s (or [`UninlinableRule`]s); `@media` blocks are set aside
    /// whole; `@charset`, `@import` and `@font-face` pass through; any other
    /// at-rule is dropped with a warning.
    pub fn compile(css: &str, cache: &mut StyleCache) -> Self {
        let css = strip_comments(css);
        let mut sheet = Self::default();
        let mut font_faces = Vec::new();

        for (source_order, item) in split_top_level(&css).into_iter().enumerate() {
            match item {
                TopLevelItem::Statement(text) => {
                    let name = at_keyword(text);
                    if name == "charset" || name == "import" {
                        sheet.passthrough.push(text.trim().to_string());
                    } else {
                        let _ = warn_once("css", &format!("dropping unsupported at-rule '@{name}'"));
                    }
                }
                TopLevelItem::AtBlock { prelude, body, text } => match at_keyword(prelude).as_str() {
                    "media" => {
                        let media = collapse_whitespace(prelude);
                        let queries = media
                            .get("@media".len()..)
                            .unwrap_or_default()
                            .trim()
                            .to_string();
                        sheet.media_blocks.push(MediaBlock {
                            media,
                            queries,
                            body: body.to_string(),
                            source_order,
                        });
                    }
                    "font-face" => font_faces.push(text.trim().to_string()),
                    name => {
                        let _ = warn_once("css", &format!("dropping unsupported at-rule '@{name}'"));
                    }
                },
                TopLevelItem::Qualified { prelude, body } => {
                    compile_rule_block(prelude, body, source_order, None, cache, &mut sheet);
                }
            }
        }

        sheet.passthrough.extend(font_faces);
        sort_by_precedence(&mut sheet.rules);
        sheet
    }
}

/// Compile the rules nested in a media block, for relevance testing.
/// Uninlinable selectors are skipped.
pub fn compile_media_rules(block: &MediaBlock, cache: &mut StyleCache) -> Vec<Rule> {
    let mut sheet = CompiledStylesheet::default();
    for item in split_top_level(&block.body) {
        if let TopLevelItem::Qualified { prelude, body } = item {
            compile_rule_block(
                prelude,
                body,
                block.source_order,
                Some(&block.media),
                cache,
                &mut sheet,
            );
        }
    }
    sort_by_precedence(&mut sheet.rules);
    sheet.rules
}

/// Stable ascending sort: equal specificity keeps stylesheet order, and
/// later application wins in the cascade.
fn sort_by_precedence(rules: &mut [Rule]) {
    rules.sort_by_key(|rule| (rule.specificity, rule.source_order));
}

fn compile_rule_block(
    prelude: &str,
    body: &str,
    source_order: usize,
    containing_at_rule: Option<&str>,
    cache: &mut StyleCache,
    sheet: &mut CompiledStylesheet,
) {
    if body.trim().is_empty() {
        return;
    }
    let declarations = cache.declarations(body);

    for selector in split_selectors(prelude) {
        let selector = selector.trim();
        if selector.is_empty() {
            continue;
        }
        if !is_inlinable(selector) {
            sheet.uninlinable.push(UninlinableRule {
                selector: normalize_selector(selector),
                declarations: body.trim().to_string(),
                source_order,
            });
            continue;
        }
        match cache.specificity(selector) {
            Ok(specificity) => sheet.rules.push(Rule {
                selector: selector.to_string(),
                specificity,
                source_order,
                declarations: Rc::clone(&declarations),
                containing_at_rule: containing_at_rule.map(str::to_string),
            }),
            Err(err) => {
                let _ = warn_once("css", &format!("dropping selector '{selector}': {err}"));
            }
        }
    }
}

/// Top-level pieces of a stylesheet, borrowing from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopLevelItem<'a> {
    /// `@name ...;`
    Statement(&'a str),
    /// `@name prelude { body }`; `text` spans the whole block.
    AtBlock {
        prelude: &'a str,
        body: &'a str,
        text: &'a str,
    },
    /// `selectors { declarations }`
    Qualified { prelude: &'a str, body: &'a str },
}

/// Scan text into top-level items. At-rule blocks are brace-balanced;
/// qualified rule bodies end at the first `}` outside a string.
fn split_top_level(css: &str) -> Vec<TopLevelItem<'_>> {
    let mut items = Vec::new();
    let mut pos = 0;

    while pos < css.len() {
        let rest = &css[pos..];
        pos += rest.len() - rest.trim_start().len();
        if pos >= css.len() {
            break;
        }

        if css[pos..].starts_with('@') {
            let Some((open, byte)) = find_outside_strings(css, pos, &[';', '{']) else {
                break;
            };
            if byte == ';' {
                items.push(TopLevelItem::Statement(&css[pos..=open]));
                pos = open + 1;
                continue;
            }
            let close = matching_brace(css, open).unwrap_or(css.len());
            items.push(TopLevelItem::AtBlock {
                prelude: &css[pos..open],
                body: &css[open + 1..close],
                text: &css[pos..(close + 1).min(css.len())],
            });
            pos = close + 1;
        } else {
            let Some((open, _)) = find_outside_strings(css, pos, &['{']) else {
                break;
            };
            let Some((close, _)) = find_outside_strings(css, open + 1, &['}']) else {
                break;
            };
            items.push(TopLevelItem::Qualified {
                prelude: css[pos..open].trim_start_matches(['}', ';']),
                body: &css[open + 1..close],
            });
            pos = close + 1;
        }
    }

    items
}

/// First of `targets` at or after `from`, skipping quoted strings.
fn find_outside_strings(css: &str, from: usize, targets: &[char]) -> Option<(usize, char)> {
    let mut quote: Option<char> = None;
    for (offset, c) in css[from..].char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            None if c == '"' || c == '\'' => quote = Some(c),
            None if targets.contains(&c) => return Some((from + offset, c)),
            _ => {}
        }
    }
    None
}

/// Index of the `}` balancing the `{` at `open`.
fn matching_brace(css: &str, open: usize) -> Option<usize> {
    let mut depth = 0u32;
    let mut pos = open;
    while let Some((index, c)) = find_outside_strings(css, pos, &['{', '}']) {
        if c == '{' {
            depth += 1;
        } else {
            depth -= 1;
            if depth == 0 {
                return Some(index);
            }
        }
        pos = index + 1;
    }
    None
}

/// Lowercased at-keyword name of `@name ...`.
fn at_keyword(text: &str) -> String {
    text.trim_start()
        .trim_start_matches('@')
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Remove `/* ... */` comments. An unterminated comment runs to the end.
fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split a selector list on commas that are not inside parentheses,
/// brackets or strings.
#[must_use]
pub fn split_selectors(selector_list: &str) -> Vec<&str> {
    split_top_level_commas(selector_list)
}

fn split_top_level_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (index, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), _) if q == c => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}
