//! Custom property `var()` substitution over inlined styles.
//!
//! [CSS Custom Properties for Cascading Variables Module Level 1 § 3](https://www.w3.org/TR/css-variables-1/#using-variables)
//!
//! "If the value of the custom property named by the first argument to the
//! `var()` function is anything but the initial value, replace the `var()`
//! function by the value of the corresponding custom property. Otherwise, if
//! the `var()` function has a fallback value as its second argument, replace
//! the `var()` function by the fallback value. If there are any `var()`
//! references in the fallback, substitute them as well."
//!
//! Runs once after the cascade, over the `style` attributes it wrote.
//! Scopes follow the tree: an element sees its own `--*` definitions over
//! those of its ancestors, never those of its siblings. A reference that
//! cannot be resolved and has no fallback is left in place.

use std::rc::Rc;

use quill_dom::{DomTree, NodeId};
use rustc_hash::FxHashMap;

use crate::declaration::{DeclarationMap, is_custom_property};

/// Custom property name to resolved value, as seen by one element.
pub type VariableScope = FxHashMap<String, String>;

/// Nesting limit for fallbacks of fallbacks.
const MAX_FALLBACK_DEPTH: u32 = 32;

/// Substitute `var()` references in every element's `style` attribute.
///
/// Returns the number of elements whose style was rewritten.
pub fn resolve_variables(tree: &mut DomTree) -> usize {
    let mut rewritten = 0;
    let root_scope = Rc::new(VariableScope::default());
    let mut stack: Vec<(NodeId, Rc<VariableScope>)> = tree
        .children(tree.root())
        .iter()
        .rev()
        .map(|&child| (child, Rc::clone(&root_scope)))
        .collect();

    while let Some((id, inherited)) = stack.pop() {
        let Some(element) = tree.as_element(id) else {
            continue;
        };
        // No definitions and no references: the parent's scope passes through.
        let resolved = element
            .style()
            .filter(|style| style.contains("--"))
            .map(|style| resolve_declarations(style, &inherited));

        let scope = match resolved {
            Some((scope, changed)) => {
                if let (Some(declarations), Some(element)) = (changed, tree.as_element_mut(id)) {
                    element.set_style(&declarations.to_style_string());
                    rewritten += 1;
                }
                Rc::new(scope)
            }
            None => inherited,
        };

        for &child in tree.children(id).iter().rev() {
            stack.push((child, Rc::clone(&scope)));
        }
    }

    log::trace!("var() substitution rewrote {rewritten} element(s)");
    rewritten
}

/// Build the element's scope from its definitions and substitute its
/// declarations. Returns the new declarations only if something changed.
///
/// Custom properties are resolved first, in declaration order, each against
/// the scope built so far; the remaining properties see the finished scope.
fn resolve_declarations(
    style: &str,
    inherited: &VariableScope,
) -> (VariableScope, Option<DeclarationMap>) {
    let mut declarations = DeclarationMap::parse(style);
    let mut scope = inherited.clone();
    for (name, value) in declarations.custom_properties() {
        let _ = scope.insert(name.to_string(), value.to_string());
    }

    let mut changes: Vec<(String, String)> = Vec::new();
    let custom_first = declarations
        .custom_properties()
        .chain(declarations.iter().filter(|(name, _)| !is_custom_property(name)))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect::<Vec<_>>();

    for (name, value) in custom_first {
        let resolved = substitute(&value, &scope, 0);
        if resolved == value {
            continue;
        }
        if is_custom_property(&name) {
            let _ = scope.insert(name.clone(), resolved.clone());
        }
        changes.push((name, resolved));
    }

    if changes.is_empty() {
        return (scope, None);
    }
    for (name, value) in &changes {
        declarations.insert(name, value);
    }
    (scope, Some(declarations))
}

/// Substitute every `var()` in `value` against `scope`.
///
/// Values taken from the scope are inserted as they are; only fallbacks
/// are substituted recursively. Quoted strings are copied untouched.
#[must_use]
pub fn substitute_value(value: &str, scope: &VariableScope) -> String {
    substitute(value, scope, 0)
}

fn substitute(value: &str, scope: &VariableScope, depth: u32) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pos = 0;

    while let Some(c) = value[pos..].chars().next() {
        if c == '"' || c == '\'' {
            let end = string_end(value, pos);
            out.push_str(&value[pos..end]);
            pos = end;
            continue;
        }

        if starts_var_function(value, pos) {
            let arguments_start = pos + "var(".len();
            let Some(close) = closing_paren(value, arguments_start) else {
                // Unbalanced: nothing after this point can be a complete reference.
                out.push_str(&value[pos..]);
                break;
            };
            let reference = &value[pos..=close];
            let arguments = &value[arguments_start..close];
            out.push_str(&resolve_reference(reference, arguments, scope, depth));
            pos = close + 1;
            continue;
        }

        out.push(c);
        pos += c.len_utf8();
    }

    out
}

/// Replacement text for one `var(name[, fallback])`.
fn resolve_reference(reference: &str, arguments: &str, scope: &VariableScope, depth: u32) -> String {
    let (name, fallback) = match top_level_comma(arguments) {
        Some(comma) => (&arguments[..comma], Some(&arguments[comma + 1..])),
        None => (arguments, None),
    };
    let name = name.trim();

    if !is_custom_property(name) {
        return reference.to_string();
    }
    if let Some(value) = scope.get(name) {
        return value.clone();
    }
    match fallback {
        Some(fallback) if depth < MAX_FALLBACK_DEPTH => {
            substitute(fallback.trim(), scope, depth + 1)
        }
        _ => reference.to_string(),
    }
}

/// `var(` at `pos`, ASCII case-insensitive, not the tail of a longer name.
fn starts_var_function(value: &str, pos: usize) -> bool {
    let is_var = value
        .get(pos..pos + "var(".len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("var("));
    is_var
        && !value[..pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Byte index just past the string starting at `start` (or the end of the
/// text if the string is unterminated). Backslash escapes are honored.
fn string_end(value: &str, start: usize) -> usize {
    let mut chars = value[start..].char_indices();
    let Some((_, quote)) = chars.next() else {
        return value.len();
    };
    let mut escaped = false;
    for (offset, c) in chars {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return start + offset + c.len_utf8();
        }
    }
    value.len()
}

/// Index of the `)` closing a function whose arguments start at `start`.
fn closing_paren(value: &str, start: usize) -> Option<usize> {
    let mut depth = 1u32;
    let mut pos = start;
    while let Some(c) = value[pos..].chars().next() {
        match c {
            '"' | '\'' => {
                pos = string_end(value, pos);
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(pos);
                }
            }
            _ => {}
        }
        pos += c.len_utf8();
    }
    None
}

/// First `,` outside nested parentheses and strings.
fn top_level_comma(arguments: &str) -> Option<usize> {
    let mut depth = 0u32;
    let mut pos = 0;
    while let Some(c) = arguments[pos..].chars().next() {
        match c {
            '"' | '\'' => {
                pos = string_end(arguments, pos);
                continue;
            }
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some(pos),
            _ => {}
        }
        pos += c.len_utf8();
    }
    None
}
