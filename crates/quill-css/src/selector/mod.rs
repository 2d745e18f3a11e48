//! Selector compilation and matching.
//!
//! A selector is compiled once into a [`CompiledQuery`], a right-to-left
//! chain of compound selectors that is evaluated directly against the
//! [`DomTree`]. Only selectors whose outcome depends on nothing but the
//! document are compiled: type, universal, id, class and attribute
//! selectors, the four combinators, and the structural pseudo-classes
//! `:first-child`, `:last-child`, `:nth-child()` and `:nth-of-type()`.
//! Everything else (`:hover`, `::before`, `:not()`, ...) is rejected with a
//! [`SelectorError`] rather than approximated.
//!
//! See [Selectors Level 4](https://www.w3.org/TR/selectors-4/).

mod nth;

pub use nth::Nth;

use std::iter::Peekable;
use std::str::Chars;

use quill_dom::{DomTree, ElementData, NodeId};

use crate::error::SelectorError;

/// Pseudo-classes that depend only on tree position and are therefore
/// inlinable. Functional ones are listed with their opening parenthesis.
const STRUCTURAL_PSEUDO_CLASSES: [&str; 4] =
    ["first-child", "last-child", "nth-child(", "nth-of-type("];

/// [§ 5 Elemental selectors](https://www.w3.org/TR/selectors-4/#elemental-selectors)
/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
///
/// A simple selector is a single condition on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    ///
    /// Stored lowercased; matched ASCII case-insensitively.
    Type(String),

    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,

    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),

    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    ///
    /// Matches when the whitespace-tokenized `class` attribute contains the
    /// name. Repeated classes (`.a.b`) are a conjunction of these.
    Class(String),

    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),

    /// Structural pseudo-class, evaluated against the element's siblings.
    PseudoClass(PseudoClass),
}

/// The structural pseudo-classes that survive compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// [§ 14.3.1 :first-child](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    /// "The :first-child pseudo-class represents an element that is first among its
    /// inclusive siblings."
    FirstChild,

    /// [§ 14.3.2 :last-child](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,

    /// [§ 14.4.1 :nth-child()](https://www.w3.org/TR/selectors-4/#the-nth-child-pseudo)
    /// Position counted among all element siblings.
    NthChild(Nth),

    /// [§ 14.4.3 :nth-of-type()](https://www.w3.org/TR/selectors-4/#the-nth-of-type-pseudo)
    /// Position counted among element siblings with the same type.
    NthOfType(Nth),
}

/// Attribute selectors per [§ 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(String),
    /// `[attr=value]`
    Equals(String, String),
    /// `[attr~=value]`, whitespace-separated word match
    Includes(String, String),
    /// `[attr|=value]`, exact or followed by `-`
    DashMatch(String, String),
    /// `[attr^=value]`
    PrefixMatch(String, String),
    /// `[attr$=value]`
    SuffixMatch(String, String),
    /// `[attr*=value]`
    SubstringMatch(String, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
///
/// "A compound selector is a sequence of simple selectors that are not
/// separated by a combinator, and represents a set of simultaneous
/// conditions on a single element."
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// The list of simple selectors that make up this compound selector.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 15 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Whitespace: any-descendant step.
    Descendant,
    /// `>`: direct-child step.
    Child,
    /// `+`: immediately-following-sibling step.
    NextSibling,
    /// `~`: any-following-sibling step.
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// Example: `div.container > ul.nav li` is stored as
/// ```text
/// subject: [li]
/// combinators: [(Descendant, [ul.nav]), (Child, [div.container])]
/// ```
/// The order is right-to-left because matching is done from the subject upward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector (the subject of the selector).
    pub subject: CompoundSelector,
    /// Chain of (combinator, compound) pairs going left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// Precedence score of a selector: `100 * ids + 10 * (classes, attributes and
/// pseudo-classes) + types`. Higher wins; ties fall back to source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32);

impl Specificity {
    /// Combine the three selector counts into one score.
    #[must_use]
    pub const fn from_counts(ids: u32, classes: u32, types: u32) -> Self {
        Self(100 * ids + 10 * classes + types)
    }
}

/// A selector compiled into a tree query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    /// The complex selector (compound selectors with combinators).
    pub complex: ComplexSelector,
    /// The specificity of this selector.
    pub specificity: Specificity,
}

impl CompiledQuery {
    /// Compile selector text.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorError`] for empty input, unsupported pseudo-classes
    /// and pseudo-elements, invalid `An+B` arguments and malformed syntax.
    pub fn compile(selector: &str) -> Result<Self, SelectorError> {
        SelectorParser::new(selector).parse()
    }

    /// Whether the element `node_id` is matched by this query.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node_id: NodeId) -> bool {
        compound_matches(&self.complex.subject, tree, node_id)
            && self.matches_combinators(tree, node_id)
    }

    /// All matching elements, in document order.
    #[must_use]
    pub fn select(&self, tree: &DomTree) -> Vec<NodeId> {
        tree.descendants(tree.root())
            .filter(|&id| self.matches(tree, id))
            .collect()
    }

    /// Whether at least one element of the document matches.
    #[must_use]
    pub fn matches_any(&self, tree: &DomTree) -> bool {
        tree.descendants(tree.root())
            .any(|id| self.matches(tree, id))
    }

    /// Walk the combinator chain from the (already matched) subject outward.
    ///
    /// Descendant and subsequent-sibling steps backtrack: if the nearest
    /// candidate fails further up the chain, farther candidates are tried.
    fn matches_combinators(&self, tree: &DomTree, subject_id: NodeId) -> bool {
        matches_chain(&self.complex.combinators, tree, subject_id)
    }
}

fn matches_chain(chain: &[(Combinator, CompoundSelector)], tree: &DomTree, current: NodeId) -> bool {
    let Some(((combinator, compound), rest)) = chain.split_first() else {
        return true;
    };

    match combinator {
        Combinator::Descendant => tree
            .ancestors(current)
            .any(|id| compound_matches(compound, tree, id) && matches_chain(rest, tree, id)),
        Combinator::Child => tree
            .parent(current)
            .is_some_and(|id| compound_matches(compound, tree, id) && matches_chain(rest, tree, id)),
        Combinator::NextSibling => previous_element_sibling(tree, current)
            .is_some_and(|id| compound_matches(compound, tree, id) && matches_chain(rest, tree, id)),
        Combinator::SubsequentSibling => tree
            .preceding_siblings(current)
            .filter(|&id| tree.as_element(id).is_some())
            .any(|id| compound_matches(compound, tree, id) && matches_chain(rest, tree, id)),
    }
}

/// Check if a compound selector matches an element.
fn compound_matches(compound: &CompoundSelector, tree: &DomTree, node_id: NodeId) -> bool {
    let Some(element) = tree.as_element(node_id) else {
        return false;
    };
    compound.simple_selectors.iter().all(|simple| match simple {
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(*pc, tree, node_id, element),
        _ => simple.matches(element),
    })
}

/// Match a structural pseudo-class using the element's position among its
/// element siblings.
fn pseudo_class_matches(
    pc: PseudoClass,
    tree: &DomTree,
    node_id: NodeId,
    element: &ElementData,
) -> bool {
    let Some(parent) = tree.parent(node_id) else {
        return false;
    };

    match pc {
        PseudoClass::FirstChild => tree.element_children(parent).next() == Some(node_id),
        PseudoClass::LastChild => tree.element_children(parent).last() == Some(node_id),
        PseudoClass::NthChild(nth) => tree
            .element_children(parent)
            .position(|c| c == node_id)
            .is_some_and(|index| nth.matches(index + 1)),
        PseudoClass::NthOfType(nth) => tree
            .element_children(parent)
            .filter(|&c| {
                tree.as_element(c)
                    .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
            })
            .position(|c| c == node_id)
            .is_some_and(|index| nth.matches(index + 1)),
    }
}

fn previous_element_sibling(tree: &DomTree, node_id: NodeId) -> Option<NodeId> {
    tree.preceding_siblings(node_id)
        .find(|&sibling_id| tree.as_element(sibling_id).is_some())
}

impl ComplexSelector {
    /// [§ 16 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
    ///
    /// Counts are summed over every compound in the chain.
    #[must_use]
    pub fn calculate_specificity(&self) -> Specificity {
        let (mut ids, mut classes, mut types) = (0, 0, 0);
        let compounds = std::iter::once(&self.subject)
            .chain(self.combinators.iter().map(|(_, compound)| compound));

        for simple in compounds.flat_map(|c| &c.simple_selectors) {
            match simple {
                SimpleSelector::Id(_) => ids += 1,
                SimpleSelector::Class(_)
                | SimpleSelector::Attribute(_)
                | SimpleSelector::PseudoClass(_) => classes += 1,
                SimpleSelector::Type(_) => types += 1,
                // "ignore the universal selector"
                SimpleSelector::Universal => {}
            }
        }

        Specificity::from_counts(ids, classes, types)
    }
}

impl SimpleSelector {
    /// Match this simple selector against an element without tree context.
    /// Structural pseudo-classes never match here; see [`CompiledQuery::matches`].
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Type(name) => element.tag_name.eq_ignore_ascii_case(name),
            Self::Universal => true,
            Self::Id(id) => element.id() == Some(id.as_str()),
            Self::Class(class_name) => element.has_class(class_name),
            Self::PseudoClass(_) => false,
            Self::Attribute(attr_sel) => attr_sel.matches(element),
        }
    }
}

impl AttributeSelector {
    fn matches(&self, element: &ElementData) -> bool {
        match self {
            Self::Exists(name) => element.attr(name).is_some(),
            Self::Equals(name, val) => element.attr(name) == Some(val.as_str()),
            Self::Includes(name, val) => element
                .attr(name)
                .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
            Self::DashMatch(name, val) => element.attr(name).is_some_and(|v| {
                v == val
                    || v.strip_prefix(val.as_str())
                        .is_some_and(|rest| rest.starts_with('-'))
            }),
            Self::PrefixMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.starts_with(val.as_str())),
            Self::SuffixMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.ends_with(val.as_str())),
            Self::SubstringMatch(name, val) => element
                .attr(name)
                .is_some_and(|v| !val.is_empty() && v.contains(val.as_str())),
        }
    }
}

const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

/// Hand-written recursive-descent parser producing a [`CompiledQuery`].
struct SelectorParser<'a> {
    chars: Peekable<Chars<'a>>,
    compounds: Vec<CompoundSelector>,
    combinators: Vec<Combinator>,
    current: Vec<SimpleSelector>,
}

impl<'a> SelectorParser<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            chars: raw.trim().chars().peekable(),
            compounds: Vec::new(),
            combinators: Vec::new(),
            current: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<CompiledQuery, SelectorError> {
        if self.chars.peek().is_none() {
            return Err(SelectorError::Empty);
        }

        while let Some(&c) = self.chars.peek() {
            match c {
                '.' | '#' => {
                    let _ = self.chars.next();
                    let name = self.read_ident();
                    if name.is_empty() {
                        return Err(SelectorError::UnexpectedCharacter(c));
                    }
                    self.current.push(if c == '.' {
                        SimpleSelector::Class(name)
                    } else {
                        SimpleSelector::Id(name)
                    });
                }
                '*' => {
                    let _ = self.chars.next();
                    self.current.push(SimpleSelector::Universal);
                }
                '[' => {
                    let _ = self.chars.next();
                    let attribute = self.parse_attribute()?;
                    self.current.push(SimpleSelector::Attribute(attribute));
                }
                ':' => {
                    let _ = self.chars.next();
                    let pseudo = self.parse_pseudo_class()?;
                    self.current.push(SimpleSelector::PseudoClass(pseudo));
                }
                c if c.is_ascii_whitespace() => {
                    self.skip_whitespace();
                    match self.chars.peek() {
                        // Explicit combinator follows; it closes the compound itself.
                        Some('>' | '+' | '~') | None => {}
                        Some(_) => self.close_compound(Combinator::Descendant, ' ')?,
                    }
                }
                '>' | '+' | '~' => {
                    let _ = self.chars.next();
                    let combinator = match c {
                        '>' => Combinator::Child,
                        '+' => Combinator::NextSibling,
                        _ => Combinator::SubsequentSibling,
                    };
                    self.close_compound(combinator, c)?;
                    self.skip_whitespace();
                    if matches!(self.chars.peek(), None | Some('>' | '+' | '~')) {
                        return Err(SelectorError::DanglingCombinator(c));
                    }
                }
                c if is_ident_start_char(c) || c == '-' => {
                    // A type selector can only lead its compound.
                    if !self.current.is_empty() {
                        return Err(SelectorError::UnexpectedCharacter(c));
                    }
                    let name = self.read_ident().to_ascii_lowercase();
                    self.current.push(SimpleSelector::Type(name));
                }
                other => return Err(SelectorError::UnexpectedCharacter(other)),
            }
        }

        if self.current.is_empty() {
            return Err(SelectorError::Empty);
        }
        let subject = CompoundSelector {
            simple_selectors: std::mem::take(&mut self.current),
        };

        // For "A > B C" we have compounds [A, B] and combinators [Child, Descendant];
        // matching wants [(Descendant, B), (Child, A)].
        let combinators = self
            .compounds
            .into_iter()
            .zip(self.combinators)
            .rev()
            .map(|(compound, combinator)| (combinator, compound))
            .collect();

        let complex = ComplexSelector {
            subject,
            combinators,
        };
        let specificity = complex.calculate_specificity();
        Ok(CompiledQuery {
            complex,
            specificity,
        })
    }

    fn close_compound(&mut self, combinator: Combinator, symbol: char) -> Result<(), SelectorError> {
        if self.current.is_empty() {
            return Err(SelectorError::DanglingCombinator(symbol));
        }
        self.compounds.push(CompoundSelector {
            simple_selectors: std::mem::take(&mut self.current),
        });
        self.combinators.push(combinator);
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(char::is_ascii_whitespace).is_some() {}
    }

    fn read_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.chars.next_if(|&c| is_ident_char(c)) {
            ident.push(c);
        }
        ident
    }

    /// Parse after `:`. Only the four structural pseudo-classes are accepted.
    fn parse_pseudo_class(&mut self) -> Result<PseudoClass, SelectorError> {
        if self.chars.next_if_eq(&':').is_some() {
            let name = self.read_ident();
            return Err(SelectorError::UnsupportedPseudo(format!(":{name}")));
        }

        let name = self.read_ident().to_ascii_lowercase();
        match name.as_str() {
            "" => Err(SelectorError::UnexpectedCharacter(':')),
            "first-child" => Ok(PseudoClass::FirstChild),
            "last-child" => Ok(PseudoClass::LastChild),
            "nth-child" => Ok(PseudoClass::NthChild(Nth::parse(&self.read_argument()?)?)),
            "nth-of-type" => Ok(PseudoClass::NthOfType(Nth::parse(&self.read_argument()?)?)),
            _ => Err(SelectorError::UnsupportedPseudo(name)),
        }
    }

    /// Read a parenthesized argument, balancing nested parentheses.
    fn read_argument(&mut self) -> Result<String, SelectorError> {
        if self.chars.next_if_eq(&'(').is_none() {
            return Err(SelectorError::InvalidNthArgument(String::new()));
        }
        let mut depth = 1u32;
        let mut argument = String::new();
        for c in self.chars.by_ref() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(argument);
                    }
                }
                _ => {}
            }
            argument.push(c);
        }
        Err(SelectorError::Unbalanced('('))
    }

    /// Parse after `[`: `name]` or `name op value]`.
    fn parse_attribute(&mut self) -> Result<AttributeSelector, SelectorError> {
        self.skip_whitespace();
        let name = self.read_ident().to_ascii_lowercase();
        if name.is_empty() {
            return Err(SelectorError::MalformedAttribute);
        }
        self.skip_whitespace();

        let operator = match self.chars.next() {
            Some(']') => return Ok(AttributeSelector::Exists(name)),
            Some('=') => '=',
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                if self.chars.next() != Some('=') {
                    return Err(SelectorError::MalformedAttribute);
                }
                op
            }
            None => return Err(SelectorError::Unbalanced('[')),
            Some(_) => return Err(SelectorError::MalformedAttribute),
        };

        let value = self.parse_attribute_value()?;
        self.skip_whitespace();
        match self.chars.next() {
            Some(']') => {}
            None => return Err(SelectorError::Unbalanced('[')),
            Some(_) => return Err(SelectorError::MalformedAttribute),
        }

        Ok(match operator {
            '~' => AttributeSelector::Includes(name, value),
            '|' => AttributeSelector::DashMatch(name, value),
            '^' => AttributeSelector::PrefixMatch(name, value),
            '$' => AttributeSelector::SuffixMatch(name, value),
            '*' => AttributeSelector::SubstringMatch(name, value),
            _ => AttributeSelector::Equals(name, value),
        })
    }

    fn parse_attribute_value(&mut self) -> Result<String, SelectorError> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some(&quote @ ('"' | '\'')) => {
                let _ = self.chars.next();
                let mut value = String::new();
                for c in self.chars.by_ref() {
                    if c == quote {
                        return Ok(value);
                    }
                    value.push(c);
                }
                Err(SelectorError::UnterminatedString)
            }
            Some(_) => {
                let mut value = String::new();
                while let Some(c) = self
                    .chars
                    .next_if(|&c| c != ']' && !c.is_ascii_whitespace())
                {
                    value.push(c);
                }
                if value.is_empty() {
                    Err(SelectorError::MalformedAttribute)
                } else {
                    Ok(value)
                }
            }
            None => Err(SelectorError::Unbalanced('[')),
        }
    }
}

/// Collapse whitespace runs outside quoted strings to one space and trim.
/// Used as the cache key for compiled queries.
#[must_use]
pub fn normalize_selector(selector: &str) -> String {
    let mut out = String::with_capacity(selector.len());
    let mut quote: Option<char> = None;
    let mut pending_space = false;

    for c in selector.trim().chars() {
        if quote.is_none() && c.is_ascii_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), _) if q == c => quote = None,
            _ => {}
        }
        out.push(c);
    }
    out
}

/// Scan `selector` outside quoted strings and attribute brackets, calling
/// `visit` with the byte index of every `:` and the text after it.
fn for_each_pseudo(selector: &str, mut visit: impl FnMut(usize, &str)) {
    let mut quote: Option<char> = None;
    let mut in_brackets = false;
    for (index, c) in selector.char_indices() {
        match (quote, c) {
            (Some(q), _) if q == c => quote = None,
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => in_brackets = true,
            (None, ']') => in_brackets = false,
            (None, ':') if !in_brackets => visit(index, &selector[index + 1..]),
            _ => {}
        }
    }
}

fn is_structural_pseudo(after_colon: &str) -> bool {
    STRUCTURAL_PSEUDO_CLASSES.iter().any(|name| {
        after_colon
            .get(..name.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
    })
}

/// Whether a selector can be inlined: it contains no `:` other than one of
/// the structural pseudo-classes `:first-child`, `:last-child`,
/// `:nth-child()` and `:nth-of-type()`.
#[must_use]
pub fn is_inlinable(selector: &str) -> bool {
    let mut inlinable = true;
    let mut previous_colon: Option<usize> = None;
    for_each_pseudo(selector, |index, after| {
        // The second colon of `::` is visited too; the first already failed.
        let is_second_of_pair = previous_colon.is_some_and(|p| p + 1 == index);
        if !is_second_of_pair && (after.starts_with(':') || !is_structural_pseudo(after)) {
            inlinable = false;
        }
        previous_colon = Some(index);
    });
    inlinable
}

/// Remove every non-structural pseudo-class and pseudo-element from a
/// selector, so `a.button:hover` becomes `a.button` and `p :focus` becomes
/// `p *`. Used to decide whether an uninlinable rule concerns the document.
#[must_use]
pub fn strip_dynamic_pseudos(selector: &str) -> String {
    let mut cut: Vec<(usize, usize)> = Vec::new();
    for_each_pseudo(selector, |index, after| {
        if cut.last().is_some_and(|&(_, end)| index < end) {
            return;
        }
        if !after.starts_with(':') && is_structural_pseudo(after) {
            return;
        }
        let body = after.trim_start_matches(':');
        let mut end = index + 1 + (after.len() - body.len());
        let name_len = body
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(body.len());
        end += name_len;
        if selector[end..].starts_with('(') {
            let mut depth = 0u32;
            for (offset, c) in selector[end..].char_indices() {
                match c {
                    '(' => depth += 1,
                    ')' => {
                        depth -= 1;
                        if depth == 0 {
                            end += offset + 1;
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
        cut.push((index, end));
    });

    let mut out = String::with_capacity(selector.len());
    let mut last = 0;
    for (start, end) in cut {
        out.push_str(&selector[last..start]);
        // A removed pseudo that was its compound's only component leaves a gap.
        if out.is_empty() || out.ends_with(|c: char| c.is_ascii_whitespace() || "+>~".contains(c)) {
            out.push('*');
        }
        last = end;
    }
    out.push_str(&selector[last..]);
    normalize_selector(&out)
}
