//! CSS inlining for the Quill document tree.
//!
//! Takes a [`DomTree`](quill_dom::DomTree) and a stylesheet and writes each
//! element's cascaded declarations into its `style` attribute, for
//! consumers (email clients, mostly) that ignore `<style>` elements.
//!
//! The pipeline:
//!
//! 1. [`stylesheet`] splits CSS text into rules, one per selector, sorted by
//!    [specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
//!    and source order.
//! 2. [`selector`] compiles each selector into a query over the tree.
//! 3. [`cascade`] applies the rules in order, merging [`declaration`]
//!    blocks into existing `style` attributes.
//! 4. [`variables`] substitutes `var()` references against ancestor-scoped
//!    custom properties.
//! 5. [`concat`] compacts what could not be inlined (`@media` blocks whose
//!    selectors match, `:hover` rules, `@font-face`) into a residual
//!    stylesheet.
//!
//! ```
//! use quill_css::inline_css;
//! use quill_dom::{DomTree, NodeId};
//!
//! let mut tree = DomTree::new();
//! let p = tree.append_element(NodeId::ROOT, "p", &[("class", "note")]);
//!
//! let outcome = inline_css(&mut tree, ".note { color: red } a:hover { color: blue }");
//!
//! assert_eq!(tree.as_element(p).and_then(|e| e.style()), Some("color: red;"));
//! assert_eq!(outcome.residual_css, "");
//! ```

pub mod cache;
pub mod cascade;
pub mod concat;
pub mod config;
pub mod declaration;
pub mod error;
pub mod selector;
pub mod stylesheet;
pub mod variables;

pub use cache::StyleCache;
pub use cascade::{InlineOutcome, Inliner, inline_css, merge_declarations};
pub use concat::CssConcatenator;
pub use config::InlinerConfig;
pub use declaration::DeclarationMap;
pub use error::SelectorError;
pub use selector::{CompiledQuery, Specificity};
pub use stylesheet::{CompiledStylesheet, Rule};
