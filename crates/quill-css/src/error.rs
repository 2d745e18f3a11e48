//! Errors raised while compiling selectors.
//!
//! None of these abort an inlining run: the cascade logs the error once and
//! skips the offending selector, leaving sibling selectors of the same rule
//! in effect.

use thiserror::Error;

/// Why a selector could not be compiled into a tree query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorError {
    /// The selector was empty or whitespace-only.
    #[error("empty selector")]
    Empty,

    /// A pseudo-class or pseudo-element that depends on user interaction,
    /// document state or generated content (`:hover`, `::before`, ...).
    #[error("unsupported pseudo-class or pseudo-element ':{0}'")]
    UnsupportedPseudo(String),

    /// The argument of `:nth-child()` / `:nth-of-type()` is not `odd`,
    /// `even`, an integer or an `An+B` expression.
    #[error("invalid An+B argument '{0}'")]
    InvalidNthArgument(String),

    /// A `(` or `[` without its closing counterpart.
    #[error("unbalanced '{0}' in selector")]
    Unbalanced(char),

    /// A quoted attribute value without a closing quote.
    #[error("unterminated string in selector")]
    UnterminatedString,

    /// A combinator with nothing on one of its sides (`> p`, `div +`).
    #[error("combinator '{0}' is missing an operand")]
    DanglingCombinator(char),

    /// An attribute selector that does not read `[name]` or `[name op value]`.
    #[error("malformed attribute selector")]
    MalformedAttribute,

    /// A character that cannot start any selector component.
    #[error("unexpected character '{0}' in selector")]
    UnexpectedCharacter(char),
}
