//! `An+B` microsyntax for `:nth-child()` and `:nth-of-type()`.
//!
//! [CSS Syntax § 6](https://www.w3.org/TR/css-syntax-3/#anb-microsyntax)
//! "The An+B notation defines an integer step (A) and offset (B), and
//! represents the An+Bth elements in a list, for every positive integer or
//! zero value of n, with the first element in the list having index 1."

use crate::error::SelectorError;

/// A parsed `An+B` expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Nth {
    /// The step `A`. Zero means "exactly position `B`".
    pub step: i32,
    /// The offset `B`.
    pub offset: i32,
}

impl Nth {
    /// `odd` (`2n+1`).
    pub const ODD: Self = Self { step: 2, offset: 1 };
    /// `even` (`2n`).
    pub const EVEN: Self = Self { step: 2, offset: 0 };

    /// Parse the argument of an nth pseudo-class.
    ///
    /// Accepts `odd`, `even`, a bare (optionally signed) integer, and the
    /// general `An+B` / `An-B` / `n` / `-n+B` forms. Whitespace is ignored.
    ///
    /// # Errors
    ///
    /// [`SelectorError::InvalidNthArgument`] if the text matches none of the
    /// forms above.
    pub fn parse(argument: &str) -> Result<Self, SelectorError> {
        let invalid = || SelectorError::InvalidNthArgument(argument.trim().to_string());

        let compact: String = argument
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match compact.as_str() {
            "odd" => return Ok(Self::ODD),
            "even" => return Ok(Self::EVEN),
            "" => return Err(invalid()),
            _ => {}
        }

        let Some((step_text, offset_text)) = compact.split_once('n') else {
            // Bare integer: a literal position, no modulus.
            let offset = parse_signed(&compact).ok_or_else(invalid)?;
            return Ok(Self { step: 0, offset });
        };

        let step = match step_text {
            "" | "+" => 1,
            "-" => -1,
            text => parse_signed(text).ok_or_else(invalid)?,
        };

        let offset = if offset_text.is_empty() {
            0
        } else {
            // After `n` the sign is mandatory: `2n+1`, `2n-1`.
            if !offset_text.starts_with(['+', '-']) {
                return Err(invalid());
            }
            parse_signed(offset_text).ok_or_else(invalid)?
        };

        Ok(Self { step, offset })
    }

    /// Whether the element at 1-based `position` among its (filtered)
    /// siblings is selected, i.e. `position = A*n + B` for some `n >= 0`.
    ///
    /// A negative `A` counts down from `B` toward the first sibling, never
    /// from the end of the list: `-n+3` selects positions 1 through 3.
    #[must_use]
    pub fn matches(self, position: usize) -> bool {
        let Ok(position) = i64::try_from(position) else {
            return false;
        };
        let step = i64::from(self.step);
        let offset = i64::from(self.offset);

        match step {
            0 => position == offset,
            // Counting up from B: B, B+A, B+2A, ...
            s if s > 0 => position >= offset && (position - offset) % s == 0,
            // Counting down from B: B, B-|A|, ... (e.g. -n+3 is 3, 2, 1)
            s => position <= offset && (offset - position) % s.abs() == 0,
        }
    }
}

/// Parse an integer with an optional leading `+`/`-`, digits only.
fn parse_signed(text: &str) -> Option<i32> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.strip_prefix('+').unwrap_or(text).parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(nth: Nth, count: usize) -> Vec<usize> {
        (1..=count).filter(|&p| nth.matches(p)).collect()
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Nth::parse("odd"), Ok(Nth::ODD));
        assert_eq!(Nth::parse(" EVEN "), Ok(Nth::EVEN));
    }

    #[test]
    fn test_parse_integer() {
        assert_eq!(Nth::parse("3"), Ok(Nth { step: 0, offset: 3 }));
        assert_eq!(Nth::parse("+3"), Ok(Nth { step: 0, offset: 3 }));
    }

    #[test]
    fn test_parse_an_plus_b_forms() {
        assert_eq!(Nth::parse("2n+1"), Ok(Nth { step: 2, offset: 1 }));
        assert_eq!(Nth::parse("2n - 1"), Ok(Nth { step: 2, offset: -1 }));
        assert_eq!(Nth::parse("n"), Ok(Nth { step: 1, offset: 0 }));
        assert_eq!(Nth::parse("-n+3"), Ok(Nth { step: -1, offset: 3 }));
        assert_eq!(Nth::parse("+n+2"), Ok(Nth { step: 1, offset: 2 }));
        assert_eq!(Nth::parse("-2n+5"), Ok(Nth { step: -2, offset: 5 }));
        assert_eq!(Nth::parse("0n+4"), Ok(Nth { step: 0, offset: 4 }));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for argument in ["", "first", "2n+", "n2", "2x+1", "--n", "2n1", "3.5"] {
            assert!(
                matches!(Nth::parse(argument), Err(SelectorError::InvalidNthArgument(_))),
                "expected '{argument}' to be rejected"
            );
        }
    }

    #[test]
    fn test_odd_and_2n_plus_1_select_the_same_positions() {
        assert_eq!(selected(Nth::ODD, 6), vec![1, 3, 5]);
        assert_eq!(selected(Nth::parse("2n+1").unwrap(), 6), vec![1, 3, 5]);
        assert_eq!(selected(Nth::EVEN, 6), vec![2, 4, 6]);
    }

    #[test]
    fn test_negative_step_selects_first_b() {
        let first_three = Nth::parse("-n+3").unwrap();
        assert_eq!(selected(first_three, 2), vec![1, 2]);
        assert_eq!(selected(first_three, 10), vec![1, 2, 3]);
        assert_eq!(selected(Nth::parse("-2n+5").unwrap(), 10), vec![1, 3, 5]);
    }

    #[test]
    fn test_negative_offset() {
        assert_eq!(selected(Nth::parse("3n-1").unwrap(), 9), vec![2, 5, 8]);
        assert_eq!(selected(Nth::parse("4n+5").unwrap(), 14), vec![5, 9, 13]);
    }

    #[test]
    fn test_literal_position() {
        assert_eq!(selected(Nth::parse("2").unwrap(), 5), vec![2]);
        assert!(selected(Nth::parse("0").unwrap(), 5).is_empty());
    }
}
