//! Conditional occurrence ratio between two category values
//!
//! The test statistic of the whole system: among rows whose
//! independent-role column equals one category value, the fraction whose
//! dependent-role column equals another. Which physical column plays the
//! independent role is decided by [`Direction`] — dependence testing is
//! not symmetric, so both orientations of the same column pair are
//! distinct questions and are evaluated separately.
//!
//! The computation is a pure fold over the two columns and is generic
//! over the label representation: the dataset layer works with strings,
//! while the sampler encodes columns as small integer codes to keep
//! per-draw working copies cheap.

use serde::{Deserialize, Serialize};

/// Role assignment for the two physical columns of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Column A conditions, column B is measured.
    Natural,
    /// Column B conditions, column A is measured.
    Reversed,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Natural, Direction::Reversed];
}

/// Fraction of rows matching `independent` whose paired cell matches
/// `dependent`, with column roles chosen by `direction`.
///
/// Returns `None` when no row matches the conditioning value — an
/// undefined ratio, deliberately not an error: callers exclude it from
/// statistics or propagate it as NaN. Null cells never match. A defined
/// result always lies in `[0, 1]`.
pub fn conditional_ratio<T: PartialEq>(
    independent: &T,
    dependent: &T,
    column_a: &[Option<T>],
    column_b: &[Option<T>],
    direction: Direction,
) -> Option<f64> {
    let (conditioning, measured) = match direction {
        Direction::Natural => (column_a, column_b),
        Direction::Reversed => (column_b, column_a),
    };

    let mut subset = 0usize;
    let mut matched = 0usize;
    for (cond, meas) in conditioning.iter().zip(measured) {
        if cond.as_ref() == Some(independent) {
            subset += 1;
            if meas.as_ref() == Some(dependent) {
                matched += 1;
            }
        }
    }

    if subset == 0 {
        None
    } else {
        Some(matched as f64 / subset as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> (Vec<Option<&'static str>>, Vec<Option<&'static str>>) {
        // (A1,B1), (A1,B1), (A1,B2), (A2,B2)
        (
            vec![Some("A1"), Some("A1"), Some("A1"), Some("A2")],
            vec![Some("B1"), Some("B1"), Some("B2"), Some("B2")],
        )
    }

    #[test]
    fn natural_direction_four_row_scenario() {
        let (a, b) = columns();
        let r = |x, y| conditional_ratio(&x, &y, &a, &b, Direction::Natural);

        assert_eq!(r("A1", "B1"), Some(0.5));
        assert_eq!(r("A1", "B2"), Some(0.5));
        assert_eq!(r("A2", "B2"), Some(1.0));
        // Never co-occurring pair: zero, not undefined.
        assert_eq!(r("A2", "B1"), Some(0.0));
    }

    #[test]
    fn reversed_direction_swaps_roles() {
        let (a, b) = columns();
        // Conditioning on B2: rows 3 and 4, one of which carries A1.
        assert_eq!(
            conditional_ratio(&"B2", &"A1", &a, &b, Direction::Reversed),
            Some(0.5)
        );
        assert_eq!(
            conditional_ratio(&"B1", &"A1", &a, &b, Direction::Reversed),
            Some(1.0)
        );
    }

    #[test]
    fn unseen_conditioning_value_is_undefined() {
        let (a, b) = columns();
        assert_eq!(
            conditional_ratio(&"A9", &"B1", &a, &b, Direction::Natural),
            None
        );
    }

    #[test]
    fn null_cells_match_nothing() {
        let a = vec![Some("A1"), None, Some("A1")];
        let b = vec![None, Some("B1"), Some("B1")];

        // Row 1 counts toward the denominator but its null B cell cannot
        // match the dependent value.
        assert_eq!(
            conditional_ratio(&"A1", &"B1", &a, &b, Direction::Natural),
            Some(0.5)
        );
    }

    #[test]
    fn defined_ratios_stay_in_unit_interval() {
        let (a, b) = columns();
        for x in ["A1", "A2"] {
            for y in ["B1", "B2"] {
                for dir in Direction::BOTH {
                    if let Some(r) = conditional_ratio(&x, &y, &a, &b, dir) {
                        assert!((0.0..=1.0).contains(&r), "{x}/{y} {dir:?}: {r}");
                    }
                }
            }
        }
    }
}
