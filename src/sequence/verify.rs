//! Counterbalancing verification.
//!
//! Checks that a sequence uses every transition of its design as evenly as
//! the number of windows allows.

use super::TrialSequence;

/// Result of verifying a sequence.
#[derive(Debug, Clone)]
pub struct BalanceVerification {
    /// Whether the sequence passes verification.
    pub is_balanced: bool,
    /// The history length that was checked.
    pub order: usize,
    /// Smallest acceptable count per transition.
    pub min_expected: usize,
    /// Largest acceptable count per transition.
    pub max_expected: usize,
    /// Details about any issues found.
    pub issues: Vec<BalanceIssue>,
}

/// A specific issue found during verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceIssue {
    /// A value is out of the valid range for its column.
    ValueOutOfRange {
        /// Row of the offending value.
        row: usize,
        /// Column of the offending value.
        col: usize,
        /// The value found.
        value: u32,
        /// Largest valid value.
        max: u32,
    },
    /// A transition occurs more or less often than the balance allows.
    Imbalanced {
        /// The transition key, as in [`super::TransitionReport`].
        transition: Vec<u32>,
        /// How often it occurs.
        count: usize,
    },
}

/// Verify that a sequence is counterbalanced over windows of `order + 1` rows.
///
/// With `W` windows over `C` allowed transitions, every transition must occur
/// either `floor(W / C)` or `ceil(W / C)` times. When `W` is a multiple of `C`
/// this is exact balance.
///
/// # Algorithm
///
/// 1. Check every value is within its column's levels
/// 2. Count each transition via [`TrialSequence::transition_report`]
/// 3. Compare every count, including transitions that never occur, to the
///    acceptable range
///
/// # Example
///
/// ```
/// use counterbalance::{counterbalance, verify_balance};
///
/// let seq = counterbalance(32, vec![2, 2], 1).unwrap();
/// let result = verify_balance(&seq, 1);
/// assert!(result.is_balanced);
/// assert_eq!(result.min_expected, 2);
/// ```
#[must_use]
pub fn verify_balance(seq: &TrialSequence, order: usize) -> BalanceVerification {
    let mut issues = Vec::new();

    let limits: Vec<u32> = seq
        .alternating_states()
        .into_iter()
        .chain(seq.factor_levels().iter().copied())
        .collect();
    for (row, values) in seq.rows().enumerate() {
        for (col, (&value, &levels)) in values.iter().zip(&limits).enumerate() {
            if value >= levels {
                issues.push(BalanceIssue::ValueOutOfRange {
                    row,
                    col,
                    value,
                    max: levels - 1,
                });
            }
        }
    }

    if !issues.is_empty() {
        return BalanceVerification {
            is_balanced: false,
            order,
            min_expected: 0,
            max_expected: 0,
            issues,
        };
    }

    let report = seq.transition_report(order);
    let min_expected = report.windows / report.cells.max(1);
    let max_expected = report.windows.div_ceil(report.cells.max(1));

    for (transition, &count) in &report.counts {
        if count < min_expected || count > max_expected {
            issues.push(BalanceIssue::Imbalanced {
                transition: transition.clone(),
                count,
            });
        }
    }

    // Transitions that never occur are only acceptable while fewer windows
    // than cells exist
    let missing = report.cells.saturating_sub(report.counts.len());
    if missing > 0 && min_expected > 0 {
        issues.extend(missing_transitions(seq, &report).into_iter().map(|transition| {
            BalanceIssue::Imbalanced {
                transition,
                count: 0,
            }
        }));
    }

    BalanceVerification {
        is_balanced: issues.is_empty(),
        order,
        min_expected,
        max_expected,
        issues,
    }
}

/// Every allowed transition key that does not appear in `report`.
fn missing_transitions(seq: &TrialSequence, report: &super::TransitionReport) -> Vec<Vec<u32>> {
    let alphabet: u32 = seq.factor_levels().iter().product();
    let mut shape: Vec<u32> = vec![alphabet; report.order + 1];
    if let Some(states) = seq.alternating_states() {
        shape.insert(0, states);
    }

    let mut missing = Vec::new();
    let mut key = vec![0u32; shape.len()];
    loop {
        if !report.counts.contains_key(&key) {
            missing.push(key.clone());
        }
        // Odometer increment, last axis fastest
        let mut axis = shape.len();
        loop {
            if axis == 0 {
                return missing;
            }
            axis -= 1;
            key[axis] += 1;
            if key[axis] < shape[axis] {
                break;
            }
            key[axis] = 0;
        }
    }
}
