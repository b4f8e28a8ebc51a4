//! Transition counts of a trial sequence.

use std::collections::HashMap;

use super::TrialSequence;

/// How often each transition occurs in a sequence.
///
/// A transition is keyed like a quota-matrix cell: the alternating state of
/// the newest trial (if alternating) followed by the condition indices of a
/// window of `order + 1` consecutive rows, oldest first.
#[derive(Debug, Clone)]
pub struct TransitionReport {
    /// Length of the history window.
    pub order: usize,
    /// Number of distinct transitions the design allows.
    pub cells: usize,
    /// Number of windows counted.
    pub windows: usize,
    /// Occurrences of each transition that appeared at least once.
    pub counts: HashMap<Vec<u32>, usize>,
    /// Occurrences of each condition index over the real trials.
    pub condition_counts: HashMap<u32, usize>,
}

impl TransitionReport {
    /// Expected occurrences per transition if perfectly balanced.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn expected(&self) -> f64 {
        self.windows as f64 / self.cells as f64
    }

    /// Occurrences of one transition.
    #[must_use]
    pub fn count(&self, transition: &[u32]) -> usize {
        self.counts.get(transition).copied().unwrap_or(0)
    }

    /// Lowest count over every allowed transition.
    #[must_use]
    pub fn min(&self) -> usize {
        if self.counts.len() < self.cells {
            return 0;
        }
        self.counts.values().copied().min().unwrap_or(0)
    }

    /// Highest count over every allowed transition.
    #[must_use]
    pub fn max(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Whether every allowed transition occurs equally often.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.counts.len() == self.cells && self.min() == self.max()
    }
}

impl TrialSequence {
    /// Count transitions over windows of `order + 1` rows.
    ///
    /// For `order = 1` every window is a quota cell, so an exactly balanced
    /// sequence yields [`TransitionReport::is_balanced`]. For higher orders the
    /// seed's oldest history is not part of the output and one cell comes up
    /// one short.
    #[must_use]
    pub fn transition_report(&self, order: usize) -> TransitionReport {
        let conditions = self.condition_indices();
        let alternation = self.alternation_states();
        let alphabet: usize = self.factor_levels().iter().map(|&s| s as usize).product();
        let states = self.alternating_states().map_or(1, |a| a as usize);
        let cells = u32::try_from(order + 1)
            .ok()
            .and_then(|exp| alphabet.checked_pow(exp))
            .map_or(usize::MAX, |n| n.saturating_mul(states));

        let mut counts: HashMap<Vec<u32>, usize> = HashMap::new();
        let mut windows = 0;
        if order < conditions.len() {
            for end in order..conditions.len() {
                let mut key = Vec::with_capacity(order + 2);
                if let Some(states) = &alternation {
                    key.push(states[end]);
                }
                key.extend_from_slice(&conditions[end - order..=end]);
                *counts.entry(key).or_insert(0) += 1;
                windows += 1;
            }
        }

        let mut condition_counts = HashMap::new();
        for &c in &conditions[1..] {
            *condition_counts.entry(c).or_insert(0) += 1;
        }

        TransitionReport {
            order,
            cells,
            windows,
            counts,
            condition_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn binary(values: &[u32]) -> TrialSequence {
        let data = Array2::from_shape_vec((values.len(), 1), values.to_vec()).unwrap();
        TrialSequence::new(data, vec![2], None)
    }

    #[test]
    fn test_de_bruijn_balanced() {
        let report = binary(&[0, 0, 1, 1, 0]).transition_report(1);
        assert_eq!(report.windows, 4);
        assert_eq!(report.cells, 4);
        assert!(report.is_balanced());
        assert_eq!(report.count(&[1, 0]), 1);
        assert!((report.expected() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_transition() {
        let report = binary(&[0, 1, 0, 1, 0]).transition_report(1);
        assert!(!report.is_balanced());
        assert_eq!(report.min(), 0);
        assert_eq!(report.max(), 2);
        assert_eq!(report.count(&[0, 0]), 0);
    }

    #[test]
    fn test_condition_counts_skip_predecessor() {
        let report = binary(&[1, 0, 0, 1]).transition_report(1);
        assert_eq!(report.condition_counts[&0], 2);
        assert_eq!(report.condition_counts[&1], 1);
    }

    #[test]
    fn test_alternating_key() {
        let data = Array2::from_shape_vec((3, 2), vec![1, 0, 0, 1, 1, 1]).unwrap();
        let seq = TrialSequence::new(data, vec![2], Some(2));
        let report = seq.transition_report(1);
        assert_eq!(report.cells, 8);
        assert_eq!(report.count(&[0, 0, 1]), 1);
        assert_eq!(report.count(&[1, 1, 1]), 1);
    }

    #[test]
    fn test_order_longer_than_sequence() {
        let report = binary(&[0, 1]).transition_report(3);
        assert_eq!(report.windows, 0);
        assert!(report.counts.is_empty());
    }
}
