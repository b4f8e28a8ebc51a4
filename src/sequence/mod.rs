//! Generated trial sequences.
//!
//! A [`TrialSequence`] is the caller-facing result of a generation call: one
//! row per trial, one column per factor, preceded by the alternating state
//! when the design alternates. Row 0 is the virtual predecessor, the trial
//! assumed to precede the block so that the first real trial has a
//! well-defined history.

mod decode;
mod stats;
mod verify;

pub use decode::Decoder;
pub use stats::TransitionReport;
pub use verify::{verify_balance, BalanceIssue, BalanceVerification};

use ndarray::{Array2, ArrayView1};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::ravel_index;

/// An ordered list of trial conditions.
///
/// # Example
///
/// ```
/// use counterbalance::CounterbalanceBuilder;
///
/// let seq = CounterbalanceBuilder::new()
///     .trials(16)
///     .factor_levels(vec![2, 2])
///     .build()
///     .unwrap()
///     .generate()
///     .unwrap();
///
/// assert_eq!(seq.len(), 17);
/// assert_eq!(seq.trials(), 16);
/// assert_eq!(seq.width(), 2);
/// ```
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrialSequence {
    /// Shape (trials + 1, width).
    data: Array2<u32>,
    factor_levels: Vec<u32>,
    alternating: Option<u32>,
}

impl TrialSequence {
    /// Wrap decoded rows.
    ///
    /// # Panics
    ///
    /// Panics if the number of columns does not match the factors plus the
    /// alternating column, or if there are no rows.
    #[must_use]
    pub fn new(data: Array2<u32>, factor_levels: Vec<u32>, alternating: Option<u32>) -> Self {
        let width = factor_levels.len() + usize::from(alternating.is_some());
        assert_eq!(
            data.ncols(),
            width,
            "data cols {} must match tuple width {}",
            data.ncols(),
            width
        );
        assert!(data.nrows() > 0, "a sequence holds at least the predecessor");

        Self {
            data,
            factor_levels,
            alternating,
        }
    }

    /// Wrap decoded rows, validating the dimensions and values.
    ///
    /// # Errors
    ///
    /// Returns an error if the column count does not match, there are no
    /// rows, or a value lies outside its column's range.
    pub fn try_new(
        data: Array2<u32>,
        factor_levels: Vec<u32>,
        alternating: Option<u32>,
    ) -> Result<Self> {
        let width = factor_levels.len() + usize::from(alternating.is_some());
        if data.ncols() != width {
            return Err(Error::DimensionMismatch {
                expected: format!("{} columns", width),
                actual: format!("{} columns", data.ncols()),
            });
        }
        if data.nrows() == 0 {
            return Err(Error::DimensionMismatch {
                expected: "at least 1 row".to_string(),
                actual: "0 rows".to_string(),
            });
        }

        let seq = Self {
            data,
            factor_levels,
            alternating,
        };
        if !seq.values_in_range() {
            return Err(Error::invalid_params("sequence value out of range"));
        }
        Ok(seq)
    }

    /// Number of rows, including the predecessor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    /// Always `false`: the predecessor row is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Number of real trials (`len() - 1`).
    #[must_use]
    pub fn trials(&self) -> usize {
        self.len() - 1
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Levels of each factor.
    #[must_use]
    pub fn factor_levels(&self) -> &[u32] {
        &self.factor_levels
    }

    /// Number of alternating states, if alternating.
    #[must_use]
    pub fn alternating_states(&self) -> Option<u32> {
        self.alternating
    }

    /// Get the value at a specific position.
    ///
    /// # Panics
    ///
    /// Panics if the indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> u32 {
        self.data[[row, col]]
    }

    /// A row, counting the predecessor as row 0.
    #[must_use]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.row(idx)
    }

    /// The virtual predecessor.
    #[must_use]
    pub fn predecessor(&self) -> ArrayView1<'_, u32> {
        self.data.row(0)
    }

    /// The `idx`-th real trial, starting at 0.
    #[must_use]
    pub fn trial(&self, idx: usize) -> ArrayView1<'_, u32> {
        self.data.row(idx + 1)
    }

    /// Iterate over rows, predecessor first.
    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, u32>> {
        self.data.rows().into_iter()
    }

    /// Every row as an owned tuple.
    #[must_use]
    pub fn to_tuples(&self) -> Vec<Vec<u32>> {
        self.rows().map(|r| r.to_vec()).collect()
    }

    /// The alternating state of each row, if alternating.
    #[must_use]
    pub fn alternation_states(&self) -> Option<Vec<u32>> {
        self.alternating.map(|_| self.data.column(0).to_vec())
    }

    /// Levels of one factor, read down the sequence.
    ///
    /// # Panics
    ///
    /// Panics if `factor` is not a valid factor index.
    #[must_use]
    pub fn factor_column(&self, factor: usize) -> Vec<u32> {
        self.data.column(factor + self.factor_offset()).to_vec()
    }

    /// Condition index of each row, ignoring the alternating state.
    ///
    /// Conditions are numbered row-major over the factor levels.
    #[must_use]
    pub fn condition_indices(&self) -> Vec<u32> {
        let shape: Vec<usize> = self.factor_levels.iter().map(|&s| s as usize).collect();
        let offset = self.factor_offset();
        self.rows()
            .map(|r| {
                let factors: Vec<u32> = r.iter().skip(offset).copied().collect();
                ravel_index(&factors, &shape).map_or(u32::MAX, |i| i as u32)
            })
            .collect()
    }

    /// Get a reference to the underlying data.
    #[must_use]
    pub fn data(&self) -> &Array2<u32> {
        &self.data
    }

    /// Consume the sequence and return the underlying data.
    #[must_use]
    pub fn into_data(self) -> Array2<u32> {
        self.data
    }

    /// Check if all values are in range for their column.
    #[must_use]
    pub fn values_in_range(&self) -> bool {
        let limits = self.column_limits();
        self.rows()
            .all(|r| r.iter().zip(&limits).all(|(&v, &max)| v < max))
    }

    fn factor_offset(&self) -> usize {
        usize::from(self.alternating.is_some())
    }

    fn column_limits(&self) -> Vec<u32> {
        self.alternating
            .into_iter()
            .chain(self.factor_levels.iter().copied())
            .collect()
    }
}

impl fmt::Debug for TrialSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TrialSequence({} trials, levels {:?}, alternating {:?}) with data {:?}",
            self.trials(),
            self.factor_levels,
            self.alternating,
            self.data
        )
    }
}

impl fmt::Display for TrialSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} trials over levels {:?}",
            self.trials(),
            self.factor_levels
        )?;
        for (i, row) in self.data.rows().into_iter().enumerate() {
            let row_str: Vec<String> = row.iter().map(|v| v.to_string()).collect();
            let label = if i == 0 { "pre".to_string() } else { i.to_string() };
            writeln!(f, "  {:>4}: {}", label, row_str.join(" "))?;
        }
        Ok(())
    }
}
