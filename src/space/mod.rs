//! Factorial design space.
//!
//! A [`FactorSpace`] describes the conditions a single trial can take and the
//! shape of the quota matrix that balances transitions between them.
//!
//! ## Notation
//!
//! - `factor_levels`: levels of each factor, e.g. `[2, 2]` for a 2×2 design
//! - **L**: size of the condition alphabet, `product(factor_levels)`
//! - **order**: length of the history window (the `levels` parameter)
//! - **D**: `order + 1`, the number of condition axes of the quota matrix
//! - **A**: number of alternating states, when an alternating dimension is used
//!
//! The quota matrix has shape `[L; D]`, prefixed by `A` when alternating.
//! Conditions are numbered in row-major order over the factor shape, with the
//! alternating state (if any) as the most significant axis.

mod alternator;

pub use alternator::Alternator;

use ndarray::{Array2, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::utils::{checked_product, ravel_index, unravel_index};

/// Upper bound on the number of quota cells a design may have.
pub const MAX_MATRIX_CELLS: usize = 1 << 26;

/// The condition alphabet of a factorial design and its quota-matrix shape.
///
/// Immutable once constructed.
///
/// # Example
///
/// ```
/// use counterbalance::FactorSpace;
///
/// // 2x2 design, balancing pairs of consecutive trials
/// let space = FactorSpace::new(&[2, 2], 1, None).unwrap();
/// assert_eq!(space.conditions(), 4);
/// assert_eq!(space.quota_shape(), vec![4, 4]);
/// assert_eq!(space.tuple(3).to_vec(), vec![1, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FactorSpace {
    factor_levels: Vec<u32>,
    order: usize,
    alternating: Option<u32>,
    conditions: usize,
    matrix_size: usize,
    /// Row `i` holds the tuple of flat index `i`.
    decode: Array2<u32>,
}

impl FactorSpace {
    /// Build the design space.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `factor_levels` is empty or contains a 0
    /// - `order` is 0
    /// - `alternating` is `Some(0)`
    /// - the quota matrix would exceed [`MAX_MATRIX_CELLS`]
    pub fn new(factor_levels: &[u32], order: usize, alternating: Option<u32>) -> Result<Self> {
        if factor_levels.is_empty() {
            return Err(Error::invalid_params(
                "factor_levels must contain at least 1 factor",
            ));
        }
        for (i, &s) in factor_levels.iter().enumerate() {
            if s < 1 {
                return Err(Error::invalid_params(format!(
                    "levels for factor {} must be at least 1, got {}",
                    i, s
                )));
            }
        }
        if order < 1 {
            return Err(Error::invalid_params("levels must be 1 or higher"));
        }
        if alternating == Some(0) {
            return Err(Error::invalid_params(
                "alternating dimension must have at least 1 state",
            ));
        }

        let level_sizes: Vec<usize> = factor_levels.iter().map(|&s| s as usize).collect();
        let too_large = || {
            Error::invalid_params(format!(
                "design {:?} with history {} exceeds {} quota cells",
                factor_levels, order, MAX_MATRIX_CELLS
            ))
        };

        let conditions = checked_product(&level_sizes).ok_or_else(too_large)?;
        let mut shape = vec![conditions; order + 1];
        if let Some(a) = alternating {
            shape.insert(0, a as usize);
        }
        let matrix_size = checked_product(&shape)
            .filter(|&n| n <= MAX_MATRIX_CELLS)
            .ok_or_else(too_large)?;

        let mut tuple_shape = level_sizes;
        if let Some(a) = alternating {
            tuple_shape.insert(0, a as usize);
        }
        let rows = conditions * alternating.map_or(1, |a| a as usize);
        let mut decode = Array2::zeros((rows, tuple_shape.len()));
        for (flat, mut row) in decode.rows_mut().into_iter().enumerate() {
            if let Some(coords) = unravel_index(flat, &tuple_shape) {
                for (cell, c) in row.iter_mut().zip(coords) {
                    *cell = c;
                }
            }
        }

        Ok(Self {
            factor_levels: factor_levels.to_vec(),
            order,
            alternating,
            conditions,
            matrix_size,
            decode,
        })
    }

    /// Levels of each factor.
    #[must_use]
    pub fn factor_levels(&self) -> &[u32] {
        &self.factor_levels
    }

    /// Number of factors, not counting the alternating dimension.
    #[must_use]
    pub fn factors(&self) -> usize {
        self.factor_levels.len()
    }

    /// Size of the condition alphabet (L).
    #[must_use]
    pub fn conditions(&self) -> usize {
        self.conditions
    }

    /// Length of the history window.
    #[must_use]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of condition axes of the quota matrix (D = order + 1).
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.order + 1
    }

    /// Number of alternating states, if alternating.
    #[must_use]
    pub fn alternating_states(&self) -> Option<u32> {
        self.alternating
    }

    /// Whether the design has an alternating dimension.
    #[must_use]
    pub fn is_alternating(&self) -> bool {
        self.alternating.is_some()
    }

    /// Shape of the quota matrix.
    #[must_use]
    pub fn quota_shape(&self) -> Vec<usize> {
        let mut shape = vec![self.conditions; self.dimensions()];
        if let Some(a) = self.alternating {
            shape.insert(0, a as usize);
        }
        shape
    }

    /// Number of cells of the quota matrix.
    #[must_use]
    pub fn matrix_size(&self) -> usize {
        self.matrix_size
    }

    /// Number of distinct seeds (`L^D`).
    ///
    /// The alternating state of a seed is fixed by the alternator start, so it
    /// does not contribute.
    #[must_use]
    pub fn seed_space(&self) -> usize {
        self.matrix_size / self.alternating.map_or(1, |a| a as usize)
    }

    /// Width of a decoded tuple: one column per factor plus the alternating state.
    #[must_use]
    pub fn tuple_width(&self) -> usize {
        self.decode.ncols()
    }

    /// The full decode table, one row per flat index.
    #[must_use]
    pub fn decode_table(&self) -> &Array2<u32> {
        &self.decode
    }

    /// Flat index of a condition combined with its alternating state.
    ///
    /// Without alternation the state is ignored.
    #[must_use]
    pub fn flat_index(&self, alternating_state: u32, condition: u32) -> usize {
        match self.alternating {
            Some(_) => condition as usize + self.conditions * alternating_state as usize,
            None => condition as usize,
        }
    }

    /// The tuple of a flat index.
    ///
    /// # Panics
    ///
    /// Panics if `flat` is not smaller than `conditions() * alternating_states()`.
    #[must_use]
    pub fn tuple(&self, flat: usize) -> ArrayView1<'_, u32> {
        self.decode.row(flat)
    }

    /// Flat index of a full tuple, the inverse of [`FactorSpace::tuple`].
    #[must_use]
    pub fn encode(&self, tuple: &[u32]) -> Option<usize> {
        let mut shape: Vec<usize> = self.factor_levels.iter().map(|&s| s as usize).collect();
        if let Some(a) = self.alternating {
            shape.insert(0, a as usize);
        }
        ravel_index(tuple, &shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_single_factor() {
        let space = FactorSpace::new(&[2], 1, None).unwrap();
        assert_eq!(space.conditions(), 2);
        assert_eq!(space.dimensions(), 2);
        assert_eq!(space.quota_shape(), vec![2, 2]);
        assert_eq!(space.matrix_size(), 4);
        assert_eq!(space.seed_space(), 4);
        assert_eq!(space.tuple_width(), 1);
    }

    #[test]
    fn test_alternating_shape() {
        let space = FactorSpace::new(&[2, 2], 2, Some(2)).unwrap();
        assert_eq!(space.conditions(), 4);
        assert_eq!(space.quota_shape(), vec![2, 4, 4, 4]);
        assert_eq!(space.matrix_size(), 128);
        assert_eq!(space.seed_space(), 64);
        assert_eq!(space.tuple_width(), 3);
    }

    #[test]
    fn test_decode_row_major() {
        let space = FactorSpace::new(&[2, 3], 1, None).unwrap();
        let table = space.decode_table();
        assert_eq!(table.nrows(), 6);
        assert_eq!(table.row(0).to_vec(), vec![0, 0]);
        assert_eq!(table.row(1).to_vec(), vec![0, 1]);
        assert_eq!(table.row(3).to_vec(), vec![1, 0]);
        assert_eq!(table.row(5).to_vec(), vec![1, 2]);
    }

    #[test]
    fn test_decode_alternating_prefix() {
        let space = FactorSpace::new(&[2, 2], 1, Some(2)).unwrap();
        // condition 2 = (1, 0) in alternating state 1
        let flat = space.flat_index(1, 2);
        assert_eq!(flat, 6);
        assert_eq!(space.tuple(flat).to_vec(), vec![1, 1, 0]);
        assert_eq!(space.encode(&[1, 1, 0]), Some(6));
    }

    #[test]
    fn test_flat_index_ignores_state_without_alternation() {
        let space = FactorSpace::new(&[4], 1, None).unwrap();
        assert_eq!(space.flat_index(1, 3), 3);
    }

    #[test]
    fn test_invalid_params() {
        assert!(FactorSpace::new(&[], 1, None).is_err());
        assert!(FactorSpace::new(&[2, 0], 1, None).is_err());
        assert!(FactorSpace::new(&[2], 0, None).is_err());
        assert!(FactorSpace::new(&[2], 1, Some(0)).is_err());
    }

    #[test]
    fn test_oversized_design_rejected() {
        let err = FactorSpace::new(&[1024], 3, None).unwrap_err();
        assert!(err.is_parameter_error());
    }

    #[test]
    fn test_single_level_factor() {
        let space = FactorSpace::new(&[1], 2, None).unwrap();
        assert_eq!(space.conditions(), 1);
        assert_eq!(space.matrix_size(), 1);
        assert_eq!(space.tuple(0).to_vec(), vec![0]);
    }
}
