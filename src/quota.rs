//! Transition quota matrix.
//!
//! One cell per (alternating state, history window, next condition)
//! combination, holding the number of times that transition may still be
//! used by the current attempt. Cells are stored flat in row-major order so
//! that the "next condition" axis of any context is a contiguous slice.

use tracing::warn;

use crate::error::{Error, Result};
use crate::space::FactorSpace;
use crate::utils::{checked_product, ravel_index};

/// Remaining transition counts for one search attempt.
///
/// Every cell starts at the same allowance. In exact mode that is
/// `trials / size`. In approximate mode the per-cell target
/// `trials / size` may be fractional; a cell then admits `ceil(target)` draws,
/// the number of times a fractional count can be decremented while it is
/// still positive.
///
/// # Example
///
/// ```
/// use counterbalance::quota::QuotaMatrix;
///
/// let mut quotas = QuotaMatrix::new(8, vec![2, 2], false).unwrap();
/// assert_eq!(quotas.allowance(), 2);
/// assert_eq!(quotas.row(&[1]), Some(&[2, 2][..]));
///
/// quotas.decrement(&[1, 0]).unwrap();
/// assert_eq!(quotas.get(&[1, 0]), Some(1));
/// assert_eq!(quotas.remaining(), 7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaMatrix {
    shape: Vec<usize>,
    cells: Vec<u32>,
    target: f64,
    allowance: u32,
}

impl QuotaMatrix {
    /// Create a matrix of the given shape holding `trials` transitions.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the shape is empty or has a zero-length axis
    /// - `trials` is not a multiple of the matrix size and
    ///   `allow_approximate` is false
    pub fn new(trials: usize, shape: Vec<usize>, allow_approximate: bool) -> Result<Self> {
        let size = checked_product(&shape)
            .filter(|&n| n > 0 && !shape.is_empty())
            .ok_or_else(|| {
                Error::invalid_params(format!("invalid quota matrix shape {:?}", shape))
            })?;

        let exact = trials % size == 0;
        if !exact && !allow_approximate {
            return Err(Error::QuotaNotIntegral {
                trials,
                cells: size,
            });
        }

        #[allow(clippy::cast_precision_loss)]
        let target = trials as f64 / size as f64;
        let allowance = u32::try_from(trials.div_ceil(size)).map_err(|_| {
            Error::invalid_params(format!("{} trials per cell is too many", target))
        })?;

        if !exact {
            warn!(
                trials,
                cells = size,
                target,
                allowance,
                "quota is not a whole number, balance will only be approximate"
            );
        }

        Ok(Self {
            cells: vec![allowance; size],
            shape,
            target,
            allowance,
        })
    }

    /// Create the quota matrix for a design space.
    ///
    /// # Errors
    ///
    /// See [`QuotaMatrix::new`].
    pub fn for_space(trials: usize, space: &FactorSpace, allow_approximate: bool) -> Result<Self> {
        Self::new(trials, space.quota_shape(), allow_approximate)
    }

    /// Shape of the matrix.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of cells.
    #[must_use]
    pub fn size(&self) -> usize {
        self.cells.len()
    }

    /// The per-cell target `trials / size`, possibly fractional.
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Number of draws each cell started with.
    #[must_use]
    pub fn allowance(&self) -> u32 {
        self.allowance
    }

    /// Whether every cell's target is a whole number.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.target.fract() == 0.0
    }

    /// Flat offset of a cell, or `None` if the coordinate does not fit.
    #[must_use]
    pub fn offset(&self, coord: &[u32]) -> Option<usize> {
        ravel_index(coord, &self.shape)
    }

    /// Remaining count of a cell.
    #[must_use]
    pub fn get(&self, coord: &[u32]) -> Option<u32> {
        self.offset(coord).map(|o| self.cells[o])
    }

    /// The remaining counts over the last axis for a context.
    ///
    /// `context` holds every coordinate except the last.
    #[must_use]
    pub fn row(&self, context: &[u32]) -> Option<&[u32]> {
        let (&width, outer) = self.shape.split_last()?;
        let start = ravel_index(context, outer)? * width;
        Some(&self.cells[start..start + width])
    }

    /// Use up one draw of a cell and return what is left.
    ///
    /// The caller must only decrement cells that are still positive.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate does not fit the matrix.
    pub fn decrement(&mut self, coord: &[u32]) -> Result<u32> {
        let offset = self.offset(coord).ok_or_else(|| Error::DimensionMismatch {
            expected: format!("coordinate within {:?}", self.shape),
            actual: format!("{:?}", coord),
        })?;
        let cell = &mut self.cells[offset];
        debug_assert!(*cell > 0, "quota cell {:?} already exhausted", coord);
        *cell = cell.saturating_sub(1);
        Ok(*cell)
    }

    /// Sum of all remaining counts.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.cells.iter().map(|&c| c as usize).sum()
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_quota() {
        let q = QuotaMatrix::new(64, vec![4, 4, 4], false).unwrap();
        assert_eq!(q.size(), 64);
        assert_eq!(q.allowance(), 1);
        assert!(q.is_exact());
        assert_eq!(q.remaining(), 64);
        assert!(q.cells().iter().all(|&c| c == 1));
    }

    #[test]
    fn test_non_integral_rejected() {
        let err = QuotaMatrix::new(10, vec![2, 2], false).unwrap_err();
        assert_eq!(err, Error::QuotaNotIntegral { trials: 10, cells: 4 });
    }

    #[test]
    fn test_approximate_quota() {
        let q = QuotaMatrix::new(10, vec![2, 2], true).unwrap();
        assert!(!q.is_exact());
        assert!((q.target() - 2.5).abs() < 1e-12);
        // 2.5 -> 1.5 -> 0.5 -> -0.5: three draws while positive
        assert_eq!(q.allowance(), 3);
    }

    #[test]
    fn test_approximate_fewer_trials_than_cells() {
        let q = QuotaMatrix::new(2, vec![2, 2, 2], true).unwrap();
        assert_eq!(q.allowance(), 1);
    }

    #[test]
    fn test_row_is_last_axis() {
        let mut q = QuotaMatrix::new(12, vec![3, 2, 2], false).unwrap();
        q.decrement(&[2, 1, 0]).unwrap();
        assert_eq!(q.row(&[2, 1]), Some(&[0, 1][..]));
        assert_eq!(q.row(&[2, 0]), Some(&[1, 1][..]));
        assert_eq!(q.row(&[3, 0]), None);
        assert_eq!(q.row(&[2]), None);
    }

    #[test]
    fn test_decrement_out_of_range() {
        let mut q = QuotaMatrix::new(4, vec![2, 2], false).unwrap();
        assert!(q.decrement(&[0, 2]).is_err());
        assert!(q.decrement(&[0]).is_err());
        assert_eq!(q.remaining(), 4);
    }

    #[test]
    fn test_copy_is_independent() {
        let base = QuotaMatrix::new(4, vec![2, 2], false).unwrap();
        let mut working = base.clone();
        working.decrement(&[0, 0]).unwrap();
        assert_eq!(base.get(&[0, 0]), Some(1));
        assert_eq!(working.get(&[0, 0]), Some(0));
    }

    #[test]
    fn test_invalid_shape() {
        assert!(QuotaMatrix::new(4, vec![], false).is_err());
        assert!(QuotaMatrix::new(4, vec![2, 0], false).is_err());
    }
}
