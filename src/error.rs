//! Error types for the counterbalance library.
//!
//! This module provides error handling using the `thiserror` crate. Errors fall
//! into two families: parameter errors, raised before any search starts, and
//! the infeasible-design error, raised once the search has run out of seeds or
//! attempts.

use thiserror::Error;

/// The main error type for the counterbalance library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ============ Parameter Validation Errors ============
    /// Invalid design parameters.
    #[error("invalid design parameters: {message}")]
    InvalidParams {
        /// Description of what is invalid.
        message: String,
    },

    /// The trial count does not split evenly over the quota matrix.
    #[error(
        "number of trials not a whole multiple of the counterbalancing conditions: \
         {trials} / {cells} is not an integer (allow approximate quotas to proceed anyway)"
    )]
    QuotaNotIntegral {
        /// Requested number of trials.
        trials: usize,
        /// Number of cells in the quota matrix.
        cells: usize,
    },

    /// A caller-supplied seed coordinate does not fit the quota matrix.
    #[error("invalid seed {seed:?}: expected {dimensions} coordinates in 0..{conditions}")]
    InvalidSeed {
        /// The rejected seed.
        seed: Vec<u32>,
        /// Number of coordinates a seed must have.
        dimensions: usize,
        /// Exclusive upper bound of each coordinate.
        conditions: usize,
    },

    // ============ Search Errors ============
    /// No counterbalanced sequence could be found for the design.
    #[error(
        "counterbalanced sequence impossible with given parameters \
         ({attempts} attempts, {restarts} restarts, {seeds_discarded} seeds discarded)"
    )]
    Infeasible {
        /// Total number of attempts made.
        attempts: usize,
        /// Number of attempts that hit a dead end.
        restarts: usize,
        /// Number of seeds marked unproductive.
        seeds_discarded: usize,
    },

    // ============ Dimension Errors ============
    /// Array dimensions are inconsistent.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension description.
        expected: String,
        /// Actual dimension description.
        actual: String,
    },

    /// Index is out of bounds.
    #[error("index {index} is out of bounds for size {size}")]
    IndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// The maximum valid size.
        size: usize,
    },
}

/// A specialized `Result` type for counterbalance operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Create a new `InvalidParams` error.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    /// Whether this error was caused by the caller's parameters.
    ///
    /// Parameter errors are raised before any search begins and are always
    /// fixed by changing the inputs.
    #[must_use]
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidParams { .. } | Self::QuotaNotIntegral { .. } | Self::InvalidSeed { .. }
        )
    }

    /// Whether this error reports that no sequence exists for the design.
    #[must_use]
    pub fn is_infeasible(&self) -> bool {
        matches!(self, Self::Infeasible { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::QuotaNotIntegral { trials: 10, cells: 4 };
        assert!(err.to_string().contains("10 / 4"));

        let err = Error::Infeasible {
            attempts: 12,
            restarts: 12,
            seeds_discarded: 1,
        };
        assert!(err.to_string().contains("impossible"));
        assert!(err.to_string().contains("12 attempts"));

        let err = Error::InvalidSeed {
            seed: vec![0, 5],
            dimensions: 2,
            conditions: 4,
        };
        assert!(err.to_string().contains("[0, 5]"));
        assert!(err.to_string().contains("0..4"));
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::invalid_params("bad").is_parameter_error());
        assert!(Error::QuotaNotIntegral { trials: 3, cells: 4 }.is_parameter_error());
        assert!(!Error::QuotaNotIntegral { trials: 3, cells: 4 }.is_infeasible());

        let infeasible = Error::Infeasible {
            attempts: 1,
            restarts: 1,
            seeds_discarded: 0,
        };
        assert!(infeasible.is_infeasible());
        assert!(!infeasible.is_parameter_error());
    }

    #[test]
    fn test_error_equality() {
        let err1 = Error::invalid_params("levels must be at least 1");
        let err2 = Error::invalid_params("levels must be at least 1");
        let err3 = Error::invalid_params("trials must be at least 1");

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
