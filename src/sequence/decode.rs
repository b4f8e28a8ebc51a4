//! Mapping flat condition indices to factor tuples.

use ndarray::Array2;

use super::TrialSequence;
use crate::space::FactorSpace;

/// Decodes chains of flat indices through a [`FactorSpace`]'s decode table.
///
/// Stateless apart from the borrowed design.
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    space: &'a FactorSpace,
}

impl<'a> Decoder<'a> {
    /// Create a decoder for `space`.
    #[must_use]
    pub fn new(space: &'a FactorSpace) -> Self {
        Self { space }
    }

    /// The tuple of a single flat index.
    ///
    /// # Panics
    ///
    /// Panics if `flat` lies outside the design's decode table.
    #[must_use]
    pub fn decode_one(&self, flat: usize) -> Vec<u32> {
        self.space.tuple(flat).to_vec()
    }

    /// Decode a full chain, predecessor first.
    ///
    /// # Panics
    ///
    /// Panics if the chain is empty or holds an index outside the decode
    /// table. The search only produces indices within the table.
    #[must_use]
    pub fn decode(&self, chain: &[usize]) -> TrialSequence {
        let table = self.space.decode_table();
        let mut data = Array2::zeros((chain.len(), table.ncols()));
        for (mut row, &flat) in data.rows_mut().into_iter().zip(chain) {
            row.assign(&table.row(flat));
        }
        TrialSequence::new(
            data,
            self.space.factor_levels().to_vec(),
            self.space.alternating_states(),
        )
    }
}
