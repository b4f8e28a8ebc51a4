//! Parallel generation of multi-block sessions.
//!
//! This module generates one sequence per block on the Rayon thread pool.
//! Enable with the `parallel` feature flag.
//!
//! # Usage
//!
//! ```ignore
//! use counterbalance::parallel::par_generate_blocks;
//! use counterbalance::CounterbalanceBuilder;
//!
//! let generator = CounterbalanceBuilder::new()
//!     .trials(64)
//!     .factor_levels(vec![2, 2])
//!     .levels(2)
//!     .build()
//!     .unwrap();
//! let blocks = par_generate_blocks(&generator, 8, 2024).unwrap();
//! assert_eq!(blocks, generator.generate_blocks_seeded(8, 2024).unwrap());
//! ```
//!
//! # Performance
//!
//! Each block's search is independent, so a session scales with the number
//! of cores. Block `b` is seeded with `base_seed + b`, which makes the result
//! independent of scheduling and identical to the sequential
//! [`Counterbalancer::generate_blocks_seeded`].

use rayon::prelude::*;

use crate::builder::{block_seed, Counterbalancer};
use crate::error::Result;
use crate::sequence::TrialSequence;

/// Generate `blocks` sequences in parallel, block `b` seeded with
/// `base_seed + b`.
///
/// # Errors
///
/// Returns an error if any block is infeasible.
pub fn par_generate_blocks(
    generator: &Counterbalancer,
    blocks: usize,
    base_seed: u64,
) -> Result<Vec<TrialSequence>> {
    (0..blocks)
        .into_par_iter()
        .map(|b| generator.generate_seeded(block_seed(base_seed, b)))
        .collect()
}

/// Build a design and generate `blocks` sequences of it in parallel.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or any block is
/// infeasible.
pub fn par_counterbalance(
    trials: usize,
    factor_levels: Vec<u32>,
    levels: usize,
    blocks: usize,
    base_seed: u64,
) -> Result<Vec<TrialSequence>> {
    let generator = crate::CounterbalanceBuilder::new()
        .trials(trials)
        .factor_levels(factor_levels)
        .levels(levels)
        .build()?;
    par_generate_blocks(&generator, blocks, base_seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::verify_balance;
    use crate::CounterbalanceBuilder;

    #[test]
    fn test_par_matches_sequential() {
        let generator = CounterbalanceBuilder::new()
            .trials(64)
            .factor_levels(vec![2, 2])
            .levels(2)
            .build()
            .unwrap();

        let parallel = par_generate_blocks(&generator, 6, 77).unwrap();
        let sequential = generator.generate_blocks_seeded(6, 77).unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_par_blocks_balanced() {
        let blocks = par_counterbalance(32, vec![2, 2], 1, 4, 5).unwrap();
        assert_eq!(blocks.len(), 4);
        for seq in &blocks {
            let result = verify_balance(seq, 1);
            assert!(result.is_balanced, "{:?}", result.issues);
        }
    }

    #[test]
    fn test_par_invalid_params() {
        assert!(par_counterbalance(10, vec![2], 1, 2, 0).is_err());
    }

    #[test]
    fn test_par_zero_blocks() {
        let generator = CounterbalanceBuilder::new()
            .trials(4)
            .factor_levels(vec![2])
            .build()
            .unwrap();
        assert!(par_generate_blocks(&generator, 0, 0).unwrap().is_empty());
    }
}
