//! Seed selection with an exclusion bitmap.

use rand::Rng;

use crate::space::FactorSpace;
use crate::utils::{ravel_index, unravel_index};

/// Result of drawing a seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedDraw {
    /// A seed coordinate that has not been discarded yet.
    Seed(Vec<u32>),
    /// Every seed has been discarded.
    Exhausted,
}

/// The seeds still worth trying during one generation call.
///
/// A seed is a coordinate over `D` condition axes; the alternating state is
/// not part of it. Discarded seeds are tracked in a bitmap over the flat seed
/// index.
#[derive(Debug, Clone)]
pub struct SeedPool {
    shape: Vec<usize>,
    discarded: Vec<bool>,
    discarded_count: usize,
}

impl SeedPool {
    /// A pool containing every seed of the design.
    #[must_use]
    pub fn new(space: &FactorSpace) -> Self {
        Self {
            shape: vec![space.conditions(); space.dimensions()],
            discarded: vec![false; space.seed_space()],
            discarded_count: 0,
        }
    }

    /// Draw a seed uniformly among the ones not yet discarded.
    ///
    /// Equivalent to redrawing uniform coordinates until one is not excluded,
    /// but terminates after a single random draw.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SeedDraw {
        let available = self.available();
        if available == 0 {
            return SeedDraw::Exhausted;
        }

        let pick = rng.gen_range(0..available);
        let flat = self
            .discarded
            .iter()
            .enumerate()
            .filter(|(_, gone)| !**gone)
            .nth(pick)
            .map(|(i, _)| i);

        match flat.and_then(|i| unravel_index(i, &self.shape)) {
            Some(seed) => SeedDraw::Seed(seed),
            None => SeedDraw::Exhausted,
        }
    }

    /// Mark a seed as unproductive.
    ///
    /// Returns `false` if the seed was already discarded or does not belong to
    /// the pool.
    pub fn discard(&mut self, seed: &[u32]) -> bool {
        let Some(flat) = ravel_index(seed, &self.shape) else {
            return false;
        };
        if self.discarded[flat] {
            return false;
        }
        self.discarded[flat] = true;
        self.discarded_count += 1;
        true
    }

    /// Whether a seed has been discarded.
    #[must_use]
    pub fn is_discarded(&self, seed: &[u32]) -> bool {
        ravel_index(seed, &self.shape).is_some_and(|flat| self.discarded[flat])
    }

    /// Number of seeds discarded so far.
    #[must_use]
    pub fn discarded(&self) -> usize {
        self.discarded_count
    }

    /// Number of seeds that can still be drawn.
    #[must_use]
    pub fn available(&self) -> usize {
        self.discarded.len() - self.discarded_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn binary_pool() -> SeedPool {
        let space = FactorSpace::new(&[2], 1, None).unwrap();
        SeedPool::new(&space)
    }

    #[test]
    fn test_draw_within_shape() {
        let pool = binary_pool();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            match pool.draw(&mut rng) {
                SeedDraw::Seed(seed) => {
                    assert_eq!(seed.len(), 2);
                    assert!(seed.iter().all(|&c| c < 2));
                }
                SeedDraw::Exhausted => panic!("fresh pool cannot be exhausted"),
            }
        }
    }

    #[test]
    fn test_discarded_seed_never_drawn() {
        let mut pool = binary_pool();
        assert!(pool.discard(&[0, 1]));
        assert!(pool.discard(&[1, 1]));
        assert!(pool.is_discarded(&[0, 1]));

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            match pool.draw(&mut rng) {
                SeedDraw::Seed(seed) => assert!(seed == vec![0, 0] || seed == vec![1, 0]),
                SeedDraw::Exhausted => panic!("two seeds remain"),
            }
        }
    }

    #[test]
    fn test_exhaustion() {
        let mut pool = binary_pool();
        for seed in [[0, 0], [0, 1], [1, 0], [1, 1]] {
            assert!(pool.discard(&seed));
        }
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.discarded(), 4);

        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(pool.draw(&mut rng), SeedDraw::Exhausted);
    }

    #[test]
    fn test_discard_twice_counts_once() {
        let mut pool = binary_pool();
        assert!(pool.discard(&[1, 0]));
        assert!(!pool.discard(&[1, 0]));
        assert!(!pool.discard(&[2, 0]));
        assert_eq!(pool.discarded(), 1);
    }

    #[test]
    fn test_alternating_state_not_part_of_seed() {
        let space = FactorSpace::new(&[2, 2], 2, Some(2)).unwrap();
        let pool = SeedPool::new(&space);
        assert_eq!(pool.available(), 64);
    }
}
