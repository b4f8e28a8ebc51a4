//! Randomized backtracking search for counterbalanced sequences.
//!
//! The search walks the quota matrix like an Eulerian walk through a weighted
//! transition graph: every step keeps the history window of the previous step,
//! shifted by one, and picks the next condition at random among the ones whose
//! transition quota is not used up yet.
//!
//! ## Attempts
//!
//! 1. A seed coordinate over all `D` condition axes is installed as the first
//!    trial. Its second-to-last coordinate becomes the virtual predecessor.
//! 2. Each further trial takes the trailing `order` coordinates of the
//!    previous one, and the first digit of a random permutation of the
//!    alphabet that still has quota left.
//! 3. A step with no eligible digit abandons the attempt (a restart).
//!
//! A seed is retried with fresh quotas up to `retries_per_seed` times before it
//! is discarded and a new one is drawn. The search fails once every seed has
//! been discarded or `max_attempts` attempts were made.

mod constraint;
mod seeds;

pub use constraint::TrialConstraint;
pub use seeds::{SeedDraw, SeedPool};

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::quota::QuotaMatrix;
use crate::space::{Alternator, FactorSpace};

/// Diagnostic counters of one generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchStats {
    /// Attempts started, including the successful one.
    pub attempts: usize,
    /// Attempts abandoned at a dead end.
    pub restarts: usize,
    /// Seeds marked unproductive.
    pub seeds_discarded: usize,
}

impl SearchStats {
    fn infeasible(self) -> Error {
        Error::Infeasible {
            attempts: self.attempts,
            restarts: self.restarts,
            seeds_discarded: self.seeds_discarded,
        }
    }
}

/// A successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Flat indices of the virtual predecessor followed by every trial.
    pub chain: Vec<usize>,
    /// The seed the sequence grew from.
    pub seed: Vec<u32>,
    /// Search diagnostics.
    pub stats: SearchStats,
}

/// The search state shared by every attempt of one generation call.
///
/// The builder borrows the design; it owns nothing that outlives a call.
pub struct SequenceBuilder<'a> {
    space: &'a FactorSpace,
    quotas: &'a QuotaMatrix,
    trials: usize,
    alternator_start: u32,
    fixed_seed: Option<&'a [u32]>,
    constraint: Option<&'a dyn TrialConstraint>,
    retries_per_seed: usize,
    max_attempts: usize,
}

impl<'a> SequenceBuilder<'a> {
    /// Prepare a search of `trials` trials over `quotas`.
    ///
    /// `quotas` must have the shape of `space`. Retries default to
    /// `3 × matrix_size` per seed and the attempt budget to enough retries for
    /// every seed of the design.
    #[must_use]
    pub fn new(space: &'a FactorSpace, quotas: &'a QuotaMatrix, trials: usize) -> Self {
        let retries_per_seed = default_retries_per_seed(space);
        Self {
            space,
            quotas,
            trials,
            alternator_start: 0,
            fixed_seed: None,
            constraint: None,
            retries_per_seed,
            max_attempts: default_max_attempts(space),
        }
    }

    /// Start the alternating dimension at `start`.
    #[must_use]
    pub fn alternator_start(mut self, start: u32) -> Self {
        self.alternator_start = start;
        self
    }

    /// Use `seed` as the first seed instead of drawing one.
    #[must_use]
    pub fn fixed_seed(mut self, seed: Option<&'a [u32]>) -> Self {
        self.fixed_seed = seed;
        self
    }

    /// Veto candidate trials with `constraint`.
    #[must_use]
    pub fn constraint(mut self, constraint: Option<&'a dyn TrialConstraint>) -> Self {
        self.constraint = constraint;
        self
    }

    /// Number of failed attempts after which a seed is discarded.
    #[must_use]
    pub fn retries_per_seed(mut self, retries: usize) -> Self {
        self.retries_per_seed = retries.max(1);
        self
    }

    /// Total number of attempts before giving up.
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Run the search.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSeed`] for a malformed fixed seed, and
    /// [`Error::Infeasible`] when every seed was discarded or the attempt
    /// budget ran out.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SearchOutcome> {
        let mut pool = SeedPool::new(self.space);
        let mut stats = SearchStats::default();

        let mut seed = match self.fixed_seed {
            Some(seed) => self.check_seed(seed)?,
            None => match pool.draw(rng) {
                SeedDraw::Seed(seed) => seed,
                SeedDraw::Exhausted => return Err(stats.infeasible()),
            },
        };
        let mut seed_tried = 0;

        loop {
            if stats.attempts >= self.max_attempts {
                warn!(
                    attempts = stats.attempts,
                    restarts = stats.restarts,
                    "attempt budget exhausted"
                );
                return Err(stats.infeasible());
            }

            if seed_tried >= self.retries_per_seed {
                pool.discard(&seed);
                stats.seeds_discarded = pool.discarded();
                debug!(
                    seed = ?seed,
                    discarded = stats.seeds_discarded,
                    remaining = pool.available(),
                    "seed discarded"
                );
                seed = match pool.draw(rng) {
                    SeedDraw::Seed(next) => next,
                    SeedDraw::Exhausted => {
                        warn!(attempts = stats.attempts, "every seed is unproductive");
                        return Err(stats.infeasible());
                    }
                };
                seed_tried = 0;
            }

            seed_tried += 1;
            stats.attempts += 1;

            match self.attempt(&seed, rng)? {
                Some(chain) => {
                    info!(
                        trials = self.trials,
                        attempts = stats.attempts,
                        restarts = stats.restarts,
                        "counterbalanced sequence found"
                    );
                    return Ok(SearchOutcome { chain, seed, stats });
                }
                None => {
                    stats.restarts += 1;
                    trace!(seed = ?seed, restarts = stats.restarts, "restarting");
                }
            }
        }
    }

    fn check_seed(&self, seed: &[u32]) -> Result<Vec<u32>> {
        let dimensions = self.space.dimensions();
        let conditions = self.space.conditions();
        if seed.len() != dimensions || seed.iter().any(|&c| c as usize >= conditions) {
            return Err(Error::InvalidSeed {
                seed: seed.to_vec(),
                dimensions,
                conditions,
            });
        }
        Ok(seed.to_vec())
    }

    /// One attempt from `seed`, returning the chain of flat indices on success.
    fn attempt<R: Rng + ?Sized>(&self, seed: &[u32], rng: &mut R) -> Result<Option<Vec<usize>>> {
        let space = self.space;
        let order = space.order();
        let mut quotas = self.quotas.clone();
        let mut alternator = match space.alternating_states() {
            Some(states) => Some(Alternator::new(states, self.alternator_start)?),
            None => None,
        };

        let mut coord = Vec::with_capacity(self.quotas.shape().len());
        if let Some(a) = alternator {
            coord.push(a.index());
        }
        coord.extend_from_slice(seed);

        // The predecessor happened one alternation step before the seed
        let predecessor = seed[seed.len() - 2];
        let predecessor_state = alternator.map_or(0, Alternator::previous_index);
        let current_state = alternator.map_or(0, Alternator::index);

        let mut chain = Vec::with_capacity(self.trials + 1);
        chain.push(space.flat_index(predecessor_state, predecessor));
        chain.push(space.flat_index(current_state, seed[seed.len() - 1]));
        quotas.decrement(&coord)?;

        let mut history: Vec<Vec<u32>> = Vec::new();
        if let Some(c) = self.constraint {
            history.push(space.tuple(chain[0]).to_vec());
            let first = space.tuple(chain[1]).to_vec();
            if !c.allows(&history, &first) {
                return Ok(None);
            }
            history.push(first);
        }

        let mut digits: Vec<u32> = (0..space.conditions() as u32).collect();

        for _ in 1..self.trials {
            let mut next = Vec::with_capacity(coord.len());
            let mut state = 0;
            if let Some(a) = alternator.as_mut() {
                *a = a.advance();
                state = a.index();
                next.push(state);
            }
            next.extend_from_slice(&coord[coord.len() - order..]);

            digits.shuffle(rng);
            let choice = {
                let row = quotas.row(&next).ok_or_else(|| Error::IndexOutOfBounds {
                    index: next.len(),
                    size: quotas.shape().len(),
                })?;
                digits.iter().copied().find(|&d| {
                    row[d as usize] > 0
                        && self.constraint.map_or(true, |c| {
                            let candidate = space.tuple(space.flat_index(state, d));
                            c.allows(&history, &candidate.to_vec())
                        })
                })
            };

            let Some(digit) = choice else {
                return Ok(None);
            };

            next.push(digit);
            quotas.decrement(&next)?;
            let flat = space.flat_index(state, digit);
            chain.push(flat);
            if self.constraint.is_some() {
                history.push(space.tuple(flat).to_vec());
            }
            coord = next;
        }

        Ok(Some(chain))
    }
}

/// Failed attempts tolerated per seed: `3 × matrix_size`.
#[must_use]
pub fn default_retries_per_seed(space: &FactorSpace) -> usize {
    space.matrix_size().saturating_mul(3)
}

/// Attempt budget: every seed retried the default number of times, plus one
/// extra round.
#[must_use]
pub fn default_max_attempts(space: &FactorSpace) -> usize {
    default_retries_per_seed(space).saturating_mul(space.seed_space().saturating_add(1))
}
