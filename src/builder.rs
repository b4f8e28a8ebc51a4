//! Builder pattern for counterbalanced sequence generation.
//!
//! The builder collects the design parameters, validates them once, and
//! produces a reusable [`Counterbalancer`] that can generate any number of
//! sequences (for example one per experimental block).
//!
//! # Example
//!
//! ```
//! use counterbalance::CounterbalanceBuilder;
//!
//! // Flanker-style 2x2 design, balancing triplets of consecutive trials
//! let generator = CounterbalanceBuilder::new()
//!     .trials(64)
//!     .factor_levels(vec![2, 2])
//!     .levels(2)
//!     .build()
//!     .unwrap();
//!
//! let seq = generator.generate().unwrap();
//! assert_eq!(seq.len(), 65);
//! ```
//!
//! # Alternating dimension
//!
//! An alternating dimension cycles through `A` states on a fixed schedule
//! (e.g. response hand per trial) and is balanced orthogonally to the random
//! factors. Its arity is given explicitly with
//! [`CounterbalanceBuilder::alternating_levels`]. The historical boolean form,
//! where "alternating" meant exactly two states, is available as
//! [`CounterbalanceBuilder::alternate`].

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::quota::QuotaMatrix;
use crate::search::{SearchStats, SequenceBuilder, TrialConstraint};
use crate::sequence::{Decoder, TrialSequence};
use crate::space::FactorSpace;

/// Where the alternating dimension starts for each generated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlternatorStart {
    /// Always start at this state (reduced modulo the number of states).
    Fixed(u32),
    /// Draw a uniformly random start state for every sequence.
    Random,
}

impl Default for AlternatorStart {
    fn default() -> Self {
        Self::Fixed(0)
    }
}

fn default_order() -> usize {
    1
}

/// Plain-data description of a counterbalanced design.
///
/// This is what a [`CounterbalanceBuilder`] collects, and it can be loaded
/// from configuration when the `serde` feature is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesignParams {
    /// Number of trials per sequence.
    pub trials: usize,
    /// Levels of each factor.
    pub factor_levels: Vec<u32>,
    /// Length of the balanced history window.
    #[cfg_attr(feature = "serde", serde(default = "default_order"))]
    pub levels: usize,
    /// Number of alternating states, if any.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternating_levels: Option<u32>,
    /// Start of the alternating dimension.
    #[cfg_attr(feature = "serde", serde(default))]
    pub alternator_start: AlternatorStart,
    /// Accept a per-cell quota that is not a whole number.
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_approximate_quota: bool,
    /// Seed coordinate tried first instead of a random one.
    #[cfg_attr(feature = "serde", serde(default))]
    pub fixed_seed: Option<Vec<u32>>,
    /// Total attempt budget; defaults to enough for every seed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub max_attempts: Option<usize>,
}

impl DesignParams {
    /// Parameters for `trials` trials over `factor_levels`, first-order balance.
    #[must_use]
    pub fn new(trials: usize, factor_levels: Vec<u32>) -> Self {
        Self {
            trials,
            factor_levels,
            levels: default_order(),
            alternating_levels: None,
            alternator_start: AlternatorStart::default(),
            allow_approximate_quota: false,
            fixed_seed: None,
            max_attempts: None,
        }
    }

    /// Validate the parameters without building the quota matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of range. See
    /// [`Counterbalancer::new`] for the full list.
    pub fn validate(&self) -> Result<()> {
        self.space().map(|_| ())
    }

    fn space(&self) -> Result<FactorSpace> {
        if self.trials == 0 {
            return Err(Error::invalid_params("trials must be at least 1"));
        }
        let space = FactorSpace::new(&self.factor_levels, self.levels, self.alternating_levels)?;

        if let Some(seed) = &self.fixed_seed {
            let dimensions = space.dimensions();
            let conditions = space.conditions();
            if seed.len() != dimensions || seed.iter().any(|&c| c as usize >= conditions) {
                return Err(Error::InvalidSeed {
                    seed: seed.clone(),
                    dimensions,
                    conditions,
                });
            }
        }
        Ok(space)
    }
}

impl fmt::Display for DesignParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} trials over {:?}, history {}",
            self.trials, self.factor_levels, self.levels
        )?;
        if let Some(a) = self.alternating_levels {
            write!(f, ", alternating {}", a)?;
        }
        Ok(())
    }
}

/// Builder for [`Counterbalancer`].
///
/// # Example
///
/// ```
/// use counterbalance::{AlternatorStart, CounterbalanceBuilder};
///
/// // Prime-probe design: 2x2 factors, second-order balance, response hand
/// // alternating between trials
/// let generator = CounterbalanceBuilder::new()
///     .trials(128)
///     .factor_levels(vec![2, 2])
///     .levels(2)
///     .alternating_levels(2)
///     .alternator_start(AlternatorStart::Fixed(1))
///     .build()
///     .unwrap();
///
/// let seq = generator.generate().unwrap();
/// let hands = seq.alternation_states().unwrap();
/// assert_eq!(&hands[1..5], &[1, 0, 1, 0]);
/// ```
#[derive(Clone, Default)]
pub struct CounterbalanceBuilder {
    trials: Option<usize>,
    factor_levels: Option<Vec<u32>>,
    levels: Option<usize>,
    alternating_levels: Option<u32>,
    alternator_start: AlternatorStart,
    allow_approximate_quota: bool,
    fixed_seed: Option<Vec<u32>>,
    max_attempts: Option<usize>,
    constraint: Option<Arc<dyn TrialConstraint>>,
}

impl CounterbalanceBuilder {
    /// Create a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a complete set of parameters.
    #[must_use]
    pub fn from_params(params: DesignParams) -> Self {
        Self {
            trials: Some(params.trials),
            factor_levels: Some(params.factor_levels),
            levels: Some(params.levels),
            alternating_levels: params.alternating_levels,
            alternator_start: params.alternator_start,
            allow_approximate_quota: params.allow_approximate_quota,
            fixed_seed: params.fixed_seed,
            max_attempts: params.max_attempts,
            constraint: None,
        }
    }

    /// Set the number of trials per sequence.
    #[must_use]
    pub fn trials(mut self, trials: usize) -> Self {
        self.trials = Some(trials);
        self
    }

    /// Set the levels of each factor.
    #[must_use]
    pub fn factor_levels(mut self, factor_levels: Vec<u32>) -> Self {
        self.factor_levels = Some(factor_levels);
        self
    }

    /// Set the length of the balanced history window.
    ///
    /// `1` balances pairs of consecutive trials, `2` triplets, and so on.
    /// Default is 1.
    #[must_use]
    pub fn levels(mut self, levels: usize) -> Self {
        self.levels = Some(levels);
        self
    }

    /// Add an alternating dimension with `states` states.
    ///
    /// The value is the number of states, used as given.
    #[must_use]
    pub fn alternating_levels(mut self, states: u32) -> Self {
        self.alternating_levels = Some(states);
        self
    }

    /// Enable or disable a two-state alternating dimension.
    ///
    /// Historically the generator took a boolean "alternating" flag and
    /// derived two states from it; this keeps that form available.
    #[must_use]
    pub fn alternate(mut self, enabled: bool) -> Self {
        self.alternating_levels = enabled.then_some(2);
        self
    }

    /// Set where the alternating dimension starts.
    #[must_use]
    pub fn alternator_start(mut self, start: AlternatorStart) -> Self {
        self.alternator_start = start;
        self
    }

    /// Draw a random alternating start for every generated sequence.
    #[must_use]
    pub fn random_alternator_start(self) -> Self {
        self.alternator_start(AlternatorStart::Random)
    }

    /// Accept a per-cell quota that is not a whole number.
    ///
    /// The resulting sequence is only approximately balanced.
    #[must_use]
    pub fn allow_approximate_quota(mut self, allow: bool) -> Self {
        self.allow_approximate_quota = allow;
        self
    }

    /// Try `seed` first instead of a random seed.
    ///
    /// A seed has `levels + 1` condition indices. If it keeps failing it is
    /// replaced by random seeds like any other.
    #[must_use]
    pub fn fixed_seed(mut self, seed: Vec<u32>) -> Self {
        self.fixed_seed = Some(seed);
        self
    }

    /// Limit the total number of search attempts per sequence.
    #[must_use]
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Veto candidate trials with a constraint.
    ///
    /// # Example
    ///
    /// ```
    /// use counterbalance::CounterbalanceBuilder;
    ///
    /// // Never show the same condition twice in a row. Each non-repeating
    /// // pair of the 3 conditions then occurs once.
    /// let generator = CounterbalanceBuilder::new()
    ///     .trials(6)
    ///     .factor_levels(vec![3])
    ///     .allow_approximate_quota(true)
    ///     .constraint(|history: &[Vec<u32>], candidate: &[u32]| {
    ///         history.last().map_or(true, |prev| prev != candidate)
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// let seq = generator.generate().unwrap();
    /// let tuples = seq.to_tuples();
    /// assert!(tuples.windows(2).all(|w| w[0] != w[1]));
    /// ```
    #[must_use]
    pub fn constraint(mut self, constraint: impl TrialConstraint + 'static) -> Self {
        self.constraint = Some(Arc::new(constraint));
        self
    }

    /// Validate the parameters and build the generator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `trials` or `factor_levels` were not specified
    /// - any parameter is invalid (see [`Counterbalancer::new`])
    pub fn build(self) -> Result<Counterbalancer> {
        let trials = self
            .trials
            .ok_or_else(|| Error::invalid_params("trials must be specified"))?;
        let factor_levels = self
            .factor_levels
            .ok_or_else(|| Error::invalid_params("factor_levels must be specified"))?;

        let params = DesignParams {
            trials,
            factor_levels,
            levels: self.levels.unwrap_or_else(default_order),
            alternating_levels: self.alternating_levels,
            alternator_start: self.alternator_start,
            allow_approximate_quota: self.allow_approximate_quota,
            fixed_seed: self.fixed_seed,
            max_attempts: self.max_attempts,
        };

        let mut generator = Counterbalancer::new(params)?;
        generator.constraint = self.constraint;
        Ok(generator)
    }
}

impl fmt::Debug for CounterbalanceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterbalanceBuilder")
            .field("trials", &self.trials)
            .field("factor_levels", &self.factor_levels)
            .field("levels", &self.levels)
            .field("alternating_levels", &self.alternating_levels)
            .field("alternator_start", &self.alternator_start)
            .field("allow_approximate_quota", &self.allow_approximate_quota)
            .field("fixed_seed", &self.fixed_seed)
            .field("max_attempts", &self.max_attempts)
            .field("constraint", &self.constraint.is_some())
            .finish()
    }
}

/// A generated sequence together with search diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// The sequence.
    pub sequence: TrialSequence,
    /// The seed the sequence grew from.
    pub seed: Vec<u32>,
    /// Alternating start state used, if alternating.
    pub alternator_start: Option<u32>,
    /// Attempts, restarts and discarded seeds.
    pub stats: SearchStats,
}

/// A validated design, ready to generate sequences.
///
/// Building one checks every parameter, so generation can only fail with
/// [`Error::Infeasible`].
#[derive(Clone)]
pub struct Counterbalancer {
    params: DesignParams,
    space: FactorSpace,
    quotas: QuotaMatrix,
    constraint: Option<Arc<dyn TrialConstraint>>,
}

impl Counterbalancer {
    /// Validate `params` and prepare the design.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `trials` is 0
    /// - `factor_levels` is empty or contains a 0
    /// - `levels` is 0
    /// - `alternating_levels` is `Some(0)`
    /// - the fixed seed does not have `levels + 1` coordinates below `L`
    /// - `trials` is not a multiple of the quota matrix size and approximate
    ///   quotas are not allowed
    pub fn new(params: DesignParams) -> Result<Self> {
        let space = params.space()?;
        if space.order() >= 3 {
            warn!(
                levels = space.order(),
                "history windows of 3 or more can make the search slow or unsolvable"
            );
        }

        let quotas = QuotaMatrix::for_space(params.trials, &space, params.allow_approximate_quota)?;

        debug!(
            trials = params.trials,
            conditions = space.conditions(),
            dimensions = space.dimensions(),
            alternating = ?space.alternating_states(),
            cells = space.matrix_size(),
            "counterbalanced design prepared"
        );

        Ok(Self {
            params,
            space,
            quotas,
            constraint: None,
        })
    }

    /// The validated parameters.
    #[must_use]
    pub fn params(&self) -> &DesignParams {
        &self.params
    }

    /// The design space.
    #[must_use]
    pub fn space(&self) -> &FactorSpace {
        &self.space
    }

    /// The initial quota matrix every attempt starts from.
    #[must_use]
    pub fn quotas(&self) -> &QuotaMatrix {
        &self.quotas
    }

    /// Generate a sequence using the thread-local random number generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Infeasible`] if no sequence could be found.
    pub fn generate(&self) -> Result<TrialSequence> {
        self.generate_with_rng(&mut rand::thread_rng())
    }

    /// Generate a sequence reproducibly from a numeric seed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Infeasible`] if no sequence could be found.
    pub fn generate_seeded(&self, seed: u64) -> Result<TrialSequence> {
        self.generate_with_rng(&mut StdRng::seed_from_u64(seed))
    }

    /// Generate a sequence with the given random number generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Infeasible`] if no sequence could be found.
    pub fn generate_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<TrialSequence> {
        self.generate_detailed_with_rng(rng).map(|g| g.sequence)
    }

    /// Generate a sequence and report how the search went.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Infeasible`] if no sequence could be found.
    pub fn generate_detailed_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Generation> {
        let start = self.resolve_start(rng);

        let mut search = SequenceBuilder::new(&self.space, &self.quotas, self.params.trials)
            .alternator_start(start.unwrap_or(0))
            .fixed_seed(self.params.fixed_seed.as_deref())
            .constraint(self.constraint.as_deref());
        if let Some(attempts) = self.params.max_attempts {
            search = search.max_attempts(attempts);
        }

        let outcome = search.run(rng)?;
        let sequence = Decoder::new(&self.space).decode(&outcome.chain);

        Ok(Generation {
            sequence,
            seed: outcome.seed,
            alternator_start: start,
            stats: outcome.stats,
        })
    }

    /// Generate one sequence per block.
    ///
    /// With [`AlternatorStart::Random`] every block draws its own start.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn generate_blocks<R: Rng + ?Sized>(
        &self,
        blocks: usize,
        rng: &mut R,
    ) -> Result<Vec<TrialSequence>> {
        (0..blocks).map(|_| self.generate_with_rng(rng)).collect()
    }

    /// Generate one sequence per block, block `b` seeded with `base_seed + b`.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    pub fn generate_blocks_seeded(&self, blocks: usize, base_seed: u64) -> Result<Vec<TrialSequence>> {
        (0..blocks)
            .map(|b| self.generate_seeded(block_seed(base_seed, b)))
            .collect()
    }

    fn resolve_start<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<u32> {
        let states = self.space.alternating_states()?;
        Some(match self.params.alternator_start {
            AlternatorStart::Fixed(start) => start % states,
            AlternatorStart::Random => rng.gen_range(0..states),
        })
    }
}

impl fmt::Debug for Counterbalancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Counterbalancer")
            .field("params", &self.params)
            .field("cells", &self.space.matrix_size())
            .field("constraint", &self.constraint.is_some())
            .finish()
    }
}

/// Seed of block `block` derived from `base_seed`.
pub(crate) fn block_seed(base_seed: u64, block: usize) -> u64 {
    base_seed.wrapping_add(block as u64)
}

/// Convenience function to generate a counterbalanced sequence.
///
/// This is a shorthand for using the builder with `trials`, `factor_levels`
/// and a history window of `levels`.
///
/// # Errors
///
/// Returns an error if the parameters are invalid or no sequence exists.
///
/// # Example
///
/// ```
/// use counterbalance::counterbalance;
///
/// let seq = counterbalance(4, vec![2], 1).unwrap();
/// assert_eq!(seq.len(), 5);
/// ```
pub fn counterbalance(trials: usize, factor_levels: Vec<u32>, levels: usize) -> Result<TrialSequence> {
    CounterbalanceBuilder::new()
        .trials(trials)
        .factor_levels(factor_levels)
        .levels(levels)
        .build()?
        .generate()
}
