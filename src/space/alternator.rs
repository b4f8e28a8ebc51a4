//! Deterministic cyclic counter for the alternating dimension.

use crate::error::{Error, Result};

/// A position on a fixed cycle of `states` alternating states.
///
/// `Alternator` is a small `Copy` value: stepping it returns a new value and
/// never mutates the old one, so an attempt that is abandoned cannot leak its
/// position into the next attempt.
///
/// # Example
///
/// ```
/// use counterbalance::space::Alternator;
///
/// let hand = Alternator::new(2, 1).unwrap();
/// assert_eq!(hand.index(), 1);
/// assert_eq!(hand.previous_index(), 0);
///
/// let hand = hand.advance();
/// assert_eq!(hand.index(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Alternator {
    index: u32,
    states: u32,
}

impl Alternator {
    /// Create an alternator over `states` states positioned at `start`.
    ///
    /// `start` is reduced modulo `states`.
    ///
    /// # Errors
    ///
    /// Returns an error if `states` is 0.
    pub fn new(states: u32, start: u32) -> Result<Self> {
        if states == 0 {
            return Err(Error::invalid_params(
                "alternating dimension must have at least 1 state",
            ));
        }
        Ok(Self {
            index: start % states,
            states,
        })
    }

    /// The current state.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Number of states on the cycle.
    #[must_use]
    pub fn states(self) -> u32 {
        self.states
    }

    /// The alternator one step later.
    #[must_use]
    pub fn advance(self) -> Self {
        Self {
            index: self.next_index(),
            ..self
        }
    }

    /// The alternator one step earlier.
    #[must_use]
    pub fn retreat(self) -> Self {
        Self {
            index: self.previous_index(),
            ..self
        }
    }

    /// The state one step later, without moving.
    #[must_use]
    pub fn next_index(self) -> u32 {
        if self.index + 1 < self.states {
            self.index + 1
        } else {
            0
        }
    }

    /// The state one step earlier, without moving.
    #[must_use]
    pub fn previous_index(self) -> u32 {
        if self.index > 0 {
            self.index - 1
        } else {
            self.states - 1
        }
    }

    /// Iterate over the states starting with the current one.
    ///
    /// The iterator is infinite.
    pub fn cycle(self) -> impl Iterator<Item = u32> {
        std::iter::successors(Some(self), |a| Some(a.advance())).map(Self::index)
    }
}
