//! # Counterbalance
//!
//! Generation of counterbalanced trial sequences for experimental psychology.
//!
//! ## Overview
//!
//! Sequential effects (the influence of trial *n-1*, *n-2*, … on trial *n*)
//! confound many cognitive-control tasks. A counterbalanced sequence makes
//! every history window of conditions occur equally often, so those effects
//! average out:
//! - **Flanker / Stroop**: congruency sequences balanced over triplets
//! - **Simon / AFST**: stimulus pairs balanced over consecutive trials
//! - **Prime-probe**: balanced sequences with an alternating response hand
//!
//! This library provides:
//! - Exact balance of every window of `levels + 1` consecutive trials
//! - An optional alternating dimension on a fixed cyclic schedule
//! - Constraints that veto candidate trials
//! - Reproducible, seeded multi-block generation
//! - Verification of a sequence's transition counts
//!
//! ## Quick Start
//!
//! The easiest way to create a sequence is with the builder:
//!
//! ```rust
//! use counterbalance::CounterbalanceBuilder;
//!
//! // 2x2 design, every pair of consecutive conditions twice
//! let seq = CounterbalanceBuilder::new()
//!     .trials(32)
//!     .factor_levels(vec![2, 2])
//!     .levels(1)
//!     .build()
//!     .unwrap()
//!     .generate()
//!     .unwrap();
//!
//! assert_eq!(seq.len(), 33);   // predecessor + 32 trials
//! assert_eq!(seq.width(), 2);
//! ```
//!
//! Or use the shorthand and check the result:
//!
//! ```rust
//! use counterbalance::{counterbalance, verify_balance};
//!
//! let seq = counterbalance(64, vec![2, 4], 1).expect("feasible design");
//! assert!(verify_balance(&seq, 1).is_balanced);
//! ```
//!
//! ## Notation
//!
//! A design is described by:
//! - **T**: number of trials
//! - **L**: number of conditions, the product of the factor levels
//! - **levels**: length of the balanced history window
//! - **A**: number of alternating states (1 when not alternating)
//!
//! Every cell of the quota matrix, `A × L^(levels+1)` of them, must occur
//! `T / (A × L^(levels+1))` times.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization of designs and sequences
//! - `parallel`: Enable parallel multi-block generation using rayon
//! - `python`: Enable Python bindings via PyO3

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod builder;
pub mod catalogue;
pub mod error;
pub mod quota;
#[cfg(feature = "python")]
pub mod python;
pub mod search;
pub mod sequence;
pub mod space;
pub mod utils;

#[cfg(feature = "parallel")]
pub mod parallel;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builder::{
        counterbalance, AlternatorStart, CounterbalanceBuilder, Counterbalancer, DesignParams,
        Generation,
    };
    pub use crate::error::{Error, Result};
    pub use crate::quota::QuotaMatrix;
    pub use crate::search::{SearchStats, SequenceBuilder, TrialConstraint};
    pub use crate::sequence::{
        verify_balance, BalanceIssue, BalanceVerification, Decoder, TransitionReport,
        TrialSequence,
    };
    pub use crate::space::{Alternator, FactorSpace};

    #[cfg(feature = "parallel")]
    pub use crate::parallel::{par_counterbalance, par_generate_blocks};
}

// Re-export commonly used items at crate root
pub use builder::{
    counterbalance, AlternatorStart, CounterbalanceBuilder, Counterbalancer, DesignParams,
    Generation,
};
pub use catalogue::get_by_name as get_paradigm;
pub use error::{Error, Result};
pub use quota::QuotaMatrix;
pub use search::{SearchStats, TrialConstraint};
pub use sequence::{verify_balance, Decoder, TrialSequence};
pub use space::{Alternator, FactorSpace};

#[cfg(feature = "parallel")]
pub use parallel::{par_counterbalance, par_generate_blocks};
