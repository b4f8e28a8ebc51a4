//! Catalogue of standard task designs.
//!
//! This module provides preconfigured builders for common cognitive-control
//! paradigms, referenced by name. Each entry can be adjusted further before
//! building, for example to change the trial count of a block.

use crate::builder::CounterbalanceBuilder;
use crate::error::{Error, Result};

/// Retrieve a preconfigured design by its paradigm name.
///
/// Supported paradigms:
/// - **flanker**: 64 trials, 2x2 factors, triplets balanced
/// - **simon** / **afst**: 64 trials, 2x4 factors, pairs balanced
/// - **prime-probe**: 128 trials, 2x2 factors, triplets balanced, response
///   hand alternating from a random start
///
/// # Example
///
/// ```
/// use counterbalance::catalogue::get_by_name;
///
/// let seq = get_by_name("flanker").unwrap().build().unwrap().generate().unwrap();
/// assert_eq!(seq.trials(), 64);
/// assert_eq!(seq.width(), 2);
/// ```
pub fn get_by_name(name: &str) -> Result<CounterbalanceBuilder> {
    let builder = CounterbalanceBuilder::new();
    match name.to_lowercase().replace('_', "-").as_str() {
        "flanker" => Ok(builder.trials(64).factor_levels(vec![2, 2]).levels(2)),
        "simon" | "afst" => Ok(builder.trials(64).factor_levels(vec![2, 4]).levels(1)),
        "prime-probe" => Ok(builder
            .trials(128)
            .factor_levels(vec![2, 2])
            .levels(2)
            .alternating_levels(2)
            .random_alternator_start()),
        _ => Err(Error::invalid_params(format!(
            "Unknown paradigm: {}",
            name
        ))),
    }
}

/// List all available paradigms.
pub fn list_paradigms() -> Vec<&'static str> {
    vec!["flanker", "simon", "afst", "prime-probe"]
}
