//! Python bindings for counterbalance.
//!
//! This module exposes sequence generation to Python using PyO3. Enable the
//! `python` feature to use this.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::builder::{AlternatorStart, CounterbalanceBuilder, Counterbalancer};
use crate::catalogue;
use crate::error::Error;
use crate::sequence::TrialSequence;

fn to_py_err(err: Error) -> PyErr {
    if err.is_infeasible() {
        PyRuntimeError::new_err(err.to_string())
    } else {
        PyValueError::new_err(err.to_string())
    }
}

fn generate(generator: &Counterbalancer, random_state: Option<u64>) -> Result<TrialSequence, Error> {
    match random_state {
        Some(seed) => generator.generate_seeded(seed),
        None => generator.generate(),
    }
}

fn to_tuples(py: Python<'_>, seq: &TrialSequence) -> Vec<PyObject> {
    seq.rows()
        .map(|row| PyTuple::new(py, row.iter().copied()).into())
        .collect()
}

/// Generate a counterbalanced sequence as a list of tuples.
///
/// The first tuple is the virtual predecessor. `force` accepts a quota that
/// is not a whole number; `initial_seed` fixes the first seed coordinate.
#[pyfunction]
#[pyo3(
    name = "counterbalance",
    signature = (
        trials,
        factor_levels,
        levels=1,
        alternating=None,
        alternator_start=0,
        force=false,
        initial_seed=None,
        random_state=None
    )
)]
#[allow(clippy::too_many_arguments)]
fn py_counterbalance(
    py: Python<'_>,
    trials: usize,
    factor_levels: Vec<u32>,
    levels: usize,
    alternating: Option<u32>,
    alternator_start: u32,
    force: bool,
    initial_seed: Option<Vec<u32>>,
    random_state: Option<u64>,
) -> PyResult<Vec<PyObject>> {
    let mut builder = CounterbalanceBuilder::new()
        .trials(trials)
        .factor_levels(factor_levels)
        .levels(levels)
        .alternator_start(AlternatorStart::Fixed(alternator_start))
        .allow_approximate_quota(force);
    if let Some(states) = alternating {
        builder = builder.alternating_levels(states);
    }
    if let Some(seed) = initial_seed {
        builder = builder.fixed_seed(seed);
    }

    let generator = builder.build().map_err(to_py_err)?;
    let seq = py
        .allow_threads(|| generate(&generator, random_state))
        .map_err(to_py_err)?;
    Ok(to_tuples(py, &seq))
}

/// Generate a sequence for a named paradigm.
#[pyfunction]
#[pyo3(signature = (name, random_state=None))]
fn paradigm(py: Python<'_>, name: &str, random_state: Option<u64>) -> PyResult<Vec<PyObject>> {
    let generator = catalogue::get_by_name(name)
        .and_then(CounterbalanceBuilder::build)
        .map_err(to_py_err)?;
    let seq = py
        .allow_threads(|| generate(&generator, random_state))
        .map_err(to_py_err)?;
    Ok(to_tuples(py, &seq))
}

/// Names accepted by `paradigm`.
#[pyfunction]
fn list_paradigms() -> Vec<&'static str> {
    catalogue::list_paradigms()
}

/// The counterbalance Python module.
#[pymodule]
fn counterbalance(_py: Python<'_>, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_counterbalance, m)?)?;
    m.add_function(wrap_pyfunction!(paradigm, m)?)?;
    m.add_function(wrap_pyfunction!(list_paradigms, m)?)?;
    Ok(())
}
