//! Python FFI
use pyo3::prelude::*;

use crate::feedforward::InputOutputPair;

pub mod feedforward;
mod gen_macros;
pub mod genetic;

#[pymodule]
fn nnlearn(_py: Python, m: &PyModule) -> PyResult<()> {
    feedforward::construct_module(m)?;
    genetic::construct_module(m)?;
    Ok(())
}

/// Converts `(inputs, desired_outputs)` tuples coming from Python.
pub(crate) fn to_pairs(samples: Vec<(Vec<f64>, Vec<f64>)>) -> Vec<InputOutputPair> {
    samples
        .into_iter()
        .map(|(inputs, outputs)| InputOutputPair::new(inputs, outputs))
        .collect()
}
