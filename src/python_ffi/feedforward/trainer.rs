use pyo3::prelude::*;

use super::net::Network;
use crate::feedforward::BackPropagationLearner as InnerLearner;
use crate::learner::{LearnError, Learner};
use crate::Impl_to_PyErr;

#[pyclass]
pub struct BackPropagationLearner {
    learner: InnerLearner,
}

#[pymethods]
impl BackPropagationLearner {
    #[new]
    pub fn new() -> Self {
        Self {
            learner: InnerLearner::default(),
        }
    }

    pub fn initialize(&mut self, network: PyRef<Network>) -> Result<(), LearnError> {
        self.learner.initialize(network.model.clone())
    }

    pub fn model(&self) -> Option<Network> {
        self.learner.model().map(Network::wrap)
    }

    /// Runs one gradient step over `samples` given as `(inputs, desired_outputs)` tuples.
    pub fn learn(&mut self, samples: Vec<(Vec<f64>, Vec<f64>)>) -> Result<Network, LearnError> {
        let batch = super::super::to_pairs(samples);
        Ok(Network::wrap(self.learner.learn(&batch)?))
    }
}

Impl_to_PyErr!(for LearnError);
