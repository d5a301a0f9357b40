use std::sync::Arc;

use pyo3::{prelude::*, wrap_pymodule};

use super::feedforward::net::Network;
use crate::genetic::{
    BreedingPolicy, GeneticConfig, GeneticConfigError, GeneticLearner as InnerLearner,
    MutationConfig,
};
use crate::learner::{LearnError, Learner};
use crate::random::RandomService;
use crate::Impl_to_PyErr;

#[pyclass]
pub struct GeneticLearner {
    learner: InnerLearner,
}

#[pymethods]
impl GeneticLearner {
    #[new]
    pub fn new(
        population_size: usize,
        selection_size: usize,
        polygamous: bool,
        seed: Option<u64>,
    ) -> Result<Self, GeneticConfigError> {
        let policy = if polygamous {
            BreedingPolicy::Polygamous
        } else {
            BreedingPolicy::Monogamous
        };
        let random = seed.map_or_else(RandomService::new, RandomService::seeded);

        Ok(Self {
            learner: InnerLearner::with_defaults(
                GeneticConfig::new(population_size, selection_size),
                policy,
                MutationConfig::default(),
                Arc::new(random),
            )?,
        })
    }

    pub fn initialize(&mut self, network: PyRef<Network>) -> Result<(), LearnError> {
        self.learner.initialize(network.model.clone())
    }

    /// Best model of the population.
    pub fn model(&self) -> Option<Network> {
        self.learner.model().map(Network::wrap)
    }

    /// Costs of the current population, best first.
    pub fn costs(&self) -> Vec<f64> {
        self.learner.population().iter().map(|m| m.cost).collect()
    }

    /// Runs one generation over `samples` given as `(inputs, desired_outputs)` tuples.
    pub fn learn(&mut self, samples: Vec<(Vec<f64>, Vec<f64>)>) -> Result<Network, LearnError> {
        let batch = super::to_pairs(samples);
        Ok(Network::wrap(self.learner.learn(&batch)?))
    }
}

Impl_to_PyErr!(for GeneticConfigError);

#[pymodule]
fn genetic(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<GeneticLearner>()?;
    Ok(())
}

pub fn construct_module(m: &PyModule) -> PyResult<()> {
    m.add_wrapped(wrap_pymodule!(genetic))?;
    Ok(())
}
