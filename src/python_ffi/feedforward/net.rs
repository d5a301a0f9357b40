use std::sync::Arc;

use pyo3::prelude::*;

use crate::feedforward::{
    ActivationFunction, Architecture, Executer, FeedforwardExecuter, ModelInitializer,
    NetworkModel, NewNetError, ProcessError, RandomInitializer, SizeMismatch,
};
use crate::random::RandomService;
use crate::training::classification_accuracy;
use crate::Impl_to_PyErr;

#[pyclass]
#[derive(Clone)]
pub struct Network {
    pub(crate) model: NetworkModel,
}

impl Network {
    pub(crate) fn wrap(model: &NetworkModel) -> Network {
        Network {
            model: model.clone(),
        }
    }
}

#[pymethods]
impl Network {
    /// Builds network from explicit `(weights, biases)` or with random parameters.
    #[new]
    pub fn new(
        geometry: Vec<usize>,
        sigmoid: bool,
        parameters: Option<(Vec<Vec<f64>>, Vec<Vec<f64>>)>,
        seed: Option<u64>,
    ) -> Result<Self, NewNetError> {
        let activation = if sigmoid {
            ActivationFunction::Sigmoid
        } else {
            ActivationFunction::None
        };
        let architecture = Architecture::new(&geometry, activation)?;

        let model = match parameters {
            Some((weights, biases)) => NetworkModel::new(architecture, weights, biases)?,
            None => {
                let random = seed.map_or_else(RandomService::new, RandomService::seeded);
                RandomInitializer::new(Arc::new(random)).create_model(&architecture)
            }
        };

        Ok(Self { model })
    }

    pub fn geometry(&self) -> Vec<usize> {
        self.model.geometry().to_vec()
    }

    pub fn export(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        self.model.export()
    }

    /// Outputs of the last layer.
    pub fn process(&self, inputs: Vec<f64>) -> Result<Vec<f64>, ProcessError> {
        let mut activations = FeedforwardExecuter::new().execute(&self.model, &inputs)?;
        Ok(activations.pop().unwrap_or_default())
    }

    /// Activations of every layer, inputs included.
    pub fn activations(&self, inputs: Vec<f64>) -> Result<Vec<Vec<f64>>, ProcessError> {
        FeedforwardExecuter::new().execute(&self.model, &inputs)
    }

    pub fn accuracy(&self, samples: Vec<(Vec<f64>, Vec<f64>)>) -> Result<f64, ProcessError> {
        classification_accuracy(
            &FeedforwardExecuter::new(),
            &self.model,
            &super::super::to_pairs(samples),
        )
    }

    #[staticmethod]
    pub fn calc_cost(outputs: Vec<f64>, desired_outputs: Vec<f64>) -> Result<f64, SizeMismatch> {
        NetworkModel::calc_cost(&outputs, &desired_outputs)
    }
}

Impl_to_PyErr!(for NewNetError, ProcessError, SizeMismatch);
