use std::{fmt, sync::Arc};

use super::activation::{Activation, ActivationFunction, Sigmoid};
use super::net::{NetworkModel, SizeMismatch};

/// Forward pass over a network model.
pub trait Executer: Send + Sync {
    /// Calculates activations of all layers for given inputs.
    ///
    /// # Returns
    /// * `Ok(activations)` holding one vector per layer: the unmodified `inputs` first, the
    /// network outputs last;
    /// * `Err(ProcessError)` if `inputs` size disagrees with the input layer.
    fn execute(&self, model: &NetworkModel, inputs: &[f64]) -> Result<Vec<Vec<f64>>, ProcessError>;
}

/// Executer for fully-connected networks.
pub struct FeedforwardExecuter {
    sigmoid: Arc<dyn Activation>,
}

impl FeedforwardExecuter {
    pub fn new() -> FeedforwardExecuter {
        FeedforwardExecuter::with_sigmoid(Arc::new(Sigmoid))
    }

    /// Uses `sigmoid` wherever a model asks for `ActivationFunction::Sigmoid`.
    pub fn with_sigmoid(sigmoid: Arc<dyn Activation>) -> FeedforwardExecuter {
        FeedforwardExecuter { sigmoid }
    }

    /// Neuron activations of one layer.
    ///
    /// Implements the formula:
    /// `activation((prev_activations . weights) + bias)` for each output neuron.
    fn execute_layer(&self, model: &NetworkModel, layer: usize, inputs: &[f64]) -> Vec<f64> {
        let weights = model.weights(layer);
        let biases = model.biases(layer);
        let outputs_count = biases.len();

        biases
            .iter()
            .enumerate()
            .map(|(j, &bias)| {
                let sum = inputs
                    .iter()
                    .enumerate()
                    .fold(0.0, |acc, (k, &a)| acc + a * weights[k * outputs_count + j]);
                self.apply(model.activation(), sum + bias)
            })
            .collect()
    }

    fn apply(&self, activation: ActivationFunction, input: f64) -> f64 {
        match activation {
            ActivationFunction::Sigmoid => self.sigmoid.calculate(input),
            ActivationFunction::None => input,
        }
    }
}

impl Default for FeedforwardExecuter {
    fn default() -> Self {
        FeedforwardExecuter::new()
    }
}

impl Executer for FeedforwardExecuter {
    /// # Examples
    /// ```
    /// # use nnlearn::feedforward::{ActivationFunction, Architecture, Executer, FeedforwardExecuter, NetworkModel};
    /// let architecture = Architecture::new(&[2, 1], ActivationFunction::None).unwrap();
    /// let model = NetworkModel::new(architecture, vec![vec![1.0, 2.0]], vec![vec![0.5]]).unwrap();
    /// let activations = FeedforwardExecuter::new().execute(&model, &[3.0, 4.0]).unwrap();
    /// assert_eq!(activations, vec![vec![3.0, 4.0], vec![11.5]]);
    /// ```
    fn execute(&self, model: &NetworkModel, inputs: &[f64]) -> Result<Vec<Vec<f64>>, ProcessError> {
        let input_size = model.architecture().input_size();
        if inputs.len() != input_size {
            return Err(ProcessError::BadInputs(SizeMismatch {
                expected: input_size,
                got: inputs.len(),
            }));
        }

        let mut activations = Vec::with_capacity(model.layer_count() + 1);
        activations.push(inputs.to_vec());

        for layer in 0..model.layer_count() {
            let outputs = self.execute_layer(model, layer, &activations[layer]);
            activations.push(outputs);
        }

        Ok(activations)
    }
}

/// Error structure for `Executer::execute`
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessError {
    BadInputs(SizeMismatch),
}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            ProcessError::BadInputs(SizeMismatch { expected, got }) => {
                write!(f, "Expected {} input(s), but got {}!", expected, got)
            }
        }
    }
}

impl std::error::Error for ProcessError {}
