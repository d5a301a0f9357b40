use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use rayon::prelude::*;

use super::activation::{Activation, ActivationFunction, Sigmoid};
use super::executer::{Executer, FeedforwardExecuter};
use super::net::{Architecture, InputOutputPair, NetworkModel, SizeMismatch};
use crate::learner::{LearnError, Learner};

/// Learner performing one step of squared-error gradient descent per batch.
///
/// Training procedure will look like this:
/// * The learner gets its starting model from `Learner::initialize`.
/// * Every call to `Learner::learn` runs backpropagation for all samples of the batch
/// concurrently, averages the gradients over the batch and replaces the model with
/// `model - average gradient`. There is no separate learning rate.
/// * `Learner::model` gives access to the current model at any time.
pub struct BackPropagationLearner {
    executer: Arc<dyn Executer>,

    /// Used wherever the model asks for `ActivationFunction::Sigmoid`.
    sigmoid: Arc<dyn Activation>,

    model: Option<NetworkModel>,
}

impl BackPropagationLearner {
    pub fn new(executer: Arc<dyn Executer>, sigmoid: Arc<dyn Activation>) -> BackPropagationLearner {
        BackPropagationLearner {
            executer,
            sigmoid,
            model: None,
        }
    }

    /// Slope of the activation function at pre-activation sum `sum`.
    ///
    /// For `ActivationFunction::None` the sum itself is used as the slope.
    fn slope(&self, activation: ActivationFunction, sum: f64) -> f64 {
        match activation {
            ActivationFunction::Sigmoid => self.sigmoid.calculate_derivative(sum),
            ActivationFunction::None => sum,
        }
    }

    /// Runs forward and backward pass for one sample, adding its gradient to `totals`.
    fn propagate(
        &self,
        model: &NetworkModel,
        index: usize,
        pair: &InputOutputPair,
        totals: &GradientTotals,
    ) -> Result<(), LearnError> {
        let output_size = model.architecture().output_size();
        if pair.outputs.len() != output_size {
            return Err(LearnError::BadDesiredOutputs {
                index,
                mismatch: SizeMismatch {
                    expected: output_size,
                    got: pair.outputs.len(),
                },
            });
        }

        let activations = self
            .executer
            .execute(model, &pair.inputs)
            .map_err(|error| LearnError::BadSample { index, error })?;

        // Derivatives of cost by output activations
        let mut deltas: Vec<f64> = activations[model.layer_count()]
            .iter()
            .zip(pair.outputs.iter())
            .map(|(&o, &d_o)| 2.0 * (o - d_o))
            .collect();

        for layer in (0..model.layer_count()).rev() {
            deltas = self.propagate_layer(model, layer, &activations[layer], &deltas, totals);
        }

        Ok(())
    }

    /// Used in `BackPropagationLearner::propagate` for one layer, going in reverse order.
    ///
    /// # Arguments
    /// * `layer` - index of the weight layer;
    /// * `inputs` - activations feeding this layer;
    /// * `deltas` - derivatives of cost by this layer's outputs;
    /// * `totals` - gradient accumulators of the batch.
    ///
    /// # Returns
    /// Derivatives of cost by `inputs`.
    fn propagate_layer(
        &self,
        model: &NetworkModel,
        layer: usize,
        inputs: &[f64],
        deltas: &[f64],
        totals: &GradientTotals,
    ) -> Vec<f64> {
        let weights = model.weights(layer);
        let biases = model.biases(layer);
        let outputs_count = biases.len();

        let slopes: Vec<f64> = biases
            .iter()
            .enumerate()
            .map(|(j, &bias)| {
                let sum = inputs
                    .iter()
                    .enumerate()
                    .fold(0.0, |acc, (k, &a)| acc + a * weights[k * outputs_count + j]);
                self.slope(model.activation(), sum + bias)
            })
            .collect();

        totals.add(layer, inputs, &slopes, deltas);

        (0..inputs.len())
            .map(|k| {
                let row = &weights[k * outputs_count..(k + 1) * outputs_count];
                row.iter()
                    .zip(slopes.iter())
                    .zip(deltas.iter())
                    .fold(0.0, |acc, ((&w, &s), &d)| acc + w * s * d)
            })
            .collect()
    }
}

impl Default for BackPropagationLearner {
    fn default() -> Self {
        BackPropagationLearner::new(Arc::new(FeedforwardExecuter::new()), Arc::new(Sigmoid))
    }
}

impl Learner for BackPropagationLearner {
    fn model(&self) -> Option<&NetworkModel> {
        self.model.as_ref()
    }

    fn initialize(&mut self, model: NetworkModel) -> Result<(), LearnError> {
        self.model = Some(model);
        Ok(())
    }

    /// # Examples
    /// ```
    /// # use nnlearn::feedforward::*;
    /// # use nnlearn::learner::Learner;
    /// let architecture = Architecture::new(&[2, 1], ActivationFunction::Sigmoid).unwrap();
    /// let model = NetworkModel::new(architecture, vec![vec![0.0, 0.0]], vec![vec![0.0]]).unwrap();
    /// let mut learner = BackPropagationLearner::default();
    /// learner.initialize(model).unwrap();
    ///
    /// let batch = [InputOutputPair::new(vec![1.0, 0.0], vec![1.0])];
    /// let model = learner.learn(&batch).unwrap();
    /// // output 0.5, target 1: gradient 2 * (0.5 - 1) * 0.25 = -0.25
    /// assert_eq!(model.biases(0), &[0.25]);
    /// assert_eq!(model.weights(0), &[0.25, 0.0]);
    /// ```
    fn learn(&mut self, batch: &[InputOutputPair]) -> Result<&NetworkModel, LearnError> {
        let model = self.model.as_ref().ok_or(LearnError::NotInitialized)?;
        if batch.is_empty() {
            return Err(LearnError::EmptyBatch);
        }

        let totals = GradientTotals::new(model.architecture());
        batch
            .par_iter()
            .enumerate()
            .try_for_each(|(index, pair)| self.propagate(model, index, pair, &totals))?;

        let updated = totals.apply(model, batch.len());
        debug!(samples = batch.len(); "backpropagation step applied");

        Ok(&*self.model.insert(updated))
    }
}

/// Gradient totals of one weight layer.
struct LayerGradient {
    weights: Mutex<Box<[f64]>>,
    biases: Mutex<Box<[f64]>>,
}

/// Gradient accumulators shared by all samples of a batch.
///
/// Every layer has its own pair of locks, so samples running backward through different
/// layers don't wait for each other. All buffers are allocated before the batch starts.
struct GradientTotals {
    layers: Box<[LayerGradient]>,
}

impl GradientTotals {
    fn new(architecture: &Architecture) -> GradientTotals {
        let layers = (0..architecture.layer_count())
            .map(|layer| {
                let (inputs, outputs) = architecture.layer_shape(layer);
                LayerGradient {
                    weights: Mutex::new(vec![0.0; inputs * outputs].into_boxed_slice()),
                    biases: Mutex::new(vec![0.0; outputs].into_boxed_slice()),
                }
            })
            .collect();

        GradientTotals { layers }
    }

    /// Adds `input_k * slope_j * delta_j` to every weight total and `slope_j * delta_j`
    /// to every bias total of `layer`.
    fn add(&self, layer: usize, inputs: &[f64], slopes: &[f64], deltas: &[f64]) {
        let gradient = &self.layers[layer];

        {
            let mut weights = gradient.weights.lock();
            for (row, &a) in weights.chunks_mut(slopes.len()).zip(inputs.iter()) {
                for ((total, &s), &d) in row.iter_mut().zip(slopes.iter()).zip(deltas.iter()) {
                    *total += a * s * d;
                }
            }
        }

        let mut biases = gradient.biases.lock();
        for ((total, &s), &d) in biases.iter_mut().zip(slopes.iter()).zip(deltas.iter()) {
            *total += s * d;
        }
    }

    /// Returns `model` with the gradient totals, averaged over `samples`, subtracted.
    fn apply(self, model: &NetworkModel, samples: usize) -> NetworkModel {
        let samples = samples as f64;
        let mut weights = Vec::with_capacity(self.layers.len());
        let mut biases = Vec::with_capacity(self.layers.len());

        for (layer, gradient) in self.layers.into_vec().into_iter().enumerate() {
            let weight_totals = gradient.weights.into_inner();
            let bias_totals = gradient.biases.into_inner();

            weights.push(
                model
                    .weights(layer)
                    .iter()
                    .zip(weight_totals.iter())
                    .map(|(&w, &g)| w - g / samples)
                    .collect(),
            );
            biases.push(
                model
                    .biases(layer)
                    .iter()
                    .zip(bias_totals.iter())
                    .map(|(&b, &g)| b - g / samples)
                    .collect(),
            );
        }

        NetworkModel::from_layers(model.architecture().clone(), weights, biases)
    }
}
