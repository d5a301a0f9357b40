use std::fmt;

use super::activation::ActivationFunction;

/// Network architecture descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Architecture {
    /// The number of neurons in each layer, input and output layers included.
    geometry: Box<[usize]>,

    /// Activation applied to every layer but the input one.
    activation: ActivationFunction,
}

impl Architecture {
    /// Returns architecture for given geometry.
    ///
    /// # Arguments
    /// * `geometry` - a number slice that holds a desired number of neurons in each layer;
    /// * `activation` - activation function of all non-input layers.
    ///
    /// # Returns
    /// * `Ok(Architecture)` if there are at least two layers and none of them is empty;
    /// * `Err(NewNetError)` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::feedforward::{ActivationFunction, Architecture};
    /// let architecture = Architecture::new(&[784, 200, 10], ActivationFunction::Sigmoid).unwrap();
    /// assert_eq!(architecture.layer_count(), 2);
    /// assert!(Architecture::new(&[784], ActivationFunction::Sigmoid).is_err());
    /// ```
    pub fn new(
        geometry: &[usize],
        activation: ActivationFunction,
    ) -> Result<Architecture, NewNetError> {
        if geometry.len() < 2 {
            return Err(NewNetError::BadGeometry(geometry.len()));
        }
        if let Some(index) = geometry.iter().position(|&size| size == 0) {
            return Err(NewNetError::EmptyLayer(index));
        }

        Ok(Architecture {
            geometry: geometry.to_owned().into_boxed_slice(),
            activation,
        })
    }

    pub fn geometry(&self) -> &[usize] {
        &self.geometry
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Number of weight (and bias) layers, one less than the number of neuron layers.
    pub fn layer_count(&self) -> usize {
        self.geometry.len() - 1
    }

    pub fn input_size(&self) -> usize {
        self.geometry[0]
    }

    pub fn output_size(&self) -> usize {
        self.geometry[self.geometry.len() - 1]
    }

    /// `(inputs, outputs)` of weight layer `layer`.
    pub fn layer_shape(&self, layer: usize) -> (usize, usize) {
        (self.geometry[layer], self.geometry[layer + 1])
    }

    pub fn weight_count(&self) -> usize {
        self.geometry.windows(2).map(|w| w[0] * w[1]).sum()
    }

    pub fn bias_count(&self) -> usize {
        self.geometry[1..].iter().sum()
    }
}

/// Fully-connected network model.
///
/// A model is a value: it's produced whole by an initializer or a breeder, read by executers,
/// and replaced, never changed in place, by learners.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkModel {
    pub(super) architecture: Architecture,

    /// Weight layers.
    ///
    /// Layer `i` is a row-major `inputs_i x outputs_i` matrix, so the weight between input
    /// neuron `k` and output neuron `j` lives at `k * outputs_i + j`.
    pub(super) weights: Box<[Box<[f64]>]>,

    /// Bias layers, layer `i` holds `outputs_i` values.
    pub(super) biases: Box<[Box<[f64]>]>,
}

impl NetworkModel {
    /// Returns network built from given parameters.
    ///
    /// # Arguments
    /// * `architecture` - geometry and activation of the network;
    /// * `weights` - weight layers, see `NetworkModel::weights` for the layout;
    /// * `biases` - bias layers.
    ///
    /// # Returns
    /// * `Ok(NetworkModel)` if every layer shape agrees with the architecture;
    /// * `Err(NewNetError)` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::feedforward::{ActivationFunction, Architecture, NetworkModel};
    /// let architecture = Architecture::new(&[2, 1], ActivationFunction::None).unwrap();
    /// let model = NetworkModel::new(architecture, vec![vec![0.5, -1.0]], vec![vec![0.1]]).unwrap();
    /// assert_eq!(model.weight(0, 1, 0), -1.0);
    /// ```
    pub fn new(
        architecture: Architecture,
        weights: Vec<Vec<f64>>,
        biases: Vec<Vec<f64>>,
    ) -> Result<NetworkModel, NewNetError> {
        let layer_count = architecture.layer_count();

        if weights.len() != layer_count {
            return Err(NewNetError::BadLayerCount(SizeMismatch {
                expected: layer_count,
                got: weights.len(),
            }));
        }
        if biases.len() != layer_count {
            return Err(NewNetError::BadLayerCount(SizeMismatch {
                expected: layer_count,
                got: biases.len(),
            }));
        }

        for (layer, (w, b)) in weights.iter().zip(biases.iter()).enumerate() {
            let (inputs, outputs) = architecture.layer_shape(layer);
            if w.len() != inputs * outputs {
                return Err(NewNetError::BadWeights {
                    layer,
                    mismatch: SizeMismatch {
                        expected: inputs * outputs,
                        got: w.len(),
                    },
                });
            }
            if b.len() != outputs {
                return Err(NewNetError::BadBiases {
                    layer,
                    mismatch: SizeMismatch {
                        expected: outputs,
                        got: b.len(),
                    },
                });
            }
        }

        Ok(NetworkModel::from_layers(architecture, weights, biases))
    }

    /// Builds model from layers whose shapes are already known to match.
    pub(crate) fn from_layers(
        architecture: Architecture,
        weights: Vec<Vec<f64>>,
        biases: Vec<Vec<f64>>,
    ) -> NetworkModel {
        NetworkModel {
            architecture,
            weights: weights.into_iter().map(Vec::into_boxed_slice).collect(),
            biases: biases.into_iter().map(Vec::into_boxed_slice).collect(),
        }
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    pub fn geometry(&self) -> &[usize] {
        self.architecture.geometry()
    }

    pub fn activation(&self) -> ActivationFunction {
        self.architecture.activation()
    }

    pub fn layer_count(&self) -> usize {
        self.weights.len()
    }

    /// Row-major weight matrix of layer `layer`.
    pub fn weights(&self, layer: usize) -> &[f64] {
        &self.weights[layer]
    }

    pub fn biases(&self, layer: usize) -> &[f64] {
        &self.biases[layer]
    }

    /// Weight between input neuron `input` and output neuron `output` of layer `layer`.
    pub fn weight(&self, layer: usize, input: usize, output: usize) -> f64 {
        let (_, outputs) = self.architecture.layer_shape(layer);
        self.weights[layer][input * outputs + output]
    }

    /// Total number of genes (weights and biases).
    pub fn gene_count(&self) -> usize {
        self.architecture.weight_count() + self.architecture.bias_count()
    }

    /// Exports parameters from network.
    ///
    /// # Returns
    /// `(weights, biases)`, each as a vector of layers.
    pub fn export(&self) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        (
            self.weights.iter().map(|l| l.to_vec()).collect(),
            self.biases.iter().map(|l| l.to_vec()).collect(),
        )
    }

    /// Calculates cost function of an output values given the desired values.
    /// Implements the formula:
    /// `sum((outputs - desired outputs)^2)`
    ///
    /// # Arguments
    /// * `outputs` - slice that holds activations of outputs neurons;
    /// * `desired_outputs` - slice that holds corresponding desired activations.
    ///
    /// # Returns
    /// * `Ok(f64)` if `outputs` and `desired_outputs` have the same size;
    /// * `SizeMismatch` otherwise.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::feedforward::NetworkModel;
    /// let outputs = [10.0; 1000];
    /// let desired_outputs = [10.25; 1000];
    /// let cost = NetworkModel::calc_cost(&outputs, &desired_outputs).unwrap();
    /// assert_eq!(cost, 62.5);
    /// ```
    pub fn calc_cost(outputs: &[f64], desired_outputs: &[f64]) -> Result<f64, SizeMismatch> {
        if outputs.len() != desired_outputs.len() {
            return Err(SizeMismatch {
                expected: outputs.len(),
                got: desired_outputs.len(),
            });
        };

        Ok(outputs
            .iter()
            .zip(desired_outputs.iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .sum())
    }
}

/// Training sample: input activations and the desired output activations.
#[derive(Debug, Clone, PartialEq)]
pub struct InputOutputPair {
    pub inputs: Box<[f64]>,
    pub outputs: Box<[f64]>,
}

impl InputOutputPair {
    pub fn new(inputs: Vec<f64>, outputs: Vec<f64>) -> InputOutputPair {
        InputOutputPair {
            inputs: inputs.into_boxed_slice(),
            outputs: outputs.into_boxed_slice(),
        }
    }
}

/// Error structure for `Architecture::new` and `NetworkModel::new`
#[derive(Debug, Clone, PartialEq)]
pub enum NewNetError {
    BadGeometry(usize),
    EmptyLayer(usize),
    BadLayerCount(SizeMismatch),
    BadWeights { layer: usize, mismatch: SizeMismatch },
    BadBiases { layer: usize, mismatch: SizeMismatch },
}

impl fmt::Display for NewNetError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            NewNetError::BadGeometry(length) => write!(
                f,
                "Net must have at least two layers (input and output), \
                but got geometry with len {}!",
                length
            ),
            NewNetError::EmptyLayer(index) => {
                write!(f, "Layer {} of the geometry has no neurons!", index)
            }
            NewNetError::BadLayerCount(SizeMismatch { expected, got }) => write!(
                f,
                "Expected {} parameter layers because of provided geometry, but got {}!",
                expected, got
            ),
            NewNetError::BadWeights {
                layer,
                mismatch: SizeMismatch { expected, got },
            } => write!(
                f,
                "Expected {} weights in layer {}, but got {}!",
                expected, layer, got
            ),
            NewNetError::BadBiases {
                layer,
                mismatch: SizeMismatch { expected, got },
            } => write!(
                f,
                "Expected {} biases in layer {}, but got {}!",
                expected, layer, got
            ),
        }
    }
}

impl std::error::Error for NewNetError {}

/// Error structure for collections size mismatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatch {
    pub expected: usize,
    pub got: usize,
}

impl fmt::Display for SizeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Expected {} values, but got {}!",
            self.expected, self.got
        )
    }
}

impl std::error::Error for SizeMismatch {}
