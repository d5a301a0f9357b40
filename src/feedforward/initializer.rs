use std::sync::Arc;

use super::net::{Architecture, NetworkModel, NewNetError};
use crate::random::RandomService;

/// Builds network models for a given architecture.
pub trait ModelInitializer: Send + Sync {
    /// Returns model with fresh random parameters.
    fn create_model(&self, architecture: &Architecture) -> NetworkModel;

    /// Returns model holding the supplied parameters.
    fn create_model_with(
        &self,
        architecture: &Architecture,
        weights: Vec<Vec<f64>>,
        biases: Vec<Vec<f64>>,
    ) -> Result<NetworkModel, NewNetError>;
}

/// Initializer drawing every weight and bias uniformly from [-1,1).
pub struct RandomInitializer {
    random: Arc<RandomService>,
}

impl RandomInitializer {
    pub fn new(random: Arc<RandomService>) -> RandomInitializer {
        RandomInitializer { random }
    }

    fn next_parameter(&self) -> f64 {
        self.random.next_f64() * 2.0 - 1.0
    }
}

impl ModelInitializer for RandomInitializer {
    /// Biases are drawn first, layer by layer, then weights in row-major order.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use nnlearn::feedforward::{ActivationFunction, Architecture, ModelInitializer, RandomInitializer};
    /// # use nnlearn::random::RandomService;
    /// let initializer = RandomInitializer::new(Arc::new(RandomService::seeded(1)));
    /// let architecture = Architecture::new(&[10, 20, 3], ActivationFunction::Sigmoid).unwrap();
    /// let model = initializer.create_model(&architecture);
    /// assert_eq!(model.weights(0).len(), 200);
    /// ```
    fn create_model(&self, architecture: &Architecture) -> NetworkModel {
        let biases = (0..architecture.layer_count())
            .map(|layer| {
                let (_, outputs) = architecture.layer_shape(layer);
                (0..outputs).map(|_| self.next_parameter()).collect()
            })
            .collect();

        let weights = (0..architecture.layer_count())
            .map(|layer| {
                let (inputs, outputs) = architecture.layer_shape(layer);
                (0..inputs * outputs).map(|_| self.next_parameter()).collect()
            })
            .collect();

        NetworkModel::from_layers(architecture.clone(), weights, biases)
    }

    fn create_model_with(
        &self,
        architecture: &Architecture,
        weights: Vec<Vec<f64>>,
        biases: Vec<Vec<f64>>,
    ) -> Result<NetworkModel, NewNetError> {
        NetworkModel::new(architecture.clone(), weights, biases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedforward::ActivationFunction;

    fn architecture() -> Architecture {
        Architecture::new(&[4, 5, 3], ActivationFunction::Sigmoid).unwrap()
    }

    #[test]
    fn random_model_matches_architecture() {
        let initializer = RandomInitializer::new(Arc::new(RandomService::seeded(11)));
        let model = initializer.create_model(&architecture());

        assert_eq!(model.architecture(), &architecture());
        assert_eq!(model.weights(0).len(), 20);
        assert_eq!(model.weights(1).len(), 15);
        assert_eq!(model.biases(0).len(), 5);
        assert_eq!(model.biases(1).len(), 3);

        let (weights, biases) = model.export();
        for value in weights.iter().chain(biases.iter()).flatten() {
            assert!((-1.0..1.0).contains(value));
        }
    }

    #[test]
    fn same_seed_reproduces_model() {
        let a = RandomInitializer::new(Arc::new(RandomService::seeded(5)));
        let b = RandomInitializer::new(Arc::new(RandomService::seeded(5)));

        assert_eq!(
            a.create_model(&architecture()),
            b.create_model(&architecture())
        );
    }

    #[test]
    fn consecutive_models_differ() {
        let initializer = RandomInitializer::new(Arc::new(RandomService::seeded(5)));

        assert_ne!(
            initializer.create_model(&architecture()),
            initializer.create_model(&architecture())
        );
    }

    #[test]
    fn supplied_parameters_are_kept() {
        let initializer = RandomInitializer::new(Arc::new(RandomService::seeded(5)));
        let weights = vec![vec![0.5; 20], vec![-0.5; 15]];
        let biases = vec![vec![0.25; 5], vec![0.75; 3]];

        let model = initializer
            .create_model_with(&architecture(), weights.clone(), biases.clone())
            .unwrap();
        assert_eq!(model.export(), (weights, biases));

        assert!(initializer
            .create_model_with(&architecture(), vec![vec![0.0; 20]], vec![])
            .is_err());
    }
}
