use std::{fmt, sync::Arc};

use log::trace;

use super::population::BreedingPolicy;
use crate::feedforward::{Architecture, ModelInitializer, NetworkModel, NewNetError};
use crate::random::RandomService;

/// Produces a child model out of two parents of the same architecture.
pub trait ModelBreeder: Send + Sync {
    fn breed(&self, mother: &NetworkModel, father: &NetworkModel)
        -> Result<NetworkModel, BreedError>;
}

/// Mutation settings of `GeneticModelBreeder`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationConfig {
    /// Probability that a child goes through a mutation pass.
    pub threshold: f64,

    /// Fraction of all genes overwritten by one mutation pass.
    /// The fractional part of the resulting count is a probability of one more mutation.
    pub fraction: f64,
}

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            threshold: 0.1,
            fraction: 0.01,
        }
    }
}

/// Uniform crossover breeder with random-reset mutation.
///
/// Every gene (weight or bias) of the child is taken from the mother or the father with equal
/// probability. Mutated genes get a fresh value from [0,1).
pub struct GeneticModelBreeder {
    initializer: Arc<dyn ModelInitializer>,
    random: Arc<RandomService>,
    mutation: MutationConfig,
}

impl GeneticModelBreeder {
    pub fn new(
        initializer: Arc<dyn ModelInitializer>,
        random: Arc<RandomService>,
        mutation: MutationConfig,
    ) -> GeneticModelBreeder {
        GeneticModelBreeder {
            initializer,
            random,
            mutation,
        }
    }

    fn select_gene(&self, mother: f64, father: f64) -> f64 {
        if self.random.coin() {
            mother
        } else {
            father
        }
    }

    fn merge_layers<'a>(
        &self,
        mother: impl Iterator<Item = &'a [f64]>,
        father: impl Iterator<Item = &'a [f64]>,
    ) -> Vec<Vec<f64>> {
        mother
            .zip(father)
            .map(|(m, f)| {
                m.iter()
                    .zip(f.iter())
                    .map(|(&m, &f)| self.select_gene(m, f))
                    .collect()
            })
            .collect()
    }

    /// Overwrites `fraction` of all genes with random values.
    ///
    /// # Returns
    /// Number of mutations done.
    fn mutate(
        &self,
        architecture: &Architecture,
        weights: &mut [Vec<f64>],
        biases: &mut [Vec<f64>],
    ) -> usize {
        let bias_count = architecture.bias_count();
        let gene_count = bias_count + architecture.weight_count();
        let target = gene_count as f64 * self.mutation.fraction;

        let mut mutations = 0;
        while (mutations as f64) < target {
            // Last, fractional mutation happens with probability of the fraction
            if (mutations + 1) as f64 > target
                && self.random.next_f64() > target - mutations as f64
            {
                break;
            }

            if self.random.next_below(gene_count) < bias_count {
                let layer = self.random.next_below(biases.len());
                let index = self.random.next_below(biases[layer].len());
                biases[layer][index] = self.random.next_f64();
            } else {
                let layer = self.random.next_below(weights.len());
                let (inputs, outputs) = architecture.layer_shape(layer);
                let input = self.random.next_below(inputs);
                let output = self.random.next_below(outputs);
                weights[layer][input * outputs + output] = self.random.next_f64();
            }

            mutations += 1;
        }

        mutations
    }
}

impl ModelBreeder for GeneticModelBreeder {
    fn breed(
        &self,
        mother: &NetworkModel,
        father: &NetworkModel,
    ) -> Result<NetworkModel, BreedError> {
        let architecture = mother.architecture();
        if architecture != father.architecture() {
            return Err(BreedError::ArchitectureMismatch);
        }

        let layers = 0..architecture.layer_count();
        let mut biases = self.merge_layers(
            layers.clone().map(move |l| mother.biases(l)),
            layers.clone().map(move |l| father.biases(l)),
        );
        let mut weights = self.merge_layers(
            layers.clone().map(move |l| mother.weights(l)),
            layers.map(move |l| father.weights(l)),
        );

        if self.random.next_f64() < self.mutation.threshold {
            let mutations = self.mutate(architecture, &mut weights, &mut biases);
            trace!("child mutated {} gene(s)", mutations);
        }

        self.initializer
            .create_model_with(architecture, weights, biases)
            .map_err(BreedError::Model)
    }
}

/// Error structure for breeding
#[derive(Debug, Clone, PartialEq)]
pub enum BreedError {
    ArchitectureMismatch,
    PopulationTooSmall {
        parents: usize,
        population_size: usize,
    },
    NotEnoughParents {
        policy: BreedingPolicy,
        parents: usize,
        children: usize,
    },
    Model(NewNetError),
}

impl fmt::Display for BreedError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            BreedError::ArchitectureMismatch => {
                write!(f, "Parents must share the same architecture!")
            }
            BreedError::PopulationTooSmall {
                parents,
                population_size,
            } => write!(
                f,
                "Population of {} can't hold {} parents!",
                population_size, parents
            ),
            BreedError::NotEnoughParents {
                policy,
                parents,
                children,
            } => write!(
                f,
                "{} breeding of {} parents can't produce {} distinct pairings (at most {})!",
                policy,
                parents,
                children,
                policy.capacity(*parents)
            ),
            BreedError::Model(err) => write!(f, "Child model is invalid: {}", err),
        }
    }
}

impl std::error::Error for BreedError {}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::feedforward::{ActivationFunction, RandomInitializer};

    struct CountingInitializer {
        inner: RandomInitializer,
        calls: AtomicUsize,
    }

    impl ModelInitializer for CountingInitializer {
        fn create_model(&self, architecture: &Architecture) -> NetworkModel {
            self.inner.create_model(architecture)
        }

        fn create_model_with(
            &self,
            architecture: &Architecture,
            weights: Vec<Vec<f64>>,
            biases: Vec<Vec<f64>>,
        ) -> Result<NetworkModel, NewNetError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create_model_with(architecture, weights, biases)
        }
    }

    fn architecture() -> Architecture {
        Architecture::new(&[5, 4, 3], ActivationFunction::Sigmoid).unwrap()
    }

    fn breeder(seed: u64, mutation: MutationConfig) -> (GeneticModelBreeder, RandomInitializer) {
        let random = Arc::new(RandomService::seeded(seed));
        let initializer = Arc::new(RandomInitializer::new(random.clone()));
        (
            GeneticModelBreeder::new(initializer, random.clone(), mutation),
            RandomInitializer::new(random),
        )
    }

    fn genes(model: &NetworkModel) -> Vec<f64> {
        let (weights, biases) = model.export();
        weights.into_iter().chain(biases).flatten().collect()
    }

    #[test]
    fn breed_uses_initializer_once() {
        let random = Arc::new(RandomService::seeded(1));
        let initializer = Arc::new(CountingInitializer {
            inner: RandomInitializer::new(random.clone()),
            calls: AtomicUsize::new(0),
        });
        let breeder =
            GeneticModelBreeder::new(initializer.clone(), random, MutationConfig::default());
        let mother = initializer.create_model(&architecture());
        let father = initializer.create_model(&architecture());

        let child = breeder.breed(&mother, &father).unwrap();

        assert_eq!(initializer.calls.load(Ordering::SeqCst), 1);
        assert_ne!(child, mother);
        assert_ne!(child, father);
    }

    #[test]
    fn child_genes_come_from_parents_without_mutation() {
        let (breeder, initializer) = breeder(
            2,
            MutationConfig {
                threshold: 0.0,
                ..MutationConfig::default()
            },
        );

        for _ in 0..50 {
            let mother = initializer.create_model(&architecture());
            let father = initializer.create_model(&architecture());
            let (mother_copy, father_copy) = (mother.clone(), father.clone());

            let child = breeder.breed(&mother, &father).unwrap();

            assert_eq!(child.architecture(), mother.architecture());
            for ((c, m), f) in genes(&child)
                .iter()
                .zip(genes(&mother).iter())
                .zip(genes(&father).iter())
            {
                assert!(c == m || c == f);
            }
            assert_eq!(mother, mother_copy);
            assert_eq!(father, father_copy);
        }
    }

    #[test]
    fn mismatched_parents_are_rejected() {
        let (breeder, initializer) = breeder(3, MutationConfig::default());
        let mother = initializer.create_model(&architecture());
        let father = initializer.create_model(
            &Architecture::new(&[5, 4, 3], ActivationFunction::None).unwrap(),
        );

        assert_eq!(
            breeder.breed(&mother, &father),
            Err(BreedError::ArchitectureMismatch)
        );
    }

    #[test]
    fn mutated_genes_are_drawn_from_unit_interval() {
        let (breeder, _) = breeder(
            4,
            MutationConfig {
                threshold: 1.0,
                fraction: 0.5,
            },
        );
        let parent = |value: f64| {
            NetworkModel::new(
                architecture(),
                vec![vec![value; 20], vec![value; 12]],
                vec![vec![value; 4], vec![value; 3]],
            )
            .unwrap()
        };
        let (mother, father) = (parent(-5.0), parent(-6.0));

        let child = breeder.breed(&mother, &father).unwrap();

        let mutated: Vec<f64> = genes(&child)
            .into_iter()
            .filter(|&g| g != -5.0 && g != -6.0)
            .collect();
        assert!(!mutated.is_empty());
        assert!(mutated.iter().all(|g| (0.0..1.0).contains(g)));
    }

    #[test]
    fn same_seed_breeds_same_child() {
        let (a, initializer_a) = breeder(5, MutationConfig::default());
        let (b, initializer_b) = breeder(5, MutationConfig::default());

        for _ in 0..20 {
            let (mother_a, father_a) = (
                initializer_a.create_model(&architecture()),
                initializer_a.create_model(&architecture()),
            );
            let (mother_b, father_b) = (
                initializer_b.create_model(&architecture()),
                initializer_b.create_model(&architecture()),
            );

            assert_eq!(
                a.breed(&mother_a, &father_a).unwrap(),
                b.breed(&mother_b, &father_b).unwrap()
            );
        }
    }

    #[test]
    fn gene_shares_follow_crossover_and_mutation_rates() {
        let (breeder, initializer) = breeder(6, MutationConfig::default());
        let samples = 10_000;
        let (mut from_mother, mut from_father, mut mutated) = (0usize, 0usize, 0usize);

        for _ in 0..samples {
            let mother = initializer.create_model(&architecture());
            let father = initializer.create_model(&architecture());
            let child = breeder.breed(&mother, &father).unwrap();

            for ((c, m), f) in genes(&child)
                .iter()
                .zip(genes(&mother).iter())
                .zip(genes(&father).iter())
            {
                if c == m {
                    from_mother += 1;
                } else if c == f {
                    from_father += 1;
                } else {
                    mutated += 1;
                }
            }
        }

        let total = (from_mother + from_father + mutated) as f64;
        // 39 genes: a mutation pass happens with p = 0.1 and mutates one gene with p = 0.39
        assert!((0.49..0.51).contains(&(from_mother as f64 / total)));
        assert!((0.49..0.51).contains(&(from_father as f64 / total)));
        assert!((0.0006..0.0014).contains(&(mutated as f64 / total)));
    }
}
