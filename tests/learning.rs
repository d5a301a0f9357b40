use std::{num::NonZeroUsize, sync::Arc};

use nnlearn::feedforward::{
    ActivationFunction, Architecture, Executer, FeedforwardExecuter, InputOutputPair,
    ModelInitializer, NetworkModel, RandomInitializer,
};
use nnlearn::genetic::{BreedingPolicy, GeneticConfig, MutationConfig};
use nnlearn::learner::{Learner, LearnerConfig, Strategy};
use nnlearn::random::RandomService;
use nnlearn::training::{train_epoch, DataPurpose, DataSource};

struct Or;

impl DataSource for Or {
    fn data(&self, _purpose: DataPurpose) -> Vec<InputOutputPair> {
        [(0.0, 0.0, 0.0), (0.0, 1.0, 1.0), (1.0, 0.0, 1.0), (1.0, 1.0, 1.0)]
            .iter()
            .map(|&(a, b, t)| InputOutputPair::new(vec![a, b], vec![t]))
            .collect()
    }
}

fn cost(model: &NetworkModel, batch: &[InputOutputPair]) -> f64 {
    let executer = FeedforwardExecuter::new();
    batch
        .iter()
        .map(|pair| {
            let activations = executer.execute(model, &pair.inputs).unwrap();
            NetworkModel::calc_cost(activations.last().unwrap(), &pair.outputs).unwrap()
        })
        .sum()
}

fn seed_model(architecture: &Architecture, seed: u64) -> NetworkModel {
    RandomInitializer::new(Arc::new(RandomService::seeded(seed))).create_model(architecture)
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Best cost never grows when every generation sees the same batch.
fn evolve(config: GeneticConfig, policy: BreedingPolicy, generations: usize) {
    let random = Arc::new(RandomService::seeded(17));
    let mut learner = LearnerConfig::Genetic {
        config,
        policy,
        mutation: MutationConfig::default(),
    }
    .build(random)
    .unwrap();
    let architecture = Architecture::new(&[2, 2, 1], ActivationFunction::Sigmoid).unwrap();
    let initial = seed_model(&architecture, 3);
    let batch = Or.data(DataPurpose::Training);
    learner.initialize(initial.clone()).unwrap();

    let first = cost(learner.learn(&batch).unwrap(), &batch);
    assert!(first <= cost(&initial, &batch) + 1e-12);

    let mut best = first;
    for _ in 1..generations {
        let current = cost(learner.learn(&batch).unwrap(), &batch);
        assert!(current <= best + 1e-12);
        best = current;
    }

    match &learner {
        Strategy::Genetic(genetic) => {
            let population = genetic.population();
            assert_eq!(population.len(), config.population_size);
            assert!((population[0].cost - best).abs() < 1e-9);
        }
        Strategy::BackPropagation(_) => panic!("genetic strategy expected"),
    }
}

#[test]
fn polygamous_evolution_keeps_best_model() {
    init_logger();
    evolve(GeneticConfig::new(28, 7), BreedingPolicy::Polygamous, 40);
}

#[test]
fn monogamous_evolution_keeps_best_model() {
    init_logger();
    evolve(GeneticConfig::new(63, 42), BreedingPolicy::Monogamous, 15);
}

#[test]
fn backpropagation_epochs_fit_or() {
    init_logger();
    let random = RandomService::seeded(4);
    let mut learner = LearnerConfig::BackPropagation
        .build(Arc::new(RandomService::seeded(4)))
        .unwrap();
    let architecture = Architecture::new(&[2, 1], ActivationFunction::Sigmoid).unwrap();
    let initial = seed_model(&architecture, 4);
    let mut data = Or.data(DataPurpose::Training);
    learner.initialize(initial.clone()).unwrap();

    for _ in 0..300 {
        let steps = train_epoch(&mut learner, &mut data, NonZeroUsize::new(4).unwrap(), &random)
            .unwrap();
        assert_eq!(steps, 1);
    }

    let trained = learner.model().unwrap();
    assert!(cost(trained, &data) < cost(&initial, &data));
    assert!(cost(trained, &data) < 0.5);
}

#[test]
fn learners_share_the_same_interface() {
    let architecture = Architecture::new(&[2, 1], ActivationFunction::Sigmoid).unwrap();
    let configs = [
        LearnerConfig::BackPropagation,
        LearnerConfig::Genetic {
            config: GeneticConfig::new(10, 5),
            policy: BreedingPolicy::Polygamous,
            mutation: MutationConfig::default(),
        },
    ];

    for config in configs.iter() {
        let mut learner: Box<dyn Learner> =
            Box::new(config.build(Arc::new(RandomService::seeded(8))).unwrap());
        assert!(learner.model().is_none());

        learner.initialize(seed_model(&architecture, 9)).unwrap();
        let mut data = Or.data(DataPurpose::Training);
        train_epoch(
            learner.as_mut(),
            &mut data,
            NonZeroUsize::new(3).unwrap(),
            &RandomService::seeded(10),
        )
        .unwrap();

        assert_eq!(learner.model().unwrap().architecture(), &architecture);
    }
}
