//! Common learning interface and configuration-time strategy selection

use std::{fmt, sync::Arc};

use crate::feedforward::{
    BackPropagationLearner, InputOutputPair, NetworkModel, ProcessError, SizeMismatch,
};
use crate::genetic::{
    BreedError, BreedingPolicy, GeneticConfig, GeneticConfigError, GeneticLearner,
    MutationConfig,
};
use crate::random::RandomService;

/// Capability shared by all learners.
///
/// A learner holds the current model and replaces it with an improved one on every `learn`
/// call. Models are never changed in place.
pub trait Learner: Send {
    /// Current (best) model, `None` before `initialize`.
    fn model(&self) -> Option<&NetworkModel>;

    /// Sets the starting model.
    fn initialize(&mut self, model: NetworkModel) -> Result<(), LearnError>;

    /// Runs one learning step over `batch` and returns the resulting model.
    fn learn(&mut self, batch: &[InputOutputPair]) -> Result<&NetworkModel, LearnError>;
}

/// Learner variants selectable at configuration time.
pub enum Strategy {
    BackPropagation(BackPropagationLearner),
    Genetic(GeneticLearner),
}

impl Learner for Strategy {
    fn model(&self) -> Option<&NetworkModel> {
        match self {
            Strategy::BackPropagation(learner) => learner.model(),
            Strategy::Genetic(learner) => learner.model(),
        }
    }

    fn initialize(&mut self, model: NetworkModel) -> Result<(), LearnError> {
        match self {
            Strategy::BackPropagation(learner) => learner.initialize(model),
            Strategy::Genetic(learner) => learner.initialize(model),
        }
    }

    fn learn(&mut self, batch: &[InputOutputPair]) -> Result<&NetworkModel, LearnError> {
        match self {
            Strategy::BackPropagation(learner) => learner.learn(batch),
            Strategy::Genetic(learner) => learner.learn(batch),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearnerConfig {
    BackPropagation,
    Genetic {
        config: GeneticConfig,
        policy: BreedingPolicy,
        mutation: MutationConfig,
    },
}

impl LearnerConfig {
    /// Wires the default components (sigmoid executer, uniform initializer, crossover breeder)
    /// around `random` into a learner.
    ///
    /// # Examples
    /// ```
    /// # use std::sync::Arc;
    /// # use nnlearn::genetic::{BreedingPolicy, GeneticConfig, MutationConfig};
    /// # use nnlearn::learner::{Learner, LearnerConfig};
    /// # use nnlearn::random::RandomService;
    /// let config = LearnerConfig::Genetic {
    ///     config: GeneticConfig::new(28, 7),
    ///     policy: BreedingPolicy::Polygamous,
    ///     mutation: MutationConfig::default(),
    /// };
    /// let learner = config.build(Arc::new(RandomService::seeded(1))).unwrap();
    /// assert!(learner.model().is_none());
    /// ```
    pub fn build(&self, random: Arc<RandomService>) -> Result<Strategy, GeneticConfigError> {
        match *self {
            LearnerConfig::BackPropagation => {
                Ok(Strategy::BackPropagation(BackPropagationLearner::default()))
            }
            LearnerConfig::Genetic {
                config,
                policy,
                mutation,
            } => {
                let learner = GeneticLearner::with_defaults(config, policy, mutation, random)?;
                Ok(Strategy::Genetic(learner))
            }
        }
    }
}

/// Error structure for `Learner` operations
#[derive(Debug, Clone, PartialEq)]
pub enum LearnError {
    NotInitialized,
    AlreadyInitialized,
    EmptyBatch,
    BadSample {
        index: usize,
        error: ProcessError,
    },
    BadDesiredOutputs {
        index: usize,
        mismatch: SizeMismatch,
    },
    Breed(BreedError),
}

impl fmt::Display for LearnError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            LearnError::NotInitialized => write!(f, "Learner has no model yet!"),
            LearnError::AlreadyInitialized => write!(f, "Learner is already initialized!"),
            LearnError::EmptyBatch => write!(f, "Batch is empty!"),
            LearnError::BadSample { index, error } => write!(f, "Sample {}: {}", index, error),
            LearnError::BadDesiredOutputs {
                index,
                mismatch: SizeMismatch { expected, got },
            } => write!(
                f,
                "Sample {}: expected {} desired output(s), but got {}!",
                index, expected, got
            ),
            LearnError::Breed(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for LearnError {}

impl From<BreedError> for LearnError {
    fn from(err: BreedError) -> Self {
        LearnError::Breed(err)
    }
}
