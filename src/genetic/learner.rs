use std::{fmt, sync::Arc};

use log::{debug, warn};
use parking_lot::Mutex;
use rayon::prelude::*;

use super::breeder::{BreedError, GeneticModelBreeder, MutationConfig};
use super::population::{BreedingPolicy, PopulationBreeder};
use crate::feedforward::{
    Executer, FeedforwardExecuter, InputOutputPair, ModelInitializer, NetworkModel,
    RandomInitializer, SizeMismatch,
};
use crate::learner::{LearnError, Learner};
use crate::random::RandomService;

/// Population settings of `GeneticLearner`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneticConfig {
    /// Number of models kept alive.
    pub population_size: usize,

    /// Number of survivors of every generation.
    pub selection_size: usize,

    /// Share of the survivors taken strictly by cost. The rest is picked at random from the
    /// remaining models.
    pub elite_fraction: f64,
}

impl GeneticConfig {
    pub fn new(population_size: usize, selection_size: usize) -> GeneticConfig {
        GeneticConfig {
            population_size,
            selection_size,
            elite_fraction: 0.7,
        }
    }

    /// Number of best models that always survive.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::genetic::GeneticConfig;
    /// assert_eq!(GeneticConfig::new(28, 7).elite_size(), 5);
    /// assert_eq!(GeneticConfig::new(63, 42).elite_size(), 29);
    /// ```
    pub fn elite_size(&self) -> usize {
        (self.selection_size as f64 * self.elite_fraction).round_ties_even() as usize
    }

    pub fn validate(&self) -> Result<(), GeneticConfigError> {
        if self.selection_size < 2 {
            return Err(GeneticConfigError::SelectionTooSmall(self.selection_size));
        }
        if self.selection_size > self.population_size {
            return Err(GeneticConfigError::SelectionExceedsPopulation {
                selection_size: self.selection_size,
                population_size: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.elite_fraction) {
            return Err(GeneticConfigError::BadEliteFraction(self.elite_fraction));
        }
        Ok(())
    }
}

/// Model together with its accumulated cost.
#[derive(Debug, Clone)]
pub struct CostModel {
    pub model: Arc<NetworkModel>,
    pub cost: f64,
}

impl CostModel {
    fn new(model: Arc<NetworkModel>) -> CostModel {
        CostModel { model, cost: 0.0 }
    }
}

/// Population-based learner.
///
/// Every `learn` call scores the population on the batch, keeps the best models plus a few
/// random ones, and refills the population with their children. Survivors keep the cost they
/// were scored with and are not rescored in later generations.
pub struct GeneticLearner {
    config: GeneticConfig,
    initializer: Arc<dyn ModelInitializer>,
    executer: Arc<dyn Executer>,
    breeder: PopulationBreeder,
    random: Arc<RandomService>,
    population: Vec<CostModel>,
    first_epoch: bool,
}

impl GeneticLearner {
    /// Returns an uninitialized learner.
    ///
    /// # Returns
    /// * `Ok(GeneticLearner)` if `config` is consistent and the breeder can refill the
    /// population from the selected models;
    /// * `Err(GeneticConfigError)` otherwise.
    pub fn new(
        config: GeneticConfig,
        initializer: Arc<dyn ModelInitializer>,
        executer: Arc<dyn Executer>,
        breeder: PopulationBreeder,
        random: Arc<RandomService>,
    ) -> Result<GeneticLearner, GeneticConfigError> {
        config.validate()?;
        breeder
            .check_capacity(config.selection_size, config.population_size)
            .map_err(GeneticConfigError::Breed)?;

        Ok(GeneticLearner {
            config,
            initializer,
            executer,
            breeder,
            random,
            population: Vec::with_capacity(config.population_size),
            first_epoch: true,
        })
    }

    /// Uninitialized learner with random initialization, `GeneticModelBreeder` children and
    /// the feedforward executer, all drawing from `random`.
    pub fn with_defaults(
        config: GeneticConfig,
        policy: BreedingPolicy,
        mutation: MutationConfig,
        random: Arc<RandomService>,
    ) -> Result<GeneticLearner, GeneticConfigError> {
        let initializer: Arc<dyn ModelInitializer> =
            Arc::new(RandomInitializer::new(random.clone()));
        let breeder = GeneticModelBreeder::new(initializer.clone(), random.clone(), mutation);
        GeneticLearner::new(
            config,
            initializer,
            Arc::new(FeedforwardExecuter::new()),
            PopulationBreeder::new(policy, Arc::new(breeder), random.clone()),
            random,
        )
    }

    pub fn config(&self) -> &GeneticConfig {
        &self.config
    }

    /// Current population, best first after any `learn` call.
    pub fn population(&self) -> &[CostModel] {
        &self.population
    }

    /// Seeds the population with `model` and fills the rest with random models of the same
    /// architecture. The seed is kept as is, without copying.
    pub fn initialize_shared(&mut self, model: Arc<NetworkModel>) -> Result<(), LearnError> {
        if !self.population.is_empty() {
            return Err(LearnError::AlreadyInitialized);
        }

        let architecture = model.architecture().clone();
        self.population.push(CostModel::new(model));
        for _ in 1..self.config.population_size {
            let model = self.initializer.create_model(&architecture);
            self.population.push(CostModel::new(Arc::new(model)));
        }

        debug!(
            population_size = self.population.len();
            "population initialized"
        );
        Ok(())
    }

    /// Cost of every pair in `batch`, summed per model, for models from `start` on.
    fn evaluate(&self, batch: &[InputOutputPair], start: usize) -> Result<Vec<f64>, LearnError> {
        let members = &self.population[start..];
        let costs = CostLedger::new(members.len());
        let executer = &self.executer;

        batch.par_iter().enumerate().try_for_each(|(index, pair)| {
            members
                .par_iter()
                .enumerate()
                .try_for_each(|(slot, member)| -> Result<(), LearnError> {
                    let activations = executer
                        .execute(&member.model, &pair.inputs)
                        .map_err(|error| LearnError::BadSample { index, error })?;
                    let outputs = activations.last().map(Vec::as_slice).unwrap_or(&[]);
                    let cost = NetworkModel::calc_cost(outputs, &pair.outputs)
                        .map_err(|mismatch| LearnError::BadDesiredOutputs { index, mismatch })?;
                    costs.add(slot, cost);
                    Ok(())
                })
        })?;

        Ok(costs.into_totals().collect())
    }

    /// Survivors of the cost-sorted `ranked` population followed by their children.
    fn next_generation(&self, ranked: &[CostModel]) -> Result<Vec<CostModel>, BreedError> {
        let population_size = ranked.len();
        let elite = self.config.elite_size();
        let lucky = self.random.distinct_between(
            elite,
            population_size,
            self.config.selection_size - elite,
        );

        let mut generation: Vec<CostModel> = (0..elite)
            .chain(lucky)
            .map(|index| ranked[index].clone())
            .collect();
        let parents: Vec<Arc<NetworkModel>> =
            generation.iter().map(|s| Arc::clone(&s.model)).collect();

        let children = self
            .breeder
            .create_next_generation(&parents, population_size)?;
        generation.extend(children.into_iter().map(|c| CostModel::new(Arc::new(c))));

        Ok(generation)
    }
}

impl Learner for GeneticLearner {
    fn model(&self) -> Option<&NetworkModel> {
        self.population.first().map(|member| &*member.model)
    }

    fn initialize(&mut self, model: NetworkModel) -> Result<(), LearnError> {
        self.initialize_shared(Arc::new(model))
    }

    /// Runs one generation.
    ///
    /// # Returns
    /// * `Ok(&NetworkModel)` with the best model after selection;
    /// * `Err(LearnError)` if the learner is uninitialized, the batch doesn't fit the
    /// architecture or breeding fails. The population is left unchanged in that case.
    fn learn(&mut self, batch: &[InputOutputPair]) -> Result<&NetworkModel, LearnError> {
        let output_size = match self.population.first() {
            Some(member) => member.model.architecture().output_size(),
            None => return Err(LearnError::NotInitialized),
        };

        if let Some((index, pair)) = batch
            .iter()
            .enumerate()
            .find(|(_, pair)| pair.outputs.len() != output_size)
        {
            return Err(LearnError::BadDesiredOutputs {
                index,
                mismatch: SizeMismatch {
                    expected: output_size,
                    got: pair.outputs.len(),
                },
            });
        }

        let mut ranked = self.population.clone();
        if batch.is_empty() {
            warn!("empty batch, generation is bred without scoring");
        } else {
            let start = if self.first_epoch {
                0
            } else {
                self.config.selection_size
            };
            let totals = self.evaluate(batch, start)?;
            for (member, cost) in ranked[start..].iter_mut().zip(totals) {
                member.cost += cost;
            }
        }

        ranked.sort_by(|a, b| a.cost.total_cmp(&b.cost));
        self.population = self.next_generation(&ranked)?;
        self.first_epoch = false;

        let best = &self.population[0];
        debug!(
            samples = batch.len(),
            best_cost = best.cost;
            "generation done"
        );
        Ok(&*best.model)
    }
}

/// Per-model cost accumulators shared between scoring workers.
struct CostLedger {
    cells: Box<[Mutex<f64>]>,
}

impl CostLedger {
    fn new(size: usize) -> CostLedger {
        CostLedger {
            cells: (0..size).map(|_| Mutex::new(0.0)).collect(),
        }
    }

    fn add(&self, slot: usize, cost: f64) {
        *self.cells[slot].lock() += cost;
    }

    fn into_totals(self) -> impl Iterator<Item = f64> {
        self.cells.into_vec().into_iter().map(Mutex::into_inner)
    }
}

/// Error structure for `GeneticLearner` construction
#[derive(Debug, Clone, PartialEq)]
pub enum GeneticConfigError {
    SelectionTooSmall(usize),
    SelectionExceedsPopulation {
        selection_size: usize,
        population_size: usize,
    },
    BadEliteFraction(f64),
    Breed(BreedError),
}

impl fmt::Display for GeneticConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            GeneticConfigError::SelectionTooSmall(size) => {
                write!(f, "At least 2 survivors are needed, got {}!", size)
            }
            GeneticConfigError::SelectionExceedsPopulation {
                selection_size,
                population_size,
            } => write!(
                f,
                "Can't select {} survivors out of {} models!",
                selection_size, population_size
            ),
            GeneticConfigError::BadEliteFraction(fraction) => {
                write!(f, "Elite fraction must be in [0,1], got {}!", fraction)
            }
            GeneticConfigError::Breed(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for GeneticConfigError {}

impl From<BreedError> for GeneticConfigError {
    fn from(err: BreedError) -> Self {
        GeneticConfigError::Breed(err)
    }
}
