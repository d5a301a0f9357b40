use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use log::trace;
use parking_lot::Mutex;
use rayon::prelude::*;

use super::breeder::{BreedError, ModelBreeder};
use crate::feedforward::NetworkModel;
use crate::random::RandomService;

/// How parents are paired up to produce the next generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreedingPolicy {
    /// Each parent breeds at most once.
    Monogamous,
    /// Each unordered pair of distinct parents breeds at most once.
    Polygamous,
}

impl BreedingPolicy {
    /// Maximal number of children `parents` can produce under this policy.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::genetic::BreedingPolicy;
    /// assert_eq!(BreedingPolicy::Monogamous.capacity(7), 3);
    /// assert_eq!(BreedingPolicy::Polygamous.capacity(7), 21);
    /// ```
    pub fn capacity(self, parents: usize) -> usize {
        match self {
            BreedingPolicy::Monogamous => parents / 2,
            BreedingPolicy::Polygamous => parents * parents.saturating_sub(1) / 2,
        }
    }
}

impl fmt::Display for BreedingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BreedingPolicy::Monogamous => write!(f, "Monogamous"),
            BreedingPolicy::Polygamous => write!(f, "Polygamous"),
        }
    }
}

/// Fills a population up to its size with children of the given parents.
pub struct PopulationBreeder {
    policy: BreedingPolicy,
    breeder: Arc<dyn ModelBreeder>,
    random: Arc<RandomService>,
}

impl PopulationBreeder {
    pub fn new(
        policy: BreedingPolicy,
        breeder: Arc<dyn ModelBreeder>,
        random: Arc<RandomService>,
    ) -> PopulationBreeder {
        PopulationBreeder {
            policy,
            breeder,
            random,
        }
    }

    pub fn policy(&self) -> BreedingPolicy {
        self.policy
    }

    /// Checks that `parents` can fill a population of `population_size`.
    ///
    /// # Returns
    /// * `Ok(children)` with the number of children to breed;
    /// * `Err(BreedError)` if parents don't fit the population or can't form enough pairs.
    pub fn check_capacity(
        &self,
        parents: usize,
        population_size: usize,
    ) -> Result<usize, BreedError> {
        if parents > population_size {
            return Err(BreedError::PopulationTooSmall {
                parents,
                population_size,
            });
        }

        let children = population_size - parents;
        if children > self.policy.capacity(parents) {
            return Err(BreedError::NotEnoughParents {
                policy: self.policy,
                parents,
                children,
            });
        }

        Ok(children)
    }

    /// Breeds `population_size - parents.len()` children.
    ///
    /// Parents are left untouched; the caller puts them in front of the children.
    pub fn create_next_generation(
        &self,
        parents: &[Arc<NetworkModel>],
        population_size: usize,
    ) -> Result<Vec<NetworkModel>, BreedError> {
        let children = self.check_capacity(parents.len(), population_size)?;

        match self.policy {
            BreedingPolicy::Monogamous => self.breed_monogamous(parents, children),
            BreedingPolicy::Polygamous => self.breed_polygamous(parents, children),
        }
    }

    fn breed_monogamous(
        &self,
        parents: &[Arc<NetworkModel>],
        children: usize,
    ) -> Result<Vec<NetworkModel>, BreedError> {
        let mut remaining: Vec<usize> = (0..parents.len()).collect();
        let mut generation = Vec::with_capacity(children);

        while generation.len() < children {
            let mother = remaining[0];
            let father = remaining.remove(self.random.next_between(1, remaining.len()));
            remaining.remove(0);

            trace!("breeding parents {} and {}", mother, father);
            generation.push(self.breeder.breed(&parents[mother], &parents[father])?);
        }

        Ok(generation)
    }

    fn breed_polygamous(
        &self,
        parents: &[Arc<NetworkModel>],
        children: usize,
    ) -> Result<Vec<NetworkModel>, BreedError> {
        let ledger = PairLedger::default();

        (0..children)
            .into_par_iter()
            .map(|_| {
                let (mother, father) = self.reserve_pair(parents.len(), &ledger);
                trace!("breeding parents {} and {}", mother, father);
                self.breeder.breed(&parents[mother], &parents[father])
            })
            .collect()
    }

    /// Draws unordered pairs until one that hasn't bred yet comes up.
    fn reserve_pair(&self, parents: usize, ledger: &PairLedger) -> (usize, usize) {
        loop {
            let a = self.random.next_below(parents);
            let b = self.random.next_below(parents);
            if a == b {
                continue;
            }

            let (mother, father) = if a < b { (a, b) } else { (b, a) };
            if ledger.try_reserve(mother, father) {
                return (mother, father);
            }
        }
    }
}

/// Pairs already used in the current generation, keyed by the lower index.
#[derive(Default)]
struct PairLedger {
    bred: Mutex<HashMap<usize, HashSet<usize>>>,
}

impl PairLedger {
    /// Records pair and returns `true` if it wasn't recorded before.
    fn try_reserve(&self, mother: usize, father: usize) -> bool {
        self.bred.lock().entry(mother).or_default().insert(father)
    }
}
