//! Genetic learning: crossover breeding of models, population refill policies and the
//! generational learner built on top of them

mod breeder;
mod learner;
mod population;

pub use breeder::*;
pub use learner::*;
pub use population::*;
