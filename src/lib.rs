//! Learning engine for fully-connected feedforward neural networks.
//!
//! Models are plain values ([`feedforward::NetworkModel`]) produced by an initializer or a
//! breeder and replaced, never changed in place, by the learners:
//! * [`feedforward::BackPropagationLearner`] does batch gradient descent on squared error;
//! * [`genetic::GeneticLearner`] evolves a population of models with crossover and mutation.
//!
//! Both implement [`learner::Learner`] and can be picked at configuration time through
//! [`learner::LearnerConfig`]. Work over a batch or a population runs on the rayon pool; every
//! random draw goes through one shared [`random::RandomService`].

pub mod feedforward;
pub mod genetic;
pub mod learner;
pub mod random;
pub mod training;

#[cfg(feature = "python")]
mod python_ffi;
