//! Dataset boundary and training helpers: shuffled minibatches, epochs and classification
//! accuracy

use std::{
    fmt,
    num::NonZeroUsize,
    slice::Chunks,
    sync::atomic::{AtomicUsize, Ordering},
};

use log::debug;
use rayon::prelude::*;

use crate::feedforward::{Executer, InputOutputPair, NetworkModel, ProcessError};
use crate::learner::{LearnError, Learner};
use crate::random::RandomService;

/// Which part of a dataset is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataPurpose {
    Training,
    Test,
}

impl fmt::Display for DataPurpose {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataPurpose::Training => write!(f, "training"),
            DataPurpose::Test => write!(f, "test"),
        }
    }
}

/// Provider of labelled samples.
pub trait DataSource {
    fn data(&self, purpose: DataPurpose) -> Vec<InputOutputPair>;
}

/// Shuffles `data` in place and splits it into batches of `batch_size`.
/// The last batch may be shorter.
///
/// # Examples
/// ```
/// # use std::num::NonZeroUsize;
/// # use nnlearn::feedforward::InputOutputPair;
/// # use nnlearn::random::RandomService;
/// # use nnlearn::training::minibatches;
/// let mut data: Vec<_> = (0..10)
///     .map(|i| InputOutputPair::new(vec![i as f64], vec![0.0]))
///     .collect();
/// let random = RandomService::seeded(1);
/// let sizes: Vec<usize> = minibatches(&mut data, NonZeroUsize::new(4).unwrap(), &random)
///     .map(|batch| batch.len())
///     .collect();
/// assert_eq!(sizes, vec![4, 4, 2]);
/// ```
pub fn minibatches<'a>(
    data: &'a mut [InputOutputPair],
    batch_size: NonZeroUsize,
    random: &RandomService,
) -> Chunks<'a, InputOutputPair> {
    random.shuffle(data);
    let data: &'a [InputOutputPair] = data;
    data.chunks(batch_size.get())
}

/// Feeds one shuffled pass over `data` to `learner`, batch by batch.
///
/// # Returns
/// Number of learning steps done, or the first learner error.
pub fn train_epoch<L: Learner + ?Sized>(
    learner: &mut L,
    data: &mut [InputOutputPair],
    batch_size: NonZeroUsize,
    random: &RandomService,
) -> Result<usize, LearnError> {
    let mut steps = 0;
    for batch in minibatches(data, batch_size, random) {
        learner.learn(batch)?;
        steps += 1;
    }

    debug!(steps = steps, samples = data.len(); "epoch finished");
    Ok(steps)
}

/// Share of `pairs` for which the strongest output neuron of `model` matches the strongest
/// desired output. Ties resolve to the lowest index. Empty `pairs` score 0.
pub fn classification_accuracy(
    executer: &dyn Executer,
    model: &NetworkModel,
    pairs: &[InputOutputPair],
) -> Result<f64, ProcessError> {
    let correct = AtomicUsize::new(0);
    let incorrect = AtomicUsize::new(0);

    pairs.par_iter().try_for_each(|pair| -> Result<(), ProcessError> {
        let activations = executer.execute(model, &pair.inputs)?;
        let outputs = activations.last().map(Vec::as_slice).unwrap_or(&[]);

        if argmax(outputs) == argmax(&pair.outputs) {
            correct.fetch_add(1, Ordering::Relaxed);
        } else {
            incorrect.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    })?;

    let correct = correct.into_inner();
    let total = correct + incorrect.into_inner();
    if total == 0 {
        return Ok(0.0);
    }
    Ok(correct as f64 / total as f64)
}

fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, max)) if v <= max => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}
