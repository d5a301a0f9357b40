//! Thread-safe uniform random source shared by every stochastic component.

use parking_lot::Mutex;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_pcg::Pcg64;

/// Random number service.
///
/// All draws go through one generator guarded by a mutex, so the service can be shared
/// between rayon workers behind an `Arc`. With a fixed seed and a sequential caller the
/// sequence of draws is reproducible bit for bit.
pub struct RandomService {
    rng: Mutex<Pcg64>,
}

impl RandomService {
    /// Returns service seeded from the thread-local entropy source.
    pub fn new() -> RandomService {
        RandomService::seeded(rand::random())
    }

    /// Returns service with a fixed seed.
    ///
    /// # Examples
    /// ```
    /// # use nnlearn::random::RandomService;
    /// let a = RandomService::seeded(7);
    /// let b = RandomService::seeded(7);
    /// assert_eq!(a.next_f64(), b.next_f64());
    /// ```
    pub fn seeded(seed: u64) -> RandomService {
        RandomService {
            rng: Mutex::new(Pcg64::seed_from_u64(seed)),
        }
    }

    /// Uniform value from [0,1).
    pub fn next_f64(&self) -> f64 {
        self.rng.lock().gen::<f64>()
    }

    /// Uniform index from [0, max).
    ///
    /// Panics if `max` is zero.
    pub fn next_below(&self, max: usize) -> usize {
        self.rng.lock().gen_range(0..max)
    }

    /// Uniform index from [min, max).
    ///
    /// Panics if the range is empty.
    pub fn next_between(&self, min: usize, max: usize) -> usize {
        self.rng.lock().gen_range(min..max)
    }

    /// Fair coin flip.
    pub fn coin(&self) -> bool {
        self.next_below(2) == 0
    }

    /// Shuffles slice in place.
    pub fn shuffle<T>(&self, items: &mut [T]) {
        items.shuffle(&mut *self.rng.lock());
    }

    /// Draws `count` distinct indices from [min, max), in draw order.
    ///
    /// Panics if the range holds fewer than `count` values.
    pub fn distinct_between(&self, min: usize, max: usize, count: usize) -> Vec<usize> {
        assert!(
            max.saturating_sub(min) >= count,
            "cannot draw {} distinct values from {}..{}",
            count,
            min,
            max
        );

        let mut drawn = Vec::with_capacity(count);
        while drawn.len() < count {
            let candidate = self.next_between(min, max);
            if !drawn.contains(&candidate) {
                drawn.push(candidate);
            }
        }
        drawn
    }
}

impl Default for RandomService {
    fn default() -> Self {
        RandomService::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_sequence() {
        let a = RandomService::seeded(42);
        let b = RandomService::seeded(42);

        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
            assert_eq!(a.next_below(17), b.next_below(17));
        }
    }

    #[test]
    fn draws_stay_in_range() {
        let random = RandomService::seeded(1);

        for _ in 0..1000 {
            let x = random.next_f64();
            assert!((0.0..1.0).contains(&x));
            assert!(random.next_below(3) < 3);
            let i = random.next_between(5, 9);
            assert!((5..9).contains(&i));
        }
    }

    #[test]
    fn distinct_between_never_repeats() {
        let random = RandomService::seeded(3);

        let drawn = random.distinct_between(10, 20, 10);
        let mut sorted = drawn.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (10..20).collect::<Vec<_>>());
    }

    #[test]
    #[should_panic]
    fn distinct_between_rejects_short_range() {
        RandomService::seeded(3).distinct_between(0, 2, 3);
    }

    #[test]
    fn shuffle_keeps_elements() {
        let random = RandomService::seeded(9);
        let mut items: Vec<usize> = (0..50).collect();

        random.shuffle(&mut items);
        items.sort_unstable();
        assert_eq!(items, (0..50).collect::<Vec<_>>());
    }
}
