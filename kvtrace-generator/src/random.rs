//! The random source driving all decisions of a generation run.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Exclusive upper bound for generated keys and values.
///
/// Keeps the top two values of the `u64` range unused. Benchmark harnesses use `u64::MAX` as the
/// "not found" sentinel for lookups.
pub const KEY_SPACE_END: u64 = u64::MAX - 1;

/// A seedable source of branch probabilities and 64-bit keys and values.
///
/// Two sources created from the same seed produce identical sequences.
#[derive(Clone, Debug)]
pub struct RandomSource {
    seed: u64,
    rng: SmallRng,
}

impl RandomSource {
    /// Creates a random source from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates a random source with a freshly drawn seed.
    ///
    /// The seed is still available through [`seed`](Self::seed), so the run can be reproduced.
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// The seed this source was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniform value in `[0, 1)` for branch decisions.
    pub fn probability(&mut self) -> f64 {
        self.rng.random()
    }

    /// A uniform key or value in `[0, KEY_SPACE_END)`.
    pub fn key_or_value(&mut self) -> u64 {
        self.rng.random_range(0..KEY_SPACE_END)
    }

    /// A uniform index in `[0, len)`.
    ///
    /// `len` must not be zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}
