//! Seeded random number helpers
//!
//! Every consumer of randomness (weight initialization, dropout masks, batch
//! shuffling) receives an explicit [`StdRng`] instead of reaching for a global
//! generator, so a single seed reproduces a whole training run.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Deterministic generator for the given seed.
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// One draw from the standard normal distribution N(0, 1).
pub fn standard_normal(rng: &mut impl Rng) -> f32 {
    rng.sample(StandardNormal)
}

/// `0..len` in a random order (Fisher-Yates).
pub fn shuffled_indices(rng: &mut impl Rng, len: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..len).collect();
    indices.shuffle(rng);
    indices
}
