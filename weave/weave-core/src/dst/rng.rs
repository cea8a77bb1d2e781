//! DeterministicRng - Seeded randomness
//!
//! TigerStyle: Same seed, same sequence. Every run logs its seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::constants::DST_SEED_ENV;

/// Reproducible random source for simulations.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    seed: u64,
    inner: ChaCha8Rng,
}

impl DeterministicRng {
    /// Create from an explicit seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Seed from `DST_SEED` if set, otherwise pick one at random.
    ///
    /// The chosen seed is logged so a failing run can be replayed.
    #[must_use]
    pub fn from_env() -> Self {
        let seed = std::env::var(DST_SEED_ENV)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        tracing::info!(seed, "DST seed (replay with {}={})", DST_SEED_ENV, seed);
        Self::new(seed)
    }

    /// The seed this generator started from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen()
    }

    /// True with the given probability.
    ///
    /// # Panics
    /// Panics if `probability` is outside `[0, 1]`.
    pub fn chance(&mut self, probability: f64) -> bool {
        assert!(
            (0.0..=1.0).contains(&probability),
            "probability must be in [0, 1], got {probability}"
        );
        self.next_f64() < probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRng::new(7);
        let mut b = DeterministicRng::new(7);

        for _ in 0..16 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
        assert_eq!(a.seed(), 7);
    }

    #[test]
    fn test_chance_bounds() {
        let mut rng = DeterministicRng::new(1);

        assert!((0..100).all(|_| !rng.chance(0.0)));
        assert!((0..100).all(|_| rng.chance(1.0)));
    }

    #[test]
    #[should_panic(expected = "probability must be in [0, 1]")]
    fn test_chance_rejects_out_of_range() {
        DeterministicRng::new(1).chance(1.5);
    }
}
