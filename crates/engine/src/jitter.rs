//! Uniform multiplicative jitter used by the fallback paths.
//!
//! The RNG is injected so tests and replays can pin a seed. Draws are
//! serialized through a mutex; with parallel batch workers the assignment of
//! draws to requests is not deterministic even when seeded.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const JITTER_LOW: f64 = 0.8;
pub const JITTER_HIGH: f64 = 1.2;

pub struct UniformJitter {
    rng: Mutex<StdRng>,
}

impl UniformJitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    /// Draw a factor from `U(0.8, 1.2)`.
    pub fn sample(&self) -> f64 {
        self.rng.lock().gen_range(JITTER_LOW..=JITTER_HIGH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_stay_in_range() {
        let jitter = UniformJitter::from_entropy();
        for _ in 0..1_000 {
            let factor = jitter.sample();
            assert!((JITTER_LOW..=JITTER_HIGH).contains(&factor), "{factor}");
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = UniformJitter::seeded(42);
        let b = UniformJitter::from_seed(Some(42));
        let xs: Vec<f64> = (0..5).map(|_| a.sample()).collect();
        let ys: Vec<f64> = (0..5).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }
}
