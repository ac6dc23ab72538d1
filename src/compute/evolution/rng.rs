//! Seedable random source shared by every population operation.

use rand::prelude::*;

/// Random number generator wrapper for genome operations.
///
/// Passed explicitly to every operation that draws randomness so that runs are
/// reproducible and several populations can evolve side by side.
#[derive(Debug, Clone)]
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Uniform sample in `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f32 {
        self.rng.r#gen::<f32>()
    }

    /// Uniform index in `[0, n)`. `n` must be non-zero.
    #[inline]
    pub fn index(&mut self, n: usize) -> usize {
        self.rng.gen_range(0..n)
    }

    /// True with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform float in `[min, max]`.
    #[inline]
    pub fn uniform(&mut self, min: f32, max: f32) -> f32 {
        (min + (max - min) * self.unit()).min(max)
    }

    /// Uniform integer in `[min, max]`, drawn as a rounded float so both ends get half
    /// the weight of interior values.
    #[inline]
    pub fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        let span = max as f64 - min as f64;
        let offset = (span * self.unit() as f64).round() as i128;
        (min as i128 + offset).clamp(min as i128, max as i128) as i64
    }
}
