//! Bounded multiplicative jitter for published point estimates

use crate::error::{ForecastError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Scales each estimate by an independent factor drawn from
/// `U[1 - pct, 1 + pct]`, rounds it, and clamps it at zero.
///
/// The random source is a type parameter so tests can run with a seeded
/// generator, or with `pct = 0` for no jitter at all.
#[derive(Debug, Clone)]
pub struct NoiseInjector<R: Rng = StdRng> {
    pct: f64,
    rng: R,
}

impl NoiseInjector<StdRng> {
    /// Jitter seeded from operating system entropy
    pub fn from_entropy(pct: f64) -> Result<Self> {
        Self::new(pct, StdRng::from_entropy())
    }

    /// Reproducible jitter
    pub fn seeded(pct: f64, seed: u64) -> Result<Self> {
        Self::new(pct, StdRng::seed_from_u64(seed))
    }

    /// Jitter that leaves every estimate unchanged
    pub fn disabled() -> Self {
        Self {
            pct: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }
}

impl<R: Rng> NoiseInjector<R> {
    /// Create an injector over an arbitrary random source
    pub fn new(pct: f64, rng: R) -> Result<Self> {
        if !pct.is_finite() || !(0.0..1.0).contains(&pct) {
            return Err(ForecastError::InvalidParameter(format!(
                "Noise fraction must be in [0, 1), got {}",
                pct
            )));
        }
        Ok(Self { pct, rng })
    }

    pub fn pct(&self) -> f64 {
        self.pct
    }

    /// Jitter a single estimate
    pub fn jitter_one(&mut self, value: i64) -> i64 {
        if self.pct == 0.0 {
            return value.max(0);
        }
        let factor = self.rng.gen_range(1.0 - self.pct..=1.0 + self.pct);
        ((value as f64 * factor).round() as i64).max(0)
    }

    /// Jitter every estimate independently
    pub fn jitter(&mut self, values: &[i64]) -> Vec<i64> {
        values.iter().map(|&v| self.jitter_one(v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_fraction() {
        assert!(NoiseInjector::seeded(-0.1, 1).is_err());
        assert!(NoiseInjector::seeded(1.0, 1).is_err());
        assert!(NoiseInjector::seeded(f64::NAN, 1).is_err());
        assert!(NoiseInjector::seeded(0.0, 1).is_ok());
    }

    #[test]
    fn test_disabled_is_identity() {
        let mut noise = NoiseInjector::disabled();
        assert_eq!(noise.jitter(&[0, 7, 120]), vec![0, 7, 120]);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = NoiseInjector::seeded(0.1, 99).unwrap();
        let mut b = NoiseInjector::seeded(0.1, 99).unwrap();
        assert_eq!(a.jitter(&[100, 200, 300]), b.jitter(&[100, 200, 300]));
    }
}
