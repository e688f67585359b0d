//! Trace sampling.

use crate::id_generator::with_rng;
use rand::Rng;

/// Per-trace sampling decision based on a fixed ratio.
///
/// Rates at or above 1 always sample and rates at or below 0 never do,
/// without touching the rng. A disabled tracer never samples, even when
/// the decision is forced; a forced decision on an enabled tracer always
/// samples, which is how error recording bypasses the ratio.
#[derive(Clone, Debug)]
pub struct Sampler {
    enabled: bool,
    sample_rate: f64,
}

impl Sampler {
    /// Create a sampler for the given enabled flag and rate.
    pub fn new(enabled: bool, sample_rate: f64) -> Self {
        Sampler {
            enabled,
            sample_rate,
        }
    }

    /// Decide whether the next trace is recorded.
    pub fn should_sample(&self, force_sample: bool) -> bool {
        if !self.enabled {
            return false;
        }
        if force_sample || self.sample_rate >= 1.0 {
            return true;
        }
        if self.sample_rate <= 0.0 {
            return false;
        }
        with_rng(|rng| rng.random::<f64>()) < self.sample_rate
    }
}
