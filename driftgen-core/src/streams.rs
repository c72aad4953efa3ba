//! Paired seeded random streams backing mixture construction and sampling.
//!
//! The model stream drives geometry (weights, means, covariance factors); the
//! instance stream drives sampling. Keeping them separate means resampling
//! instances never perturbs model geometry, and a model can be reconstructed
//! deterministically from its seed pair.

use rand::{SeedableRng, rngs::SmallRng};

/// Two independently seeded pseudo-random sequences owned by one mixture.
#[derive(Clone, Debug)]
pub struct RandomStreams {
    instance: SmallRng,
    model: SmallRng,
}

impl RandomStreams {
    /// Creates both streams from their seeds.
    ///
    /// # Examples
    /// ```
    /// use driftgen_core::RandomStreams;
    ///
    /// let streams = RandomStreams::new(7, 11);
    /// let again = RandomStreams::new(7, 11);
    /// assert_eq!(format!("{streams:?}"), format!("{again:?}"));
    /// ```
    #[must_use]
    pub fn new(instance_seed: u64, model_seed: u64) -> Self {
        Self {
            instance: SmallRng::seed_from_u64(instance_seed),
            model: SmallRng::seed_from_u64(model_seed),
        }
    }

    /// Reseeds both streams in place. Neither stream observes the other's
    /// reseed.
    pub fn reseed(&mut self, instance_seed: u64, model_seed: u64) {
        self.instance = SmallRng::seed_from_u64(instance_seed);
        self.model = SmallRng::seed_from_u64(model_seed);
    }

    /// The stream that drives instance sampling.
    pub(crate) fn instance(&mut self) -> &mut SmallRng {
        &mut self.instance
    }

    /// The stream that drives model geometry.
    pub(crate) fn model(&mut self) -> &mut SmallRng {
        &mut self.model
    }
}
