//! Drifting stream: two concepts a controlled Hellinger distance apart.
//!
//! The stream burns in on the `pre` concept, crosses a transition window in
//! which each draw picks the `post` concept with a probability given by the
//! transition function, and then stays on `post`.

use std::sync::Arc;

use driftgen_core::{DriftSearch, DriftSearchParams, MixtureModel, ModelSpec};
use rand::{Rng, SeedableRng, distributions::Standard, rngs::SmallRng};
use tracing::info;

use crate::{
    error::StreamError, example::Example, header::StreamHeader, stream::InstanceStream,
};

const SELECTOR_SEED_SALT: u64 = 0x0D12_F75A;

/// How the draw probability shifts from `pre` to `post` across the
/// transition window.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DriftTransition {
    /// Linear ramp: the post probability equals the window progress.
    #[default]
    Incremental,
    /// Logistic ramp: a sigmoid centered on the window midpoint, so the
    /// concepts blend slowly at the edges and quickly in the middle.
    Gradual,
}

impl DriftTransition {
    /// Probability of drawing from `post` at `progress ∈ [0, 1]` through the
    /// window.
    #[must_use]
    pub fn fraction(self, progress: f64) -> f64 {
        let progress = progress.clamp(0.0, 1.0);
        match self {
            Self::Incremental => progress,
            Self::Gradual => 1.0 / (1.0 + (-10.0 * (progress - 0.5)).exp()),
        }
    }
}

/// Configuration for a [`DriftStream`].
#[derive(Clone, Debug)]
pub struct DriftStreamConfig {
    /// Dimensionality of the attribute space.
    pub dimensions: usize,
    /// Component count of the pre-drift concept.
    pub pre_components: usize,
    /// Component count of the post-drift concept.
    pub post_components: usize,
    /// Instances drawn purely from `pre` before the transition starts.
    pub burn_in: u64,
    /// Width of the transition window in instances; zero switches abruptly.
    pub drift_duration: u64,
    /// Transition shape across the window.
    pub transition: DriftTransition,
    /// Drift magnitude, precision, and search budgets. The target distance
    /// doubles as the drift magnitude and must not exceed 0.9.
    pub search: DriftSearchParams,
    /// Seed of the instance streams.
    pub instance_seed: u64,
    /// Seed of the model streams.
    pub model_seed: u64,
}

/// A stream whose generating distribution drifts from a `pre` mixture to a
/// `post` mixture at a caller-chosen Hellinger distance.
#[derive(Clone, Debug)]
pub struct DriftStream {
    pre: MixtureModel,
    post: MixtureModel,
    pre_header: Arc<StreamHeader>,
    post_header: Arc<StreamHeader>,
    burn_in: u64,
    drift_duration: u64,
    transition: DriftTransition,
    selector: SmallRng,
    selector_seed: u64,
    position: u64,
    measured_distance: f64,
}

impl DriftStream {
    /// Runs the drift search and prepares both concepts.
    ///
    /// This is the expensive call: the search measures candidate mixtures by
    /// Monte Carlo integration until one lands inside the precision band.
    ///
    /// # Errors
    /// Returns [`StreamError::InvalidDriftMagnitude`] when the target
    /// distance exceeds 0.9, and [`StreamError::Drift`] when the search
    /// rejects its configuration or exhausts its budgets.
    pub fn new(config: DriftStreamConfig) -> Result<Self, StreamError> {
        let magnitude = config.search.target_distance();
        if magnitude > 0.9 {
            return Err(StreamError::InvalidDriftMagnitude { got: magnitude });
        }

        let spec = ModelSpec {
            pre_components: config.pre_components,
            post_components: config.post_components,
            dimensions: config.dimensions,
            instance_seed: config.instance_seed,
            model_seed: config.model_seed,
        };
        let outcome = DriftSearch::new(config.search).search(&spec)?;
        info!(
            distance = outcome.distance(),
            post_attempts = outcome.post_attempts(),
            "drift stream concepts prepared"
        );

        let measured_distance = outcome.distance();
        let (pre, post) = outcome.into_models();
        let selector_seed = config.instance_seed ^ SELECTOR_SEED_SALT;
        Ok(Self {
            pre_header: Arc::new(StreamHeader::numeric(
                config.dimensions,
                config.pre_components,
            )),
            post_header: Arc::new(StreamHeader::numeric(
                config.dimensions,
                config.post_components,
            )),
            pre,
            post,
            burn_in: config.burn_in,
            drift_duration: config.drift_duration,
            transition: config.transition,
            selector: SmallRng::seed_from_u64(selector_seed),
            selector_seed,
            position: 0,
            measured_distance,
        })
    }

    /// Returns the measured Hellinger distance between the two concepts.
    #[must_use]
    pub fn measured_distance(&self) -> f64 {
        self.measured_distance
    }

    /// Returns the pre-drift concept.
    #[must_use]
    pub fn pre(&self) -> &MixtureModel {
        &self.pre
    }

    /// Returns the post-drift concept.
    #[must_use]
    pub fn post(&self) -> &MixtureModel {
        &self.post
    }

    fn draw_from_post(&mut self, position: u64) -> bool {
        if position < self.burn_in {
            return false;
        }
        let elapsed = position - self.burn_in;
        if elapsed >= self.drift_duration {
            return true;
        }
        let progress = elapsed as f64 / self.drift_duration as f64;
        let threshold = self.transition.fraction(progress);
        self.selector.sample::<f64, _>(Standard) < threshold
    }
}

impl InstanceStream for DriftStream {
    /// The header of the concept the stream has settled on: `pre` until the
    /// transition window closes, `post` afterwards. Individual examples are
    /// stamped with the header of the concept that actually produced them.
    fn header(&self) -> &Arc<StreamHeader> {
        if self.position >= self.burn_in + self.drift_duration {
            &self.post_header
        } else {
            &self.pre_header
        }
    }

    fn next_example(&mut self) -> Example {
        let position = self.position;
        self.position += 1;
        if self.draw_from_post(position) {
            let (values, class) = self.post.sample().into_parts();
            Example::new(Arc::clone(&self.post_header), values, class)
        } else {
            let (values, class) = self.pre.sample().into_parts();
            Example::new(Arc::clone(&self.pre_header), values, class)
        }
    }

    fn restart(&mut self) {
        self.position = 0;
        let (instance_seed, model_seed) = self.pre.seeds();
        self.pre.restart(instance_seed, model_seed);
        let (instance_seed, model_seed) = self.post.seeds();
        self.post.restart(instance_seed, model_seed);
        self.selector = SmallRng::seed_from_u64(self.selector_seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DriftTransition::Incremental)]
    #[case(DriftTransition::Gradual)]
    fn transitions_ramp_from_zero_to_one(#[case] transition: DriftTransition) {
        let start = transition.fraction(0.0);
        let middle = transition.fraction(0.5);
        let end = transition.fraction(1.0);
        assert!(start < 0.01, "window start must favor pre, got {start}");
        assert!((middle - 0.5).abs() < 1e-9);
        assert!(end > 0.99, "window end must favor post, got {end}");
    }

    #[test]
    fn incremental_transition_is_linear() {
        assert!((DriftTransition::Incremental.fraction(0.25) - 0.25).abs() < 1e-12);
        assert!((DriftTransition::Incremental.fraction(0.75) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn gradual_transition_is_steeper_in_the_middle() {
        let edges = DriftTransition::Gradual.fraction(0.1) - DriftTransition::Gradual.fraction(0.0);
        let middle = DriftTransition::Gradual.fraction(0.55) - DriftTransition::Gradual.fraction(0.45);
        assert!(middle > edges);
    }
}
