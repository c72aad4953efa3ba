//! Monte Carlo estimation of the Hellinger distance between two mixtures.
//!
//! `H(f1, f2) = sqrt(1 − ∫ sqrt(f1·f2))`, with the integral evaluated over
//! the axis-aligned hyper-cube `[−R/2, R/2]^d` by uniform sampling. A Welford
//! online mean/variance accumulator turns the running sample spread into a
//! standard error, which drives a convergence-adaptive stopping rule: stop
//! once the integral's standard error drops below the tolerance, or bail out
//! early when a caller-supplied target distance is provably out of reach of
//! the current estimate.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, instrument};

use crate::{error::EstimatorError, model::MixtureModel};

/// Sample floor before convergence is assessed.
pub const DEFAULT_MIN_SAMPLES: u64 = 1_000_000;

/// Tolerance on the standard error of the integral estimate.
pub const DEFAULT_TOLERANCE: f64 = 0.001;

/// Hard ceiling on the sample count. Reaching it forces the same early exit
/// as the out-of-reach path, so a degenerate integrand (NaN densities, an
/// unreachable tolerance) cannot spin the loop forever.
pub const DEFAULT_MAX_SAMPLES: u64 = 100_000_000;

#[cfg(feature = "parallel")]
const BATCH_SAMPLES: u64 = 65_536;

/// Configuration for [`HellingerEstimator`].
///
/// # Examples
/// ```
/// use driftgen_core::EstimatorParams;
///
/// let params = EstimatorParams::new(20.0)
///     .expect("range must be accepted")
///     .with_seed(9)
///     .with_min_samples(100_000);
/// assert_eq!(params.integrate_range(), 20.0);
/// ```
#[derive(Clone, Debug)]
pub struct EstimatorParams {
    integrate_range: f64,
    seed: u64,
    min_samples: u64,
    max_samples: u64,
    tolerance: f64,
}

impl EstimatorParams {
    /// Creates parameters with an explicit integration range `R`; the
    /// integration cube is `[−R/2, R/2]^d`.
    ///
    /// # Errors
    /// Returns [`EstimatorError::InvalidIntegrateRange`] when `R` is not
    /// positive and finite.
    pub fn new(integrate_range: f64) -> Result<Self, EstimatorError> {
        if !integrate_range.is_finite() || integrate_range <= 0.0 {
            return Err(EstimatorError::InvalidIntegrateRange {
                got: integrate_range,
            });
        }
        Ok(Self {
            integrate_range,
            seed: 0,
            min_samples: DEFAULT_MIN_SAMPLES,
            max_samples: DEFAULT_MAX_SAMPLES,
            tolerance: DEFAULT_TOLERANCE,
        })
    }

    /// Derives a range covering the effective support of both mixtures:
    /// component means lie within `±range_scale/2` and every factor direction
    /// has standard deviation at most `√d`, so
    /// `R = max(range_scale) + 6·√d` spans both supports with six standard
    /// deviations to spare.
    ///
    /// # Errors
    /// Returns [`EstimatorError::DimensionMismatch`] when the mixtures differ
    /// in dimensionality.
    pub fn covering(left: &MixtureModel, right: &MixtureModel) -> Result<Self, EstimatorError> {
        if left.dimensions() != right.dimensions() {
            return Err(EstimatorError::DimensionMismatch {
                left: left.dimensions(),
                right: right.dimensions(),
            });
        }
        let spread = left.range_scale().max(right.range_scale());
        let range = spread + 6.0 * (left.dimensions() as f64).sqrt();
        Self::new(range)
    }

    /// Seeds the estimator's own random stream, independent of any model
    /// stream.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Overrides the sample floor below which convergence is never assessed.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: u64) -> Self {
        self.min_samples = min_samples.max(1);
        self
    }

    /// Overrides the hard sample ceiling.
    #[must_use]
    pub fn with_max_samples(mut self, max_samples: u64) -> Self {
        self.max_samples = max_samples;
        self
    }

    /// Overrides the standard-error tolerance of the integral estimate.
    ///
    /// # Errors
    /// Returns [`EstimatorError::InvalidTolerance`] when the tolerance is not
    /// positive and finite.
    pub fn with_tolerance(mut self, tolerance: f64) -> Result<Self, EstimatorError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(EstimatorError::InvalidTolerance { got: tolerance });
        }
        self.tolerance = tolerance;
        Ok(self)
    }

    /// Returns the configured integration range.
    #[must_use]
    pub fn integrate_range(&self) -> f64 {
        self.integrate_range
    }

    /// Returns the configured seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the configured sample floor.
    #[must_use]
    pub fn min_samples(&self) -> u64 {
        self.min_samples
    }

    /// Returns the configured sample ceiling.
    #[must_use]
    pub fn max_samples(&self) -> u64 {
        self.max_samples
    }

    /// Returns the configured standard-error tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn effective_max_samples(&self) -> u64 {
        self.max_samples.max(self.min_samples.saturating_add(1))
    }
}

/// Outcome of one distance query.
///
/// Callers must tolerate imprecision: an estimate with `converged() == false`
/// left the loop through the out-of-reach or sample-ceiling path and should be
/// retried with a different candidate rather than trusted blindly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HellingerEstimate {
    distance: f64,
    std_error: f64,
    samples: u64,
    converged: bool,
}

impl HellingerEstimate {
    /// Returns the estimated Hellinger distance in `[0, 1]`.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Returns the standard error of the underlying integral estimate
    /// (before the sqrt transform).
    #[must_use]
    pub fn std_error(&self) -> f64 {
        self.std_error
    }

    /// Returns the number of Monte Carlo samples drawn.
    #[must_use]
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Returns whether the stopping rule was met, as opposed to an early
    /// exit through the out-of-reach or sample-ceiling path.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Conservative error bound on the distance itself. Propagating the
    /// integral error `e` through the sqrt gives `e / (2·distance)` away from
    /// zero; `√e` bounds the error everywhere because
    /// `|√a − √b| ≤ √|a − b|`. The smaller of the two applies.
    #[must_use]
    pub fn distance_error(&self) -> f64 {
        let sqrt_bound = self.std_error.sqrt();
        if self.distance > 0.0 {
            sqrt_bound.min(self.std_error / (2.0 * self.distance))
        } else {
            sqrt_bound
        }
    }
}

/// Welford online mean/variance accumulator.
#[derive(Clone, Copy, Debug, Default)]
struct Welford {
    count: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        self.m2 / (self.count - 1) as f64
    }

    /// Parallel combination of two accumulators (Chan et al.).
    #[cfg(feature = "parallel")]
    fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = *other;
            return;
        }
        let total = self.count + other.count;
        let delta = other.mean - self.mean;
        self.mean += delta * other.count as f64 / total as f64;
        self.m2 += other.m2
            + delta * delta * self.count as f64 * other.count as f64 / total as f64;
        self.count = total;
    }
}

enum LoopDecision {
    Continue,
    Stop { converged: bool },
}

/// Monte Carlo Hellinger-distance estimator over a bounded hyper-cube.
///
/// # Examples
/// ```
/// use driftgen_core::{EstimatorParams, HellingerEstimator, MixtureModel};
///
/// let model = MixtureModel::new(2, 2, 1, 1).expect("model");
/// let params = EstimatorParams::covering(&model, &model)
///     .expect("range")
///     .with_min_samples(10_000)
///     .with_max_samples(20_000)
///     .with_tolerance(0.5)
///     .expect("tolerance");
/// let estimate = HellingerEstimator::new(params)
///     .estimate(&model, &model)
///     .expect("estimate");
/// assert!(estimate.distance() >= 0.0);
/// ```
#[derive(Clone, Debug)]
pub struct HellingerEstimator {
    params: EstimatorParams,
}

impl HellingerEstimator {
    /// Creates an estimator from validated parameters.
    #[must_use]
    pub fn new(params: EstimatorParams) -> Self {
        Self { params }
    }

    /// Returns the estimator configuration.
    #[must_use]
    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Estimates the distance between two mixtures, running until the
    /// stopping rule or the sample ceiling is met.
    ///
    /// # Errors
    /// Returns [`EstimatorError::DimensionMismatch`] when the mixtures differ
    /// in dimensionality.
    pub fn estimate(
        &self,
        left: &MixtureModel,
        right: &MixtureModel,
    ) -> Result<HellingerEstimate, EstimatorError> {
        self.run(left, right, None)
    }

    /// Estimates the distance, additionally bailing out early once `target`
    /// is provably out of reach: when the target's squared distance falls
    /// outside twice the standard error around the squared-distance estimate,
    /// the loop exits with `converged() == false` and the best estimate so
    /// far.
    ///
    /// # Errors
    /// Returns [`EstimatorError::DimensionMismatch`] when the mixtures differ
    /// in dimensionality.
    pub fn estimate_with_target(
        &self,
        left: &MixtureModel,
        right: &MixtureModel,
        target: f64,
    ) -> Result<HellingerEstimate, EstimatorError> {
        self.run(left, right, Some(target))
    }

    #[instrument(
        name = "hellinger.estimate",
        level = "debug",
        skip(self, left, right),
        fields(dimensions = left.dimensions(), target = ?target),
    )]
    fn run(
        &self,
        left: &MixtureModel,
        right: &MixtureModel,
        target: Option<f64>,
    ) -> Result<HellingerEstimate, EstimatorError> {
        if left.dimensions() != right.dimensions() {
            return Err(EstimatorError::DimensionMismatch {
                left: left.dimensions(),
                right: right.dimensions(),
            });
        }

        let dimensions = left.dimensions();
        let volume = self.params.integrate_range.powi(dimensions as i32);
        let (accumulator, converged) = self.accumulate(left, right, target, volume);

        let integral = volume * accumulator.mean;
        let squared = 1.0 - integral;
        let distance = squared.max(0.0).sqrt();
        let std_error = volume * accumulator.sample_variance().sqrt()
            / (accumulator.count as f64).sqrt();
        debug!(
            samples = accumulator.count,
            integral,
            distance,
            std_error,
            converged,
            "monte carlo integration finished"
        );
        Ok(HellingerEstimate {
            distance,
            std_error,
            samples: accumulator.count,
            converged,
        })
    }

    /// One stopping-rule check, valid only past the sample floor.
    fn assess(
        &self,
        accumulator: &Welford,
        volume: f64,
        target: Option<f64>,
    ) -> LoopDecision {
        let n = accumulator.count;
        if n <= self.params.min_samples {
            return LoopDecision::Continue;
        }
        let std_error =
            volume * accumulator.sample_variance().sqrt() / (n as f64).sqrt();
        if std_error < self.params.tolerance {
            return LoopDecision::Stop { converged: true };
        }
        if let Some(target) = target {
            let squared = 1.0 - volume * accumulator.mean;
            if (target * target - squared).abs() > 2.0 * std_error {
                debug!(
                    samples = n,
                    squared,
                    std_error,
                    target,
                    "target distance out of reach, abandoning integration"
                );
                return LoopDecision::Stop { converged: false };
            }
        }
        if n >= self.params.effective_max_samples() {
            return LoopDecision::Stop { converged: false };
        }
        if n % 1_000_000 == 0 {
            debug!(samples = n, estimate = volume * accumulator.mean, std_error, "integration progress");
        }
        LoopDecision::Continue
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate(
        &self,
        left: &MixtureModel,
        right: &MixtureModel,
        target: Option<f64>,
        volume: f64,
    ) -> (Welford, bool) {
        let dimensions = left.dimensions();
        let half = self.params.integrate_range / 2.0;
        let mut rng = SmallRng::seed_from_u64(self.params.seed);
        let mut point = vec![0.0; dimensions];
        let mut accumulator = Welford::default();
        loop {
            for coordinate in &mut point {
                *coordinate = rng.gen_range(-half..half);
            }
            accumulator.push(integrand(left, right, &point));
            match self.assess(&accumulator, volume, target) {
                LoopDecision::Continue => {}
                LoopDecision::Stop { converged } => return (accumulator, converged),
            }
        }
    }

    /// Batched map-reduce variant: fixed-size batches fan out over rayon,
    /// each seeded from `seed + batch_index`, merged in index order so the
    /// result is deterministic for a given seed regardless of scheduling.
    /// The stopping rule runs between rounds.
    #[cfg(feature = "parallel")]
    fn accumulate(
        &self,
        left: &MixtureModel,
        right: &MixtureModel,
        target: Option<f64>,
        volume: f64,
    ) -> (Welford, bool) {
        use rayon::prelude::*;

        let dimensions = left.dimensions();
        let half = self.params.integrate_range / 2.0;
        let batches_per_round = rayon::current_num_threads().max(1) as u64;
        let mut accumulator = Welford::default();
        let mut next_batch: u64 = 0;
        loop {
            let round: Vec<Welford> = (next_batch..next_batch + batches_per_round)
                .into_par_iter()
                .map(|batch| {
                    let mut rng =
                        SmallRng::seed_from_u64(self.params.seed.wrapping_add(batch));
                    let mut point = vec![0.0; dimensions];
                    let mut partial = Welford::default();
                    for _ in 0..BATCH_SAMPLES {
                        for coordinate in &mut point {
                            *coordinate = rng.gen_range(-half..half);
                        }
                        partial.push(integrand(left, right, &point));
                    }
                    partial
                })
                .collect();
            next_batch += batches_per_round;
            for partial in &round {
                accumulator.merge(partial);
            }
            match self.assess(&accumulator, volume, target) {
                LoopDecision::Continue => {}
                LoopDecision::Stop { converged } => return (accumulator, converged),
            }
        }
    }
}

fn integrand(left: &MixtureModel, right: &MixtureModel, point: &[f64]) -> f64 {
    (left.density_unchecked(point) * right.density_unchecked(point)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welford_matches_naive_statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let mut accumulator = Welford::default();
        for value in values {
            accumulator.push(value);
        }
        let mean: f64 = values.iter().sum::<f64>() / values.len() as f64;
        let variance: f64 = values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / (values.len() - 1) as f64;
        assert!((accumulator.mean - mean).abs() < 1e-12);
        assert!((accumulator.sample_variance() - variance).abs() < 1e-12);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn welford_merge_matches_sequential_push() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64).sin()).collect();
        let mut whole = Welford::default();
        for value in &values {
            whole.push(*value);
        }
        let mut first = Welford::default();
        let mut second = Welford::default();
        for value in &values[..37] {
            first.push(*value);
        }
        for value in &values[37..] {
            second.push(*value);
        }
        first.merge(&second);
        assert_eq!(first.count, whole.count);
        assert!((first.mean - whole.mean).abs() < 1e-12);
        assert!((first.sample_variance() - whole.sample_variance()).abs() < 1e-10);
    }

    #[test]
    fn params_reject_degenerate_ranges() {
        assert!(matches!(
            EstimatorParams::new(0.0),
            Err(EstimatorError::InvalidIntegrateRange { .. })
        ));
        assert!(matches!(
            EstimatorParams::new(f64::NAN),
            Err(EstimatorError::InvalidIntegrateRange { .. })
        ));
    }

    #[test]
    fn params_reject_degenerate_tolerances() {
        let params = EstimatorParams::new(10.0).expect("range");
        assert!(matches!(
            params.with_tolerance(-0.5),
            Err(EstimatorError::InvalidTolerance { .. })
        ));
    }

    #[test]
    fn estimate_rejects_mismatched_mixtures() {
        let left = MixtureModel::new(2, 2, 1, 1).expect("left");
        let right = MixtureModel::new(2, 3, 1, 1).expect("right");
        let params = EstimatorParams::new(10.0).expect("range");
        let err = HellingerEstimator::new(params)
            .estimate(&left, &right)
            .expect_err("dimension mismatch must fail");
        assert!(matches!(
            err,
            EstimatorError::DimensionMismatch { left: 2, right: 3 }
        ));
    }
}
