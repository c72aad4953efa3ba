//! Drift search: constructing a mixture at a target Hellinger distance.
//!
//! Given a reference ("pre") mixture, the search derives candidate ("post")
//! mixtures, measures each candidate's distance to the reference, and locally
//! adjusts near misses toward the reference until the measured distance lands
//! inside the precision band. Candidates that cannot close the gap within a
//! cumulative miss budget are abandoned for a fresh candidate; exhausted
//! candidate budgets abandon the reference itself for a fresh one. Every
//! budget is bounded, so the search either converges or reports exhaustion.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, info, instrument};

use crate::{
    error::DriftError,
    hellinger::{EstimatorParams, HellingerEstimate, HellingerEstimator},
    model::MixtureModel,
};

/// Default bound on candidate models per reference model.
pub const DEFAULT_MAX_POST_ATTEMPTS: u32 = 100;

/// Default bound on reference-model restarts.
pub const DEFAULT_MAX_PRE_RESTARTS: u32 = 100;

/// Default cumulative |miss| budget for the local adjustment loop.
pub const DEFAULT_ADJUSTMENT_BUDGET: f64 = 5.0;

/// Default magnitude of the anti-stagnation jitter.
pub const DEFAULT_JITTER_MAGNITUDE: f64 = 0.01;

/// Seed offset between consecutive reference models, large enough that
/// candidate seed offsets never collide with a later reference's.
const PRE_SEED_STRIDE: u64 = 100_003;

const JITTER_SEED_SALT: u64 = 0x5EED_C0DE;

/// The search's observable states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SearchState {
    /// Constructing a fresh reference mixture.
    SearchingPre,
    /// Deriving and measuring a fresh candidate mixture.
    SearchingPost,
    /// Nudging a near-miss candidate toward the reference.
    Adjusting,
    /// A candidate landed inside the precision band.
    Converged,
    /// Every budget was exhausted.
    Abandoned,
}

/// Shape and seeding of the mixtures the search constructs.
#[derive(Clone, Copy, Debug)]
pub struct ModelSpec {
    /// Component count of the reference mixture.
    pub pre_components: usize,
    /// Component count of the candidate mixtures.
    pub post_components: usize,
    /// Dimensionality of both mixtures.
    pub dimensions: usize,
    /// Base seed for instance streams.
    pub instance_seed: u64,
    /// Base seed for model streams.
    pub model_seed: u64,
}

/// Validated drift-search configuration.
///
/// # Examples
/// ```
/// use driftgen_core::DriftSearchParams;
///
/// let params = DriftSearchParams::new(0.5, 0.05).expect("valid target");
/// assert_eq!(params.target_distance(), 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct DriftSearchParams {
    target_distance: f64,
    precision: f64,
    max_post_attempts: u32,
    max_pre_restarts: u32,
    adjustment_budget: f64,
    jitter_magnitude: f64,
    estimator_tolerance: f64,
    estimator_min_samples: u64,
    estimator_max_samples: u64,
    integrate_range: Option<f64>,
}

impl DriftSearchParams {
    /// Creates parameters for a target distance and precision band.
    ///
    /// # Errors
    /// Returns [`DriftError::InvalidTargetDistance`] unless the target lies
    /// strictly inside `(0, 1)`, and [`DriftError::InvalidPrecision`] unless
    /// the precision is positive and finite.
    pub fn new(target_distance: f64, precision: f64) -> Result<Self, DriftError> {
        if !target_distance.is_finite() || target_distance <= 0.0 || target_distance >= 1.0 {
            return Err(DriftError::InvalidTargetDistance {
                got: target_distance,
            });
        }
        if !precision.is_finite() || precision <= 0.0 {
            return Err(DriftError::InvalidPrecision { got: precision });
        }
        Ok(Self {
            target_distance,
            precision,
            max_post_attempts: DEFAULT_MAX_POST_ATTEMPTS,
            max_pre_restarts: DEFAULT_MAX_PRE_RESTARTS,
            adjustment_budget: DEFAULT_ADJUSTMENT_BUDGET,
            jitter_magnitude: DEFAULT_JITTER_MAGNITUDE,
            estimator_tolerance: crate::hellinger::DEFAULT_TOLERANCE,
            estimator_min_samples: crate::hellinger::DEFAULT_MIN_SAMPLES,
            estimator_max_samples: crate::hellinger::DEFAULT_MAX_SAMPLES,
            integrate_range: None,
        })
    }

    /// Overrides the candidate budget per reference model.
    #[must_use]
    pub fn with_max_post_attempts(mut self, attempts: u32) -> Self {
        self.max_post_attempts = attempts;
        self
    }

    /// Overrides the reference-restart budget.
    #[must_use]
    pub fn with_max_pre_restarts(mut self, restarts: u32) -> Self {
        self.max_pre_restarts = restarts;
        self
    }

    /// Overrides the cumulative |miss| budget of the adjustment loop.
    #[must_use]
    pub fn with_adjustment_budget(mut self, budget: f64) -> Self {
        self.adjustment_budget = budget;
        self
    }

    /// Overrides the anti-stagnation jitter magnitude.
    #[must_use]
    pub fn with_jitter_magnitude(mut self, magnitude: f64) -> Self {
        self.jitter_magnitude = magnitude.abs();
        self
    }

    /// Overrides the estimator's standard-error tolerance.
    #[must_use]
    pub fn with_estimator_tolerance(mut self, tolerance: f64) -> Self {
        self.estimator_tolerance = tolerance;
        self
    }

    /// Overrides the estimator's sample floor.
    #[must_use]
    pub fn with_estimator_min_samples(mut self, min_samples: u64) -> Self {
        self.estimator_min_samples = min_samples;
        self
    }

    /// Overrides the estimator's sample ceiling.
    #[must_use]
    pub fn with_estimator_max_samples(mut self, max_samples: u64) -> Self {
        self.estimator_max_samples = max_samples;
        self
    }

    /// Pins the integration range instead of deriving a covering range from
    /// the reference mixture.
    #[must_use]
    pub fn with_integrate_range(mut self, range: f64) -> Self {
        self.integrate_range = Some(range);
        self
    }

    /// Returns the target Hellinger distance.
    #[must_use]
    pub fn target_distance(&self) -> f64 {
        self.target_distance
    }

    /// Returns the precision band around the target.
    #[must_use]
    pub fn precision(&self) -> f64 {
        self.precision
    }
}

/// A converged search: the reference, the accepted candidate, and the
/// measured distance between them.
#[derive(Clone, Debug)]
pub struct DriftSearchOutcome {
    pre: MixtureModel,
    post: MixtureModel,
    estimate: HellingerEstimate,
    pre_restarts: u32,
    post_attempts: u32,
    adjustments: u32,
}

impl DriftSearchOutcome {
    /// Returns the reference mixture.
    #[must_use]
    pub fn pre(&self) -> &MixtureModel {
        &self.pre
    }

    /// Returns the accepted candidate mixture.
    #[must_use]
    pub fn post(&self) -> &MixtureModel {
        &self.post
    }

    /// Returns the measured distance between reference and candidate.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.estimate.distance()
    }

    /// Returns the accepted distance estimate in full.
    #[must_use]
    pub fn estimate(&self) -> &HellingerEstimate {
        &self.estimate
    }

    /// Returns how many reference mixtures were constructed.
    #[must_use]
    pub fn pre_restarts(&self) -> u32 {
        self.pre_restarts
    }

    /// Returns how many candidates were measured in total.
    #[must_use]
    pub fn post_attempts(&self) -> u32 {
        self.post_attempts
    }

    /// Returns how many adjustment iterations ran in total.
    #[must_use]
    pub fn adjustments(&self) -> u32 {
        self.adjustments
    }

    /// Decomposes the outcome into the reference and candidate mixtures.
    #[must_use]
    pub fn into_models(self) -> (MixtureModel, MixtureModel) {
        (self.pre, self.post)
    }
}

/// Data carried between states of the search loop.
enum Phase {
    SearchPre,
    SearchPost {
        pre: MixtureModel,
        estimator: HellingerEstimator,
        seed_base: u64,
    },
    Adjust {
        pre: MixtureModel,
        estimator: HellingerEstimator,
        seed_base: u64,
        post: MixtureModel,
        estimate: HellingerEstimate,
        spent: f64,
    },
    Done(Box<DriftSearchOutcome>),
    Abandon,
}

impl Phase {
    const fn state(&self) -> SearchState {
        match self {
            Self::SearchPre => SearchState::SearchingPre,
            Self::SearchPost { .. } => SearchState::SearchingPost,
            Self::Adjust { .. } => SearchState::Adjusting,
            Self::Done(_) => SearchState::Converged,
            Self::Abandon => SearchState::Abandoned,
        }
    }
}

/// Orchestrates the construction of a drifted mixture pair.
///
/// # Examples
/// ```no_run
/// use driftgen_core::{DriftSearch, DriftSearchParams, ModelSpec};
///
/// let params = DriftSearchParams::new(0.5, 0.05).expect("params");
/// let spec = ModelSpec {
///     pre_components: 2,
///     post_components: 2,
///     dimensions: 2,
///     instance_seed: 1,
///     model_seed: 1,
/// };
/// let outcome = DriftSearch::new(params).search(&spec).expect("search");
/// assert!((outcome.distance() - 0.5).abs() <= 0.05);
/// ```
#[derive(Clone, Debug)]
pub struct DriftSearch {
    params: DriftSearchParams,
}

impl DriftSearch {
    /// Creates a search from validated parameters.
    #[must_use]
    pub fn new(params: DriftSearchParams) -> Self {
        Self { params }
    }

    /// Returns the search configuration.
    #[must_use]
    pub fn params(&self) -> &DriftSearchParams {
        &self.params
    }

    /// Runs the search to completion.
    ///
    /// Termination is probabilistic but bounded: the candidate and restart
    /// budgets cap the total work, and exhaustion surfaces as an error rather
    /// than an endless loop.
    ///
    /// # Errors
    /// Returns [`DriftError::EmptyBudget`] for zeroed budgets,
    /// [`DriftError::Model`] or [`DriftError::Estimator`] for invalid model
    /// shapes, and [`DriftError::SearchExhausted`] when every budget ran out.
    #[instrument(
        name = "drift.search",
        skip(self, spec),
        fields(
            target = self.params.target_distance,
            precision = self.params.precision,
            pre_components = spec.pre_components,
            post_components = spec.post_components,
            dimensions = spec.dimensions,
        ),
    )]
    pub fn search(&self, spec: &ModelSpec) -> Result<DriftSearchOutcome, DriftError> {
        if self.params.max_post_attempts == 0 {
            return Err(DriftError::EmptyBudget {
                budget: "max_post_attempts",
            });
        }
        if self.params.max_pre_restarts == 0 {
            return Err(DriftError::EmptyBudget {
                budget: "max_pre_restarts",
            });
        }

        let mut jitter_rng =
            SmallRng::seed_from_u64(spec.model_seed ^ JITTER_SEED_SALT);
        let mut restarts: u32 = 0;
        let mut attempts_total: u32 = 0;
        let mut attempts_this_pre: u32 = 0;
        let mut adjustments: u32 = 0;
        let mut candidate_offset: u64 = 0;

        let mut phase = Phase::SearchPre;
        loop {
            debug!(state = ?phase.state(), restarts, attempts_total, "search step");
            phase = match phase {
                Phase::SearchPre => {
                    if restarts >= self.params.max_pre_restarts {
                        Phase::Abandon
                    } else {
                        let seed_base = u64::from(restarts) * PRE_SEED_STRIDE;
                        let pre = MixtureModel::new(
                            spec.pre_components,
                            spec.dimensions,
                            spec.instance_seed.wrapping_add(seed_base),
                            spec.model_seed.wrapping_add(seed_base),
                        )?;
                        let estimator =
                            HellingerEstimator::new(self.estimator_params(spec, &pre)?);
                        restarts += 1;
                        attempts_this_pre = 0;
                        Phase::SearchPost {
                            pre,
                            estimator,
                            seed_base,
                        }
                    }
                }
                Phase::SearchPost {
                    pre,
                    estimator,
                    seed_base,
                } => {
                    if attempts_this_pre >= self.params.max_post_attempts {
                        Phase::SearchPre
                    } else {
                        candidate_offset += 1;
                        attempts_this_pre += 1;
                        attempts_total += 1;
                        let offset = seed_base.wrapping_add(candidate_offset);
                        let post = MixtureModel::derive(
                            &pre,
                            spec.post_components,
                            self.params.target_distance,
                            spec.instance_seed.wrapping_add(offset),
                            spec.model_seed.wrapping_add(offset),
                        )?;
                        let estimate = estimator.estimate_with_target(
                            &pre,
                            &post,
                            self.params.target_distance,
                        )?;
                        let miss = estimate.distance() - self.params.target_distance;
                        if estimate.converged() && miss.abs() <= self.params.precision {
                            Phase::Done(Box::new(DriftSearchOutcome {
                                pre,
                                post,
                                estimate,
                                pre_restarts: restarts,
                                post_attempts: attempts_total,
                                adjustments,
                            }))
                        } else if estimate.converged() {
                            Phase::Adjust {
                                pre,
                                estimator,
                                seed_base,
                                post,
                                estimate,
                                spent: 0.0,
                            }
                        } else {
                            // Estimate bailed out: the candidate is out of
                            // reach of the target, try another.
                            Phase::SearchPost {
                                pre,
                                estimator,
                                seed_base,
                            }
                        }
                    }
                }
                Phase::Adjust {
                    pre,
                    estimator,
                    seed_base,
                    mut post,
                    estimate,
                    spent,
                } => {
                    let miss = estimate.distance() - self.params.target_distance;
                    let spent = spent + miss.abs();
                    if spent >= self.params.adjustment_budget {
                        debug!(spent, "adjustment budget exhausted, abandoning candidate");
                        Phase::SearchPost {
                            pre,
                            estimator,
                            seed_base,
                        }
                    } else {
                        self.adjust_toward(&mut post, &pre, miss, &mut jitter_rng);
                        adjustments += 1;
                        let estimate = estimator.estimate_with_target(
                            &pre,
                            &post,
                            self.params.target_distance,
                        )?;
                        let miss = estimate.distance() - self.params.target_distance;
                        if estimate.converged() && miss.abs() <= self.params.precision {
                            Phase::Done(Box::new(DriftSearchOutcome {
                                pre,
                                post,
                                estimate,
                                pre_restarts: restarts,
                                post_attempts: attempts_total,
                                adjustments,
                            }))
                        } else if estimate.converged() {
                            Phase::Adjust {
                                pre,
                                estimator,
                                seed_base,
                                post,
                                estimate,
                                spent,
                            }
                        } else {
                            Phase::SearchPost {
                                pre,
                                estimator,
                                seed_base,
                            }
                        }
                    }
                }
                Phase::Done(outcome) => {
                    info!(
                        distance = outcome.distance(),
                        pre_restarts = outcome.pre_restarts,
                        post_attempts = outcome.post_attempts,
                        adjustments = outcome.adjustments,
                        "drift search converged"
                    );
                    return Ok(*outcome);
                }
                Phase::Abandon => {
                    return Err(DriftError::SearchExhausted {
                        pre_restarts: restarts,
                        post_attempts: attempts_total,
                    });
                }
            };
        }
    }

    fn estimator_params(
        &self,
        spec: &ModelSpec,
        pre: &MixtureModel,
    ) -> Result<EstimatorParams, DriftError> {
        let params = match self.params.integrate_range {
            Some(range) => EstimatorParams::new(range)?,
            None => EstimatorParams::covering(pre, pre)?,
        };
        let params = params
            .with_seed(spec.instance_seed.wrapping_add(spec.model_seed))
            .with_min_samples(self.params.estimator_min_samples)
            .with_max_samples(self.params.estimator_max_samples);
        params
            .with_tolerance(self.params.estimator_tolerance)
            .map_err(DriftError::Estimator)
    }

    /// Nudges every weight, mean coordinate, and factor entry of `post`
    /// toward the corresponding entry of `pre`, scaled by the signed miss,
    /// plus a small random jitter against local stagnation. Components
    /// without a counterpart in `pre` receive jitter only. Factor diagonals
    /// are clamped at zero so the candidate stays inside the PSD-generating
    /// parameterization.
    fn adjust_toward(
        &self,
        post: &mut MixtureModel,
        pre: &MixtureModel,
        miss: f64,
        rng: &mut SmallRng,
    ) {
        let shared = post.num_components().min(pre.num_components());
        let dimensions = post.dimensions();
        let jitter = self.params.jitter_magnitude;

        let pre_weights = pre.weights();
        for (index, weight) in post.weights_mut().iter_mut().enumerate() {
            let pull = if index < shared {
                miss * (pre_weights[index] - *weight)
            } else {
                0.0
            };
            *weight += pull + draw_jitter(rng, jitter);
        }

        for index in 0..post.num_components() {
            // Components without a counterpart in the reference receive
            // jitter only.
            let reference = if index < shared {
                pre.component(index)
                    .ok()
                    .map(|component| (component.mean().to_vec(), component.factor().clone()))
            } else {
                None
            };

            let component = &mut post.components_mut()[index];
            for (coordinate, value) in component.mean_mut().iter_mut().enumerate() {
                let pull = reference
                    .as_ref()
                    .map_or(0.0, |(mean, _)| miss * (mean[coordinate] - *value));
                *value += pull + draw_jitter(rng, jitter);
            }
            let factor = component.factor_mut();
            for row in 0..dimensions {
                for col in 0..=row {
                    let entry = factor.entry_mut(row, col);
                    let pull = reference
                        .as_ref()
                        .map_or(0.0, |(_, f)| miss * (f.entry(row, col) - *entry));
                    *entry += pull + draw_jitter(rng, jitter);
                    if col == row {
                        *entry = entry.max(0.0);
                    }
                }
            }
            component.refresh_covariance();
        }

        post.normalize_weights();
    }
}

fn draw_jitter(rng: &mut SmallRng, magnitude: f64) -> f64 {
    if magnitude == 0.0 {
        return 0.0;
    }
    rng.gen_range(-magnitude..magnitude)
}
