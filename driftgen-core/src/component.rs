//! A single Gaussian component of a mixture.

use rand::{Rng, rngs::SmallRng};
use rand_distr::StandardNormal;

use crate::covariance::CholeskyFactor;

/// One multivariate-Gaussian component: a mean vector, the retained
/// lower-triangular factor, and the covariance derived from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    mean: Vec<f64>,
    factor: CholeskyFactor,
    covariance: Vec<Vec<f64>>,
}

impl Component {
    pub(crate) fn new(mean: Vec<f64>, factor: CholeskyFactor) -> Self {
        let covariance = factor.covariance();
        Self {
            mean,
            factor,
            covariance,
        }
    }

    /// Returns the component mean.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Returns the covariance matrix `L·Lᵗ`.
    #[must_use]
    pub fn covariance(&self) -> &[Vec<f64>] {
        &self.covariance
    }

    /// Returns the retained lower-triangular factor.
    #[must_use]
    pub fn factor(&self) -> &CholeskyFactor {
        &self.factor
    }

    /// Draws one point: `mean + L·z` with `z` i.i.d. standard normal.
    pub(crate) fn sample(&self, rng: &mut SmallRng) -> Vec<f64> {
        let d = self.mean.len();
        let z: Vec<f64> = (0..d).map(|_| rng.sample(StandardNormal)).collect();
        (0..d)
            .map(|j| {
                let spread: f64 = (0..=j).map(|m| self.factor.entry(j, m) * z[m]).sum();
                self.mean[j] + spread
            })
            .collect()
    }

    /// Gaussian density at `point`.
    ///
    /// Evaluated against the retained factor: with `y = L⁻¹(x − μ)`,
    /// `f(x) = exp(−‖y‖²/2) / ((2π)^{d/2}·det L)`. Degenerate factors (a zero
    /// diagonal entry) propagate whatever the arithmetic yields, typically a
    /// zero or NaN density; the caller does not special-case this.
    pub(crate) fn density(&self, point: &[f64]) -> f64 {
        let d = self.mean.len();
        let mut diff: Vec<f64> = point
            .iter()
            .zip(self.mean.iter())
            .map(|(x, mu)| x - mu)
            .collect();
        self.factor.forward_substitute(&mut diff);
        let mahalanobis_sq: f64 = diff.iter().map(|y| y * y).sum();
        let normalizer = (2.0 * std::f64::consts::PI).powf(d as f64 / 2.0)
            * self.factor.determinant();
        (-0.5 * mahalanobis_sq).exp() / normalizer
    }

    pub(crate) fn mean_mut(&mut self) -> &mut [f64] {
        &mut self.mean
    }

    pub(crate) fn factor_mut(&mut self) -> &mut CholeskyFactor {
        &mut self.factor
    }

    /// Re-derives the covariance after the factor was mutated in place.
    pub(crate) fn refresh_covariance(&mut self) {
        self.covariance = self.factor.covariance();
    }
}
