//! Random positive-semi-definite covariance synthesis.
//!
//! Covariances are never drawn directly. Each component draws a random
//! lower-triangular factor `L` and derives its covariance as `L·Lᵗ`, which is
//! symmetric and positive semi-definite for any `L`. The factor is retained on
//! the component because drift adjustment interpolates factors, not
//! covariances, so every intermediate model stays inside the PSD-generating
//! parameterization.

use rand::{Rng, rngs::SmallRng};

/// A lower-triangular matrix whose self-product `L·Lᵗ` is a valid covariance.
///
/// # Examples
/// ```
/// use driftgen_core::CholeskyFactor;
/// use rand::{SeedableRng, rngs::SmallRng};
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let factor = CholeskyFactor::synthesize(3, &mut rng);
/// let covariance = factor.covariance();
/// assert_eq!(covariance.len(), 3);
/// assert!((covariance[0][1] - covariance[1][0]).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    dimensions: usize,
    rows: Vec<Vec<f64>>,
}

impl CholeskyFactor {
    /// Draws a random factor: sub-diagonal entries uniform in `[-1, 1]`,
    /// diagonal entries uniform in `[0, 1]`, zero above the diagonal.
    #[must_use]
    pub fn synthesize(dimensions: usize, rng: &mut SmallRng) -> Self {
        let rows = (0..dimensions)
            .map(|j| {
                (0..dimensions)
                    .map(|k| {
                        if k < j {
                            rng.gen_range(-1.0..1.0)
                        } else if k == j {
                            rng.gen_range(0.0..1.0)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        Self { dimensions, rows }
    }

    /// Re-derives a factor from a symmetric matrix by classical Cholesky
    /// decomposition. Returns `None` when the matrix is not positive
    /// semi-definite within `tolerance`.
    #[must_use]
    pub fn decompose(matrix: &[Vec<f64>], tolerance: f64) -> Option<Self> {
        let dimensions = matrix.len();
        let mut rows = vec![vec![0.0; dimensions]; dimensions];
        for j in 0..dimensions {
            for k in 0..=j {
                let mut sum = matrix[j][k];
                for m in 0..k {
                    sum -= rows[j][m] * rows[k][m];
                }
                if j == k {
                    if sum < -tolerance {
                        return None;
                    }
                    rows[j][j] = sum.max(0.0).sqrt();
                } else if rows[k][k].abs() > tolerance {
                    rows[j][k] = sum / rows[k][k];
                } else if sum.abs() > tolerance {
                    // A zero pivot with remaining mass means the matrix
                    // is not reproducible as L·Lᵗ.
                    return None;
                }
            }
        }
        Some(Self { dimensions, rows })
    }

    /// Returns the dimensionality of the factor.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns one entry of the factor.
    #[must_use]
    pub fn entry(&self, row: usize, col: usize) -> f64 {
        self.rows[row][col]
    }

    /// Expands the factor into its covariance `L·Lᵗ`, entry `(j, k)` being
    /// `Σ_m L[j][m]·L[k][m]`. Symmetric by construction.
    #[must_use]
    pub fn covariance(&self) -> Vec<Vec<f64>> {
        let d = self.dimensions;
        let mut covariance = vec![vec![0.0; d]; d];
        for j in 0..d {
            for k in 0..=j {
                let mut sum = 0.0;
                for m in 0..=k.min(j) {
                    sum += self.rows[j][m] * self.rows[k][m];
                }
                covariance[j][k] = sum;
                covariance[k][j] = sum;
            }
        }
        covariance
    }

    /// Determinant of the factor, the product of its diagonal.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        (0..self.dimensions).map(|j| self.rows[j][j]).product()
    }

    /// Solves `L·y = rhs` in place by forward substitution.
    ///
    /// A zero diagonal entry yields infinite or NaN coordinates, which the
    /// density evaluation propagates unchanged.
    pub(crate) fn forward_substitute(&self, rhs: &mut [f64]) {
        for j in 0..self.dimensions {
            let mut value = rhs[j];
            for m in 0..j {
                value -= self.rows[j][m] * rhs[m];
            }
            rhs[j] = value / self.rows[j][j];
        }
    }

    /// Mutable access to one entry, used by drift adjustment. Writes above
    /// the diagonal are rejected by debug assertion.
    pub(crate) fn entry_mut(&mut self, row: usize, col: usize) -> &mut f64 {
        debug_assert!(col <= row, "factor is lower-triangular");
        &mut self.rows[row][col]
    }
}
