//! Weighted multivariate-Gaussian mixture models.
//!
//! A [`MixtureModel`] owns its components, its normalized weight vector, and a
//! pair of seeded random streams (see [`RandomStreams`]). Geometry is fixed at
//! construction except for the explicit mutation operations (weight setters
//! and drift adjustment); `num_components` and `dimensions` never change.

use rand::{Rng, distributions::Standard, rngs::SmallRng};
use tracing::warn;

use crate::{
    component::Component,
    covariance::CholeskyFactor,
    error::ModelError,
    streams::RandomStreams,
};

/// One sampled instance: a point in attribute space plus the index of the
/// component that produced it, used as the class label.
///
/// # Examples
/// ```
/// use driftgen_core::MixtureModel;
///
/// let mut model = MixtureModel::new(3, 2, 1, 1).expect("valid parameters");
/// let point = model.sample();
/// assert_eq!(point.attributes().len(), 2);
/// assert!(point.label() < 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledPoint {
    attributes: Vec<f64>,
    label: usize,
}

impl LabeledPoint {
    /// Returns the sampled attribute vector.
    #[must_use]
    pub fn attributes(&self) -> &[f64] {
        &self.attributes
    }

    /// Returns the class label (the index of the generating component).
    #[must_use]
    pub fn label(&self) -> usize {
        self.label
    }

    /// Decomposes the point into its attribute vector and label.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f64>, usize) {
        (self.attributes, self.label)
    }
}

/// A weighted mixture of multivariate-Gaussian components.
///
/// # Examples
/// ```
/// use driftgen_core::MixtureModel;
///
/// let model = MixtureModel::new(4, 3, 1, 1).expect("valid parameters");
/// let total: f64 = model.weights().iter().sum();
/// assert!((total - 1.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct MixtureModel {
    num_components: usize,
    dimensions: usize,
    range_scale: f64,
    weights: Vec<f64>,
    components: Vec<Component>,
    streams: RandomStreams,
    instance_seed: u64,
    model_seed: u64,
}

impl MixtureModel {
    /// Builds a randomized mixture with `range_scale` defaulting to the
    /// component count, so components spread out as the mixture grows.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidComponentCount`] or
    /// [`ModelError::InvalidDimensions`] when either count is zero.
    pub fn new(
        num_components: usize,
        dimensions: usize,
        instance_seed: u64,
        model_seed: u64,
    ) -> Result<Self, ModelError> {
        Self::with_range_scale(
            num_components,
            dimensions,
            instance_seed,
            model_seed,
            num_components as f64,
        )
    }

    /// Builds a randomized mixture with an explicit mean spread.
    ///
    /// Per component, in model-stream draw order: one unnormalized weight
    /// `~ U(0, 1)`, a mean with each coordinate
    /// `~ U(−range_scale/2, range_scale/2)`, then a random covariance factor.
    /// Weights are normalized once all components are built.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidComponentCount`],
    /// [`ModelError::InvalidDimensions`], or
    /// [`ModelError::InvalidRangeScale`] for invalid inputs.
    pub fn with_range_scale(
        num_components: usize,
        dimensions: usize,
        instance_seed: u64,
        model_seed: u64,
        range_scale: f64,
    ) -> Result<Self, ModelError> {
        validate_shape(num_components, dimensions)?;
        if !range_scale.is_finite() || range_scale <= 0.0 {
            return Err(ModelError::InvalidRangeScale { got: range_scale });
        }

        let mut streams = RandomStreams::new(instance_seed, model_seed);
        let mut weights = Vec::with_capacity(num_components);
        let mut components = Vec::with_capacity(num_components);
        let half = range_scale / 2.0;
        for _ in 0..num_components {
            weights.push(streams.model().sample(Standard));
            let mean = draw_mean(streams.model(), dimensions, half);
            let factor = CholeskyFactor::synthesize(dimensions, streams.model());
            components.push(Component::new(mean, factor));
        }

        let mut model = Self {
            num_components,
            dimensions,
            range_scale,
            weights,
            components,
            streams,
            instance_seed,
            model_seed,
        };
        model.normalize_weights();
        Ok(model)
    }

    /// Builds a mixture derived from `source`, blended toward fresh random
    /// geometry by `target_distance`.
    ///
    /// Indices present in the source copy its weight and mean and inherit its
    /// covariance factor unmodified; indices beyond the source draw fresh
    /// values throughout. Every weight and mean coordinate is then
    /// interpolated as `(1 − t²)·base + t²·fresh` with `t = target_distance`,
    /// and the weights renormalized. This gives a continuously tunable
    /// distance dial without a distance query.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidComponentCount`] when `num_components` is
    /// zero and [`ModelError::InvalidTargetDistance`] when `target_distance`
    /// is outside `[0, 1]`.
    pub fn derive(
        source: &Self,
        num_components: usize,
        target_distance: f64,
        instance_seed: u64,
        model_seed: u64,
    ) -> Result<Self, ModelError> {
        if num_components == 0 {
            return Err(ModelError::InvalidComponentCount { got: 0 });
        }
        if !target_distance.is_finite() || !(0.0..=1.0).contains(&target_distance) {
            return Err(ModelError::InvalidTargetDistance {
                got: target_distance,
            });
        }

        let dimensions = source.dimensions;
        let half = source.range_scale / 2.0;
        let blend = target_distance * target_distance;
        let keep = 1.0 - blend;

        let mut streams = RandomStreams::new(instance_seed, model_seed);
        let mut weights = Vec::with_capacity(num_components);
        let mut components = Vec::with_capacity(num_components);
        for index in 0..num_components {
            let (base_weight, base_mean, factor) = if index < source.num_components {
                (
                    source.weights[index],
                    source.components[index].mean().to_vec(),
                    source.components[index].factor().clone(),
                )
            } else {
                let weight = streams.model().sample(Standard);
                let mean = draw_mean(streams.model(), dimensions, half);
                let factor = CholeskyFactor::synthesize(dimensions, streams.model());
                (weight, mean, factor)
            };

            let fresh_weight: f64 = streams.model().sample(Standard);
            weights.push(keep * base_weight + blend * fresh_weight);
            let mean: Vec<f64> = base_mean
                .into_iter()
                .map(|base| {
                    let fresh = streams.model().gen_range(-half..half);
                    keep * base + blend * fresh
                })
                .collect();
            components.push(Component::new(mean, factor));
        }

        let mut model = Self {
            num_components,
            dimensions,
            range_scale: source.range_scale,
            weights,
            components,
            streams,
            instance_seed,
            model_seed,
        };
        model.normalize_weights();
        Ok(model)
    }

    /// Draws one labeled instance: a weighted component selection followed by
    /// one Gaussian draw from the selected component. Consumes draws from the
    /// instance stream only.
    pub fn sample(&mut self) -> LabeledPoint {
        let label = self.select_component();
        let attributes = self.components[label].sample(self.streams.instance());
        LabeledPoint { attributes, label }
    }

    /// Mixture density `Σ wᵢ·N(x; μᵢ, Σᵢ)` at `point`. Pure.
    ///
    /// # Errors
    /// Returns [`ModelError::PointDimensionMismatch`] when the point has the
    /// wrong dimensionality.
    pub fn density(&self, point: &[f64]) -> Result<f64, ModelError> {
        if point.len() != self.dimensions {
            return Err(ModelError::PointDimensionMismatch {
                got: point.len(),
                expected: self.dimensions,
            });
        }
        Ok(self.density_unchecked(point))
    }

    /// Mixture density without the dimensionality check, for callers that
    /// validated the point once up front (the Monte Carlo loop).
    pub(crate) fn density_unchecked(&self, point: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(self.components.iter())
            .map(|(weight, component)| weight * component.density(point))
            .sum()
    }

    /// Reseeds both random streams in place. Geometry is untouched; only
    /// future instance draws are affected.
    pub fn restart(&mut self, instance_seed: u64, model_seed: u64) {
        self.instance_seed = instance_seed;
        self.model_seed = model_seed;
        self.streams.reseed(instance_seed, model_seed);
    }

    /// Returns the `(instance_seed, model_seed)` pair the streams were last
    /// seeded with, so callers can replay the model from scratch.
    #[must_use]
    pub fn seeds(&self) -> (u64, u64) {
        (self.instance_seed, self.model_seed)
    }

    /// Sets one weight, clamping it to `[0, 1]`, and rescales every other
    /// weight proportionally so the vector still sums to one. Out-of-range
    /// inputs are clamped with a warning, never an error.
    ///
    /// # Errors
    /// Returns [`ModelError::ComponentOutOfBounds`] for an invalid index.
    pub fn set_weight(&mut self, index: usize, weight: f64) -> Result<(), ModelError> {
        self.check_index(index)?;
        let clamped = if weight.is_nan() { 0.0 } else { weight.clamp(0.0, 1.0) };
        if clamped != weight {
            warn!(index, weight, clamped, "weight outside [0, 1] was clamped");
        }
        if self.num_components == 1 {
            self.weights[0] = 1.0;
            return Ok(());
        }

        let others: f64 = self
            .weights
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, w)| w)
            .sum();
        self.weights[index] = clamped;
        let remainder = 1.0 - clamped;
        if others > 0.0 {
            let scale = remainder / others;
            for (j, w) in self.weights.iter_mut().enumerate() {
                if j != index {
                    *w *= scale;
                }
            }
        } else {
            let share = remainder / (self.num_components - 1) as f64;
            for (j, w) in self.weights.iter_mut().enumerate() {
                if j != index {
                    *w = share;
                }
            }
        }
        Ok(())
    }

    /// Redraws every weight, splitting the mass between a majority block (the
    /// first `num_majority` components, normalized to `majority_total`) and
    /// the minority block (the rest, normalized to `1 − majority_total`).
    /// Used to construct class-imbalanced streams.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidMajoritySplit`] unless
    /// `1 ≤ num_majority < num_components`, and
    /// [`ModelError::InvalidMajorityTotal`] when `majority_total` is not a
    /// probability.
    pub fn set_weights(
        &mut self,
        num_majority: usize,
        majority_total: f64,
    ) -> Result<(), ModelError> {
        if num_majority == 0 || num_majority >= self.num_components {
            return Err(ModelError::InvalidMajoritySplit {
                num_majority,
                num_components: self.num_components,
            });
        }
        if !majority_total.is_finite() || !(0.0..=1.0).contains(&majority_total) {
            return Err(ModelError::InvalidMajorityTotal {
                got: majority_total,
            });
        }

        for weight in &mut self.weights {
            *weight = self.streams.model().sample(Standard);
        }
        normalize_block(&mut self.weights[..num_majority], majority_total);
        normalize_block(&mut self.weights[num_majority..], 1.0 - majority_total);
        Ok(())
    }

    /// Per-component concept labels for concept-marked streams: component `i`
    /// belongs to concept `i`.
    ///
    /// # Errors
    /// Returns [`ModelError::InvalidMajoritySplit`] when `num_majority`
    /// exceeds the component count or is zero.
    pub fn concept_assignments(&self, num_majority: usize) -> Result<Vec<f64>, ModelError> {
        if num_majority == 0 || num_majority > self.num_components {
            return Err(ModelError::InvalidMajoritySplit {
                num_majority,
                num_components: self.num_components,
            });
        }
        Ok((0..self.num_components).map(|i| i as f64).collect())
    }

    /// Returns the dimensionality of the attribute space.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Returns the number of components.
    #[must_use]
    pub fn num_components(&self) -> usize {
        self.num_components
    }

    /// Returns the mean spread the mixture was constructed with.
    #[must_use]
    pub fn range_scale(&self) -> f64 {
        self.range_scale
    }

    /// Returns an owned copy of the weight vector. Mutating the copy never
    /// affects the mixture; use [`Self::set_weight`] for that.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.weights.clone()
    }

    /// Returns one weight.
    ///
    /// # Errors
    /// Returns [`ModelError::ComponentOutOfBounds`] for an invalid index.
    pub fn weight(&self, index: usize) -> Result<f64, ModelError> {
        self.check_index(index)?;
        Ok(self.weights[index])
    }

    /// Returns one component for introspection.
    ///
    /// # Errors
    /// Returns [`ModelError::ComponentOutOfBounds`] for an invalid index.
    pub fn component(&self, index: usize) -> Result<&Component, ModelError> {
        self.check_index(index)?;
        Ok(&self.components[index])
    }

    /// Cumulative-sum inverse-CDF selection over the weight vector. The final
    /// bucket is a catch-all so float drift in the sum can never exclude the
    /// last component.
    fn select_component(&mut self) -> usize {
        let draw: f64 = self.streams.instance().sample(Standard);
        let mut cumulative = 0.0;
        for (index, weight) in self.weights.iter().enumerate() {
            cumulative += weight;
            if draw < cumulative {
                return index;
            }
        }
        self.num_components - 1
    }

    fn check_index(&self, index: usize) -> Result<(), ModelError> {
        if index >= self.num_components {
            return Err(ModelError::ComponentOutOfBounds {
                index,
                num_components: self.num_components,
            });
        }
        Ok(())
    }

    pub(crate) fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    pub(crate) fn components_mut(&mut self) -> &mut [Component] {
        &mut self.components
    }

    pub(crate) fn normalize_weights(&mut self) {
        for weight in &mut self.weights {
            *weight = weight.max(0.0);
        }
        let total: f64 = self.weights.iter().sum();
        if total > 0.0 {
            for weight in &mut self.weights {
                *weight /= total;
            }
        } else {
            let uniform = 1.0 / self.num_components as f64;
            for weight in &mut self.weights {
                *weight = uniform;
            }
        }
    }
}

fn validate_shape(num_components: usize, dimensions: usize) -> Result<(), ModelError> {
    if num_components == 0 {
        return Err(ModelError::InvalidComponentCount { got: 0 });
    }
    if dimensions == 0 {
        return Err(ModelError::InvalidDimensions { got: 0 });
    }
    Ok(())
}

fn draw_mean(rng: &mut SmallRng, dimensions: usize, half: f64) -> Vec<f64> {
    (0..dimensions)
        .map(|_| rng.gen_range(-half..half))
        .collect()
}

/// Normalizes a weight block to sum to `total`; an all-zero block is spread
/// evenly instead of dividing by zero.
fn normalize_block(block: &mut [f64], total: f64) {
    let sum: f64 = block.iter().sum();
    if sum > 0.0 {
        for weight in block.iter_mut() {
            *weight *= total / sum;
        }
    } else {
        let share = total / block.len() as f64;
        for weight in block.iter_mut() {
            *weight = share;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TOLERANCE: f64 = 1e-9;

    #[rstest]
    #[case(1, 1)]
    #[case(2, 2)]
    #[case(7, 4)]
    fn weights_are_normalized_probabilities(
        #[case] num_components: usize,
        #[case] dimensions: usize,
    ) {
        let model = MixtureModel::new(num_components, dimensions, 1, 1)
            .expect("construction must succeed");
        let weights = model.weights();
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < TOLERANCE);
        assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[rstest]
    #[case(0, 2)]
    #[case(2, 0)]
    fn construction_rejects_degenerate_shapes(
        #[case] num_components: usize,
        #[case] dimensions: usize,
    ) {
        let err = MixtureModel::new(num_components, dimensions, 1, 1)
            .expect_err("degenerate shape must fail");
        assert!(matches!(
            err,
            ModelError::InvalidComponentCount { got: 0 } | ModelError::InvalidDimensions { got: 0 }
        ));
    }

    #[test]
    fn same_seeds_reproduce_the_same_geometry() {
        let a = MixtureModel::new(3, 2, 5, 9).expect("model a");
        let b = MixtureModel::new(3, 2, 5, 9).expect("model b");
        assert_eq!(a.weights(), b.weights());
        for index in 0..3 {
            assert_eq!(
                a.component(index).expect("a component").mean(),
                b.component(index).expect("b component").mean()
            );
        }
    }

    #[test]
    fn derive_with_zero_distance_preserves_shared_geometry() {
        let source = MixtureModel::new(3, 2, 1, 1).expect("source");
        let derived = MixtureModel::derive(&source, 3, 0.0, 2, 2).expect("derived");
        for index in 0..3 {
            let base = source.component(index).expect("source component");
            let copy = derived.component(index).expect("derived component");
            assert_eq!(base.mean(), copy.mean());
            assert_eq!(base.factor(), copy.factor());
        }
        // Weights renormalize from identical bases, so they match too.
        for (a, b) in source.weights().iter().zip(derived.weights().iter()) {
            assert!((a - b).abs() < TOLERANCE);
        }
    }

    #[test]
    fn derive_can_grow_the_component_count() {
        let source = MixtureModel::new(2, 3, 1, 1).expect("source");
        let derived = MixtureModel::derive(&source, 4, 0.3, 2, 2).expect("derived");
        assert_eq!(derived.num_components(), 4);
        assert_eq!(derived.dimensions(), 3);
        let total: f64 = derived.weights().iter().sum();
        assert!((total - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn derive_rejects_out_of_range_distance() {
        let source = MixtureModel::new(2, 2, 1, 1).expect("source");
        let err = MixtureModel::derive(&source, 2, 1.5, 2, 2)
            .expect_err("distance above 1 must fail");
        assert!(matches!(err, ModelError::InvalidTargetDistance { .. }));
    }

    #[rstest]
    #[case(0, 0.6)]
    #[case(1, 0.25)]
    fn set_weight_reads_back_and_preserves_total(#[case] index: usize, #[case] weight: f64) {
        let mut model = MixtureModel::new(3, 2, 1, 1).expect("model");
        model.set_weight(index, weight).expect("set must succeed");
        assert!((model.weight(index).expect("weight") - weight).abs() < TOLERANCE);
        let others: f64 = model
            .weights()
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, w)| w)
            .sum();
        assert!((others - (1.0 - weight)).abs() < TOLERANCE);
    }

    #[test]
    fn set_weight_clamps_out_of_range_values() {
        let mut model = MixtureModel::new(2, 2, 1, 1).expect("model");
        model.set_weight(0, 1.7).expect("set must succeed");
        assert!((model.weight(0).expect("weight") - 1.0).abs() < TOLERANCE);
        model.set_weight(0, -0.4).expect("set must succeed");
        assert!(model.weight(0).expect("weight").abs() < TOLERANCE);
        let total: f64 = model.weights().iter().sum();
        assert!((total - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn set_weight_rejects_missing_component() {
        let mut model = MixtureModel::new(2, 2, 1, 1).expect("model");
        let err = model.set_weight(5, 0.5).expect_err("index must be checked");
        assert!(matches!(
            err,
            ModelError::ComponentOutOfBounds {
                index: 5,
                num_components: 2
            }
        ));
    }

    #[test]
    fn set_weights_splits_mass_between_blocks() {
        let mut model = MixtureModel::new(5, 2, 1, 1).expect("model");
        model.set_weights(2, 0.9).expect("split must succeed");
        let weights = model.weights();
        let majority: f64 = weights[..2].iter().sum();
        let minority: f64 = weights[2..].iter().sum();
        assert!((majority - 0.9).abs() < TOLERANCE);
        assert!((minority - 0.1).abs() < TOLERANCE);
    }

    #[test]
    fn set_weights_rejects_empty_minority() {
        let mut model = MixtureModel::new(3, 2, 1, 1).expect("model");
        let err = model
            .set_weights(3, 0.9)
            .expect_err("empty minority block must fail");
        assert!(matches!(err, ModelError::InvalidMajoritySplit { .. }));
    }

    #[test]
    fn concept_assignments_are_per_component() {
        let model = MixtureModel::new(4, 2, 1, 1).expect("model");
        let assignments = model.concept_assignments(1).expect("assignments");
        assert_eq!(assignments, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn density_rejects_mismatched_points() {
        let model = MixtureModel::new(2, 3, 1, 1).expect("model");
        let err = model.density(&[0.0, 0.0]).expect_err("dimension mismatch");
        assert!(matches!(
            err,
            ModelError::PointDimensionMismatch {
                got: 2,
                expected: 3
            }
        ));
    }

    #[test]
    fn density_is_non_negative_across_the_support() {
        let model = MixtureModel::new(3, 2, 1, 1).expect("model");
        for point in [[0.0, 0.0], [1.0, -1.0], [10.0, 10.0]] {
            let density = model.density(&point).expect("density");
            assert!(density >= 0.0 || density.is_nan());
        }
    }

    #[test]
    fn restart_reproduces_the_sample_sequence() {
        let mut model = MixtureModel::new(3, 2, 11, 13).expect("model");
        let first: Vec<LabeledPoint> = (0..16).map(|_| model.sample()).collect();
        model.restart(11, 13);
        let second: Vec<LabeledPoint> = (0..16).map(|_| model.sample()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn every_component_is_selectable() {
        let mut model = MixtureModel::new(4, 1, 3, 3).expect("model");
        // Pin every weight near 0.25 so each component is drawn with
        // certainty over the sample budget, the last one included.
        for index in 0..4 {
            model.set_weight(index, 0.25).expect("set weight");
        }
        let mut seen = [false; 4];
        for _ in 0..10_000 {
            seen[model.sample().label()] = true;
        }
        assert!(
            seen.iter().all(|s| *s),
            "selection must include the last component"
        );
    }
}
