//! Shared fixtures for the driftgen benchmarks.

use driftgen_core::MixtureModel;

/// Builds a deterministic mixture for benchmarking.
///
/// # Panics
/// Panics when the shape is invalid; benchmark fixtures use known-good
/// shapes.
#[must_use]
pub fn fixture_model(num_components: usize, dimensions: usize) -> MixtureModel {
    match MixtureModel::new(num_components, dimensions, 7, 11) {
        Ok(model) => model,
        Err(err) => panic!("benchmark fixture must construct: {err}"),
    }
}
