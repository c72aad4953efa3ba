//! End-to-end drift search scenario.
//!
//! The estimator budget is reduced from the production defaults so the search
//! completes in test time; the acceptance band is the one the search itself
//! enforced, so the assertion exercises the full pipeline rather than the
//! estimator in isolation.

use driftgen_core::{DriftSearch, DriftSearchParams, ModelSpec};

#[test]
fn search_lands_inside_the_target_band() {
    let params = DriftSearchParams::new(0.5, 0.05)
        .expect("params")
        .with_estimator_min_samples(30_000)
        .with_estimator_max_samples(2_000_000)
        .with_estimator_tolerance(0.03);
    let spec = ModelSpec {
        pre_components: 2,
        post_components: 2,
        dimensions: 2,
        instance_seed: 1,
        model_seed: 1,
    };

    let outcome = DriftSearch::new(params).search(&spec).expect("search must converge");

    assert!(
        (0.45..=0.55).contains(&outcome.distance()),
        "measured distance {} must lie in [0.45, 0.55]",
        outcome.distance()
    );
    assert_eq!(outcome.pre().num_components(), 2);
    assert_eq!(outcome.post().num_components(), 2);
    assert_eq!(outcome.pre().dimensions(), 2);
    assert!(outcome.post_attempts() >= 1);
}

#[test]
fn search_supports_differing_component_counts() {
    let params = DriftSearchParams::new(0.4, 0.08)
        .expect("params")
        .with_estimator_min_samples(20_000)
        .with_estimator_max_samples(1_000_000)
        .with_estimator_tolerance(0.04);
    let spec = ModelSpec {
        pre_components: 2,
        post_components: 3,
        dimensions: 2,
        instance_seed: 11,
        model_seed: 13,
    };

    let outcome = DriftSearch::new(params).search(&spec).expect("search must converge");

    assert_eq!(outcome.post().num_components(), 3);
    assert!((outcome.distance() - 0.4).abs() <= 0.08);
}
