//! Integration tests for mixture construction, sampling, and weight ops.

use driftgen_core::{MixtureModel, ModelError};
use rstest::rstest;

#[rstest]
#[case(2, 2, 1, 1)]
#[case(5, 3, 42, 7)]
#[case(10, 4, 1234, 5678)]
fn constructed_weights_are_a_probability_vector(
    #[case] num_components: usize,
    #[case] dimensions: usize,
    #[case] instance_seed: u64,
    #[case] model_seed: u64,
) {
    let model = MixtureModel::new(num_components, dimensions, instance_seed, model_seed)
        .expect("construction must succeed");
    let weights = model.weights();
    let total: f64 = weights.iter().sum();
    assert!((total - 1.0).abs() < 1e-9, "weights must sum to one, got {total}");
    assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
}

#[rstest]
#[case(2, 2, 9)]
#[case(4, 3, 77)]
fn every_covariance_survives_cholesky_redecomposition(
    #[case] num_components: usize,
    #[case] dimensions: usize,
    #[case] model_seed: u64,
) {
    use driftgen_core::CholeskyFactor;

    let model = MixtureModel::new(num_components, dimensions, 1, model_seed)
        .expect("construction must succeed");
    for index in 0..num_components {
        let component = model.component(index).expect("component");
        let covariance: Vec<Vec<f64>> = component.covariance().to_vec();
        assert!(
            CholeskyFactor::decompose(&covariance, 1e-9).is_some(),
            "component {index} covariance must be positive semi-definite"
        );
    }
}

#[test]
fn label_frequencies_converge_to_the_weights() {
    let mut model = MixtureModel::new(2, 2, 99, 3).expect("model");
    model.set_weight(0, 0.3).expect("set weight");

    let draws = 200_000;
    let mut counts = [0u32; 2];
    for _ in 0..draws {
        counts[model.sample().label()] += 1;
    }

    let frequency = f64::from(counts[0]) / f64::from(draws);
    assert!(
        (frequency - 0.3).abs() < 0.01,
        "label frequency {frequency} must approach the weight 0.3"
    );
}

#[test]
fn restart_matches_a_freshly_constructed_model() {
    let mut lived_in = MixtureModel::new(3, 2, 17, 23).expect("model");
    for _ in 0..500 {
        lived_in.sample();
    }
    lived_in.restart(17, 23);

    let mut fresh = MixtureModel::new(3, 2, 17, 23).expect("fresh model");
    for _ in 0..32 {
        let replayed = lived_in.sample();
        let reference = fresh.sample();
        assert_eq!(replayed.attributes(), reference.attributes());
        assert_eq!(replayed.label(), reference.label());
    }
}

#[test]
fn weights_accessor_returns_a_defensive_copy() {
    let model = MixtureModel::new(2, 2, 1, 1).expect("model");
    let mut copy = model.weights();
    copy[0] = 42.0;
    let total: f64 = model.weights().iter().sum();
    assert!((total - 1.0).abs() < 1e-9, "mutating the copy must not touch the mixture");
}

#[test]
fn sample_dimensionality_matches_the_model() {
    let mut model = MixtureModel::new(3, 5, 1, 1).expect("model");
    let point = model.sample();
    assert_eq!(point.attributes().len(), 5);
    assert!(point.label() < 3);
}

#[test]
fn component_accessors_reject_out_of_range_indices() {
    let model = MixtureModel::new(2, 2, 1, 1).expect("model");
    assert!(matches!(
        model.component(2),
        Err(ModelError::ComponentOutOfBounds { index: 2, .. })
    ));
    assert!(matches!(
        model.weight(9),
        Err(ModelError::ComponentOutOfBounds { index: 9, .. })
    ));
}
