//! Property-based tests for covariance synthesis and weight manipulation.

use driftgen_core::{CholeskyFactor, MixtureModel};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn synthesized_covariances_always_redecompose(
        dimensions in 1_usize..6,
        seed in any::<u64>(),
    ) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let factor = CholeskyFactor::synthesize(dimensions, &mut rng);
        let covariance = factor.covariance();
        prop_assert!(
            CholeskyFactor::decompose(&covariance, 1e-9).is_some(),
            "L·Lᵗ must always be positive semi-definite",
        );
    }

    #[test]
    fn construction_always_normalizes_weights(
        num_components in 1_usize..9,
        dimensions in 1_usize..5,
        model_seed in any::<u64>(),
    ) {
        let model = MixtureModel::new(num_components, dimensions, 1, model_seed)
            .expect("construction must succeed");
        let total: f64 = model.weights().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(model.weights().iter().all(|w| (0.0..=1.0).contains(w)));
    }

    #[test]
    fn set_weight_always_reads_back_clamped(
        num_components in 2_usize..8,
        model_seed in any::<u64>(),
        index in 0_usize..8,
        weight in -0.5_f64..1.5,
    ) {
        let index = index % num_components;
        let mut model = MixtureModel::new(num_components, 2, 1, model_seed)
            .expect("construction must succeed");
        model.set_weight(index, weight).expect("set must succeed");

        let clamped = weight.clamp(0.0, 1.0);
        prop_assert!((model.weight(index).expect("weight") - clamped).abs() < 1e-9);
        let total: f64 = model.weights().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn derived_models_keep_weights_normalized(
        target in 0.0_f64..1.0,
        post_components in 1_usize..7,
        model_seed in any::<u64>(),
    ) {
        let source = MixtureModel::new(3, 2, 1, 1).expect("source");
        let derived = MixtureModel::derive(&source, post_components, target, 2, model_seed)
            .expect("derive must succeed");
        let total: f64 = derived.weights().iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }
}
