//! Property tests over random rasters and random signal sets.

use crate::compare::compare_images;
use crate::config::EngineConfig;
use crate::engine::analyze_image;
use crate::fusion::{fuse, FusionPolicy, Verdict, WeightConfig};
use crate::raster::RasterImage;
use crate::signal::{SignalName, SignalScore};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_raster(width: u32, height: u32, channels: u8, seed: u64) -> RasterImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = (width * height) as usize * channels as usize;
    let pixels = (0..len).map(|_| rng.random::<u8>()).collect();
    RasterImage::new(width, height, channels, pixels).unwrap()
}

/// One optional unit value per signal name, scaled onto the signal's scale.
fn signal_set(values: &[Option<f64>]) -> Vec<SignalScore> {
    SignalName::ALL
        .iter()
        .zip(values)
        .filter_map(|(&name, value)| {
            value.map(|v| SignalScore::new(name, v, v * name.scale().max()))
        })
        .collect()
}

fn unit_values() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::of(0.0..=1.0_f64), SignalName::ALL.len())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_assessment_scores_in_range(
        width in 8u32..48,
        height in 8u32..48,
        gray in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let raster = random_raster(width, height, if gray { 1 } else { 3 }, seed);
        for policy in [FusionPolicy::Additive, FusionPolicy::Weighted] {
            let config = EngineConfig::default().with_policy(policy);
            let result = analyze_image(&raster, &config).unwrap();
            prop_assert!((0.0..=100.0).contains(&result.final_score));
            prop_assert!((0.0..=100.0).contains(&result.suspicion_score));
            prop_assert!((0.0..=100.0).contains(&result.confidence));
            prop_assert_eq!(result.verdict, Verdict::from_suspicion(result.suspicion_score));
            for signal in &result.signals {
                prop_assert!(signal.normalized_score >= 0.0);
                prop_assert!(signal.normalized_score <= signal.scale.max());
            }
        }
    }

    #[test]
    fn prop_analysis_is_deterministic(
        width in 8u32..40,
        height in 8u32..40,
        seed in any::<u64>(),
    ) {
        let raster = random_raster(width, height, 3, seed);
        let config = EngineConfig::default().with_policy(FusionPolicy::Weighted);
        let first = analyze_image(&raster, &config).unwrap();
        let second = analyze_image(&raster, &config).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_self_comparison_is_identical(
        width in 4u32..32,
        height in 4u32..32,
        seed in any::<u64>(),
    ) {
        let raster = random_raster(width, height, 3, seed);
        let result = compare_images(&raster, &raster).unwrap();
        prop_assert!((result.score - 1.0).abs() < 1e-9);
        prop_assert_eq!(result.alteration_score, 0.1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_fusion_is_idempotent(values in unit_values()) {
        let signals = signal_set(&values);
        for policy in [FusionPolicy::Additive, FusionPolicy::Weighted] {
            let first = fuse(signals.clone(), policy, WeightConfig::defaults());
            let second = fuse(signals.clone(), policy, WeightConfig::defaults());
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn prop_weighted_score_in_range(values in unit_values()) {
        let result = fuse(signal_set(&values), FusionPolicy::Weighted, WeightConfig::defaults());
        prop_assert!((0.0..=100.0).contains(&result.final_score));
        prop_assert!((result.final_score + result.suspicion_score - 100.0).abs() < 1e-9);
    }

    #[test]
    fn prop_weights_normalize_to_one(
        raw in prop::collection::vec(0.01..10.0_f64, SignalName::ALL.len()),
    ) {
        let weights = WeightConfig::from_pairs(SignalName::ALL.iter().copied().zip(raw.iter().copied()))
            .unwrap();
        let total: f64 = weights.normalized().values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_weight_scaling_does_not_change_score(
        raw in prop::collection::vec(0.01..10.0_f64, SignalName::ALL.len()),
        factor in 0.1..50.0_f64,
        values in unit_values(),
    ) {
        let names = SignalName::ALL.iter().copied();
        let base = WeightConfig::from_pairs(names.clone().zip(raw.iter().copied())).unwrap();
        let scaled = WeightConfig::from_pairs(names.zip(raw.iter().map(|w| w * factor))).unwrap();
        let signals = signal_set(&values);
        let a = fuse(signals.clone(), FusionPolicy::Weighted, &base);
        let b = fuse(signals, FusionPolicy::Weighted, &scaled);
        prop_assert!((a.final_score - b.final_score).abs() < 1e-6);
    }
}
