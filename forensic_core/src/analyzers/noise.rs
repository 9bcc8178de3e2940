//! Noise Pattern Analyzer
//!
//! Raw per-region luma variance stands in for sensor noise. A frame shot in
//! one exposure has roughly the same noise everywhere; a spliced patch
//! (denoised, upscaled or from another camera) stands out.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::{extract_regions, GridSpec, LumaField};
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats;

pub const INCONSISTENCY_THRESHOLD: f64 = 0.8;

/// `stddev(variances) / (mean(variances) + 1)`
pub fn inconsistency_ratio(region_variances: &[f64]) -> f64 {
    stats::std_dev(region_variances) / (stats::mean(region_variances) + 1.0)
}

pub fn analyze_noise(luma: &LumaField, grid: GridSpec, edge_threshold: f64) -> SignalScore {
    let variances: Vec<f64> = extract_regions(luma, grid, edge_threshold)
        .iter()
        .map(|r| r.stats.brightness_variance)
        .collect();

    let mean_variance = stats::mean(&variances);
    let spread = stats::std_dev(&variances);
    let ratio = inconsistency_ratio(&variances);
    let inconsistent = ratio > INCONSISTENCY_THRESHOLD;

    tracing::debug!(mean_variance, spread, ratio, inconsistent, "noise analysis");

    let score = SignalScore::new(
        SignalName::NoisePattern,
        ratio,
        ratio / INCONSISTENCY_THRESHOLD,
    )
    .with_consistent(!inconsistent)
    .with_detail("mean_region_variance", mean_variance)
    .with_detail("region_variance_std_dev", spread)
    .with_detail("inconsistency_ratio", ratio);

    if inconsistent {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Inconsistent noise patterns detected - possible splicing",
            ))
    } else {
        score.with_finding(Finding::info("Noise pattern is uniform across regions"))
    }
}

pub struct NoiseAnalyzer;

impl SignalAnalyzer for NoiseAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::NoisePattern
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_noise(
            ctx.luma,
            ctx.params.noise_grid,
            ctx.params.edge_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::gray_from_fn;
    use crate::raster::RasterImage;
    use crate::regions::DEFAULT_EDGE_THRESHOLD;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const SIDE: u32 = 200; // 5x5 grid of 40x40 regions

    fn noise_field(seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..SIDE * SIDE).map(|_| rng.random::<u8>()).collect()
    }

    fn run(raster: &RasterImage) -> SignalScore {
        let luma = LumaField::from_raster(raster);
        analyze_noise(&luma, GridSpec::square(5), DEFAULT_EDGE_THRESHOLD)
    }

    #[test]
    fn test_uniform_noise_is_consistent() {
        let field = noise_field(7);
        let score = run(&gray_from_fn(SIDE, SIDE, |x, y| field[(y * SIDE + x) as usize]));
        assert!(score.consistent);
        assert!(score.raw_value < 0.1, "ratio {}", score.raw_value);
    }

    #[test]
    fn test_constant_region_raises_ratio() {
        let field = noise_field(7);
        let baseline = run(&gray_from_fn(SIDE, SIDE, |x, y| field[(y * SIDE + x) as usize]));
        let patched = run(&gray_from_fn(SIDE, SIDE, |x, y| {
            if x < 40 && y < 40 {
                128
            } else {
                field[(y * SIDE + x) as usize]
            }
        }));
        // one flat region among 24 noisy ones: ratio ~ 1/sqrt(24)
        assert!(patched.raw_value > 5.0 * baseline.raw_value);
        assert!((patched.raw_value - 0.204).abs() < 0.03, "ratio {}", patched.raw_value);
    }

    #[test]
    fn test_noisy_patch_in_flat_frame_is_flagged() {
        let field = noise_field(11);
        let score = run(&gray_from_fn(SIDE, SIDE, |x, y| {
            if (80..120).contains(&x) && (80..120).contains(&y) {
                field[(y * SIDE + x) as usize]
            } else {
                128
            }
        }));
        assert!(score.raw_value > INCONSISTENCY_THRESHOLD);
        assert!(!score.consistent);
        assert_eq!(score.normalized_score, 1.0);
        assert_eq!(score.warnings().count(), 1);
    }

    #[test]
    fn test_flat_image_has_negligible_ratio() {
        let score = run(&gray_from_fn(50, 50, |_, _| 200));
        assert!(score.raw_value < 1e-6);
        assert!(score.normalized_score < 1e-6);
        assert!(score.consistent);
    }

    #[test]
    fn test_ratio_formula() {
        assert_eq!(inconsistency_ratio(&[4.0, 4.0]), 0.0);
        // std 1, mean 1 -> 1 / 2
        assert!((inconsistency_ratio(&[0.0, 2.0]) - 0.5).abs() < 1e-12);
    }
}
