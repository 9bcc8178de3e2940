//! Residual / Statistical Anomaly Analyzer
//!
//! Three bucketed sub-scores over the luma field, combined with fixed weights:
//! - high-pass noise: variance of the 8-neighbour Laplacian (0.4)
//! - block energy: variance of high-frequency quadrant sums per 8x8 block (0.4)
//! - entropy: Shannon entropy of the luma histogram (0.2)

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::LumaField;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats::{self, RunningStats};

pub const NOISE_WEIGHT: f64 = 0.4;
pub const BLOCK_WEIGHT: f64 = 0.4;
pub const ENTROPY_WEIGHT: f64 = 0.2;
const BLOCK: usize = 8;

pub fn laplacian_variance(luma: &LumaField) -> f64 {
    let mut acc = RunningStats::default();
    for (x, y) in luma.interior() {
        acc.push(luma.laplacian(x, y));
    }
    acc.variance()
}

pub fn noise_subscore(variance: f64) -> f64 {
    if variance > 500.0 {
        0.7
    } else if variance > 300.0 {
        0.4
    } else {
        0.1
    }
}

/// Per full 8x8 block: sum of luma where the in-block offset has `x >= 4`
/// or `y >= 4`. Partial blocks on the right and bottom edges are skipped.
pub fn block_energies(luma: &LumaField) -> Vec<f64> {
    let (w, h) = (luma.width(), luma.height());
    let mut energies = Vec::with_capacity((w / BLOCK) * (h / BLOCK));
    for by in (0..h / BLOCK).map(|b| b * BLOCK) {
        for bx in (0..w / BLOCK).map(|b| b * BLOCK) {
            let mut energy = 0.0;
            for dy in 0..BLOCK {
                for dx in 0..BLOCK {
                    if dx >= BLOCK / 2 || dy >= BLOCK / 2 {
                        energy += luma.get(bx + dx, by + dy).abs();
                    }
                }
            }
            energies.push(energy);
        }
    }
    energies
}

/// 0.0 when the image holds no full block.
pub fn block_subscore(energies: &[f64]) -> f64 {
    if energies.is_empty() {
        return 0.0;
    }
    let variance = stats::variance(energies);
    if variance > 10_000.0 {
        0.8
    } else if variance > 5_000.0 {
        0.5
    } else {
        0.2
    }
}

pub fn entropy_subscore(entropy: f64) -> f64 {
    if !(5.0..=8.5).contains(&entropy) {
        0.6
    } else if !(6.0..=8.0).contains(&entropy) {
        0.3
    } else {
        0.1
    }
}

pub fn analyze_residual(luma: &LumaField) -> SignalScore {
    let lap_variance = laplacian_variance(luma);
    let energies = block_energies(luma);
    let entropy = stats::shannon_entropy(&luma.histogram());

    let noise = noise_subscore(lap_variance);
    let blocks = block_subscore(&energies);
    let anomaly = entropy_subscore(entropy);
    let combined = (noise * NOISE_WEIGHT + blocks * BLOCK_WEIGHT + anomaly * ENTROPY_WEIGHT).min(1.0);

    tracing::debug!(lap_variance, entropy, noise, blocks, anomaly, combined, "residual analysis");

    let score = SignalScore::new(SignalName::ResidualAnalysis, combined, combined)
        .with_consistent(combined < 0.5)
        .with_detail("laplacian_variance", lap_variance)
        .with_detail("block_energy_variance", stats::variance(&energies))
        .with_detail("block_count", energies.len() as f64)
        .with_detail("entropy_bits", entropy)
        .with_detail("noise_score", noise)
        .with_detail("block_score", blocks)
        .with_detail("entropy_score", anomaly);

    if combined >= 0.5 {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Residual statistics deviate from a single-capture image",
            ))
    } else {
        score.with_finding(Finding::info("Residual statistics look natural"))
    }
}

pub struct ResidualAnalyzer;

impl SignalAnalyzer for ResidualAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::ResidualAnalysis
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_residual(ctx.luma))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::gray_from_fn;

    #[test]
    fn test_subscore_buckets() {
        assert_eq!(noise_subscore(501.0), 0.7);
        assert_eq!(noise_subscore(301.0), 0.4);
        assert_eq!(noise_subscore(300.0), 0.1);

        assert_eq!(block_subscore(&[]), 0.0);
        assert_eq!(block_subscore(&[1.0, 1.0]), 0.2);
        // variance 90000
        assert_eq!(block_subscore(&[0.0, 600.0]), 0.8);
        // variance 6400
        assert_eq!(block_subscore(&[0.0, 160.0]), 0.5);

        assert_eq!(entropy_subscore(4.0), 0.6);
        assert_eq!(entropy_subscore(9.0), 0.6);
        assert_eq!(entropy_subscore(5.5), 0.3);
        assert_eq!(entropy_subscore(8.2), 0.3);
        assert_eq!(entropy_subscore(7.0), 0.1);
    }

    #[test]
    fn test_block_energy_uses_high_frequency_quadrant() {
        let luma = LumaField::from_raster(&gray_from_fn(17, 9, |_, _| 2));
        let energies = block_energies(&luma);
        // 2 full blocks; 48 of 64 pixels per block
        assert_eq!(energies.len(), 2);
        assert!(energies.iter().all(|&e| (e - 96.0).abs() < 1e-9));
    }

    #[test]
    fn test_flat_image() {
        let score = analyze_residual(&LumaField::from_raster(&gray_from_fn(32, 32, |_, _| 50)));
        // noise 0.1, blocks 0.2, entropy 0 bits -> 0.6
        let expected = 0.1 * 0.4 + 0.2 * 0.4 + 0.6 * 0.2;
        assert!((score.normalized_score - expected).abs() < 1e-9);
        assert!(score.consistent);
    }

    #[test]
    fn test_tiny_image_has_no_blocks() {
        let score = analyze_residual(&LumaField::from_raster(&gray_from_fn(5, 5, |x, _| x as u8)));
        assert_eq!(score.details["block_count"], 0.0);
        assert_eq!(score.details["block_score"], 0.0);
    }

    #[test]
    fn test_checkerboard_is_suspicious() {
        let score = analyze_residual(&LumaField::from_raster(&gray_from_fn(64, 64, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 && (x + y) % 2 == 0 {
                255
            } else {
                0
            }
        })));
        assert_eq!(score.details["noise_score"], 0.7);
        assert_eq!(score.details["block_score"], 0.8);
        assert!(score.normalized_score >= 0.5);
        assert!(!score.consistent);
    }
}
