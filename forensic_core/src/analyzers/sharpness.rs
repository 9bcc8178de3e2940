//! Focus / Sharpness Analyzer
//!
//! Regions pasted from a different shot rarely share the host image's focus.
//! Mean edge energy per region is the sharpness proxy.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::{extract_regions, GridSpec, LumaField};
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats;

pub const INCONSISTENCY_THRESHOLD: f64 = 0.6;
/// Below this mean edge energy the frame is likely blurred.
pub const BLUR_LEVEL: f64 = 3.0;
/// Above this mean edge energy the frame is likely over-sharpened.
pub const OVERSHARP_LEVEL: f64 = 40.0;

pub fn analyze_sharpness(luma: &LumaField, grid: GridSpec, edge_threshold: f64) -> SignalScore {
    let sharpness: Vec<f64> = extract_regions(luma, grid, edge_threshold)
        .iter()
        .map(|r| r.stats.sharpness)
        .collect();

    let mean = stats::mean(&sharpness);
    let ratio = stats::std_dev(&sharpness) / (mean + 1.0);
    let inconsistent = ratio > INCONSISTENCY_THRESHOLD;

    tracing::debug!(mean, ratio, inconsistent, "sharpness analysis");

    let mut score = SignalScore::new(
        SignalName::Sharpness,
        ratio,
        ratio / INCONSISTENCY_THRESHOLD,
    )
    .with_consistent(!inconsistent)
    .with_detail("average_sharpness", mean)
    .with_detail("sharpness_variance", stats::variance(&sharpness))
    .with_detail("inconsistency_ratio", ratio);

    score = if inconsistent {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Inconsistent sharpness across regions - possible composite",
            ))
    } else {
        score.with_finding(Finding::info("Focus is consistent across regions"))
    };

    // descriptive only
    if mean < BLUR_LEVEL {
        score = score.with_finding(Finding::info("Image appears blurry or heavily smoothed"));
    } else if mean > OVERSHARP_LEVEL {
        score = score.with_finding(Finding::info("Image appears heavily sharpened"));
    }
    score
}

pub struct SharpnessAnalyzer;

impl SignalAnalyzer for SharpnessAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::Sharpness
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_sharpness(
            ctx.luma,
            ctx.params.sharpness_grid,
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

    fn run(raster: &RasterImage) -> SignalScore {
        let luma = LumaField::from_raster(raster);
        analyze_sharpness(&luma, GridSpec::square(4), DEFAULT_EDGE_THRESHOLD)
    }

    #[test]
    fn test_flat_image_is_blurry_but_not_flagged() {
        let score = run(&gray_from_fn(64, 64, |_, _| 100));
        assert!(score.consistent);
        assert_eq!(score.normalized_score, 0.0);
        assert_eq!(score.warnings().count(), 0);
        assert!(score.findings.iter().any(|f| f.message.contains("blurry")));
    }

    #[test]
    fn test_uniform_texture_is_consistent() {
        let score = run(&gray_from_fn(64, 64, |x, y| {
            if (x + y) % 2 == 0 {
                40
            } else {
                200
            }
        }));
        assert!(score.consistent);
        assert!(score.raw_value < 1e-9);
        assert!(score.findings.iter().any(|f| f.message.contains("sharpened")));
    }

    #[test]
    fn test_single_sharp_region_is_flagged() {
        // one textured cell out of sixteen
        let score = run(&gray_from_fn(64, 64, |x, y| {
            if x < 16 && y < 16 && (x + y) % 2 == 0 {
                255
            } else {
                0
            }
        }));
        assert!(score.raw_value > INCONSISTENCY_THRESHOLD);
        assert!(!score.consistent);
        assert_eq!(score.assessment, Assessment::Suspicious);
        assert_eq!(score.normalized_score, 1.0);
    }
}
