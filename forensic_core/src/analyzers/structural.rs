//! Structural Coherence Analyzer
//!
//! Pasted elements are often rescaled, which shows up as regions whose edge
//! density departs from the rest of the frame. Extreme aspect ratios hint at
//! cropping or stretching.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::{extract_regions, GridSpec, LumaField};
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats;

pub const EDGE_VARIANCE_THRESHOLD: f64 = 0.004;
pub const UNEVEN_DENSITY_PENALTY: f64 = 25.0;
pub const ASPECT_PENALTY: f64 = 15.0;
pub const MIN_ASPECT: f64 = 0.2;
pub const MAX_ASPECT: f64 = 5.0;

pub fn coherence_assessment(score: f64) -> Assessment {
    if score > 70.0 {
        Assessment::Pass
    } else if score > 40.0 {
        Assessment::Suspicious
    } else {
        Assessment::Fail
    }
}

pub fn analyze_structure(luma: &LumaField, grid: GridSpec, edge_threshold: f64) -> SignalScore {
    let densities: Vec<f64> = extract_regions(luma, grid, edge_threshold)
        .iter()
        .map(|r| r.stats.edge_density)
        .collect();
    let average_density = stats::mean(&densities);
    let edge_variance = stats::variance(&densities);
    let aspect_ratio = luma.width() as f64 / luma.height() as f64;

    let mut coherence = 100.0;
    let mut findings = Vec::new();

    if edge_variance > EDGE_VARIANCE_THRESHOLD {
        findings.push(Finding::warning(
            "Uneven edge density distribution - possible scale inconsistencies",
        ));
        coherence -= UNEVEN_DENSITY_PENALTY;
    }

    if !(MIN_ASPECT..=MAX_ASPECT).contains(&aspect_ratio) {
        findings.push(Finding::warning(
            "Unusual aspect ratio - may indicate cropping or stretching",
        ));
        coherence -= ASPECT_PENALTY;
    }

    if findings.is_empty() {
        findings.push(Finding::info("Physical coherence appears normal"));
    }

    let assessment = coherence_assessment(coherence);
    tracing::debug!(edge_variance, aspect_ratio, coherence, ?assessment, "structural analysis");

    let mut score = SignalScore::new(SignalName::StructuralCoherence, edge_variance, coherence)
        .with_consistent(assessment == Assessment::Pass)
        .with_assessment(assessment)
        .with_detail("edge_density_variance", edge_variance)
        .with_detail("average_edge_density", average_density)
        .with_detail("aspect_ratio", aspect_ratio)
        .with_detail("coherence_score", coherence);
    score.findings = findings;
    score
}

pub struct StructuralAnalyzer;

impl SignalAnalyzer for StructuralAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::StructuralCoherence
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_structure(
            ctx.luma,
            ctx.params.structural_grid,
            ctx.params.edge_threshold,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::gray_from_fn;
    use crate::regions::DEFAULT_EDGE_THRESHOLD;

    fn run(raster: &crate::raster::RasterImage) -> SignalScore {
        let luma = LumaField::from_raster(raster);
        analyze_structure(&luma, GridSpec::square(3), DEFAULT_EDGE_THRESHOLD)
    }

    #[test]
    fn test_buckets() {
        assert_eq!(coherence_assessment(100.0), Assessment::Pass);
        assert_eq!(coherence_assessment(75.0), Assessment::Pass);
        assert_eq!(coherence_assessment(70.0), Assessment::Suspicious);
        assert_eq!(coherence_assessment(60.0), Assessment::Suspicious);
        assert_eq!(coherence_assessment(40.0), Assessment::Fail);
    }

    #[test]
    fn test_flat_image_is_coherent() {
        let score = run(&gray_from_fn(60, 60, |_, _| 90));
        assert_eq!(score.normalized_score, 100.0);
        assert!(score.consistent);
        assert_eq!(score.assessment, Assessment::Pass);
    }

    #[test]
    fn test_textured_patch_in_flat_frame() {
        // checkerboard in the centre cell only
        let score = run(&gray_from_fn(60, 60, |x, y| {
            if (20..40).contains(&x) && (20..40).contains(&y) && (x + y) % 2 == 0 {
                255
            } else {
                0
            }
        }));
        assert!(score.raw_value > EDGE_VARIANCE_THRESHOLD);
        assert_eq!(score.normalized_score, 75.0);
        assert_eq!(score.assessment, Assessment::Pass);
        assert_eq!(score.warnings().count(), 1);
    }

    #[test]
    fn test_extreme_aspect_and_uneven_density() {
        let score = run(&gray_from_fn(300, 30, |x, y| {
            if x < 100 && (x + y) % 2 == 0 {
                255
            } else {
                0
            }
        }));
        assert!((score.details["aspect_ratio"] - 10.0).abs() < 1e-12);
        assert_eq!(score.normalized_score, 60.0);
        assert_eq!(score.assessment, Assessment::Suspicious);
        assert!(!score.consistent);
        assert_eq!(score.warnings().count(), 2);
    }
}
