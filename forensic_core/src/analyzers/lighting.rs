//! Lighting Consistency Analyzer
//!
//! Conjunctive rule: a composite lit from different sources shows both a wide
//! brightness range across regions AND a high spread around the mean. Either
//! alone is normal photography (a bright sky over a dark street).

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::{extract_regions, GridSpec, LumaField};
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats;

pub const RANGE_THRESHOLD: f64 = 180.0;
pub const VARIANCE_THRESHOLD: f64 = 3500.0;

pub fn analyze_lighting(luma: &LumaField, grid: GridSpec, edge_threshold: f64) -> SignalScore {
    let brightness: Vec<f64> = extract_regions(luma, grid, edge_threshold)
        .iter()
        .map(|r| r.stats.mean_brightness)
        .collect();

    let max = brightness.iter().copied().fold(f64::MIN, f64::max);
    let min = brightness.iter().copied().fold(f64::MAX, f64::min);
    let range = max - min;
    let average = stats::mean(&brightness);
    let variance = stats::variance(&brightness);

    let inconsistent = range > RANGE_THRESHOLD && variance > VARIANCE_THRESHOLD;
    // Reaches 1.0 only once both conditions are met.
    let severity = (range / RANGE_THRESHOLD).min(variance / VARIANCE_THRESHOLD);

    tracing::debug!(range, variance, average, inconsistent, "lighting analysis");

    let score = SignalScore::new(SignalName::Lighting, variance, severity)
        .with_consistent(!inconsistent)
        .with_detail("brightness_range", range)
        .with_detail("brightness_variance", variance)
        .with_detail("average_brightness", average);

    if inconsistent {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Significant lighting inconsistencies detected across regions",
            ))
            .with_finding(Finding::info(
                "Extreme brightness differences suggest a composite or multiple light sources",
            ))
    } else {
        score.with_finding(Finding::info("Lighting appears consistent across the image"))
    }
}

pub struct LightingAnalyzer;

impl SignalAnalyzer for LightingAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::Lighting
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_lighting(
            ctx.luma,
            ctx.params.lighting_grid,
            ctx.params.edge_threshold,
        ))
    }
}
