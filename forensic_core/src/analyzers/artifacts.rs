//! Compression / Artifact Detector
//!
//! Two independent scans:
//! - JPEG block boundaries: luma steps across every 8th row (block-based
//!   sources only)
//! - chromatic aberration: sparse sample of pixels with extreme channel
//!   separation (colour sources only)

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::raster::{RasterImage, SourceFormat};
use crate::regions::LumaField;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};

/// Luma step across a block boundary that counts as a discontinuity.
pub const BOUNDARY_STEP: f64 = 20.0;
/// Anomaly rates are percentages of scanned boundary pixels.
pub const HEAVY_RATE: f64 = 8.0;
pub const MODERATE_RATE: f64 = 4.0;
pub const CHANNEL_SPREAD: u8 = 120;
pub const ABERRATION_FRACTION: f64 = 0.15;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundaryScan {
    pub anomalies: usize,
    pub scanned: usize,
}

impl BoundaryScan {
    pub fn rate_percent(&self) -> f64 {
        if self.scanned == 0 {
            0.0
        } else {
            self.anomalies as f64 * 100.0 / self.scanned as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChromaScan {
    pub flagged: usize,
    pub sampled: usize,
}

impl ChromaScan {
    pub fn fraction(&self) -> f64 {
        if self.sampled == 0 {
            0.0
        } else {
            self.flagged as f64 / self.sampled as f64
        }
    }
}

/// Compare each pixel on rows `stride, 2*stride, ...` with the pixel above.
pub fn scan_block_boundaries(luma: &LumaField, stride: usize) -> BoundaryScan {
    let stride = stride.max(1);
    let (w, h) = (luma.width(), luma.height());
    let mut scan = BoundaryScan::default();
    for y in (stride..h).step_by(stride) {
        for x in 0..w.saturating_sub(1) {
            if (luma.get(x, y) - luma.get(x, y - 1)).abs() > BOUNDARY_STEP {
                scan.anomalies += 1;
            }
            scan.scanned += 1;
        }
    }
    scan
}

/// Every `stride`-th pixel on every `stride`-th row.
pub fn scan_chroma(raster: &RasterImage, stride: usize) -> ChromaScan {
    let mut scan = ChromaScan::default();
    if !raster.has_color() {
        return scan;
    }
    let stride = stride.max(1);
    let (w, h) = (raster.width() as usize, raster.height() as usize);
    for y in (0..h).step_by(stride) {
        for x in (0..w.saturating_sub(1)).step_by(stride) {
            let p = raster.pixel(x as u32, y as u32);
            let (r, g, b) = (p[0], p[1], p[2]);
            let spread = r.abs_diff(g).max(g.abs_diff(b)).max(r.abs_diff(b));
            if spread > CHANNEL_SPREAD {
                scan.flagged += 1;
            }
            scan.sampled += 1;
        }
    }
    scan
}

pub fn artifact_assessment(score: f64) -> Assessment {
    if score < 25.0 {
        Assessment::Pass
    } else if score < 50.0 {
        Assessment::Suspicious
    } else {
        Assessment::Fail
    }
}

pub fn analyze_artifacts(
    raster: &RasterImage,
    luma: &LumaField,
    format: SourceFormat,
    block_stride: usize,
    chroma_stride: usize,
) -> SignalScore {
    let mut points = 0.0;
    let mut findings = Vec::new();

    let boundary = format
        .is_block_based()
        .then(|| scan_block_boundaries(luma, block_stride));
    if let Some(scan) = boundary {
        let rate = scan.rate_percent();
        if rate > HEAVY_RATE {
            findings.push(Finding::warning("Significant JPEG compression artifacts detected"));
            points += 30.0;
        } else if rate > MODERATE_RATE {
            findings.push(Finding::info(
                "Moderate compression artifacts present (normal for JPEG)",
            ));
            points += 10.0;
        }
    }

    let chroma = scan_chroma(raster, chroma_stride);
    let aberration = chroma.fraction() > ABERRATION_FRACTION;
    if aberration {
        findings.push(Finding::warning("Chromatic aberration patterns detected"));
        points += 20.0;
    }

    if findings.is_empty() {
        findings.push(Finding::info("No significant artifacts detected"));
    }

    let assessment = artifact_assessment(points);
    let boundary_rate = boundary.map(|s| s.rate_percent()).unwrap_or(0.0);
    tracing::debug!(
        format = format.as_str(),
        boundary_rate,
        aberration_fraction = chroma.fraction(),
        points,
        "artifact analysis"
    );

    let mut score = SignalScore::new(SignalName::Artifacts, points, points)
        .with_consistent(assessment == Assessment::Pass)
        .with_assessment(assessment)
        .with_detail("block_anomaly_rate", boundary_rate)
        .with_detail("block_boundary_scanned", boundary.is_some() as u8 as f64)
        .with_detail("aberration_fraction", chroma.fraction())
        .with_detail("aberration_samples", chroma.sampled as f64);
    score.findings = findings;
    score
}

pub struct ArtifactAnalyzer;

impl SignalAnalyzer for ArtifactAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::Artifacts
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_artifacts(
            ctx.raster,
            ctx.luma,
            ctx.source_format,
            ctx.params.block_stride,
            ctx.params.chroma_stride,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{gray_from_fn, rgb_from_fn};

    fn run(raster: &RasterImage, format: SourceFormat) -> SignalScore {
        let luma = LumaField::from_raster(raster);
        analyze_artifacts(raster, &luma, format, 8, 10)
    }

    /// Brightness jumps at every 8th row, like badly quantized blocks.
    fn blocky(_x: u32, y: u32) -> u8 {
        if (y / 8) % 2 == 0 {
            40
        } else {
            160
        }
    }

    #[test]
    fn test_block_boundaries_only_scanned_for_jpeg() {
        let raster = gray_from_fn(64, 64, blocky);

        let jpeg = run(&raster, SourceFormat::Jpeg);
        assert_eq!(jpeg.normalized_score, 30.0);
        assert_eq!(jpeg.assessment, Assessment::Suspicious);
        assert_eq!(jpeg.details["block_anomaly_rate"], 100.0);

        let png = run(&raster, SourceFormat::Png);
        assert_eq!(png.normalized_score, 0.0);
        assert_eq!(png.assessment, Assessment::Pass);
        assert_eq!(png.details["block_boundary_scanned"], 0.0);
    }

    #[test]
    fn test_boundary_rate_counts_steps() {
        let raster = gray_from_fn(9, 17, blocky);
        let luma = LumaField::from_raster(&raster);
        let scan = scan_block_boundaries(&luma, 8);
        // rows 8 and 16, 8 columns each; both rows are steps
        assert_eq!(scan.scanned, 16);
        assert_eq!(scan.anomalies, 16);
        assert_eq!(scan.rate_percent(), 100.0);
    }

    #[test]
    fn test_chromatic_aberration() {
        let red = rgb_from_fn(50, 50, |_, _| [250, 10, 10]);
        let score = run(&red, SourceFormat::Png);
        assert_eq!(score.details["aberration_fraction"], 1.0);
        assert_eq!(score.normalized_score, 20.0);
        assert_eq!(score.assessment, Assessment::Pass);

        let shifted = rgb_from_fn(64, 64, |x, y| {
            let v = blocky(x, y);
            [v.saturating_add(95), v, 0]
        });
        let both = run(&shifted, SourceFormat::Jpeg);
        assert_eq!(both.normalized_score, 50.0);
        assert_eq!(both.assessment, Assessment::Fail);
    }

    #[test]
    fn test_grayscale_skips_chroma() {
        let raster = RasterImage::new(20, 20, 1, vec![77; 400]).unwrap();
        let scan = scan_chroma(&raster, 10);
        assert_eq!(scan.sampled, 0);
        assert_eq!(scan.fraction(), 0.0);
    }

    #[test]
    fn test_clean_image_passes() {
        let score = run(&gray_from_fn(64, 64, |x, _| (x * 2) as u8), SourceFormat::Jpeg);
        assert_eq!(score.normalized_score, 0.0);
        assert!(score.consistent);
        assert_eq!(score.warnings().count(), 0);
    }
}
