//! Image comparator: simplified SSIM plus difference statistics on luma.

use super::ComparisonResult;
use crate::errors::Result;
use crate::raster::RasterImage;
use crate::regions::LumaField;
use crate::stats::RunningStats;
use image::imageops::FilterType;

/// Per-pixel luma difference above which a pixel counts as altered.
pub const ALTERATION_STEP: f64 = 30.0;

pub fn variant_bucket(diff_variance: f64) -> f64 {
    if diff_variance < 100.0 {
        0.1
    } else if diff_variance < 500.0 {
        0.5
    } else {
        0.9
    }
}

pub fn alteration_bucket(altered_fraction: f64) -> f64 {
    if altered_fraction > 0.1 {
        0.9
    } else if altered_fraction > 0.05 {
        0.6
    } else if altered_fraction > 0.01 {
        0.3
    } else {
        0.1
    }
}

/// Downsample to `(width, height)` if needed. Never upsamples.
fn fit_luma(raster: &RasterImage, width: u32, height: u32) -> Result<LumaField> {
    if raster.width() == width && raster.height() == height {
        return Ok(LumaField::from_raster(raster));
    }
    let resized = raster
        .to_dynamic()?
        .resize_exact(width, height, FilterType::Triangle);
    Ok(LumaField::from_raster(&RasterImage::from_dynamic(&resized)?))
}

pub fn compare_images(a: &RasterImage, b: &RasterImage) -> Result<ComparisonResult> {
    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    let la = fit_luma(a, width, height)?;
    let lb = fit_luma(b, width, height)?;

    let mut diffs = RunningStats::default();
    let mut diff_sum = 0.0;
    let mut ssim_sum = 0.0;
    let mut altered = 0usize;
    for (&pa, &pb) in la.values().iter().zip(lb.values()) {
        let diff = (pa - pb).abs();
        diff_sum += diff;
        ssim_sum += 1.0 - diff / 255.0;
        if diff > ALTERATION_STEP {
            altered += 1;
        }
        diffs.push(diff);
    }

    let n = diffs.count().max(1) as f64;
    let ssim = ssim_sum / n;
    let similarity = 1.0 - diff_sum / (n * 255.0);
    let combined = 0.7 * ssim + 0.3 * similarity;
    let altered_fraction = altered as f64 / n;

    tracing::debug!(
        width,
        height,
        ssim,
        similarity,
        altered_fraction,
        "image comparison"
    );

    Ok(ComparisonResult {
        ssim_score: Some(ssim),
        similarity_score: Some(similarity),
        ..ComparisonResult::new(
            combined.clamp(0.0, 1.0),
            variant_bucket(diffs.variance()),
            alteration_bucket(altered_fraction),
        )
    })
}
