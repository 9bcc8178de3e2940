//! Error-Level Analysis (ELA)
//!
//! Re-encode the decoded pixels as JPEG at a fixed quality, decode again and
//! diff against the input. Regions edited after the last save recompress
//! differently from the rest of the frame.
//!
//! The encoded bytes live in a scoped scratch resource: an in-memory buffer or
//! a `tempfile::NamedTempFile`. Both are released on drop, on every exit path.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::{ForensicError, Result};
use crate::raster::RasterImage;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats::RunningStats;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use std::path::Path;

pub const DEFAULT_QUALITY: u8 = 95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScratchMode {
    #[default]
    Memory,
    Disk,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorLevels {
    pub max_error: f64,
    pub mean_error: f64,
    pub variance: f64,
    pub compared_bytes: usize,
}

/// Additive, capped at 1.0.
pub fn ela_score(levels: &ErrorLevels) -> f64 {
    let mut score: f64 = 0.0;
    if levels.max_error > 50.0 {
        score += 0.3;
    } else if levels.max_error > 30.0 {
        score += 0.15;
    }
    if levels.variance > 1000.0 {
        score += 0.3;
    } else if levels.variance > 500.0 {
        score += 0.15;
    }
    if levels.mean_error > 10.0 {
        score += 0.2;
    } else if levels.mean_error > 5.0 {
        score += 0.1;
    }
    score.min(1.0)
}

/// The layout JPEG can carry: gray stays gray, alpha is dropped.
fn jpeg_baseline(raster: &RasterImage) -> Result<DynamicImage> {
    let img = raster.to_dynamic()?;
    Ok(if raster.has_color() {
        DynamicImage::ImageRgb8(img.to_rgb8())
    } else {
        DynamicImage::ImageLuma8(img.to_luma8())
    })
}

fn codec_failure(err: image::ImageError) -> ForensicError {
    ForensicError::CodecFailure(err.to_string())
}

fn encode_jpeg<W: Write>(img: &DynamicImage, writer: W, quality: u8) -> Result<()> {
    let encoder = JpegEncoder::new_with_quality(writer, quality);
    img.write_with_encoder(encoder).map_err(codec_failure)
}

fn round_trip_memory(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    encode_jpeg(img, &mut buffer, quality)?;
    Ok(buffer.into_inner())
}

fn round_trip_disk(img: &DynamicImage, quality: u8, dir: Option<&Path>) -> Result<Vec<u8>> {
    let scratch_err = |e: std::io::Error| ForensicError::CodecFailure(format!("ELA scratch file: {}", e));

    let mut builder = tempfile::Builder::new();
    builder.prefix("ela_").suffix(".jpg");
    let mut scratch = match dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(scratch_err)?;

    encode_jpeg(img, scratch.as_file_mut(), quality)?;
    scratch.as_file_mut().flush().map_err(scratch_err)?;
    let bytes = std::fs::read(scratch.path()).map_err(scratch_err)?;
    // `scratch` unlinks on drop
    Ok(bytes)
}

/// Per-byte absolute difference statistics, truncated to the shorter buffer.
pub fn error_levels(original: &[u8], recompressed: &[u8]) -> ErrorLevels {
    let mut stats = RunningStats::default();
    let mut max_error: f64 = 0.0;
    for (&a, &b) in original.iter().zip(recompressed) {
        let diff = a.abs_diff(b) as f64;
        max_error = max_error.max(diff);
        stats.push(diff);
    }
    ErrorLevels {
        max_error,
        mean_error: stats.mean(),
        variance: stats.variance(),
        compared_bytes: stats.count() as usize,
    }
}

pub fn analyze_ela(
    raster: &RasterImage,
    quality: u8,
    scratch: ScratchMode,
    scratch_dir: Option<&Path>,
) -> Result<SignalScore> {
    let baseline = jpeg_baseline(raster)?;
    let encoded = match scratch {
        ScratchMode::Memory => round_trip_memory(&baseline, quality)?,
        ScratchMode::Disk => round_trip_disk(&baseline, quality, scratch_dir)?,
    };
    let decoded =
        image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg).map_err(codec_failure)?;
    let recompressed = if raster.has_color() {
        decoded.to_rgb8().into_raw()
    } else {
        decoded.to_luma8().into_raw()
    };

    let levels = error_levels(baseline.as_bytes(), &recompressed);
    let manipulation = ela_score(&levels);

    tracing::debug!(
        quality,
        max_error = levels.max_error,
        mean_error = levels.mean_error,
        variance = levels.variance,
        manipulation,
        "ELA analysis"
    );

    let score = SignalScore::new(SignalName::ElaAnalysis, levels.mean_error, manipulation)
        .with_consistent(manipulation < 0.5)
        .with_detail("max_error", levels.max_error)
        .with_detail("mean_error", levels.mean_error)
        .with_detail("error_variance", levels.variance)
        .with_detail("quality", quality as f64)
        .with_detail("encoded_bytes", encoded.len() as f64);

    Ok(if manipulation >= 0.5 {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Uneven recompression error - regions may have been edited after the last save",
            ))
    } else {
        score.with_finding(Finding::info("Recompression error is uniform"))
    })
}

pub struct ElaAnalyzer;

impl SignalAnalyzer for ElaAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::ElaAnalysis
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        analyze_ela(
            ctx.raster,
            ctx.params.ela_quality,
            ctx.params.ela_scratch,
            ctx.params.scratch_dir.as_deref(),
        )
    }
}
