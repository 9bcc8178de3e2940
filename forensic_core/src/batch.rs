//! Batch Frame Analysis
//!
//! Runs many independent analyses (typically extracted video frames) on a
//! bounded worker pool. One bad frame never aborts the batch: failures are
//! recorded against the frame index and the rest carry on.

use crate::config::EngineConfig;
use crate::engine::{AnalysisRequest, ForensicEngine};
use crate::error_handler::ErrorCategory;
use crate::errors::Result;
use crate::fusion::{CredibilityAssessment, Verdict};
use crate::raster::RasterImage;
use crate::signal::Finding;
use crate::stats::mean;
use crate::thread_manager::{build_pool, ThreadConfig};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameError {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<FrameError>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&mut self) {
        self.total += 1;
        self.succeeded += 1;
    }

    pub fn fail(&mut self, index: usize, message: String) {
        self.total += 1;
        self.failed += 1;
        self.errors.push(FrameError { index, message });
    }

    pub fn skip(&mut self) {
        self.total += 1;
        self.skipped += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.succeeded as f64 / self.total as f64) * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub counts: BatchResult,
    pub mean_final_score: f64,
    pub mean_suspicion_score: f64,
    /// `None` when no frame was analyzed.
    pub worst_verdict: Option<Verdict>,
    /// Union of frame findings, first-seen order, one per message.
    pub findings: Vec<Finding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameAssessment {
    pub index: usize,
    pub assessment: CredibilityAssessment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub summary: BatchSummary,
    /// Successful frames in input order.
    pub frames: Vec<FrameAssessment>,
}

pub fn summarize(outcomes: Vec<(usize, Result<CredibilityAssessment>)>) -> BatchReport {
    let mut counts = BatchResult::new();
    let mut frames = Vec::new();

    for (index, outcome) in outcomes {
        match outcome {
            Ok(assessment) => {
                counts.success();
                frames.push(FrameAssessment { index, assessment });
            }
            Err(e) if e.category() == ErrorCategory::Optional => {
                tracing::debug!(index, error = %e, "frame skipped");
                counts.skip();
            }
            Err(e) => {
                tracing::warn!(index, error = %e, "frame failed");
                counts.fail(index, e.to_string());
            }
        }
    }

    let (mean_final_score, mean_suspicion_score) = if frames.is_empty() {
        (50.0, 50.0)
    } else {
        let finals: Vec<f64> = frames.iter().map(|f| f.assessment.final_score).collect();
        let suspicions: Vec<f64> = frames.iter().map(|f| f.assessment.suspicion_score).collect();
        (mean(&finals), mean(&suspicions))
    };

    let worst_verdict = frames.iter().map(|f| f.assessment.verdict).max();

    let mut seen = HashSet::new();
    let findings = frames
        .iter()
        .flat_map(|f| f.assessment.findings.iter())
        .filter(|finding| seen.insert(finding.message.clone()))
        .cloned()
        .collect();

    BatchReport {
        summary: BatchSummary {
            counts,
            mean_final_score,
            mean_suspicion_score,
            worst_verdict,
            findings,
        },
        frames,
    }
}

/// Run `analyze` over `items` on a dedicated pool sized by `thread_config`.
/// Errors returned by `analyze` are recorded per item; only pool setup can
/// fail the whole call.
pub fn run_batch<T, F>(items: &[T], thread_config: &ThreadConfig, analyze: F) -> Result<BatchReport>
where
    T: Sync,
    F: Fn(&T) -> Result<CredibilityAssessment> + Sync,
{
    let start = Instant::now();
    let pool = build_pool(thread_config)?;

    let outcomes: Vec<(usize, Result<CredibilityAssessment>)> = pool.install(|| {
        items
            .par_iter()
            .enumerate()
            .map(|(index, item)| (index, analyze(item)))
            .collect()
    });

    let report = summarize(outcomes);
    let counts = &report.summary.counts;
    tracing::info!(
        total = counts.total,
        succeeded = counts.succeeded,
        failed = counts.failed,
        skipped = counts.skipped,
        mean_final_score = report.summary.mean_final_score,
        worst_verdict = ?report.summary.worst_verdict,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "batch complete"
    );
    Ok(report)
}

/// Analyze every frame with one configuration. The configuration is
/// validated once up front; per-frame failures do not abort.
pub fn analyze_batch(
    frames: &[RasterImage],
    config: &EngineConfig,
    thread_config: &ThreadConfig,
) -> Result<BatchReport> {
    config.validate()?;
    let engine = ForensicEngine::default();
    run_batch(frames, thread_config, |frame| {
        engine.analyze(&AnalysisRequest::new(frame), config)
    })
}
