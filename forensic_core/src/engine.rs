//! Analysis Engine
//!
//! Fan-out / fan-in over the analyzer registry for one image:
//!
//! ```text
//! RasterImage ─► LumaField ─┬─► lighting ───┐
//!                           ├─► structural ─┤
//!                           ├─► ...         ├─► fusion ─► CredibilityAssessment
//!                           └─► metadata ───┤
//! archive entries ─► historical verification┘
//! ```
//!
//! Analyzers share only immutable borrows. A recoverable analyzer failure
//! becomes a neutral signal; a fatal one aborts the request.

use crate::analyzers::{AnalysisContext, AnalyzerRegistry, MetadataFacts, SignalAnalyzer};
use crate::compare::Artifact;
use crate::config::EngineConfig;
use crate::error_handler::handle_error;
use crate::errors::Result;
use crate::fusion::{fuse, CredibilityAssessment};
use crate::historical::{verify_against_archive, ArchiveEntry};
use crate::raster::{RasterImage, SourceFormat};
use crate::regions::LumaField;
use crate::signal::SignalScore;
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::time::Instant;

/// Everything the collaborator hands over for one image.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
    pub image: &'a RasterImage,
    pub source_format: SourceFormat,
    pub metadata: Option<&'a MetadataFacts>,
    /// Reference artifacts for historical verification.
    pub archive: &'a [ArchiveEntry],
    pub claimed_date: Option<DateTime<Utc>>,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(image: &'a RasterImage) -> Self {
        Self {
            image,
            source_format: SourceFormat::Unknown,
            metadata: None,
            archive: &[],
            claimed_date: None,
        }
    }

    pub fn with_format(mut self, format: SourceFormat) -> Self {
        self.source_format = format;
        self
    }

    pub fn with_metadata(mut self, metadata: &'a MetadataFacts) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_archive(mut self, archive: &'a [ArchiveEntry], claimed_date: Option<DateTime<Utc>>) -> Self {
        self.archive = archive;
        self.claimed_date = claimed_date;
        self
    }
}

pub struct ForensicEngine {
    registry: AnalyzerRegistry,
}

impl Default for ForensicEngine {
    fn default() -> Self {
        Self::new(AnalyzerRegistry::standard())
    }
}

impl ForensicEngine {
    pub fn new(registry: AnalyzerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Run every enabled analyzer. Order follows the registry, not completion.
    pub fn collect_signals(
        &self,
        request: &AnalysisRequest<'_>,
        config: &EngineConfig,
    ) -> Result<Vec<SignalScore>> {
        let luma = LumaField::from_raster(request.image);
        let ctx = AnalysisContext {
            raster: request.image,
            luma: &luma,
            source_format: request.source_format,
            metadata: request.metadata,
            params: &config.params,
        };

        let selected: Vec<&dyn SignalAnalyzer> = self
            .registry
            .analyzers()
            .into_iter()
            .filter(|a| config.is_enabled(a.name()) && a.applies(&ctx))
            .collect();

        let outcomes: Vec<Result<SignalScore>> = if config.parallel {
            selected.par_iter().map(|a| run_analyzer(*a, &ctx)).collect()
        } else {
            selected.iter().map(|a| run_analyzer(*a, &ctx)).collect()
        };
        let mut signals = outcomes.into_iter().collect::<Result<Vec<_>>>()?;

        if !request.archive.is_empty() {
            signals.extend(historical_signals(request, config)?);
        }
        Ok(signals)
    }

    pub fn analyze(
        &self,
        request: &AnalysisRequest<'_>,
        config: &EngineConfig,
    ) -> Result<CredibilityAssessment> {
        let start = Instant::now();
        config.validate()?;

        let signals = self.collect_signals(request, config)?;
        let degraded = signals.iter().filter(|s| s.is_degraded()).count();
        let assessment = fuse(signals, config.policy, config.weights());

        tracing::info!(
            width = request.image.width(),
            height = request.image.height(),
            format = request.source_format.as_str(),
            verdict = %assessment.verdict,
            final_score = assessment.final_score,
            degraded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "image analyzed"
        );
        Ok(assessment)
    }
}

fn run_analyzer(analyzer: &dyn SignalAnalyzer, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
    let name = analyzer.name();
    match analyzer.analyze(ctx) {
        Ok(score) => Ok(score),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let note = e.to_string();
            handle_error(e.category(), name.as_str(), e);
            Ok(SignalScore::neutral(name, note))
        }
    }
}

fn historical_signals(
    request: &AnalysisRequest<'_>,
    config: &EngineConfig,
) -> Result<Vec<SignalScore>> {
    let subject = Artifact::Image(request.image.clone());
    let verification = match verify_against_archive(&subject, request.archive, request.claimed_date) {
        Ok(v) => v,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            handle_error(e.category(), "Historical verification", e);
            return Ok(Vec::new());
        }
    };
    Ok(verification
        .to_signals()
        .into_iter()
        .filter(|s| config.is_enabled(s.name))
        .collect())
}

/// `analyzeImage(RasterImage, config)` with no format tag, metadata or archive.
pub fn analyze_image(image: &RasterImage, config: &EngineConfig) -> Result<CredibilityAssessment> {
    ForensicEngine::default().analyze(&AnalysisRequest::new(image), config)
}

pub fn analyze_request(
    request: &AnalysisRequest<'_>,
    config: &EngineConfig,
) -> Result<CredibilityAssessment> {
    ForensicEngine::default().analyze(request, config)
}
