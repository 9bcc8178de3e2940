//! Forensic Core
//!
//! Signal extraction and credibility fusion for still images:
//! - Luma/region extraction shared by every pixel analyzer
//! - Lighting, structural, noise, artifact and sharpness consistency checks
//! - Error-level analysis (JPEG round trip, in memory or on disk)
//! - Residual statistics, AI-likelihood heuristics, metadata plausibility
//! - Perceptual comparison (image SSIM, text edit distance) and archive verification
//! - Additive or weighted fusion into one explainable `CredibilityAssessment`
//! - Batch frame analysis on a bounded worker pool
//!
//! Decoding files is the caller's job; the core starts from a `RasterImage`.

pub mod analyzers;
pub mod batch;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error_handler;
pub mod errors;
pub mod fusion;
pub mod historical;
pub mod logging;
pub mod raster;
pub mod regions;
pub mod signal;
pub mod stats;
pub mod thread_manager;

#[cfg(test)]
mod property_tests;

pub use analyzers::{AnalysisContext, AnalyzerParams, AnalyzerRegistry, MetadataFacts, ScratchMode, SignalAnalyzer};
pub use batch::{analyze_batch, run_batch, BatchReport, BatchResult, BatchSummary, FrameAssessment, FrameError};
pub use compare::{compare, compare_images, compare_texts, Artifact, ComparisonResult, ContentType};
pub use config::EngineConfig;
pub use engine::{analyze_image, analyze_request, AnalysisRequest, ForensicEngine};
pub use error_handler::{handle_error, report_error, ErrorAction, ErrorCategory};
pub use errors::{ForensicError, Result};
pub use fusion::{fuse, CredibilityAssessment, FusionPolicy, SignalContribution, Verdict, WeightConfig};
pub use historical::{verify_against_archive, ArchiveEntry, ArchiveMatch, HistoricalVerification, TimelineConsistency};
pub use logging::{init_logging, LogConfig};
pub use raster::{RasterImage, SourceFormat};
pub use regions::{GridSpec, LumaField};
pub use signal::{Assessment, Finding, ScoreDirection, ScoreScale, Severity, SignalName, SignalScore};
pub use thread_manager::ThreadConfig;
