//! Signal Analyzers
//!
//! Every analyzer is a pure function of `(RasterImage, params) -> SignalScore`.
//! The `AnalyzerRegistry` is the strategy table the engine fans out over; a
//! signal is computed in exactly one place regardless of caller.
//!
//! ## Analyzers
//! - `lighting`: region brightness range / variance (4x4)
//! - `structural`: edge-density uniformity + aspect ratio (3x3)
//! - `noise`: per-region luma variance spread (5x5)
//! - `artifacts`: JPEG block boundaries + chromatic aberration
//! - `sharpness`: per-region edge-energy spread (4x4)
//! - `ela`: recompression error level
//! - `residual`: high-pass noise, block energy, histogram entropy
//! - `ai_likelihood`: smoothness heuristics typical of synthetic images
//! - `metadata`: timestamp / EXIF plausibility (needs collaborator facts)

pub mod ai_likelihood;
pub mod artifacts;
pub mod ela;
pub mod lighting;
pub mod metadata;
pub mod noise;
pub mod residual;
pub mod sharpness;
pub mod structural;

use crate::errors::Result;
use crate::raster::{RasterImage, SourceFormat};
use crate::regions::{GridSpec, LumaField, DEFAULT_EDGE_THRESHOLD};
use crate::signal::{SignalName, SignalScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use ela::ScratchMode;
pub use metadata::MetadataFacts;

/// Tunables that bound per-image work. Thresholds are fixed per analyzer;
/// only sizes and strides are configurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerParams {
    pub lighting_grid: GridSpec,
    pub structural_grid: GridSpec,
    pub noise_grid: GridSpec,
    pub sharpness_grid: GridSpec,
    pub edge_threshold: f64,
    /// JPEG block stride for the boundary scan.
    pub block_stride: usize,
    /// Sampling stride for the chromatic aberration scan.
    pub chroma_stride: usize,
    pub ela_quality: u8,
    pub ela_scratch: ScratchMode,
    /// Directory for on-disk ELA scratch files (system temp when unset).
    pub scratch_dir: Option<PathBuf>,
}

impl Default for AnalyzerParams {
    fn default() -> Self {
        Self {
            lighting_grid: GridSpec::square(4),
            structural_grid: GridSpec::square(3),
            noise_grid: GridSpec::square(5),
            sharpness_grid: GridSpec::square(4),
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            block_stride: 8,
            chroma_stride: 10,
            ela_quality: 95,
            ela_scratch: ScratchMode::Memory,
            scratch_dir: None,
        }
    }
}

/// Everything an analyzer may read. All borrowed, all immutable.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub raster: &'a RasterImage,
    pub luma: &'a LumaField,
    pub source_format: SourceFormat,
    pub metadata: Option<&'a MetadataFacts>,
    pub params: &'a AnalyzerParams,
}

pub trait SignalAnalyzer: Send + Sync {
    fn name(&self) -> SignalName;

    /// Whether the inputs this analyzer needs are present.
    fn applies(&self, _ctx: &AnalysisContext<'_>) -> bool {
        true
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore>;
}

/// Strategy table keyed by signal name.
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<SignalName, Box<dyn SignalAnalyzer>>,
}

impl AnalyzerRegistry {
    pub fn empty() -> Self {
        Self {
            analyzers: BTreeMap::new(),
        }
    }

    /// All built-in image analyzers.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(lighting::LightingAnalyzer));
        registry.register(Box::new(structural::StructuralAnalyzer));
        registry.register(Box::new(noise::NoiseAnalyzer));
        registry.register(Box::new(artifacts::ArtifactAnalyzer));
        registry.register(Box::new(sharpness::SharpnessAnalyzer));
        registry.register(Box::new(ela::ElaAnalyzer));
        registry.register(Box::new(residual::ResidualAnalyzer));
        registry.register(Box::new(ai_likelihood::AiLikelihoodAnalyzer));
        registry.register(Box::new(metadata::MetadataAnalyzer));
        registry
    }

    /// Replaces any analyzer already registered under the same name.
    pub fn register(&mut self, analyzer: Box<dyn SignalAnalyzer>) {
        self.analyzers.insert(analyzer.name(), analyzer);
    }

    pub fn remove(&mut self, name: SignalName) -> bool {
        self.analyzers.remove(&name).is_some()
    }

    pub fn get(&self, name: SignalName) -> Option<&dyn SignalAnalyzer> {
        self.analyzers.get(&name).map(|a| a.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = SignalName> + '_ {
        self.analyzers.keys().copied()
    }

    /// Deterministic (name-ordered) view for fan-out.
    pub fn analyzers(&self) -> Vec<&dyn SignalAnalyzer> {
        self.analyzers.values().map(|a| a.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl Default for AnalyzerRegistry {
    fn default() -> Self {
        Self::standard()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_covers_image_signals() {
        let registry = AnalyzerRegistry::standard();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(registry.len(), 9);
        assert!(names.contains(&SignalName::Lighting));
        assert!(names.contains(&SignalName::ElaAnalysis));
        assert!(names.contains(&SignalName::MetadataConsistency));
        // comparison-derived signals are not pixel analyzers
        assert!(!names.contains(&SignalName::HistoricalMatch));
        assert!(!names.contains(&SignalName::AlterationDetection));
    }

    #[test]
    fn test_register_replaces_and_remove() {
        let mut registry = AnalyzerRegistry::empty();
        assert!(registry.is_empty());
        registry.register(Box::new(lighting::LightingAnalyzer));
        registry.register(Box::new(lighting::LightingAnalyzer));
        assert_eq!(registry.len(), 1);
        assert!(registry.get(SignalName::Lighting).is_some());
        assert!(registry.remove(SignalName::Lighting));
        assert!(!registry.remove(SignalName::Lighting));
    }

    #[test]
    fn test_default_params() {
        let params = AnalyzerParams::default();
        assert_eq!(params.lighting_grid, GridSpec::square(4));
        assert_eq!(params.structural_grid, GridSpec::square(3));
        assert_eq!(params.noise_grid, GridSpec::square(5));
        assert_eq!(params.ela_quality, 95);
        assert_eq!(params.ela_scratch, ScratchMode::Memory);
    }

    #[test]
    fn test_params_deserialize_partial() {
        let params: AnalyzerParams =
            serde_json::from_str(r#"{"ela_quality": 90, "ela_scratch": "disk"}"#).unwrap();
        assert_eq!(params.ela_quality, 90);
        assert_eq!(params.ela_scratch, ScratchMode::Disk);
        assert_eq!(params.noise_grid, GridSpec::square(5));
    }
}
