//! Engine Configuration
//!
//! One `EngineConfig` per request (or per process, shared read-only). Loaded
//! from JSON or built in code; `validate()` runs before any pixel is read.
//!
//! ```json
//! {
//!   "policy": "weighted",
//!   "weights": { "aiDetection": 0.3, "elaAnalysis": 0.3, "metadataConsistency": 0.4 },
//!   "ela_quality": 95,
//!   "ela_scratch": "disk",
//!   "disabled_signals": ["sharpness"]
//! }
//! ```

use crate::analyzers::AnalyzerParams;
use crate::errors::{ForensicError, Result};
use crate::fusion::{FusionPolicy, WeightConfig};
use crate::signal::SignalName;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub policy: FusionPolicy,
    /// Request override; the process-wide defaults apply when unset.
    pub weights: Option<WeightConfig>,
    #[serde(flatten)]
    pub params: AnalyzerParams,
    pub disabled_signals: Vec<SignalName>,
    /// Fan analyzers out over the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            policy: FusionPolicy::default(),
            weights: None,
            params: AnalyzerParams::default(),
            disabled_signals: Vec::new(),
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn with_policy(mut self, policy: FusionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_weights(mut self, weights: WeightConfig) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text).map_err(|e| {
            ForensicError::ConfigurationError(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn weights(&self) -> &WeightConfig {
        self.weights.as_ref().unwrap_or_else(|| WeightConfig::defaults())
    }

    pub fn is_enabled(&self, name: SignalName) -> bool {
        !self.disabled_signals.contains(&name)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        if !(1..=100).contains(&p.ela_quality) {
            return Err(ForensicError::ConfigurationError(format!(
                "ela_quality must be 1-100, got {}",
                p.ela_quality
            )));
        }
        for (label, grid) in [
            ("lighting_grid", p.lighting_grid),
            ("structural_grid", p.structural_grid),
            ("noise_grid", p.noise_grid),
            ("sharpness_grid", p.sharpness_grid),
        ] {
            if grid.rows == 0 || grid.cols == 0 {
                return Err(ForensicError::ConfigurationError(format!(
                    "{} must have at least one row and column",
                    label
                )));
            }
        }
        if p.block_stride == 0 || p.chroma_stride == 0 {
            return Err(ForensicError::ConfigurationError(
                "scan strides must be positive".to_string(),
            ));
        }
        if !p.edge_threshold.is_finite() || p.edge_threshold < 0.0 {
            return Err(ForensicError::ConfigurationError(
                "edge_threshold must be a non-negative number".to_string(),
            ));
        }

        if self.policy == FusionPolicy::Weighted {
            let weights = self.weights();
            let active: f64 = weights
                .signals()
                .filter(|&name| self.is_enabled(name))
                .filter_map(|name| weights.get(name))
                .sum();
            if active <= 0.0 {
                return Err(ForensicError::ConfigurationError(
                    "every weighted signal is disabled".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::ScratchMode;
    use crate::regions::GridSpec;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.policy, FusionPolicy::Additive);
        assert!(config.parallel);
        assert_eq!(config.weights(), WeightConfig::defaults());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "policy": "weighted",
                "weights": {{"aiDetection": 1.0, "elaAnalysis": 1.0}},
                "ela_scratch": "disk",
                "noise_grid": {{"rows": 3, "cols": 3}},
                "disabled_signals": ["sharpness"],
                "parallel": false
            }}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.policy, FusionPolicy::Weighted);
        assert_eq!(config.params.ela_scratch, ScratchMode::Disk);
        assert_eq!(config.params.ela_quality, 95);
        assert_eq!(config.params.noise_grid, GridSpec::square(3));
        assert!(!config.is_enabled(SignalName::Sharpness));
        assert!(!config.parallel);
        assert_eq!(config.weights().get(SignalName::AiDetection), Some(1.0));
    }

    #[test]
    fn test_bad_weights_in_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"weights": {{"elaAnalysis": 0.0}}}}"#).unwrap();
        let err = EngineConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, ForensicError::ConfigurationError(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::from_json_file("/nonexistent/forensics.json").unwrap_err();
        assert!(matches!(err, ForensicError::IoError(_)));
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        let mut config = EngineConfig::default();
        config.params.ela_quality = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.params.lighting_grid = GridSpec { rows: 0, cols: 4 };
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.params.block_stride = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weighted_with_everything_disabled() {
        let weights = WeightConfig::from_pairs([(SignalName::ElaAnalysis, 1.0)]).unwrap();
        let mut config = EngineConfig::default()
            .with_policy(FusionPolicy::Weighted)
            .with_weights(weights);
        config.disabled_signals.push(SignalName::ElaAnalysis);
        assert!(matches!(
            config.validate(),
            Err(ForensicError::ConfigurationError(_))
        ));
    }
}
