//! Signal Model
//!
//! One `SignalScore` per analyzer per request. Scores are immutable once
//! built and carry enough context (scale, direction) for any fusion policy to
//! interpret them without knowing which analyzer produced them.

use crate::errors::ForensicError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Neutral substitute for a missing or failed signal, on the unit scale.
pub const NEUTRAL_UNIT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalName {
    Lighting,
    #[serde(alias = "coherence")]
    StructuralCoherence,
    #[serde(alias = "noise")]
    NoisePattern,
    Artifacts,
    Sharpness,
    #[serde(alias = "ela")]
    ElaAnalysis,
    #[serde(alias = "residual")]
    ResidualAnalysis,
    AiDetection,
    MetadataConsistency,
    HistoricalMatch,
    AlterationDetection,
}

impl SignalName {
    pub const ALL: [SignalName; 11] = [
        SignalName::Lighting,
        SignalName::StructuralCoherence,
        SignalName::NoisePattern,
        SignalName::Artifacts,
        SignalName::Sharpness,
        SignalName::ElaAnalysis,
        SignalName::ResidualAnalysis,
        SignalName::AiDetection,
        SignalName::MetadataConsistency,
        SignalName::HistoricalMatch,
        SignalName::AlterationDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalName::Lighting => "lighting",
            SignalName::StructuralCoherence => "structural_coherence",
            SignalName::NoisePattern => "noise_pattern",
            SignalName::Artifacts => "artifacts",
            SignalName::Sharpness => "sharpness",
            SignalName::ElaAnalysis => "ela_analysis",
            SignalName::ResidualAnalysis => "residual_analysis",
            SignalName::AiDetection => "ai_detection",
            SignalName::MetadataConsistency => "metadata_consistency",
            SignalName::HistoricalMatch => "historical_match",
            SignalName::AlterationDetection => "alteration_detection",
        }
    }

    /// Natural reading of each signal's normalized score.
    pub fn direction(&self) -> ScoreDirection {
        match self {
            SignalName::StructuralCoherence
            | SignalName::MetadataConsistency
            | SignalName::HistoricalMatch => ScoreDirection::Credibility,
            _ => ScoreDirection::Manipulation,
        }
    }

    pub fn scale(&self) -> ScoreScale {
        match self {
            SignalName::StructuralCoherence | SignalName::Artifacts => ScoreScale::Percent,
            _ => ScoreScale::Unit,
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignalName {
    type Err = ForensicError;

    /// Accepts the snake_case names plus the camelCase keys used by older
    /// weight tables (`aiDetection`, `elaAnalysis`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .flat_map(|c| {
                if c.is_ascii_uppercase() {
                    vec!['_', c.to_ascii_lowercase()]
                } else {
                    vec![c]
                }
            })
            .collect();
        let key = match normalized.as_str() {
            "coherence" => "structural_coherence",
            "noise" => "noise_pattern",
            "ela" => "ela_analysis",
            "residual" => "residual_analysis",
            other => other,
        };
        SignalName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == key)
            .ok_or_else(|| ForensicError::ConfigurationError(format!("unknown signal: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// [0, 1]
    Unit,
    /// [0, 100]
    Percent,
}

impl ScoreScale {
    pub fn max(&self) -> f64 {
        match self {
            ScoreScale::Unit => 1.0,
            ScoreScale::Percent => 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreDirection {
    /// Higher means more likely manipulated.
    Manipulation,
    /// Higher means more likely authentic.
    Credibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Assessment {
    Pass,
    Suspicious,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Descriptive only, never scored.
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalScore {
    pub name: SignalName,
    pub raw_value: f64,
    pub normalized_score: f64,
    pub scale: ScoreScale,
    pub direction: ScoreDirection,
    pub consistent: bool,
    pub assessment: Assessment,
    pub findings: Vec<Finding>,
    pub details: BTreeMap<String, f64>,
    /// Set when the analyzer failed and this is a neutral substitute.
    pub error: Option<String>,
}

impl SignalScore {
    /// `normalized` is clamped into the signal's declared scale.
    pub fn new(name: SignalName, raw_value: f64, normalized: f64) -> Self {
        let scale = name.scale();
        let normalized_score = if normalized.is_finite() {
            normalized.clamp(0.0, scale.max())
        } else {
            0.0
        };
        Self {
            name,
            raw_value,
            normalized_score,
            scale,
            direction: name.direction(),
            consistent: true,
            assessment: Assessment::Pass,
            findings: Vec::new(),
            details: BTreeMap::new(),
            error: None,
        }
    }

    /// Neutral stand-in for an analyzer that failed or could not run.
    pub fn neutral(name: SignalName, note: impl Into<String>) -> Self {
        let scale = name.scale();
        let note = note.into();
        let mut score = Self::new(name, 0.0, NEUTRAL_UNIT * scale.max());
        score.findings.push(Finding::info(note.clone()));
        score.error = Some(note);
        score
    }

    pub fn with_consistent(mut self, consistent: bool) -> Self {
        self.consistent = consistent;
        self
    }

    pub fn with_assessment(mut self, assessment: Assessment) -> Self {
        self.assessment = assessment;
        self
    }

    pub fn with_finding(mut self, finding: Finding) -> Self {
        self.findings.push(finding);
        self
    }

    pub fn with_detail(mut self, key: &str, value: f64) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Normalized score mapped onto [0, 1].
    pub fn unit_value(&self) -> f64 {
        self.normalized_score / self.scale.max()
    }

    /// Unit value flipped so that higher always means more credible.
    pub fn credibility_component(&self) -> f64 {
        match self.direction {
            ScoreDirection::Credibility => self.unit_value(),
            ScoreDirection::Manipulation => 1.0 - self.unit_value(),
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_warning())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_name_parsing() {
        assert_eq!("ai_detection".parse::<SignalName>().unwrap(), SignalName::AiDetection);
        assert_eq!("aiDetection".parse::<SignalName>().unwrap(), SignalName::AiDetection);
        assert_eq!("elaAnalysis".parse::<SignalName>().unwrap(), SignalName::ElaAnalysis);
        assert_eq!("coherence".parse::<SignalName>().unwrap(), SignalName::StructuralCoherence);
        assert!(matches!(
            "gamma_rays".parse::<SignalName>(),
            Err(ForensicError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_every_name_round_trips_through_as_str() {
        for name in SignalName::ALL {
            assert_eq!(name.as_str().parse::<SignalName>().unwrap(), name);
            assert_eq!(serde_json::to_string(&name).unwrap(), format!("\"{}\"", name));
        }
    }

    #[test]
    fn test_normalized_score_is_clamped() {
        let s = SignalScore::new(SignalName::ElaAnalysis, 3.0, 1.7);
        assert_eq!(s.normalized_score, 1.0);
        let s = SignalScore::new(SignalName::Artifacts, 3.0, 170.0);
        assert_eq!(s.normalized_score, 100.0);
        let s = SignalScore::new(SignalName::NoisePattern, 0.0, f64::NAN);
        assert_eq!(s.normalized_score, 0.0);
    }

    #[test]
    fn test_credibility_component_direction() {
        let ela = SignalScore::new(SignalName::ElaAnalysis, 0.0, 0.8);
        assert!((ela.credibility_component() - 0.2).abs() < 1e-12);

        let meta = SignalScore::new(SignalName::MetadataConsistency, 0.0, 0.8);
        assert!((meta.credibility_component() - 0.8).abs() < 1e-12);

        let coherence = SignalScore::new(SignalName::StructuralCoherence, 75.0, 75.0);
        assert!((coherence.credibility_component() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_sits_mid_scale() {
        let s = SignalScore::neutral(SignalName::Artifacts, "not a JPEG");
        assert_eq!(s.normalized_score, 50.0);
        assert!(s.is_degraded());
        assert!((s.credibility_component() - 0.5).abs() < 1e-12);
        assert_eq!(s.warnings().count(), 0);
    }
}
