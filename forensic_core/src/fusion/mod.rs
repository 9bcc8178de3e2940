//! Credibility / Suspicion Fusion
//!
//! Turns a set of `SignalScore`s into one `CredibilityAssessment`. Two
//! policies are selectable per request:
//!
//! | Policy     | Inputs                                   | Primary output          |
//! |------------|------------------------------------------|-------------------------|
//! | `additive` | lighting, coherence, noise, artifacts, sharpness | suspicion points |
//! | `weighted` | every signal named in the `WeightConfig` | credibility in [0, 1]   |
//!
//! Both fill the same `breakdown` so a verdict can always be explained.
//! Fusion is a pure function: no state survives between calls.

pub mod additive;
pub mod weighted;

use crate::errors::{ForensicError, Result};
use crate::signal::{Finding, SignalName, SignalScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const AUTHENTIC_BELOW: f64 = 40.0;
pub const SUSPICIOUS_BELOW: f64 = 70.0;

// ============================================================================
// Verdict / Policy
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Authentic,
    Suspicious,
    LikelyManipulated,
}

impl Verdict {
    /// Thresholds on the 0-100 suspicion scale.
    pub fn from_suspicion(suspicion: f64) -> Self {
        if suspicion < AUTHENTIC_BELOW {
            Verdict::Authentic
        } else if suspicion < SUSPICIOUS_BELOW {
            Verdict::Suspicious
        } else {
            Verdict::LikelyManipulated
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Authentic => "AUTHENTIC",
            Verdict::Suspicious => "SUSPICIOUS",
            Verdict::LikelyManipulated => "LIKELY_MANIPULATED",
        }
    }

    pub fn explanation(&self, suspicion: f64) -> String {
        match self {
            Verdict::Authentic => {
                "Forensic signals are consistent. No significant manipulation indicators detected."
                    .to_string()
            }
            Verdict::Suspicious => format!(
                "Moderate inconsistencies detected (suspicion {:.1}). Manual inspection recommended.",
                suspicion
            ),
            Verdict::LikelyManipulated => format!(
                "Multiple manipulation indicators detected (suspicion {:.1}). Image likely contains edited or composite elements.",
                suspicion
            ),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Fixed suspicion points per triggered visual check.
    #[default]
    Additive,
    /// Normalized weighted credibility over the configured signals.
    Weighted,
}

impl fmt::Display for FusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionPolicy::Additive => write!(f, "additive"),
            FusionPolicy::Weighted => write!(f, "weighted"),
        }
    }
}

impl FromStr for FusionPolicy {
    type Err = ForensicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "additive" => Ok(FusionPolicy::Additive),
            "weighted" => Ok(FusionPolicy::Weighted),
            other => Err(ForensicError::ConfigurationError(format!(
                "unknown fusion policy: {}",
                other
            ))),
        }
    }
}

// ============================================================================
// WeightConfig
// ============================================================================

/// Non-negative weight per signal. Immutable once validated; fusion only
/// ever reads a normalized copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct WeightConfig(BTreeMap<SignalName, f64>);

static DEFAULT_WEIGHTS: OnceLock<WeightConfig> = OnceLock::new();

impl WeightConfig {
    pub fn new(weights: BTreeMap<SignalName, f64>) -> Result<Self> {
        for (name, &weight) in &weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ForensicError::ConfigurationError(format!(
                    "weight for {} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }
        let total: f64 = weights.values().sum();
        if total <= 0.0 {
            return Err(ForensicError::ConfigurationError(
                "weights sum to zero".to_string(),
            ));
        }
        Ok(Self(weights))
    }

    pub fn from_pairs<I: IntoIterator<Item = (SignalName, f64)>>(pairs: I) -> Result<Self> {
        Self::new(pairs.into_iter().collect())
    }

    /// Process-wide defaults, built on first use and never mutated.
    pub fn defaults() -> &'static WeightConfig {
        DEFAULT_WEIGHTS.get_or_init(|| {
            WeightConfig(BTreeMap::from([
                (SignalName::AiDetection, 0.25),
                (SignalName::ElaAnalysis, 0.20),
                (SignalName::ResidualAnalysis, 0.15),
                (SignalName::MetadataConsistency, 0.15),
                (SignalName::HistoricalMatch, 0.15),
                (SignalName::AlterationDetection, 0.10),
            ]))
        })
    }

    pub fn get(&self, name: SignalName) -> Option<f64> {
        self.0.get(&name).copied()
    }

    pub fn signals(&self) -> impl Iterator<Item = SignalName> + '_ {
        self.0.keys().copied()
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Request-scoped copy whose weights sum to 1.
    pub fn normalized(&self) -> BTreeMap<SignalName, f64> {
        let total = self.total();
        self.0.iter().map(|(&name, &w)| (name, w / total)).collect()
    }
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self::defaults().clone()
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeightConfig {
    type Error = ForensicError;

    fn try_from(raw: BTreeMap<String, f64>) -> Result<Self> {
        let mut weights = BTreeMap::new();
        for (key, weight) in raw {
            weights.insert(key.parse::<SignalName>()?, weight);
        }
        Self::new(weights)
    }
}

// ============================================================================
// Assessment
// ============================================================================

/// One row of the explanation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalContribution {
    /// Analyzer metric, when the signal was present.
    pub raw_value: Option<f64>,
    /// Normalized score on the signal's own scale, when present.
    pub score: Option<f64>,
    /// Credibility-direction component in [0, 1]; 0.5 when missing.
    pub component: f64,
    pub weight: f64,
    /// Additive: suspicion points added. Weighted: `component * weight`.
    pub weighted_contribution: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SignalContribution {
    fn missing(weight: f64, weighted_contribution: f64, note: impl Into<String>) -> Self {
        Self {
            raw_value: None,
            score: None,
            component: crate::signal::NEUTRAL_UNIT,
            weight,
            weighted_contribution,
            note: Some(note.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredibilityAssessment {
    pub final_score: f64,
    pub verdict: Verdict,
    pub suspicion_score: f64,
    pub confidence: f64,
    pub policy: FusionPolicy,
    pub explanation: String,
    pub findings: Vec<Finding>,
    pub breakdown: BTreeMap<SignalName, SignalContribution>,
    pub signals: Vec<SignalScore>,
}

impl CredibilityAssessment {
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_warning())
    }
}

/// First signal with this name; degraded substitutes included.
pub(crate) fn find_signal(signals: &[SignalScore], name: SignalName) -> Option<&SignalScore> {
    signals.iter().find(|s| s.name == name)
}

pub fn fuse(
    signals: Vec<SignalScore>,
    policy: FusionPolicy,
    weights: &WeightConfig,
) -> CredibilityAssessment {
    let assessment = match policy {
        FusionPolicy::Additive => additive::fuse(signals),
        FusionPolicy::Weighted => weighted::fuse(signals, weights),
    };
    tracing::info!(
        %policy,
        verdict = %assessment.verdict,
        final_score = assessment.final_score,
        suspicion = assessment.suspicion_score,
        "fusion complete"
    );
    assessment
}
