//! Additive suspicion accumulation.
//!
//! Each visual check that did not pass adds a fixed number of suspicion
//! points; artifacts add their own score. The sum is clipped to [0, 100].
//! A check that failed or did not run adds no points: its breakdown row
//! carries the neutral 0.5 component and a note instead.

use super::{find_signal, CredibilityAssessment, FusionPolicy, SignalContribution, Verdict};
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use std::collections::BTreeMap;

/// Points per check. `None` means the signal contributes its own score.
pub const POINTS: [(SignalName, Option<f64>); 5] = [
    (SignalName::Lighting, Some(30.0)),
    (SignalName::StructuralCoherence, Some(15.0)),
    (SignalName::NoisePattern, Some(25.0)),
    (SignalName::Artifacts, None),
    (SignalName::Sharpness, Some(20.0)),
];

/// Largest artifact score the detector can produce.
const ARTIFACT_MAX_POINTS: f64 = 50.0;

fn triggered(signal: &SignalScore) -> bool {
    signal.assessment != Assessment::Pass
}

pub fn fuse(signals: Vec<SignalScore>) -> CredibilityAssessment {
    let mut suspicion = 0.0;
    let mut findings = Vec::new();
    let mut breakdown = BTreeMap::new();

    for (name, points) in POINTS {
        let weight = points.unwrap_or(ARTIFACT_MAX_POINTS) / 100.0;
        let contribution = match find_signal(&signals, name) {
            Some(signal) if !signal.is_degraded() => {
                let added = if triggered(signal) {
                    findings.extend(signal.warnings().cloned());
                    points.unwrap_or(signal.normalized_score)
                } else {
                    0.0
                };
                suspicion += added;
                SignalContribution {
                    raw_value: Some(signal.raw_value),
                    score: Some(signal.normalized_score),
                    component: signal.credibility_component(),
                    weight,
                    weighted_contribution: added,
                    note: None,
                }
            }
            Some(signal) => SignalContribution::missing(
                weight,
                0.0,
                signal.error.clone().unwrap_or_else(|| "analyzer failed".to_string()),
            ),
            None => SignalContribution::missing(weight, 0.0, "not analyzed"),
        };
        breakdown.insert(name, contribution);
    }

    let suspicion = f64::min(suspicion, 100.0).max(0.0);
    let verdict = Verdict::from_suspicion(suspicion);
    if findings.is_empty() {
        findings.push(Finding::info("All visual forensics checks passed"));
    }

    CredibilityAssessment {
        final_score: 100.0 - suspicion,
        verdict,
        suspicion_score: suspicion,
        confidence: 100.0 - suspicion,
        policy: FusionPolicy::Additive,
        explanation: verdict.explanation(suspicion),
        findings,
        breakdown,
        signals,
    }
}
