//! Weighted credibility fusion.
//!
//! `credibility = sum(component_i * w_i)` over the normalized weights, where
//! each component is the signal's score flipped into the credibility
//! direction. Missing or failed signals sit at the neutral 0.5.

use super::{find_signal, CredibilityAssessment, FusionPolicy, SignalContribution, Verdict, WeightConfig};
use crate::signal::{SignalScore, NEUTRAL_UNIT};
use std::collections::BTreeMap;

pub fn fuse(signals: Vec<SignalScore>, weights: &WeightConfig) -> CredibilityAssessment {
    let normalized = weights.normalized();
    let mut credibility = 0.0;
    let mut coverage = 0.0;
    let mut breakdown = BTreeMap::new();

    for (&name, &weight) in &normalized {
        let contribution = match find_signal(&signals, name) {
            Some(signal) if !signal.is_degraded() => {
                let component = signal.credibility_component();
                coverage += weight;
                SignalContribution {
                    raw_value: Some(signal.raw_value),
                    score: Some(signal.normalized_score),
                    component,
                    weight,
                    weighted_contribution: component * weight,
                    note: None,
                }
            }
            Some(signal) => SignalContribution::missing(
                weight,
                NEUTRAL_UNIT * weight,
                signal.error.clone().unwrap_or_else(|| "analyzer failed".to_string()),
            ),
            None => SignalContribution::missing(weight, NEUTRAL_UNIT * weight, "not analyzed"),
        };
        credibility += contribution.weighted_contribution;
        breakdown.insert(name, contribution);
    }

    let credibility = credibility.clamp(0.0, 1.0);
    let suspicion = (1.0 - credibility) * 100.0;
    let verdict = Verdict::from_suspicion(suspicion);
    let findings = signals
        .iter()
        .flat_map(|s| s.warnings().cloned())
        .collect();

    CredibilityAssessment {
        final_score: credibility * 100.0,
        verdict,
        suspicion_score: suspicion,
        confidence: (coverage * 100.0).clamp(0.0, 100.0),
        policy: FusionPolicy::Weighted,
        explanation: verdict.explanation(suspicion),
        findings,
        breakdown,
        signals,
    }
}
