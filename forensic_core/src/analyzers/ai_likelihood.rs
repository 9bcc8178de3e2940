//! AI-Likelihood Heuristic
//!
//! Synthetic images tend to be smoother than camera output: low global
//! variance, weak gradients, little fine texture. This is a heuristic prior
//! for the weighted fusion, not a classifier.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::regions::LumaField;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use crate::stats::{self, RunningStats};

const BASE_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothnessFeatures {
    pub variance: f64,
    pub gradient_mean: f64,
    /// Mean absolute 8-neighbour Laplacian.
    pub texture: f64,
}

pub fn extract_features(luma: &LumaField) -> SmoothnessFeatures {
    let mut gradient = RunningStats::default();
    let mut texture = RunningStats::default();
    for (x, y) in luma.interior() {
        let gx = luma.get(x + 1, y) - luma.get(x - 1, y);
        let gy = luma.get(x, y + 1) - luma.get(x, y - 1);
        gradient.push((gx * gx + gy * gy).sqrt());
        texture.push(luma.laplacian(x, y));
    }
    SmoothnessFeatures {
        variance: stats::variance(luma.values()),
        gradient_mean: gradient.mean(),
        texture: texture.mean(),
    }
}

pub fn ai_probability(features: &SmoothnessFeatures) -> f64 {
    let mut score = BASE_SCORE;
    if features.variance < 1000.0 {
        score += 0.15;
    } else if features.variance > 5000.0 {
        score -= 0.15;
    }
    if features.texture < 20.0 {
        score += 0.1;
    }
    if features.gradient_mean < 30.0 {
        score += 0.1;
    }
    score.clamp(0.0, 1.0)
}

pub fn analyze_ai_likelihood(luma: &LumaField) -> SignalScore {
    let features = extract_features(luma);
    let probability = ai_probability(&features);
    let confidence = (probability * 1.2).min(1.0);

    tracing::debug!(?features, probability, "AI-likelihood heuristic");

    let score = SignalScore::new(SignalName::AiDetection, probability, probability)
        .with_consistent(probability < 0.7)
        .with_detail("variance", features.variance)
        .with_detail("gradient_mean", features.gradient_mean)
        .with_detail("texture_uniformity", features.texture)
        .with_detail("confidence", confidence);

    if probability >= 0.7 {
        score
            .with_assessment(Assessment::Suspicious)
            .with_finding(Finding::warning(
                "Image is unusually smooth - consistent with synthetic generation",
            ))
    } else {
        score.with_finding(Finding::info("Texture and gradients look camera-like"))
    }
}

pub struct AiLikelihoodAnalyzer;

impl SignalAnalyzer for AiLikelihoodAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::AiDetection
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(analyze_ai_likelihood(ctx.luma))
    }
}
