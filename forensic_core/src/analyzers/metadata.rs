//! Metadata Consistency Analyzer
//!
//! Plausibility of the facts the codec collaborator extracted alongside the
//! pixels. Starts fully credible and loses credibility per contradiction.
//! Without facts the signal is missing, never guessed.

use super::{AnalysisContext, SignalAnalyzer};
use crate::errors::Result;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const REVERSED_TIMESTAMPS_PENALTY: f64 = 0.3;
pub const EMPTY_EXIF_PENALTY: f64 = 0.2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFacts {
    /// Capture date: EXIF `DateTimeOriginal`/`DateTime` when present.
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    /// `None`: EXIF was not inspected. `Some(0)`: inspected and empty.
    pub exif_tag_count: Option<usize>,
}

pub fn analyze_metadata(facts: &MetadataFacts) -> SignalScore {
    let mut credibility = 1.0;
    let mut findings = Vec::new();

    if let (Some(created), Some(modified)) = (facts.created, facts.modified) {
        if created > modified {
            findings.push(Finding::warning("Creation date is later than modification date"));
            credibility -= REVERSED_TIMESTAMPS_PENALTY;
        }
    }

    if facts.exif_tag_count == Some(0) {
        findings.push(Finding::warning("No EXIF metadata found"));
        credibility -= EMPTY_EXIF_PENALTY;
    }

    let credibility = f64::max(credibility, 0.0);
    let consistent = findings.is_empty();
    if consistent {
        findings.push(Finding::info("Metadata is internally consistent"));
    }

    tracing::debug!(credibility, inconsistencies = findings.len(), "metadata analysis");

    let mut score = SignalScore::new(SignalName::MetadataConsistency, credibility, credibility)
        .with_consistent(consistent)
        .with_detail("has_timestamps", (facts.created.is_some() && facts.modified.is_some()) as u8 as f64);
    if let Some(count) = facts.exif_tag_count {
        score = score.with_detail("exif_tag_count", count as f64);
    }
    if !consistent {
        score = score.with_assessment(Assessment::Suspicious);
    }
    score.findings = findings;
    score
}

pub struct MetadataAnalyzer;

impl SignalAnalyzer for MetadataAnalyzer {
    fn name(&self) -> SignalName {
        SignalName::MetadataConsistency
    }

    fn applies(&self, ctx: &AnalysisContext<'_>) -> bool {
        ctx.metadata.is_some()
    }

    fn analyze(&self, ctx: &AnalysisContext<'_>) -> Result<SignalScore> {
        Ok(match ctx.metadata {
            Some(facts) => analyze_metadata(facts),
            None => SignalScore::neutral(self.name(), "no metadata supplied"),
        })
    }
}
