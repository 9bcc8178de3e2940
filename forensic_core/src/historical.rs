//! Historical Verification
//!
//! Compares a subject artifact against archive entries supplied by the
//! caller (the archive itself, its search and storage, live outside the
//! core). Produces the `historical_match` and `alteration_detection` signals
//! consumed by weighted fusion.

use crate::compare::{compare, Artifact, ComparisonResult};
use crate::error_handler::handle_error;
use crate::errors::Result;
use crate::signal::{Assessment, Finding, SignalName, SignalScore};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;

/// Entries compared per verification.
pub const MAX_COMPARED: usize = 10;
/// Matches kept in the report.
pub const MAX_REPORTED: usize = 5;
/// Entries checked against the claimed date.
pub const TIMELINE_ENTRIES: usize = 5;
/// Ten years.
pub const TIMELINE_TOLERANCE_DAYS: i64 = 3650;
pub const TIMELINE_PENALTY: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub id: String,
    pub artifact: Artifact,
    pub historical_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveMatch {
    pub entry_id: String,
    pub similarity: f64,
    pub comparison: ComparisonResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineConsistency {
    pub score: f64,
    pub inconsistencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalVerification {
    /// Best similarity among compared entries; 0.0 when nothing compared.
    pub historical_match_score: f64,
    /// Best matches, highest similarity first.
    pub matches: Vec<ArchiveMatch>,
    pub timeline: TimelineConsistency,
    /// Entries offered by the caller, compared or not.
    pub total_matches: usize,
}

impl HistoricalVerification {
    pub fn best_match(&self) -> Option<&ArchiveMatch> {
        self.matches.first()
    }

    /// Signals for fusion. Empty when no entry could be compared, so that
    /// fusion treats both as missing rather than as evidence.
    pub fn to_signals(&self) -> Vec<SignalScore> {
        let Some(best) = self.best_match() else {
            return Vec::new();
        };

        let historical = SignalScore::new(
            SignalName::HistoricalMatch,
            best.similarity,
            self.historical_match_score,
        )
        .with_consistent(self.timeline.inconsistencies.is_empty())
        .with_detail("timeline_score", self.timeline.score)
        .with_detail("compared_entries", self.matches.len() as f64)
        .with_finding(Finding::info(format!(
            "Best archive match {} (similarity {:.2})",
            best.entry_id, best.similarity
        )));
        let historical = self
            .timeline
            .inconsistencies
            .iter()
            .fold(historical, |s, note| s.with_finding(Finding::warning(note.clone())));

        let alteration_value = best.comparison.alteration_score;
        let alteration = SignalScore::new(
            SignalName::AlterationDetection,
            best.comparison.variant_score,
            alteration_value,
        )
        .with_consistent(alteration_value < 0.5)
        .with_detail("variant_score", best.comparison.variant_score);
        let alteration = if alteration_value >= 0.5 {
            alteration
                .with_assessment(Assessment::Suspicious)
                .with_finding(Finding::warning(format!(
                    "Significant differences from archive entry {}",
                    best.entry_id
                )))
        } else {
            alteration
        };

        vec![historical, alteration]
    }
}

pub fn check_timeline(
    claimed_date: Option<DateTime<Utc>>,
    entries: &[ArchiveEntry],
) -> TimelineConsistency {
    let Some(claimed) = claimed_date else {
        return TimelineConsistency {
            score: 0.5,
            inconsistencies: vec!["No date provided".to_string()],
        };
    };

    let mut score: f64 = 1.0;
    let mut inconsistencies = Vec::new();
    for entry in entries.iter().take(TIMELINE_ENTRIES) {
        if let Some(date) = entry.historical_date {
            let days = (claimed - date).num_days().abs();
            if days > TIMELINE_TOLERANCE_DAYS {
                inconsistencies.push(format!(
                    "Date far from archive entry {} ({} days apart)",
                    entry.id, days
                ));
                score -= TIMELINE_PENALTY;
            }
        }
    }

    TimelineConsistency {
        score: score.max(0.0),
        inconsistencies,
    }
}

pub fn verify_against_archive(
    subject: &Artifact,
    entries: &[ArchiveEntry],
    claimed_date: Option<DateTime<Utc>>,
) -> Result<HistoricalVerification> {
    let content_type = subject.content_type();

    // Entries of another content type have no comparator against the
    // subject; they must not reach fusion as zero-similarity evidence.
    let (same_type, other_type): (Vec<&ArchiveEntry>, Vec<&ArchiveEntry>) = entries
        .iter()
        .partition(|entry| entry.artifact.content_type() == content_type);
    if !other_type.is_empty() {
        tracing::debug!(
            skipped = other_type.len(),
            content_type = %content_type,
            "archive entries of another content type skipped"
        );
    }
    let comparable = &same_type[..same_type.len().min(MAX_COMPARED)];

    let compared: Vec<Result<ArchiveMatch>> = comparable
        .par_iter()
        .map(|entry| {
            let comparison = compare(subject, &entry.artifact, content_type)?;
            Ok(ArchiveMatch {
                entry_id: entry.id.clone(),
                similarity: comparison.score,
                comparison,
            })
        })
        .collect();

    let mut matches = Vec::with_capacity(compared.len());
    for outcome in compared {
        match outcome {
            Ok(m) => matches.push(m),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                handle_error(e.category(), "Archive comparison", e);
            }
        }
    }

    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    let historical_match_score = matches.first().map(|m| m.similarity).unwrap_or(0.0);
    matches.truncate(MAX_REPORTED);

    let timeline = check_timeline(claimed_date, entries);

    tracing::info!(
        entries = entries.len(),
        compared = comparable.len(),
        historical_match_score,
        timeline_score = timeline.score,
        "historical verification"
    );

    Ok(HistoricalVerification {
        historical_match_score,
        matches,
        timeline,
        total_matches: entries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterImage;
    use chrono::TimeZone;

    fn gray(value: u8) -> Artifact {
        Artifact::Image(RasterImage::new(16, 16, 1, vec![value; 256]).unwrap())
    }

    fn entry(id: &str, value: u8, year: Option<i32>) -> ArchiveEntry {
        ArchiveEntry {
            id: id.to_string(),
            artifact: gray(value),
            historical_date: year.and_then(|y| Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single()),
        }
    }

    fn year(y: i32) -> Option<DateTime<Utc>> {
        Utc.with_ymd_and_hms(y, 1, 1, 0, 0, 0).single()
    }

    #[test]
    fn test_best_match_wins() {
        let entries = vec![entry("far", 0, None), entry("exact", 120, None), entry("near", 110, None)];
        let result = verify_against_archive(&gray(120), &entries, None).unwrap();
        assert_eq!(result.best_match().unwrap().entry_id, "exact");
        assert!((result.historical_match_score - 1.0).abs() < 1e-12);
        assert_eq!(result.matches[1].entry_id, "near");
        assert_eq!(result.total_matches, 3);
    }

    #[test]
    fn test_compares_at_most_ten_and_reports_five() {
        let entries: Vec<_> = (0..14).map(|i| entry(&format!("e{}", i), i * 10, None)).collect();
        // the only exact match is beyond the comparison window
        let result = verify_against_archive(&gray(130), &entries, None).unwrap();
        assert_eq!(result.matches.len(), MAX_REPORTED);
        assert_eq!(result.total_matches, 14);
        assert_eq!(result.best_match().unwrap().entry_id, "e9");
        assert!(result.historical_match_score < 1.0);
    }

    #[test]
    fn test_timeline_without_date_is_neutral() {
        let timeline = check_timeline(None, &[entry("a", 0, Some(1950))]);
        assert_eq!(timeline.score, 0.5);
        assert_eq!(timeline.inconsistencies.len(), 1);
    }

    #[test]
    fn test_timeline_penalizes_distant_entries() {
        let entries = vec![
            entry("a", 0, Some(1950)),
            entry("b", 0, Some(2019)),
            entry("c", 0, None),
            entry("d", 0, Some(1960)),
        ];
        let timeline = check_timeline(year(2020), &entries);
        assert!((timeline.score - 0.8).abs() < 1e-12);
        assert_eq!(timeline.inconsistencies.len(), 2);
    }

    #[test]
    fn test_signals_from_best_match() {
        let entries = vec![entry("ref", 200, Some(2020))];
        let result = verify_against_archive(&gray(0), &entries, year(2021)).unwrap();
        let signals = result.to_signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[0].name, SignalName::HistoricalMatch);
        assert_eq!(signals[1].name, SignalName::AlterationDetection);
        assert_eq!(signals[1].normalized_score, 0.9);
        assert!(!signals[1].consistent);
    }

    fn text_entry(id: &str, body: &str) -> ArchiveEntry {
        ArchiveEntry {
            id: id.to_string(),
            artifact: Artifact::Text(body.to_string()),
            historical_date: None,
        }
    }

    #[test]
    fn test_other_content_type_is_not_evidence() {
        let entries = vec![text_entry("caption", "hello world")];
        let result = verify_against_archive(&gray(0), &entries, None).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.historical_match_score, 0.0);
        assert_eq!(result.total_matches, 1);
        assert!(result.to_signals().is_empty());
    }

    #[test]
    fn test_mixed_archive_compares_same_type_only() {
        let mut entries = vec![text_entry("caption", "hello world")];
        entries.extend((0..10).map(|i| entry(&format!("e{}", i), i * 20, None)));
        // the text entry does not use up a comparison slot
        let result = verify_against_archive(&gray(180), &entries, None).unwrap();
        assert!(result.matches.iter().all(|m| m.entry_id != "caption"));
        assert_eq!(result.best_match().unwrap().entry_id, "e9");
        assert!((result.historical_match_score - 1.0).abs() < 1e-12);
        assert_eq!(result.total_matches, 11);

        let signals = result.to_signals();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1].normalized_score, 0.1);
    }

    #[test]
    fn test_empty_archive_yields_no_signals() {
        let result = verify_against_archive(&gray(0), &[], None).unwrap();
        assert_eq!(result.historical_match_score, 0.0);
        assert!(result.to_signals().is_empty());
    }
}
