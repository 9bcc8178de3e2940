//! Report rendering: styled terminal text or pretty JSON.

use console::style;
use forensic_core::{
    BatchReport, BatchResult, ComparisonResult, CredibilityAssessment, Severity, Verdict,
};
use serde::Serialize;
use serde_json::json;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

fn styled_verdict(verdict: Verdict) -> String {
    let text = verdict.as_str();
    match verdict {
        Verdict::Authentic => style(text).green().bold().to_string(),
        Verdict::Suspicious => style(text).yellow().bold().to_string(),
        Verdict::LikelyManipulated => style(text).red().bold().to_string(),
    }
}

fn score_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 100.0) / 5.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(20 - filled))
}

pub fn render_assessment(path: &Path, assessment: &CredibilityAssessment) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🔍 Forensic Analysis Report");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "📁 File:        {}", path.display());
    let _ = writeln!(out, "⚖️  Verdict:     {}", styled_verdict(assessment.verdict));
    let _ = writeln!(
        out,
        "📊 Credibility: {:>5.1}  {}",
        assessment.final_score,
        score_bar(assessment.final_score)
    );
    let _ = writeln!(out, "🚩 Suspicion:   {:>5.1}", assessment.suspicion_score);
    let _ = writeln!(out, "🎯 Confidence:  {:>5.1}", assessment.confidence);
    let _ = writeln!(out, "🧮 Policy:      {}", assessment.policy);
    let _ = writeln!(out, "   {}", style(&assessment.explanation).dim());

    let _ = writeln!(out, "\n📈 Signals");
    let _ = writeln!(out, "{}", RULE);
    for (name, row) in &assessment.breakdown {
        let value = match row.score {
            Some(score) => format!("{:>7.3}", score),
            None => format!("{:>7}", "-"),
        };
        let note = row
            .note
            .as_deref()
            .map(|n| format!("  {}", style(n).dim()))
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "   {:<22} {}  weight {:.2}  → {:>6.2}{}",
            name.as_str(),
            value,
            row.weight,
            row.weighted_contribution,
            note
        );
    }

    if !assessment.findings.is_empty() {
        let _ = writeln!(out, "\n📋 Findings");
        let _ = writeln!(out, "{}", RULE);
        for finding in &assessment.findings {
            let marker = match finding.severity {
                Severity::Warning => style("⚠").yellow().to_string(),
                Severity::Info => style("•").cyan().to_string(),
            };
            let _ = writeln!(out, "   {} {}", marker, finding.message);
        }
    }
    out
}

pub fn render_comparison(a: &Path, b: &Path, result: &ComparisonResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n🔬 Comparison");
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "   A: {}", a.display());
    let _ = writeln!(out, "   B: {}", b.display());
    let _ = writeln!(out, "   Similarity:  {:.4}", result.score);
    if let Some(ssim) = result.ssim_score {
        let _ = writeln!(out, "   SSIM:        {:.4}", ssim);
    }
    let _ = writeln!(out, "   Variant:     {:.2}", result.variant_score);
    let _ = writeln!(out, "   Alteration:  {:.2}", result.alteration_score);
    if let Some(note) = &result.note {
        let _ = writeln!(out, "   {}", style(note).yellow());
    }
    out
}

pub fn render_batch_counts(counts: &BatchResult, paths: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "   📁 Processed:    {:>8}", counts.total);
    let _ = writeln!(out, "   ✅ Analyzed:     {:>8}", counts.succeeded);
    let _ = writeln!(out, "   ❌ Failed:       {:>8}", counts.failed);
    let _ = writeln!(out, "   ⏭️  Skipped:      {:>8}", counts.skipped);
    let _ = writeln!(out, "   📈 Success rate: {:>7.1}%", counts.success_rate());
    if !counts.errors.is_empty() {
        let _ = writeln!(out, "\n❌ Errors encountered:");
        for error in &counts.errors {
            let label = paths
                .get(error.index)
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| format!("#{}", error.index));
            let _ = writeln!(out, "   {} {}: {}", style("✗").red(), label, error.message);
        }
    }
    out
}

pub fn render_batch(report: &BatchReport, paths: &[PathBuf], elapsed: Duration) -> String {
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "\n📊 Batch Summary");
    let _ = writeln!(out, "{}", RULE);
    for frame in &report.frames {
        let label = paths
            .get(frame.index)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("#{}", frame.index));
        let _ = writeln!(
            out,
            "   {:<32} {:>5.1}  {}",
            label,
            frame.assessment.final_score,
            styled_verdict(frame.assessment.verdict)
        );
    }
    let _ = writeln!(out, "{}", RULE);
    out.push_str(&render_batch_counts(&summary.counts, paths));
    let _ = writeln!(out, "   📊 Mean credibility: {:.1}", summary.mean_final_score);
    let _ = writeln!(out, "   🚩 Mean suspicion:   {:.1}", summary.mean_suspicion_score);
    if let Some(worst) = summary.worst_verdict {
        let _ = writeln!(out, "   ⚖️  Worst verdict:    {}", styled_verdict(worst));
    }
    let _ = writeln!(out, "   ⏱️  Total time:       {}", format_duration(elapsed));

    let warnings: Vec<_> = summary.findings.iter().filter(|f| f.is_warning()).collect();
    if !warnings.is_empty() {
        let _ = writeln!(out, "\n📋 Findings across frames");
        for finding in warnings {
            let _ = writeln!(out, "   {} {}", style("⚠").yellow(), finding.message);
        }
    }
    out
}

#[derive(Serialize)]
struct FileAssessment<'a> {
    file: String,
    #[serde(flatten)]
    assessment: &'a CredibilityAssessment,
}

pub fn assessment_json(path: &Path, assessment: &CredibilityAssessment) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&FileAssessment {
        file: path.display().to_string(),
        assessment,
    })
}

pub fn batch_json(report: &BatchReport, paths: &[PathBuf]) -> serde_json::Result<String> {
    let frames: Vec<_> = report
        .frames
        .iter()
        .map(|f| {
            json!({
                "file": paths.get(f.index).map(|p| p.display().to_string()),
                "assessment": f.assessment,
            })
        })
        .collect();
    serde_json::to_string_pretty(&json!({
        "summary": report.summary,
        "frames": frames,
    }))
}
