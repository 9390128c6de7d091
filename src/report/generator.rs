//! JSON report generation.
//!
//! Wraps the aggregate report in a status envelope so downstream tooling
//! can tell a scored policy from a pipeline failure without inspecting
//! the numbers.

use crate::analysis::aggregate;
use crate::cli::ReportLevel;
use crate::intake::Intake;
use crate::models::{AggregateReport, ChunkResult, RankedCategory};
use crate::scoring::WeightTable;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Envelope status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Why no report could be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The input contained no entries at all.
    NoChunks,
    /// No entry was a usable chunk result.
    NoValidScores,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoChunks => write!(f, "no_chunks"),
            FailureReason::NoValidScores => write!(f, "no_valid_scores"),
        }
    }
}

/// Headline numbers of a report, used by the `summary` level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub overall_score: f64,
    pub confidence: f64,
    pub top_strengths: Vec<RankedCategory>,
    pub top_risks: Vec<RankedCategory>,
    pub red_flags_count: usize,
}

impl From<&AggregateReport> for ReportSummary {
    fn from(report: &AggregateReport) -> Self {
        Self {
            overall_score: report.overall_score,
            confidence: report.confidence,
            top_strengths: report.top_strengths.clone(),
            top_risks: report.top_risks.clone(),
            red_flags_count: report.red_flags.len(),
        }
    }
}

/// Report fields, shaped by the requested level.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportBody {
    Summary(ReportSummary),
    Detailed(AggregateReport),
}

impl ReportBody {
    /// Headline numbers, whatever the level.
    pub fn summary(&self) -> ReportSummary {
        match self {
            ReportBody::Summary(summary) => summary.clone(),
            ReportBody::Detailed(report) => ReportSummary::from(report),
        }
    }
}

/// The `chunks` field: an entry count, or the accepted results at the
/// `full` level.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Chunks {
    Count(usize),
    Results(Vec<ChunkResult>),
}

/// A successfully scored policy.
#[derive(Debug, Clone, Serialize)]
pub struct AuditSuccess {
    pub status: Status,
    /// Where the chunk results came from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// Entries found in the input, or the accepted results themselves.
    pub chunks: Chunks,
    /// Entries accepted as chunk results.
    pub valid_chunks: usize,
    #[serde(flatten)]
    pub body: ReportBody,
}

/// A pipeline failure.
#[derive(Debug, Clone, Serialize)]
pub struct AuditFailure {
    pub status: Status,
    pub reason: FailureReason,
    pub source: String,
}

/// The document written by `aggregate`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AuditOutput {
    Success(AuditSuccess),
    Failure(AuditFailure),
}

impl AuditOutput {
    /// Aggregate an intake into an output document at the given level.
    pub fn build(
        source: &str,
        intake: &Intake,
        weights: &WeightTable,
        level: ReportLevel,
    ) -> Self {
        let failure = |reason| {
            AuditOutput::Failure(AuditFailure {
                status: Status::Error,
                reason,
                source: source.to_string(),
            })
        };

        if intake.entries == 0 {
            return failure(FailureReason::NoChunks);
        }
        if intake.results.is_empty() {
            return failure(FailureReason::NoValidScores);
        }

        let report = aggregate(&intake.results, weights);
        let (chunks, body) = match level {
            ReportLevel::Summary => (
                Chunks::Count(intake.entries),
                ReportBody::Summary(ReportSummary::from(&report)),
            ),
            ReportLevel::Detailed => (Chunks::Count(intake.entries), ReportBody::Detailed(report)),
            ReportLevel::Full => (
                Chunks::Results(intake.results.clone()),
                ReportBody::Detailed(report),
            ),
        };

        AuditOutput::Success(AuditSuccess {
            status: Status::Ok,
            source: source.to_string(),
            generated_at: Utc::now(),
            chunks,
            valid_chunks: intake.results.len(),
            body,
        })
    }

    /// Headline numbers, if a report was produced.
    pub fn summary(&self) -> Option<ReportSummary> {
        match self {
            AuditOutput::Success(success) => Some(success.body.summary()),
            AuditOutput::Failure(_) => None,
        }
    }
}

/// Generate a JSON report.
pub fn generate_json_report(output: &AuditOutput) -> Result<String> {
    serde_json::to_string_pretty(output).map_err(Into::into)
}

/// Generate a short human-readable summary of the output.
pub fn generate_summary_text(output: &AuditOutput) -> String {
    let (success, summary) = match output {
        AuditOutput::Success(success) => (success, success.body.summary()),
        AuditOutput::Failure(failure) => {
            return format!("No report for {}: {}", failure.source, failure.reason);
        }
    };

    let mut lines = Vec::new();

    lines.push(format!("Overall score: {:.2}/100", summary.overall_score));
    lines.push(format!(
        "Confidence: {:.2} ({} chunks usable)",
        summary.confidence, success.valid_chunks
    ));

    let ranked = |items: &[RankedCategory]| {
        items
            .iter()
            .map(|(category, score)| format!("{} ({:.2})", category, score))
            .collect::<Vec<_>>()
            .join(", ")
    };
    lines.push(format!("Strengths: {}", ranked(&summary.top_strengths)));
    lines.push(format!("Risks: {}", ranked(&summary.top_risks)));
    lines.push(format!("Red flags: {}", summary.red_flags_count));

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::load_chunk_results;
    use serde_json::{json, Value};

    fn intake_from(value: Value) -> Intake {
        load_chunk_results(&value.to_string()).unwrap()
    }

    fn sample_intake() -> Intake {
        intake_from(json!([
            {"scores": {"security_and_breach": 8}, "red_flags": ["vague retention", "ads"]},
            {"notes": ["skipped"]}
        ]))
    }

    fn render(output: &AuditOutput) -> Value {
        serde_json::from_str(&generate_json_report(output).unwrap()).unwrap()
    }

    #[test]
    fn test_detailed_envelope() {
        let output = AuditOutput::build(
            "results.json",
            &sample_intake(),
            &WeightTable::default(),
            ReportLevel::Detailed,
        );
        let json = render(&output);

        assert_eq!(json["status"], "ok");
        assert_eq!(json["source"], "results.json");
        assert_eq!(json["chunks"], 2);
        assert_eq!(json["valid_chunks"], 1);
        assert_eq!(json["confidence"], 0.1);
        assert_eq!(json["red_flags"], json!(["ads", "vague retention"]));
        assert!(json["generated_at"].is_string());
        assert!(json["category_scores"].is_object());
        assert!(json.get("red_flags_count").is_none());
        assert!(output.summary().is_some());
    }

    #[test]
    fn test_summary_envelope() {
        let output = AuditOutput::build(
            "results.json",
            &sample_intake(),
            &WeightTable::default(),
            ReportLevel::Summary,
        );
        let json = render(&output);

        assert_eq!(json["status"], "ok");
        assert_eq!(json["chunks"], 2);
        assert_eq!(json["valid_chunks"], 1);
        assert_eq!(json["red_flags_count"], 2);
        assert_eq!(json["top_strengths"][0], json!(["security_and_breach", 8.0]));
        assert!(json["overall_score"].is_number());
        assert!(json.get("category_scores").is_none());
        assert!(json.get("red_flags").is_none());
        assert!(json.get("recommendations").is_none());
    }

    #[test]
    fn test_full_envelope_lists_accepted_chunks() {
        let output = AuditOutput::build(
            "results.json",
            &sample_intake(),
            &WeightTable::default(),
            ReportLevel::Full,
        );
        let json = render(&output);

        assert_eq!(json["valid_chunks"], 1);
        assert!(json["category_scores"].is_object());
        let chunks = json["chunks"].as_array().unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0]["index"], 1);
        assert_eq!(chunks[0]["scores"]["security_and_breach"], 8);
    }

    #[test]
    fn test_levels_share_headline_numbers() {
        let intake = sample_intake();
        let weights = WeightTable::default();
        let summary = AuditOutput::build("r", &intake, &weights, ReportLevel::Summary).summary();
        let detailed = AuditOutput::build("r", &intake, &weights, ReportLevel::Detailed).summary();
        let full = AuditOutput::build("r", &intake, &weights, ReportLevel::Full).summary();

        assert!(summary.is_some());
        assert_eq!(summary, detailed);
        assert_eq!(detailed, full);
    }

    #[test]
    fn test_no_chunks_envelope() {
        let output = AuditOutput::build(
            "empty.jsonl",
            &Intake::default(),
            &WeightTable::default(),
            ReportLevel::Full,
        );

        assert_eq!(
            render(&output),
            json!({"status": "error", "reason": "no_chunks", "source": "empty.jsonl"})
        );
        assert!(output.summary().is_none());
    }

    #[test]
    fn test_no_valid_scores_envelope() {
        let intake = intake_from(json!([{"notes": ["a"]}, "not json"]));
        let output =
            AuditOutput::build("bad.json", &intake, &WeightTable::default(), ReportLevel::Summary);
        let json = render(&output);

        assert_eq!(json["status"], "error");
        assert_eq!(json["reason"], "no_valid_scores");
    }

    #[test]
    fn test_summary_text() {
        let intake = intake_from(json!([
            {"scores": {"user_rights_and_redress": 9, "cross_border_transfers": 2}}
        ]));
        let output =
            AuditOutput::build("r.json", &intake, &WeightTable::default(), ReportLevel::Detailed);
        let text = generate_summary_text(&output);

        assert!(text.contains("Overall score:"));
        assert!(text.contains("Confidence: 0.20 (1 chunks usable)"));
        assert!(text.contains("Strengths: user_rights_and_redress (9.00)"));
        assert!(text.contains("Red flags: 0"));
    }

    #[test]
    fn test_summary_text_for_failure() {
        let output = AuditOutput::build(
            "x.json",
            &Intake::default(),
            &WeightTable::default(),
            ReportLevel::Detailed,
        );
        assert_eq!(generate_summary_text(&output), "No report for x.json: no_chunks");
    }
}
