//! Chunk aggregation and scoring.
//!
//! This module turns per-chunk model judgments into one weighted report.
//! It is a pure function of its input: no I/O, no shared state, and no
//! error path. Malformed fields are dropped where they are found.

use crate::models::{AggregateReport, Category, CategoryScore, ChunkResult, RankedCategory};
use crate::scoring::WeightTable;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Number of categories listed in each of strengths and risks.
pub const TOP_CATEGORIES: usize = 3;

/// Maximum number of recommendations carried into the report.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// Per-category evidence collected across chunks.
#[derive(Debug, Default)]
struct CategoryEvidence<'a> {
    scores: Vec<f64>,
    rationales: Vec<&'a str>,
}

/// Aggregate chunk results into a single weighted report.
///
/// Chunk order matters for rationale selection and recommendation
/// truncation only.
pub fn aggregate(chunks: &[ChunkResult], weights: &WeightTable) -> AggregateReport {
    let mut evidence: BTreeMap<Category, CategoryEvidence> = weights
        .iter()
        .map(|(category, _)| (category, CategoryEvidence::default()))
        .collect();
    let mut red_flags: BTreeSet<String> = BTreeSet::new();
    let mut notes: Vec<&str> = Vec::new();
    let mut dropped = 0usize;

    for chunk in chunks {
        for (category, entry) in evidence.iter_mut() {
            match chunk.score(*category) {
                Some(v) => entry.scores.push(f64::from(v)),
                None if chunk.has_score_entry(*category) => dropped += 1,
                None => {}
            }
            if let Some(r) = chunk.rationale(*category) {
                entry.rationales.push(r);
            }
        }
        red_flags.extend(chunk.red_flags().map(str::to_string));
        notes.extend(chunk.notes());
    }

    if dropped > 0 {
        debug!("Dropped {} malformed or out-of-range score entries", dropped);
    }

    let mut category_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut covered = 0usize;

    for (category, weight) in weights.iter() {
        let entry = &evidence[&category];
        if !entry.scores.is_empty() {
            covered += 1;
        }

        let score = round2(mean(&entry.scores));
        weighted_sum += (score / 10.0) * f64::from(weight);

        category_scores.insert(
            category,
            CategoryScore {
                score,
                weight,
                rationale: entry.rationales.first().copied().unwrap_or_default().to_string(),
            },
        );
    }

    let total_weight = weights.total_weight();
    let overall_score = if total_weight > 0 {
        round2((weighted_sum / f64::from(total_weight)) * 100.0)
    } else {
        0.0
    };
    let confidence = if !weights.is_empty() {
        round2(covered as f64 / weights.len() as f64)
    } else {
        0.0
    };

    debug!(
        "Aggregated {} chunks: {}/{} categories covered",
        chunks.len(),
        covered,
        weights.len()
    );

    let ranked: Vec<RankedCategory> = weights
        .iter()
        .map(|(category, _)| (category, category_scores[&category].score))
        .collect();

    AggregateReport {
        overall_score,
        confidence,
        category_scores,
        top_strengths: top_strengths(&ranked, TOP_CATEGORIES),
        top_risks: top_risks(&ranked, TOP_CATEGORIES),
        red_flags: red_flags.into_iter().collect(),
        recommendations: notes
            .into_iter()
            .take(MAX_RECOMMENDATIONS)
            .map(str::to_string)
            .collect(),
    }
}

/// Highest-scoring categories; equal scores keep table order.
pub fn top_strengths(ranked: &[RankedCategory], n: usize) -> Vec<RankedCategory> {
    let mut sorted = ranked.to_vec();
    sorted.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

/// Lowest-scoring categories; equal scores keep table order.
pub fn top_risks(ranked: &[RankedCategory], n: usize) -> Vec<RankedCategory> {
    let mut sorted = ranked.to_vec();
    sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    sorted.truncate(n);
    sorted
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Round to two decimal places. Exact halves go to the even neighbour.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
