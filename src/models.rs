//! Data models for the policy auditor.
//!
//! This module contains the category identifiers, the loosely-typed
//! per-chunk results produced by the scoring model, and the aggregate
//! report built from them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A compliance-relevant scoring category.
///
/// Declaration order is the category table order; it drives tie-breaks
/// when ranking strengths and risks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    LawfulBasisAndPurpose,
    CollectionAndMinimization,
    SecondaryUseAndLimits,
    RetentionAndDeletion,
    ThirdPartiesAndProcessors,
    CrossBorderTransfers,
    UserRightsAndRedress,
    SecurityAndBreach,
    TransparencyAndNotice,
    SensitiveChildrenAdsProfiling,
}

impl Category {
    /// All categories, in table order.
    pub const ALL: [Category; 10] = [
        Category::LawfulBasisAndPurpose,
        Category::CollectionAndMinimization,
        Category::SecondaryUseAndLimits,
        Category::RetentionAndDeletion,
        Category::ThirdPartiesAndProcessors,
        Category::CrossBorderTransfers,
        Category::UserRightsAndRedress,
        Category::SecurityAndBreach,
        Category::TransparencyAndNotice,
        Category::SensitiveChildrenAdsProfiling,
    ];

    /// The wire name used in model output and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::LawfulBasisAndPurpose => "lawful_basis_and_purpose",
            Category::CollectionAndMinimization => "collection_and_minimization",
            Category::SecondaryUseAndLimits => "secondary_use_and_limits",
            Category::RetentionAndDeletion => "retention_and_deletion",
            Category::ThirdPartiesAndProcessors => "third_parties_and_processors",
            Category::CrossBorderTransfers => "cross_border_transfers",
            Category::UserRightsAndRedress => "user_rights_and_redress",
            Category::SecurityAndBreach => "security_and_breach",
            Category::TransparencyAndNotice => "transparency_and_notice",
            Category::SensitiveChildrenAdsProfiling => "sensitive_children_ads_profiling",
        }
    }

    /// Look up a category by its wire name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Highest valid per-category score.
pub const MAX_CATEGORY_SCORE: u64 = 10;

/// One chunk's judgment as returned by the scoring model.
///
/// The model output is untrusted: any field may be missing or have the
/// wrong shape. Accessors return only well-formed values and never fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkResult(Value);

impl ChunkResult {
    /// Wrap a parsed JSON value.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value.
    #[allow(dead_code)] // Raw access for inspection
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Whether the value is an object carrying a `scores` key.
    pub fn has_scores(&self) -> bool {
        self.0.get("scores").is_some()
    }

    /// The category score, if it is an integer in `0..=10`.
    ///
    /// Strings, floats, booleans and out-of-range integers are rejected,
    /// not coerced or clamped.
    pub fn score(&self, category: Category) -> Option<u8> {
        let value = self.0.get("scores")?.get(category.as_str())?;
        let n = value.as_u64()?;
        (n <= MAX_CATEGORY_SCORE).then_some(n as u8)
    }

    /// Whether a score entry exists for the category, valid or not.
    pub fn has_score_entry(&self, category: Category) -> bool {
        self.0
            .get("scores")
            .and_then(|s| s.get(category.as_str()))
            .is_some()
    }

    /// The category rationale, if it is a non-empty string.
    pub fn rationale(&self, category: Category) -> Option<&str> {
        self.0
            .get("rationales")?
            .get(category.as_str())?
            .as_str()
            .filter(|r| !r.is_empty())
    }

    /// String entries of the `red_flags` array.
    pub fn red_flags(&self) -> impl Iterator<Item = &str> {
        self.strings("red_flags")
    }

    /// String entries of the `notes` array.
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.strings("notes")
    }

    /// Record the chunk's 1-based position. No-op for non-objects.
    pub fn set_index(&mut self, index: usize) {
        if let Value::Object(map) = &mut self.0 {
            map.insert("index".to_string(), Value::from(index));
        }
    }

    fn strings(&self, key: &str) -> impl Iterator<Item = &str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

impl From<Value> for ChunkResult {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Aggregated detail for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    /// Mean of the valid scores (0-10, two decimals), or 0.0 when uncovered.
    pub score: f64,
    /// Static weight from the category table.
    pub weight: u32,
    /// First non-empty rationale seen, in input order.
    pub rationale: String,
}

/// A `(category, score)` pair, serialized as a two-element array.
pub type RankedCategory = (Category, f64);

/// The weighted report built from all chunk results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Weighted score in `[0, 100]`.
    pub overall_score: f64,
    /// Fraction of categories with at least one valid score.
    pub confidence: f64,
    /// Per-category detail, in table order.
    pub category_scores: BTreeMap<Category, CategoryScore>,
    /// Up to three highest-scoring categories.
    pub top_strengths: Vec<RankedCategory>,
    /// Up to three lowest-scoring categories.
    pub top_risks: Vec<RankedCategory>,
    /// Sorted, deduplicated red flags.
    pub red_flags: Vec<String>,
    /// First notes collected, in input order.
    pub recommendations: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
            let encoded = serde_json::to_string(&category).unwrap();
            assert_eq!(encoded, format!("\"{}\"", category.as_str()));
        }
        assert_eq!(Category::parse("unknown"), None);
    }

    #[test]
    fn test_category_order_matches_table() {
        let mut sorted = Category::ALL;
        sorted.sort();
        assert_eq!(sorted, Category::ALL);
    }

    #[test]
    fn test_chunk_score_accepts_only_integers_in_range() {
        let chunk = ChunkResult::new(json!({
            "scores": {
                "lawful_basis_and_purpose": 0,
                "collection_and_minimization": 10,
                "secondary_use_and_limits": "9",
                "retention_and_deletion": 11,
                "third_parties_and_processors": -1,
                "cross_border_transfers": 7.0,
                "user_rights_and_redress": true,
                "security_and_breach": null
            }
        }));

        assert_eq!(chunk.score(Category::LawfulBasisAndPurpose), Some(0));
        assert_eq!(chunk.score(Category::CollectionAndMinimization), Some(10));
        assert_eq!(chunk.score(Category::SecondaryUseAndLimits), None);
        assert_eq!(chunk.score(Category::RetentionAndDeletion), None);
        assert_eq!(chunk.score(Category::ThirdPartiesAndProcessors), None);
        assert_eq!(chunk.score(Category::CrossBorderTransfers), None);
        assert_eq!(chunk.score(Category::UserRightsAndRedress), None);
        assert_eq!(chunk.score(Category::SecurityAndBreach), None);
        assert_eq!(chunk.score(Category::TransparencyAndNotice), None);
        assert!(chunk.has_score_entry(Category::SecurityAndBreach));
        assert!(!chunk.has_score_entry(Category::TransparencyAndNotice));
    }

    #[test]
    fn test_chunk_tolerates_wrong_shapes() {
        let chunk = ChunkResult::new(json!({
            "scores": [1, 2, 3],
            "rationales": "not a map",
            "red_flags": "not a list",
            "notes": ["kept", 3, null, "also kept"]
        }));

        assert_eq!(chunk.score(Category::LawfulBasisAndPurpose), None);
        assert_eq!(chunk.rationale(Category::LawfulBasisAndPurpose), None);
        assert_eq!(chunk.red_flags().count(), 0);
        assert_eq!(chunk.notes().collect::<Vec<_>>(), vec!["kept", "also kept"]);

        let scalar = ChunkResult::new(json!(42));
        assert_eq!(scalar.score(Category::SecurityAndBreach), None);
        assert_eq!(scalar.notes().count(), 0);
    }

    #[test]
    fn test_chunk_rationale_skips_empty() {
        let chunk = ChunkResult::new(json!({
            "rationales": {
                "security_and_breach": "",
                "transparency_and_notice": "clear"
            }
        }));
        assert_eq!(chunk.rationale(Category::SecurityAndBreach), None);
        assert_eq!(chunk.rationale(Category::TransparencyAndNotice), Some("clear"));
    }

    #[test]
    fn test_set_index() {
        let mut chunk = ChunkResult::new(json!({"scores": {}}));
        chunk.set_index(3);
        assert_eq!(chunk.as_value()["index"], json!(3));

        let mut scalar = ChunkResult::new(json!("raw"));
        scalar.set_index(1);
        assert_eq!(scalar.as_value(), &json!("raw"));
    }
}
