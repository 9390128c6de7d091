//! Static category weights.

use crate::models::Category;
use std::collections::BTreeMap;
use thiserror::Error;

/// Weights of a valid table always add up to this.
pub const REQUIRED_TOTAL_WEIGHT: u32 = 100;

/// Errors raised when building a table from user-supplied weights.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WeightTableError {
    #[error("unknown category in weight table: {0}")]
    UnknownCategory(String),

    #[error("weight table is missing category: {0}")]
    MissingCategory(Category),

    #[error("weights must sum to 100, got {0}")]
    BadTotal(u32),
}

/// Ordered, immutable mapping from category to weight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightTable {
    entries: Vec<(Category, u32)>,
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (Category::LawfulBasisAndPurpose, 12),
                (Category::CollectionAndMinimization, 10),
                (Category::SecondaryUseAndLimits, 8),
                (Category::RetentionAndDeletion, 8),
                (Category::ThirdPartiesAndProcessors, 12),
                (Category::CrossBorderTransfers, 8),
                (Category::UserRightsAndRedress, 14),
                (Category::SecurityAndBreach, 12),
                (Category::TransparencyAndNotice, 8),
                (Category::SensitiveChildrenAdsProfiling, 8),
            ],
        }
    }
}

impl WeightTable {
    /// Build a table from a name-to-weight mapping.
    ///
    /// Every category must be present exactly once and the weights must
    /// sum to [`REQUIRED_TOTAL_WEIGHT`]. The result is always in table
    /// order, whatever the order of the input.
    pub fn from_overrides(overrides: &BTreeMap<String, u32>) -> Result<Self, WeightTableError> {
        if let Some(unknown) = overrides.keys().find(|k| Category::parse(k).is_none()) {
            return Err(WeightTableError::UnknownCategory(unknown.clone()));
        }

        let entries = Category::ALL
            .into_iter()
            .map(|category| {
                overrides
                    .get(category.as_str())
                    .map(|&w| (category, w))
                    .ok_or(WeightTableError::MissingCategory(category))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total: u32 = entries.iter().map(|(_, w)| w).sum();
        if total != REQUIRED_TOTAL_WEIGHT {
            return Err(WeightTableError::BadTotal(total));
        }

        Ok(Self { entries })
    }

    /// Iterate `(category, weight)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, u32)> + '_ {
        self.entries.iter().copied()
    }

    /// Weight of a category, if present.
    #[allow(dead_code)] // Lookup helper, the aggregator iterates pairs
    pub fn weight(&self, category: Category) -> Option<u32> {
        self.iter().find(|(c, _)| *c == category).map(|(_, w)| w)
    }

    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
