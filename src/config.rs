//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.policyaudit.toml` files.

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};
use crate::cli::{Args, Command};
use crate::prompts::DEFAULT_MAX_EXCERPT_CHARS;
use crate::scoring::WeightTable;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".policyaudit.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chunking settings.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Scoring settings.
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters carried over between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Cap on chunks; the tail is merged into the last one.
    #[serde(default = "default_max_chunks")]
    pub max_chunks: usize,

    /// Maximum excerpt length placed in each prompt.
    #[serde(default = "default_max_excerpt_chars")]
    pub max_excerpt_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_chunks: default_max_chunks(),
            max_excerpt_chars: default_max_excerpt_chars(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_max_chunks() -> usize {
    DEFAULT_MAX_CHUNKS
}

fn default_max_excerpt_chars() -> usize {
    DEFAULT_MAX_EXCERPT_CHARS
}

/// Scoring settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Fail (exit code 2) when confidence is below this value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,

    /// Category weight overrides; must name every category and sum to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<BTreeMap<String, u32>>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(DEFAULT_CONFIG_FILE);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &Args) {
        match &args.command {
            Some(Command::Chunk(chunk)) => {
                if let Some(size) = chunk.chunk_size {
                    self.chunking.chunk_size = size;
                }
                if let Some(overlap) = chunk.chunk_overlap {
                    self.chunking.chunk_overlap = overlap;
                }
                if let Some(max) = chunk.max_chunks {
                    self.chunking.max_chunks = max;
                }
                if let Some(max) = chunk.max_excerpt_chars {
                    self.chunking.max_excerpt_chars = max;
                }
            }
            Some(Command::Aggregate(aggregate)) => {
                if aggregate.min_confidence.is_some() {
                    self.scoring.min_confidence = aggregate.min_confidence;
                }
            }
            None => {}
        }
    }

    /// Check values that deserialization alone cannot constrain.
    pub fn validate(&self) -> Result<()> {
        if let Some(min) = self.scoring.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                bail!(
                    "Invalid [scoring] min_confidence {}: must be between 0.0 and 1.0",
                    min
                );
            }
        }
        Ok(())
    }

    /// Resolve the weight table: overrides if configured, defaults otherwise.
    pub fn weight_table(&self) -> Result<WeightTable> {
        match &self.scoring.weights {
            Some(overrides) => WeightTable::from_overrides(overrides)
                .context("Invalid [scoring.weights] in configuration"),
            None => Ok(WeightTable::default()),
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let mut config = Config::default();
        config.scoring.weights = Some(
            WeightTable::default()
                .iter()
                .map(|(category, weight)| (category.as_str().to_string(), weight))
                .collect(),
        );
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunking.chunk_size, 3500);
        assert_eq!(config.chunking.chunk_overlap, 350);
        assert_eq!(config.chunking.max_chunks, 30);
        assert_eq!(config.chunking.max_excerpt_chars, 6000);
        assert!(config.scoring.min_confidence.is_none());
        assert_eq!(config.weight_table().unwrap(), WeightTable::default());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[chunking]
chunk_size = 2000
max_chunks = 10

[scoring]
min_confidence = 0.6
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.chunking.chunk_size, 2000);
        assert_eq!(config.chunking.chunk_overlap, 350);
        assert_eq!(config.chunking.max_chunks, 10);
        assert_eq!(config.scoring.min_confidence, Some(0.6));
    }

    #[test]
    fn test_validate_min_confidence_range() {
        let config: Config = toml::from_str("[scoring]\nmin_confidence = 5.0\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("min_confidence"));

        let config: Config = toml::from_str("[scoring]\nmin_confidence = -0.1\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[scoring]\nmin_confidence = 1.0\n").unwrap();
        assert!(config.validate().is_ok());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_weight_overrides() {
        let toml_content = r#"
[scoring.weights]
lawful_basis_and_purpose = 10
collection_and_minimization = 10
secondary_use_and_limits = 10
retention_and_deletion = 10
third_parties_and_processors = 10
cross_border_transfers = 10
user_rights_and_redress = 10
security_and_breach = 10
transparency_and_notice = 10
sensitive_children_ads_profiling = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        let table = config.weight_table().unwrap();
        assert_eq!(table.weight(Category::UserRightsAndRedress), Some(10));
        assert_eq!(table.total_weight(), 100);
    }

    #[test]
    fn test_invalid_weight_overrides() {
        let toml_content = r#"
[scoring.weights]
security_and_breach = 100
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.weight_table().is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[chunking]"));
        assert!(toml_str.contains("[scoring.weights]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.weight_table().unwrap(), WeightTable::default());
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(DEFAULT_CONFIG_FILE),
            "[chunking]\nchunk_overlap = 0\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.chunking.chunk_overlap, 0);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "[chunking\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
