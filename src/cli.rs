//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// PolicyAudit - weighted privacy-policy scoring
///
/// Splits a privacy policy into chunks with scoring prompts for an
/// external model runner, then aggregates the per-chunk JSON judgments
/// into one weighted report.
///
/// Examples:
///   policyaudit chunk policy.txt --output requests.jsonl
///   policyaudit aggregate results.jsonl --output report.json
///   policyaudit aggregate results.json --min-confidence 0.8
///   policyaudit aggregate results.jsonl --report full
///   policyaudit --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .policyaudit.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true, env = "POLICYAUDIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output file path (stdout when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .policyaudit.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split a policy text file into scoring requests (JSON Lines)
    Chunk(ChunkArgs),
    /// Aggregate per-chunk results into a weighted report
    Aggregate(AggregateArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ChunkArgs {
    /// Plain-text policy file
    #[arg(value_name = "TEXT_FILE")]
    pub input: PathBuf,

    /// Maximum chunk length in characters
    #[arg(long, value_name = "CHARS")]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    #[arg(long, value_name = "CHARS")]
    pub chunk_overlap: Option<usize>,

    /// Hard cap on chunks (tail chunks are merged)
    #[arg(long, value_name = "COUNT")]
    pub max_chunks: Option<usize>,

    /// Maximum excerpt length placed in each prompt
    #[arg(long, value_name = "CHARS")]
    pub max_excerpt_chars: Option<usize>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AggregateArgs {
    /// Chunk results as a JSON array or JSON Lines
    ///
    /// Entries may be result objects or raw model responses (strings).
    #[arg(value_name = "RESULTS_FILE")]
    pub input: PathBuf,

    /// Fail if confidence is below this value (0.0 - 1.0)
    ///
    /// Useful for CI pipelines. Exit code 2 when the threshold is not met.
    #[arg(long, value_name = "RATIO")]
    pub min_confidence: Option<f64>,

    /// Report detail level (summary, detailed, full)
    #[arg(long, default_value = "detailed", value_name = "LEVEL")]
    pub report: ReportLevel,
}

/// How much of the aggregate goes into the report document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportLevel {
    /// Headline numbers and a red-flag count
    Summary,
    /// The whole aggregate (default)
    #[default]
    Detailed,
    /// The whole aggregate plus every accepted chunk result
    Full,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match &self.command {
            None => Err("A subcommand is required (chunk or aggregate)".to_string()),
            Some(Command::Chunk(chunk)) => chunk.validate(),
            Some(Command::Aggregate(aggregate)) => aggregate.validate(),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl ChunkArgs {
    fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)?;

        if self.chunk_size == Some(0) {
            return Err("Chunk size must be at least 1".to_string());
        }
        if self.max_chunks == Some(0) {
            return Err("Max chunks must be at least 1".to_string());
        }
        if self.max_excerpt_chars == Some(0) {
            return Err("Max excerpt chars must be at least 1".to_string());
        }
        if let (Some(size), Some(overlap)) = (self.chunk_size, self.chunk_overlap) {
            if overlap > size {
                return Err(format!(
                    "Chunk overlap ({}) cannot exceed chunk size ({})",
                    overlap, size
                ));
            }
        }

        Ok(())
    }
}

impl AggregateArgs {
    fn validate(&self) -> Result<(), String> {
        validate_input(&self.input)?;

        if let Some(min) = self.min_confidence {
            if !(0.0..=1.0).contains(&min) {
                return Err("Min confidence must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(())
    }
}

fn validate_input(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Err(format!("Input file does not exist: {}", path.display()));
    }
    if !path.is_file() {
        return Err(format!("Input path is not a file: {}", path.display()));
    }
    Ok(())
}
