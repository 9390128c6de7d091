//! Analysis modules.
//!
//! Aggregation of per-chunk judgments into the final weighted report.

pub mod aggregator;

pub use aggregator::*;
