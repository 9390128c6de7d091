//! Category weighting.
//!
//! The weight table is built once at startup and passed explicitly to
//! the aggregator.

pub mod weights;

pub use weights::WeightTable;
