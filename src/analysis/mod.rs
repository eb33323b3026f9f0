//! Analysis modules.
//!
//! Reduction of benchmark trial sets into per-concurrency summaries.

pub mod aggregator;

pub use aggregator::*;
