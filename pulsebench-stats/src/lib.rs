#![warn(missing_docs)]
//! Pulsebench Statistical Aggregator
//!
//! Turns raw per-launch sample sets into descriptive statistics:
//! - Trimmed mean and standard deviation (trim policy from the run config)
//! - Min, max, and tail percentiles always computed from the untrimmed set
//! - Cross-launch combination via field-wise median

mod aggregate;
mod percentiles;
mod trim;

pub use aggregate::{AggregateResult, StatsError, aggregate, combine_launches};
pub use percentiles::{Percentiles, compute_percentile, compute_percentiles};
pub use trim::{TrimOutcome, apply_trim};
