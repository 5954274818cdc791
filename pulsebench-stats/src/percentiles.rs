//! Percentile Computation
//!
//! Percentiles are computed from raw samples, never the trimmed set. Tail
//! percentiles (p99, p999) must include outliers because they ARE the signal.

use serde::{Deserialize, Serialize};

/// Standard percentiles reported for every unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    /// 50th percentile (median).
    pub p50: f64,
    /// 75th percentile.
    pub p75: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile.
    pub p99: f64,
    /// 99.9th percentile.
    pub p999: f64,
}

/// Compute a single percentile from samples.
///
/// Uses linear interpolation between nearest ranks. Empty input yields 0.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let p = percentile / 100.0;

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

/// Compute all standard percentiles.
pub fn compute_percentiles(samples: &[f64]) -> Percentiles {
    Percentiles {
        p50: compute_percentile(samples, 50.0),
        p75: compute_percentile(samples, 75.0),
        p90: compute_percentile(samples, 90.0),
        p95: compute_percentile(samples, 95.0),
        p99: compute_percentile(samples, 99.0),
        p999: compute_percentile(samples, 99.9),
    }
}
