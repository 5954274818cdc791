//! Outlier Trimming
//!
//! Applies the configured trim policy before central-tendency computation.
//! Trimming only ever feeds the mean and standard deviation; extremes and
//! percentiles are always taken from the full set.

use pulsebench_core::TrimPolicy;

/// Result of applying a trim policy to a sorted sample set.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimOutcome {
    /// Samples surviving the trim, still sorted ascending.
    pub kept: Vec<f64>,
    /// Number of samples removed (both tails combined).
    pub trimmed_count: usize,
}

/// Apply `policy` to `samples`.
///
/// `TrimPolicy::Percentile { fraction }` drops `floor(n * fraction)` samples
/// from each tail. At least one sample always survives, so a heavy fraction
/// on a tiny set degrades to keeping the median element rather than emptying
/// the set.
pub fn apply_trim(samples: &[f64], policy: &TrimPolicy) -> TrimOutcome {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    match policy {
        TrimPolicy::None => TrimOutcome {
            kept: sorted,
            trimmed_count: 0,
        },
        TrimPolicy::Percentile { fraction } => {
            let n = sorted.len();
            if n == 0 {
                return TrimOutcome {
                    kept: sorted,
                    trimmed_count: 0,
                };
            }
            let mut per_tail = (n as f64 * fraction).floor() as usize;
            while n - 2 * per_tail < 1 {
                per_tail -= 1;
            }
            let kept = sorted[per_tail..n - per_tail].to_vec();
            TrimOutcome {
                trimmed_count: n - kept.len(),
                kept,
            }
        }
    }
}
