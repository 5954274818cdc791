//! Aggregation
//!
//! Central-tendency statistics come from the trimmed sample set; min, max,
//! and percentiles always come from the full set. Cross-launch combination
//! takes the field-wise median over per-launch aggregates, which keeps one
//! noisy launch from dragging the combined figure.

use pulsebench_core::{Sample, TrimPolicy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::percentiles::{Percentiles, compute_percentiles};
use crate::trim::apply_trim;

/// Aggregation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    /// Aggregation was requested over zero samples.
    #[error("cannot aggregate an empty sample set")]
    EmptySampleSet,

    /// Cross-launch combination was requested with no usable launches.
    #[error("no usable launches to combine")]
    NoUsableLaunches,
}

/// Descriptive statistics for one launch, or the combined run of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Mean elapsed time in nanoseconds, from the trimmed set.
    pub mean_ns: f64,
    /// Sample standard deviation in nanoseconds, from the trimmed set.
    /// Zero when fewer than two samples survive the trim.
    pub std_dev_ns: f64,
    /// Minimum elapsed time, from the full untrimmed set.
    pub min_ns: f64,
    /// Maximum elapsed time, from the full untrimmed set.
    pub max_ns: f64,
    /// Tail percentiles, from the full untrimmed set.
    pub percentiles: Percentiles,
    /// Raw samples that fed this aggregate.
    pub sample_count: usize,
    /// Samples dropped by the trim policy.
    pub trimmed_count: usize,
    /// Operations per second, when the unit declares a per-invocation
    /// operation count and the measured time is nonzero.
    pub ops_per_second: Option<f64>,
}

impl AggregateResult {
    /// Relative standard deviation, in percent. Zero when the mean is zero.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean_ns == 0.0 {
            0.0
        } else {
            (self.std_dev_ns / self.mean_ns) * 100.0
        }
    }
}

/// Aggregate one launch's sample set under the given trim policy.
pub fn aggregate(samples: &[Sample], policy: &TrimPolicy) -> Result<AggregateResult, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptySampleSet);
    }

    let all: Vec<f64> = samples.iter().map(|s| s.elapsed_ns as f64).collect();
    let trimmed = apply_trim(&all, policy);
    let kept = &trimmed.kept;

    let mean = kept.iter().sum::<f64>() / kept.len() as f64;
    let std_dev = if kept.len() < 2 {
        0.0
    } else {
        let variance =
            kept.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (kept.len() - 1) as f64;
        variance.sqrt()
    };

    // Extremes and percentiles from the full set.
    let min = all
        .iter()
        .cloned()
        .fold(f64::INFINITY, f64::min);
    let max = all
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(AggregateResult {
        mean_ns: mean,
        std_dev_ns: std_dev,
        min_ns: min,
        max_ns: max,
        percentiles: compute_percentiles(&all),
        sample_count: all.len(),
        trimmed_count: trimmed.trimmed_count,
        ops_per_second: throughput(samples),
    })
}

/// Operations per second over the whole measured phase, when declared.
fn throughput(samples: &[Sample]) -> Option<f64> {
    let total_ops: u64 = samples.iter().map(|s| s.operations).sum::<Option<u64>>()?;
    let total_ns: u64 = samples.iter().map(|s| s.elapsed_ns).sum();
    if total_ns == 0 {
        return None;
    }
    Some(total_ops as f64 / (total_ns as f64 * 1e-9))
}

/// Combine per-launch aggregates into one result for the unit.
///
/// Central statistics and percentiles take the median of that statistic
/// across launches, so one noisy launch cannot drag the headline figure.
/// Extremes stay extreme (min of mins, max of maxes) and sample counts are
/// summed. A single launch passes through unchanged.
pub fn combine_launches(launches: &[AggregateResult]) -> Result<AggregateResult, StatsError> {
    if launches.is_empty() {
        return Err(StatsError::NoUsableLaunches);
    }
    if launches.len() == 1 {
        return Ok(launches[0].clone());
    }

    let field = |get: fn(&AggregateResult) -> f64| -> f64 {
        median(&launches.iter().map(get).collect::<Vec<f64>>())
    };

    let ops: Vec<f64> = launches.iter().filter_map(|l| l.ops_per_second).collect();
    let ops_per_second = if ops.len() == launches.len() {
        Some(median(&ops))
    } else {
        None
    };

    Ok(AggregateResult {
        mean_ns: field(|l| l.mean_ns),
        std_dev_ns: field(|l| l.std_dev_ns),
        min_ns: launches.iter().map(|l| l.min_ns).fold(f64::INFINITY, f64::min),
        max_ns: launches
            .iter()
            .map(|l| l.max_ns)
            .fold(f64::NEG_INFINITY, f64::max),
        percentiles: Percentiles {
            p50: field(|l| l.percentiles.p50),
            p75: field(|l| l.percentiles.p75),
            p90: field(|l| l.percentiles.p90),
            p95: field(|l| l.percentiles.p95),
            p99: field(|l| l.percentiles.p99),
            p999: field(|l| l.percentiles.p999),
        },
        sample_count: launches.iter().map(|l| l.sample_count).sum(),
        trimmed_count: launches.iter().map(|l| l.trimmed_count).sum(),
        ops_per_second,
    })
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(elapsed: &[u64]) -> Vec<Sample> {
        elapsed
            .iter()
            .map(|&e| Sample {
                elapsed_ns: e,
                operations: None,
            })
            .collect()
    }

    #[test]
    fn constant_samples_have_zero_stddev() {
        let s = samples(&[250; 10]);
        let agg = aggregate(&s, &TrimPolicy::None).unwrap();
        assert!((agg.mean_ns - 250.0).abs() < f64::EPSILON);
        assert!((agg.std_dev_ns - 0.0).abs() < f64::EPSILON);
        assert_eq!(agg.sample_count, 10);
    }

    #[test]
    fn single_sample_has_zero_stddev() {
        let s = samples(&[42]);
        let agg = aggregate(&s, &TrimPolicy::None).unwrap();
        assert!((agg.mean_ns - 42.0).abs() < f64::EPSILON);
        assert!((agg.std_dev_ns - 0.0).abs() < f64::EPSILON);
        assert!((agg.min_ns - 42.0).abs() < f64::EPSILON);
        assert!((agg.max_ns - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_set_is_an_error() {
        let err = aggregate(&[], &TrimPolicy::None).unwrap_err();
        assert_eq!(err, StatsError::EmptySampleSet);
    }

    #[test]
    fn trim_affects_mean_but_not_extremes() {
        // Mundane samples and one huge outlier.
        let mut elapsed: Vec<u64> = vec![100; 19];
        elapsed.push(1_000_000);
        let s = samples(&elapsed);

        let untrimmed = aggregate(&s, &TrimPolicy::None).unwrap();
        let trimmed = aggregate(&s, &TrimPolicy::Percentile { fraction: 0.05 }).unwrap();

        assert!(trimmed.mean_ns < untrimmed.mean_ns);
        // Max is always from the full set.
        assert!((trimmed.max_ns - 1_000_000.0).abs() < f64::EPSILON);
        assert!((untrimmed.max_ns - 1_000_000.0).abs() < f64::EPSILON);
        assert_eq!(trimmed.trimmed_count, 2);
    }

    #[test]
    fn statistics_are_ordered() {
        let elapsed: Vec<u64> = (0..500).map(|i| (i * 37 + 11) % 10_000).collect();
        for policy in [TrimPolicy::None, TrimPolicy::Percentile { fraction: 0.1 }] {
            let agg = aggregate(&samples(&elapsed), &policy).unwrap();
            let p = &agg.percentiles;
            assert!(agg.min_ns <= p.p50);
            assert!(p.p50 <= p.p90);
            assert!(p.p90 <= p.p99);
            assert!(p.p99 <= agg.max_ns);
        }
    }

    #[test]
    fn percentiles_include_outliers() {
        let mut elapsed: Vec<u64> = vec![100; 99];
        elapsed.push(1_000_000);
        let agg = aggregate(&samples(&elapsed), &TrimPolicy::Percentile { fraction: 0.02 })
            .unwrap();
        assert!(agg.percentiles.p999 > 100.0);
    }

    #[test]
    fn throughput_requires_operation_counts() {
        let with_ops: Vec<Sample> = (0..4)
            .map(|_| Sample {
                elapsed_ns: 1_000_000,
                operations: Some(1000),
            })
            .collect();
        let agg = aggregate(&with_ops, &TrimPolicy::None).unwrap();
        // 4000 ops over 4 ms.
        let ops = agg.ops_per_second.unwrap();
        assert!((ops - 1_000_000.0).abs() < 1.0);

        let without = aggregate(&samples(&[100, 200]), &TrimPolicy::None).unwrap();
        assert!(without.ops_per_second.is_none());
    }

    #[test]
    fn combine_takes_field_wise_median() {
        let mk = |mean: f64| AggregateResult {
            mean_ns: mean,
            std_dev_ns: 1.0,
            min_ns: mean - 10.0,
            max_ns: mean + 10.0,
            percentiles: compute_percentiles(&[mean]),
            sample_count: 100,
            trimmed_count: 0,
            ops_per_second: None,
        };

        let combined = combine_launches(&[mk(100.0), mk(300.0), mk(120.0)]).unwrap();
        assert!((combined.mean_ns - 120.0).abs() < f64::EPSILON);
        // Extremes stay extreme rather than taking the median.
        assert!((combined.min_ns - 90.0).abs() < f64::EPSILON);
        assert!((combined.max_ns - 310.0).abs() < f64::EPSILON);
        assert_eq!(combined.sample_count, 300);
    }

    #[test]
    fn combine_single_launch_passes_through() {
        let agg = aggregate(&samples(&[10, 20, 30]), &TrimPolicy::None).unwrap();
        let combined = combine_launches(std::slice::from_ref(&agg)).unwrap();
        assert_eq!(combined, agg);
    }

    #[test]
    fn combine_nothing_is_an_error() {
        assert_eq!(
            combine_launches(&[]).unwrap_err(),
            StatsError::NoUsableLaunches
        );
    }
}
