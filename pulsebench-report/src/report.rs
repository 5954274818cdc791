//! Report Data Structures

use chrono::{DateTime, Utc};
use pulsebench_core::{LaunchFailure, RunConfig, Sample};
use pulsebench_stats::AggregateResult;
use serde::{Deserialize, Serialize};

/// Complete record of one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Run-level metadata.
    pub meta: ReportMeta,
    /// One entry per unit selected by the run's filter, in execution order.
    pub units: Vec<UnitReport>,
    /// Aggregate counts across all units.
    pub summary: ReportSummary,
    /// Overall run status.
    pub status: RunStatus,
}

/// Run-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report layout version.
    pub schema_version: u32,
    /// Harness version that produced the report.
    pub harness_version: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// The validated global configuration the run started from.
    pub global_config: RunConfig,
}

/// Outcome of one unit within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Unit identity.
    pub name: String,
    /// Category tags, in declaration order.
    pub categories: Vec<String>,
    /// Final status of the unit.
    pub status: UnitStatus,
    /// Effective configuration the unit ran under. Absent when resolution
    /// failed or the unit was skipped before resolution.
    pub config: Option<RunConfig>,
    /// Per-launch records, including failed and incomplete launches.
    pub launches: Vec<LaunchRecord>,
    /// Cross-launch combined statistics over usable launches only.
    pub combined: Option<AggregateResult>,
    /// Why the unit failed or was skipped, if it was.
    pub failure: Option<FailureInfo>,
}

/// One launch of one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchRecord {
    /// Zero-based launch index within the unit.
    pub index: u32,
    /// Raw samples, retained even for incomplete launches.
    pub samples: Vec<Sample>,
    /// Statistics over this launch's samples. Absent when the launch
    /// produced no samples.
    pub aggregate: Option<AggregateResult>,
    /// Warmup invocations performed.
    pub warmup_iterations: u64,
    /// True when the measured phase was cut short.
    pub incomplete: bool,
    /// Failure that ended this launch, if any.
    pub failure: Option<FailureInfo>,
    /// Teardown panic message; does not invalidate samples.
    pub teardown_error: Option<String>,
}

/// Unit execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    /// Every launch completed and statistics were produced.
    Completed,
    /// At least one launch failed, or no launch yielded usable samples.
    Failed,
    /// The unit never ran (configuration error or cancellation).
    Skipped,
}

/// Machine-readable failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCode {
    /// Setup callable panicked.
    Setup,
    /// The measured action panicked.
    Execution,
    /// Per-unit configuration resolution failed.
    Configuration,
    /// Process isolation was requested but unavailable.
    Isolation,
}

/// Failure details attached to a unit or launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Failure classification.
    pub code: FailureCode,
    /// Human-readable message.
    pub message: String,
}

impl From<&LaunchFailure> for FailureInfo {
    fn from(failure: &LaunchFailure) -> Self {
        match failure {
            LaunchFailure::Setup(_) => FailureInfo {
                code: FailureCode::Setup,
                message: failure.to_string(),
            },
            LaunchFailure::Execution { .. } => FailureInfo {
                code: FailureCode::Execution,
                message: failure.to_string(),
            },
        }
    }
}

/// Aggregate counts across the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Units selected by the filter.
    pub total_units: usize,
    /// Units that completed with statistics.
    pub completed: usize,
    /// Units that failed.
    pub failed: usize,
    /// Units skipped before execution.
    pub skipped: usize,
    /// Raw samples collected across all launches, usable or not.
    pub total_samples: usize,
}

/// Overall status of the run, mapped to a process exit code by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    /// Every selected unit completed.
    AllPassed,
    /// Some units failed or were skipped, but the run itself finished.
    PartialFailure,
    /// The run was cancelled before visiting every selected unit.
    Aborted,
}

impl RunStatus {
    /// Conventional process exit code for this status.
    pub fn exit_code(self) -> i32 {
        match self {
            RunStatus::AllPassed => 0,
            RunStatus::PartialFailure => 1,
            RunStatus::Aborted => 2,
        }
    }
}

impl RunReport {
    /// Recompute the summary and status from the unit entries.
    ///
    /// `aborted` marks a cancelled run, which reports `Aborted` regardless of
    /// per-unit outcomes.
    pub fn finalize(&mut self, aborted: bool) {
        let mut summary = ReportSummary {
            total_units: self.units.len(),
            ..Default::default()
        };
        for unit in &self.units {
            match unit.status {
                UnitStatus::Completed => summary.completed += 1,
                UnitStatus::Failed => summary.failed += 1,
                UnitStatus::Skipped => summary.skipped += 1,
            }
            summary.total_samples += unit.launches.iter().map(|l| l.samples.len()).sum::<usize>();
        }
        self.status = if aborted {
            RunStatus::Aborted
        } else if summary.failed == 0 && summary.skipped == 0 {
            RunStatus::AllPassed
        } else {
            RunStatus::PartialFailure
        };
        self.summary = summary;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_report(name: &str, status: UnitStatus) -> UnitReport {
        UnitReport {
            name: name.to_string(),
            categories: Vec::new(),
            status,
            config: None,
            launches: Vec::new(),
            combined: None,
            failure: None,
        }
    }

    fn empty_report() -> RunReport {
        let now = Utc::now();
        RunReport {
            meta: ReportMeta {
                schema_version: crate::SCHEMA_VERSION,
                harness_version: env!("CARGO_PKG_VERSION").to_string(),
                started_at: now,
                finished_at: now,
                global_config: RunConfig::default(),
            },
            units: Vec::new(),
            summary: ReportSummary::default(),
            status: RunStatus::AllPassed,
        }
    }

    #[test]
    fn finalize_counts_statuses() {
        let mut report = empty_report();
        report.units.push(unit_report("a", UnitStatus::Completed));
        report.units.push(unit_report("b", UnitStatus::Failed));
        report.units.push(unit_report("c", UnitStatus::Skipped));
        report.finalize(false);

        assert_eq!(report.summary.total_units, 3);
        assert_eq!(report.summary.completed, 1);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.status, RunStatus::PartialFailure);
    }

    #[test]
    fn all_completed_means_all_passed() {
        let mut report = empty_report();
        report.units.push(unit_report("a", UnitStatus::Completed));
        report.finalize(false);
        assert_eq!(report.status, RunStatus::AllPassed);
        assert_eq!(report.status.exit_code(), 0);
    }

    #[test]
    fn aborted_overrides_unit_outcomes() {
        let mut report = empty_report();
        report.units.push(unit_report("a", UnitStatus::Completed));
        report.finalize(true);
        assert_eq!(report.status, RunStatus::Aborted);
        assert_eq!(report.status.exit_code(), 2);
    }

    #[test]
    fn failure_info_from_launch_failure() {
        let info = FailureInfo::from(&LaunchFailure::Setup("no fixture".to_string()));
        assert_eq!(info.code, FailureCode::Setup);
        assert!(info.message.contains("no fixture"));
    }

    #[test]
    fn report_round_trips_through_json() {
        let mut report = empty_report();
        report.units.push(unit_report("a", UnitStatus::Completed));
        report.finalize(false);

        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.units.len(), 1);
        assert_eq!(back.status, RunStatus::AllPassed);
    }
}
