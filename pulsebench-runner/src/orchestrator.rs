//! Run Orchestrator
//!
//! Walks the filtered unit list in registration order, resolves each unit's
//! configuration, executes its launches, aggregates, and emits the finished
//! report to every sink exactly once. Cancellation is checked between units,
//! never mid-launch, so a cancelled run still ends with a coherent report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use pulsebench_core::{
    BenchmarkUnit, CategoryOverrides, Clock, ConfigError, ExecutionEngine, IsolationMode,
    LaunchOutcome, MonotonicClock, RunConfig, UnitFilter, UnitRegistry, resolve,
};
use pulsebench_report::{
    FailureCode, FailureInfo, LaunchRecord, ReportMeta, ReportSink, ReportSummary, RunReport,
    RunStatus, SCHEMA_VERSION, SinkError, UnitReport, UnitStatus,
};
use pulsebench_stats::{AggregateResult, aggregate, combine_launches};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::isolation::{IsolationError, ProcessLauncher};

/// Orchestration errors.
///
/// A per-unit problem never surfaces here; it becomes a failed or skipped
/// entry in the report. Only run-level problems abort without a report.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The global configuration failed validation. No report is emitted.
    #[error("invalid global configuration: {0}")]
    InvalidGlobalConfig(#[source] ConfigError),

    /// A sink rejected the finished report.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Shared cancellation flag, checked between units.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Units not yet started will be skipped.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Drives one benchmark run over a sealed registry.
pub struct Orchestrator<'r> {
    registry: &'r UnitRegistry,
    global: RunConfig,
    categories: CategoryOverrides,
    filter: UnitFilter,
    clock: Box<dyn Clock>,
    launcher: Option<Box<dyn ProcessLauncher>>,
    sinks: Vec<Box<dyn ReportSink>>,
    cancel: CancelToken,
}

impl<'r> Orchestrator<'r> {
    /// Orchestrator over `registry` with default configuration, no filter,
    /// the monotonic clock, and no sinks.
    pub fn new(registry: &'r UnitRegistry) -> Self {
        Self {
            registry,
            global: RunConfig::default(),
            categories: CategoryOverrides::new(),
            filter: UnitFilter::all(),
            clock: Box::new(MonotonicClock::new()),
            launcher: None,
            sinks: Vec::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Set the global run configuration.
    pub fn with_global_config(mut self, config: RunConfig) -> Self {
        self.global = config;
        self
    }

    /// Set category-level overrides.
    pub fn with_category_overrides(mut self, categories: CategoryOverrides) -> Self {
        self.categories = categories;
        self
    }

    /// Restrict the run to units matching `filter`.
    pub fn with_filter(mut self, filter: UnitFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Replace the measurement clock. Tests inject a deterministic one.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install the process-launch collaborator for isolated units.
    pub fn with_launcher(mut self, launcher: Box<dyn ProcessLauncher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Add a report sink. Sinks are emitted to in insertion order.
    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Share a cancellation token with the caller.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Execute the run and return the finished report.
    ///
    /// The registry is sealed before any unit executes. An invalid global
    /// configuration aborts before execution and nothing is emitted; every
    /// other failure mode is confined to its unit's report entry.
    pub fn run(mut self) -> Result<RunReport, OrchestratorError> {
        self.global
            .validate("global")
            .map_err(OrchestratorError::InvalidGlobalConfig)?;
        self.registry.seal();

        let started_at = Utc::now();
        let engine = ExecutionEngine::new(self.clock.as_ref());
        let mut units = Vec::new();
        let mut aborted = false;

        for unit in self.registry.query(&self.filter) {
            if self.cancel.is_cancelled() {
                aborted = true;
                debug!(unit = unit.name(), "skipping after cancellation");
                units.push(skipped_entry(unit, None));
                continue;
            }

            match resolve(&self.global, &self.categories, unit) {
                Err(err) => {
                    warn!(unit = unit.name(), error = %err, "configuration resolution failed");
                    units.push(skipped_entry(
                        unit,
                        Some(FailureInfo {
                            code: FailureCode::Configuration,
                            message: err.to_string(),
                        }),
                    ));
                }
                Ok(config) => {
                    info!(unit = unit.name(), launches = config.launches, "running unit");
                    units.push(self.run_unit(&engine, unit, config));
                }
            }
        }

        let mut report = RunReport {
            meta: ReportMeta {
                schema_version: SCHEMA_VERSION,
                harness_version: env!("CARGO_PKG_VERSION").to_string(),
                started_at,
                finished_at: Utc::now(),
                global_config: self.global.clone(),
            },
            units,
            summary: ReportSummary::default(),
            status: RunStatus::AllPassed,
        };
        report.finalize(aborted);

        let mut sink_error = None;
        for sink in &mut self.sinks {
            if let Err(err) = sink.emit(&report) {
                warn!(error = %err, "report sink failed");
                if sink_error.is_none() {
                    sink_error = Some(err);
                }
            }
        }
        if let Some(err) = sink_error {
            return Err(err.into());
        }
        Ok(report)
    }

    fn run_unit(
        &self,
        engine: &ExecutionEngine<'_>,
        unit: &BenchmarkUnit,
        config: RunConfig,
    ) -> UnitReport {
        let mut launches = Vec::with_capacity(config.launches as usize);
        let mut usable: Vec<AggregateResult> = Vec::new();
        let mut first_failure: Option<FailureInfo> = None;

        for index in 0..config.launches {
            let outcome = match config.isolation {
                IsolationMode::InProcess => Ok(engine.run_launch(unit, &config)),
                IsolationMode::Process => match &self.launcher {
                    Some(launcher) => launcher.launch(unit.name(), &config, index),
                    None => Err(IsolationError::Unavailable {
                        unit: unit.name().to_string(),
                    }),
                },
            };

            match outcome {
                Ok(outcome) => {
                    let record = launch_record(index, &config, outcome);
                    if let (Some(failure), None) = (&record.failure, &first_failure) {
                        first_failure = Some(failure.clone());
                    }
                    if record.failure.is_none() && !record.incomplete {
                        if let Some(agg) = &record.aggregate {
                            usable.push(agg.clone());
                        }
                    }
                    launches.push(record);
                }
                Err(err) => {
                    warn!(unit = unit.name(), launch = index, error = %err, "isolated launch failed");
                    let failure = FailureInfo {
                        code: FailureCode::Isolation,
                        message: err.to_string(),
                    };
                    if first_failure.is_none() {
                        first_failure = Some(failure.clone());
                    }
                    launches.push(LaunchRecord {
                        index,
                        samples: Vec::new(),
                        aggregate: None,
                        warmup_iterations: 0,
                        incomplete: true,
                        failure: Some(failure),
                        teardown_error: None,
                    });
                    // A missing launcher cannot recover on the next launch.
                    if matches!(err, IsolationError::Unavailable { .. }) {
                        break;
                    }
                }
            }
        }

        let combined = combine_launches(&usable).ok();
        let status = if first_failure.is_none() && usable.len() == launches.len() {
            UnitStatus::Completed
        } else {
            UnitStatus::Failed
        };
        let failure = match status {
            UnitStatus::Completed => None,
            _ => first_failure.or_else(|| {
                Some(FailureInfo {
                    code: FailureCode::Execution,
                    message: "no launch produced usable samples".to_string(),
                })
            }),
        };

        UnitReport {
            name: unit.name().to_string(),
            categories: unit.categories().to_vec(),
            status,
            config: Some(config),
            launches,
            combined,
            failure,
        }
    }
}

fn launch_record(index: u32, config: &RunConfig, outcome: LaunchOutcome) -> LaunchRecord {
    // Partial sample sets still get per-launch statistics for the raw record;
    // only usable launches feed the cross-launch combination.
    let agg = if outcome.samples.is_empty() {
        None
    } else {
        aggregate(&outcome.samples, &config.trim).ok()
    };
    LaunchRecord {
        index,
        aggregate: agg,
        warmup_iterations: outcome.warmup_iterations,
        incomplete: outcome.incomplete,
        failure: outcome.failure.as_ref().map(FailureInfo::from),
        teardown_error: outcome.teardown_error,
        samples: outcome.samples,
    }
}

fn skipped_entry(unit: &BenchmarkUnit, failure: Option<FailureInfo>) -> UnitReport {
    UnitReport {
        name: unit.name().to_string(),
        categories: unit.categories().to_vec(),
        status: UnitStatus::Skipped,
        config: None,
        launches: Vec::new(),
        combined: None,
        failure,
    }
}
