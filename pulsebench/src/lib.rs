#![warn(missing_docs)]
//! # Pulsebench
//!
//! Benchmark execution and measurement harness with explicit registration,
//! layered configuration, and crash-tolerant launches.
//!
//! - **Explicit Registration**: units are registered with plain function
//!   calls; what runs is exactly what was registered
//! - **Layered Configuration**: field-level merge of unit, category, and
//!   global settings, resolved once per unit before execution
//! - **Crash Tolerance**: every invocation is individually guarded; a
//!   panicking unit is reported and the rest of the suite keeps running
//! - **Honest Statistics**: trimming only ever feeds mean and stddev, while
//!   min, max, and tail percentiles always come from the raw sample set
//! - **Cross-Launch Combination**: multiple launches combine by field-wise
//!   median, so one noisy launch cannot drag the headline figure
//! - **Pluggable Sinks**: JSON and console reporters included, the sink
//!   trait open for custom consumers
//!
//! ## Quick Start
//!
//! ```ignore
//! use pulsebench::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut registry = UnitRegistry::new();
//!     registry.register(
//!         BenchmarkUnit::new("sum_1k", || (0..1000u64).sum::<u64>())
//!             .category("math"),
//!     )?;
//!
//!     let report = Orchestrator::new(&registry)
//!         .with_sink(Box::new(ConsoleSink::stdout()))
//!         .run()?;
//!     std::process::exit(report.status.exit_code());
//! }
//! ```

// Re-export the unit model and execution engine
pub use pulsebench_core::{
    BenchmarkUnit, CategoryOverrides, Clock, ConfigError, ConfigOverride, ExecutionEngine,
    FixedStepClock, IsolationMode, LaunchFailure, LaunchOutcome, MonotonicClock, RegistryError,
    RunConfig, Sample, TrimPolicy, UnitFilter, UnitFilterBuilder, UnitRegistry, resolve,
};

// Re-export statistics
pub use pulsebench_stats::{
    AggregateResult, Percentiles, StatsError, aggregate, combine_launches, compute_percentile,
    compute_percentiles,
};

// Re-export the report model and sinks
pub use pulsebench_report::{
    ConsoleSink, FailureCode, FailureInfo, JsonSink, LaunchRecord, MemorySink, ReportSink,
    RunReport, RunStatus, SinkError, UnitReport, UnitStatus, format_duration,
    generate_json_report,
};

// Re-export orchestration
pub use pulsebench_runner::{
    CancelToken, IsolationError, Orchestrator, OrchestratorError, ProcessLauncher, Settings,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkUnit, CancelToken, CategoryOverrides, ConfigOverride, ConsoleSink, JsonSink,
        Orchestrator, RunConfig, Settings, UnitFilter, UnitRegistry,
    };
}
