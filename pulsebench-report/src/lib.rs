#![warn(missing_docs)]
//! Pulsebench Report - Run Results and Sinks
//!
//! The report model captures everything a run produced: per-unit status,
//! per-launch raw samples and aggregates, and a run-level summary. Sinks
//! consume a finished report exactly once:
//! - JSON (machine-readable, pretty-printed)
//! - Console (human-readable terminal output)

mod console;
mod json;
mod report;
mod sink;

pub use console::{ConsoleSink, format_duration, format_human_output};
pub use json::{JsonSink, generate_json_report};
pub use report::{
    FailureCode, FailureInfo, LaunchRecord, ReportMeta, ReportSummary, RunReport, RunStatus,
    UnitReport, UnitStatus,
};
pub use sink::{MemorySink, ReportSink, SinkError};

/// Report schema version, bumped on breaking layout changes.
pub const SCHEMA_VERSION: u32 = 1;
