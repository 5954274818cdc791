#![warn(missing_docs)]
//! Pulsebench Runner - Orchestration
//!
//! Drives a full benchmark run: seals the registry, validates and resolves
//! configuration, executes every selected unit launch by launch, combines
//! statistics, and hands the finished report to the configured sinks.

mod isolation;
mod orchestrator;
mod settings;

pub use isolation::{IsolationError, ProcessLauncher};
pub use orchestrator::{CancelToken, Orchestrator, OrchestratorError};
pub use settings::{OutputSettings, OverrideSection, RunSection, Settings, parse_duration};
