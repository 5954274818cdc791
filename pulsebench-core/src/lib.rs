#![warn(missing_docs)]
//! PulseBench Core - Unit Model and Execution Engine
//!
//! This crate provides the measurement side of the harness:
//! - `BenchmarkUnit` for explicitly registered benchmark work
//! - `UnitRegistry` with glob/category filtering
//! - Field-level configuration resolution (unit > category > global)
//! - The execution engine running warmup and measured phases per launch
//! - A `Clock` abstraction so measurement is testable with a fake clock

mod clock;
mod config;
mod engine;
mod registry;
mod unit;

pub use clock::{Clock, FixedStepClock, MonotonicClock};
pub use config::{
    CategoryOverrides, ConfigError, IsolationMode, RunConfig, TrimPolicy, resolve,
};
pub use engine::{ExecutionEngine, LaunchFailure, LaunchOutcome, Sample};
pub use registry::{RegistryError, UnitFilter, UnitFilterBuilder, UnitRegistry};
pub use unit::{BenchmarkUnit, ConfigOverride};
