//! Execution Engine
//!
//! Runs one unit through one launch: setup, warmup, measured phase, teardown.
//! Every measured invocation is individually timed against the injected
//! `Clock` and recorded as one `Sample`. Panics are caught per invocation so
//! a failure mid-phase keeps the partial sample set.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::RunConfig;
use crate::unit::BenchmarkUnit;

/// One raw observation from the measured phase.
///
/// A zero elapsed time (below timer resolution) is recorded as-is; resolution
/// handling belongs to the aggregator, not the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock elapsed time for one invocation, in nanoseconds.
    pub elapsed_ns: u64,
    /// Sub-operations performed by the invocation, for throughput units.
    pub operations: Option<u64>,
}

/// Why a launch did not complete normally.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LaunchFailure {
    /// The setup callable panicked; the launch was aborted before any
    /// measurement and produced no samples.
    #[error("setup panicked: {0}")]
    Setup(String),

    /// The action panicked during warmup or measurement. Samples collected
    /// before the panic are retained on the outcome.
    #[error("action panicked after {samples} measured samples: {message}")]
    Execution {
        /// Samples collected before the panic.
        samples: usize,
        /// Panic payload rendered as text.
        message: String,
    },
}

/// Result of one launch.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOutcome {
    /// Samples collected during the measured phase (possibly partial).
    pub samples: Vec<Sample>,
    /// True when the measured phase was aborted mid-way; partial samples are
    /// retained for the raw report but excluded from cross-launch summaries.
    pub incomplete: bool,
    /// Warmup invocations performed (and discarded).
    pub warmup_iterations: u64,
    /// Setup or execution failure, if any.
    pub failure: Option<LaunchFailure>,
    /// Teardown panic message, if any. Never invalidates samples.
    pub teardown_error: Option<String>,
}

impl LaunchOutcome {
    /// Whether this launch's samples may enter cross-launch aggregation.
    pub fn is_usable(&self) -> bool {
        self.failure.is_none() && !self.incomplete && !self.samples.is_empty()
    }
}

/// Runs a single unit through one launch under a resolved configuration.
pub struct ExecutionEngine<'c> {
    clock: &'c dyn Clock,
}

impl<'c> ExecutionEngine<'c> {
    /// Create an engine measuring against `clock`.
    pub fn new(clock: &'c dyn Clock) -> Self {
        Self { clock }
    }

    /// Execute one launch of `unit` and return its samples.
    pub fn run_launch(&self, unit: &BenchmarkUnit, config: &RunConfig) -> LaunchOutcome {
        let mut outcome = LaunchOutcome {
            samples: Vec::new(),
            incomplete: false,
            warmup_iterations: 0,
            failure: None,
            teardown_error: None,
        };

        // Setup. A panic here aborts the launch entirely; teardown is not run
        // because setup never established the state it would release.
        if let Err(message) = guarded(|| unit.run_setup()) {
            outcome.failure = Some(LaunchFailure::Setup(message));
            return outcome;
        }

        if self.run_warmup(unit, config, &mut outcome) {
            self.run_measured(unit, config, &mut outcome);
        }

        // Teardown runs whenever setup succeeded, even after a failed phase.
        if let Err(message) = guarded(|| unit.run_teardown()) {
            warn!(unit = unit.name(), %message, "teardown panicked");
            outcome.teardown_error = Some(message);
        }

        outcome
    }

    /// Warmup phase. Returns false when the action panicked and the launch
    /// must skip measurement.
    fn run_warmup(
        &self,
        unit: &BenchmarkUnit,
        config: &RunConfig,
        outcome: &mut LaunchOutcome,
    ) -> bool {
        if config.warmup_iterations > 0 {
            // Iteration count is the stop condition; a co-configured time
            // budget is advisory only.
            let budget_start = config.warmup_time_ns.map(|_| self.clock.now_ns());
            for _ in 0..config.warmup_iterations {
                if let Err(message) = guarded(|| unit.invoke()) {
                    outcome.incomplete = true;
                    outcome.failure = Some(LaunchFailure::Execution {
                        samples: 0,
                        message,
                    });
                    return false;
                }
                outcome.warmup_iterations += 1;
            }
            if let (Some(budget), Some(start)) = (config.warmup_time_ns, budget_start) {
                let elapsed = self.clock.now_ns().saturating_sub(start);
                if elapsed > budget {
                    debug!(
                        unit = unit.name(),
                        elapsed_ns = elapsed,
                        budget_ns = budget,
                        "warmup exceeded advisory time budget"
                    );
                }
            }
        } else if let Some(budget) = config.warmup_time_ns {
            let deadline = self.clock.now_ns().saturating_add(budget);
            while self.clock.now_ns() < deadline {
                if let Err(message) = guarded(|| unit.invoke()) {
                    outcome.incomplete = true;
                    outcome.failure = Some(LaunchFailure::Execution {
                        samples: 0,
                        message,
                    });
                    return false;
                }
                outcome.warmup_iterations += 1;
            }
        }
        true
    }

    /// Measured phase: fixed iteration count, or run until the time budget is
    /// exhausted. Each invocation is timed individually.
    fn run_measured(&self, unit: &BenchmarkUnit, config: &RunConfig, outcome: &mut LaunchOutcome) {
        let operations = unit.operations_per_invocation();

        if config.measured_iterations > 0 {
            for _ in 0..config.measured_iterations {
                if !self.measure_one(unit, operations, outcome) {
                    return;
                }
            }
        } else if let Some(budget) = config.measured_time_ns {
            let deadline = self.clock.now_ns().saturating_add(budget);
            while self.clock.now_ns() < deadline {
                if !self.measure_one(unit, operations, outcome) {
                    return;
                }
            }
        }
    }

    /// Time one invocation. Returns false when the action panicked.
    fn measure_one(
        &self,
        unit: &BenchmarkUnit,
        operations: Option<u64>,
        outcome: &mut LaunchOutcome,
    ) -> bool {
        let start = self.clock.now_ns();
        match guarded(|| unit.invoke()) {
            Ok(()) => {
                let elapsed_ns = self.clock.now_ns().saturating_sub(start);
                outcome.samples.push(Sample {
                    elapsed_ns,
                    operations,
                });
                true
            }
            Err(message) => {
                outcome.incomplete = true;
                outcome.failure = Some(LaunchFailure::Execution {
                    samples: outcome.samples.len(),
                    message,
                });
                false
            }
        }
    }
}

/// Run a callable, converting a panic into its rendered message.
fn guarded(f: impl FnOnce()) -> Result<(), String> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|panic| {
        if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        }
    })
}
