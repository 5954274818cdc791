//! Benchmark Unit Model
//!
//! A `BenchmarkUnit` is one named, repeatable piece of measured work,
//! registered explicitly (no attribute/reflection discovery). The action's
//! return value is routed through `std::hint::black_box` at registration time
//! so the optimizer cannot eliminate the work under measurement.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{IsolationMode, TrimPolicy};

type Callable = Arc<dyn Fn() + Send + Sync>;

/// Field-level configuration override attached to a unit or a category.
///
/// Each `Some` field replaces the corresponding global (or lower-precedence)
/// value during resolution; `None` fields fall through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverride {
    /// Warmup iteration count.
    pub warmup_iterations: Option<u64>,
    /// Warmup time budget in nanoseconds (advisory when an iteration count is set).
    pub warmup_time_ns: Option<u64>,
    /// Measured iteration count.
    pub measured_iterations: Option<u64>,
    /// Measured time budget in nanoseconds.
    pub measured_time_ns: Option<u64>,
    /// Independent launches per unit.
    pub launches: Option<u32>,
    /// Isolation mode for launches.
    pub isolation: Option<IsolationMode>,
    /// Outlier trimming policy for aggregation.
    pub trim: Option<TrimPolicy>,
}

/// One named, repeatable piece of measured work.
///
/// Immutable once registered. The action is an opaque, side-effect-bearing
/// closure the harness can invoke repeatedly; the harness does not know or
/// care what it computes.
pub struct BenchmarkUnit {
    name: String,
    categories: Vec<String>,
    action: Callable,
    setup: Option<Callable>,
    teardown: Option<Callable>,
    operations: Option<u64>,
    overrides: Option<ConfigOverride>,
}

impl BenchmarkUnit {
    /// Create a unit from a stable name and a zero-argument action.
    ///
    /// The action may return a value; it is passed through `black_box` so the
    /// computation cannot be optimized away.
    pub fn new<T, F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            categories: Vec::new(),
            action: Arc::new(move || {
                std::hint::black_box(action());
            }),
            setup: None,
            teardown: None,
            operations: None,
            overrides: None,
        }
    }

    /// Tag the unit with a category. Categories form an ordered set; adding a
    /// duplicate is a no-op.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
        self
    }

    /// Attach a per-launch setup callable, run before warmup. A panic here
    /// aborts the launch and is reported as a setup failure.
    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.setup = Some(Arc::new(setup));
        self
    }

    /// Attach a per-launch teardown callable, run after the measured phase.
    /// A panic here is logged and recorded but never invalidates samples.
    pub fn teardown<F>(mut self, teardown: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.teardown = Some(Arc::new(teardown));
        self
    }

    /// Declare that one invocation performs `n` sub-operations, enabling
    /// throughput reporting (elapsed divided by `n`).
    pub fn operations(mut self, n: u64) -> Self {
        self.operations = Some(n);
        self
    }

    /// Attach a per-unit configuration override.
    pub fn with_overrides(mut self, overrides: ConfigOverride) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Stable identity of this unit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered category tags.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Whether the unit carries the given category tag.
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }

    /// Sub-operations per invocation, if declared.
    pub fn operations_per_invocation(&self) -> Option<u64> {
        self.operations
    }

    /// Per-unit configuration override, if any.
    pub fn overrides(&self) -> Option<&ConfigOverride> {
        self.overrides.as_ref()
    }

    /// Invoke the action once.
    pub(crate) fn invoke(&self) {
        (self.action)()
    }

    /// Run the setup callable if present.
    pub(crate) fn run_setup(&self) {
        if let Some(setup) = &self.setup {
            setup();
        }
    }

    /// Run the teardown callable if present.
    pub(crate) fn run_teardown(&self) {
        if let Some(teardown) = &self.teardown {
            teardown();
        }
    }
}

impl fmt::Debug for BenchmarkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BenchmarkUnit")
            .field("name", &self.name)
            .field("categories", &self.categories)
            .field("operations", &self.operations)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}
