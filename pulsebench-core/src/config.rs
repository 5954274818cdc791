//! Run Configuration and Resolution
//!
//! Global defaults, category-level overrides, and per-unit overrides merge
//! into one effective `RunConfig` per unit. Precedence is field-level:
//! unit override > first matching category override (in the unit's category
//! order) > global default. Resolution is a pure function.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::unit::{BenchmarkUnit, ConfigOverride};

/// Whether launches share the calling process or run in fresh ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsolationMode {
    /// Launches run inside the calling process (default).
    #[default]
    InProcess,
    /// Each launch runs in a fresh execution context provided by an external
    /// process-launch collaborator.
    Process,
}

impl IsolationMode {
    /// Whether this mode runs launches outside the calling process.
    pub fn is_isolated(self) -> bool {
        matches!(self, IsolationMode::Process)
    }
}

impl FromStr for IsolationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in-process" => Ok(IsolationMode::InProcess),
            "process" => Ok(IsolationMode::Process),
            other => Err(ConfigError::UnknownIsolationMode(other.to_string())),
        }
    }
}

/// Outlier trimming policy applied before mean/stddev computation.
///
/// Trimming never affects min/max or percentiles, which are always computed
/// from the untrimmed sample set so pathological outliers remain visible.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrimPolicy {
    /// No trimming.
    #[default]
    None,
    /// Drop the top and bottom `fraction` of samples (each tail) before
    /// computing mean and standard deviation. Valid range: `[0, 0.5)`.
    Percentile {
        /// Fraction of samples dropped from each tail.
        fraction: f64,
    },
}

/// Effective settings for running one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Warmup invocations before measurement. When positive this is the
    /// warmup stop condition and any time budget is advisory only.
    pub warmup_iterations: u64,
    /// Warmup time budget in nanoseconds. Stop condition only when the
    /// iteration count is zero; advisory (logged on overrun) otherwise.
    pub warmup_time_ns: Option<u64>,
    /// Measured invocations per launch. When zero, the time budget drives
    /// the measured phase instead.
    pub measured_iterations: u64,
    /// Measured time budget in nanoseconds.
    pub measured_time_ns: Option<u64>,
    /// Independent launches per unit.
    pub launches: u32,
    /// Isolation mode for launches.
    pub isolation: IsolationMode,
    /// Outlier trimming policy for aggregation.
    pub trim: TrimPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            warmup_iterations: 50,
            warmup_time_ns: None,
            measured_iterations: 100,
            measured_time_ns: None,
            launches: 1,
            isolation: IsolationMode::InProcess,
            trim: TrimPolicy::None,
        }
    }
}

impl RunConfig {
    /// Validate this configuration. `scope` names the configuration's owner
    /// in error messages ("global" or a unit name).
    pub fn validate(&self, scope: &str) -> Result<(), ConfigError> {
        if self.launches == 0 {
            return Err(ConfigError::ZeroLaunches {
                scope: scope.to_string(),
            });
        }
        if let TrimPolicy::Percentile { fraction } = self.trim {
            if !(0.0..0.5).contains(&fraction) {
                return Err(ConfigError::InvalidTrimFraction {
                    scope: scope.to_string(),
                    fraction,
                });
            }
        }
        if self.measured_iterations == 0 && self.measured_time_ns.is_none() {
            return Err(ConfigError::NoMeasurableWork {
                scope: scope.to_string(),
            });
        }
        Ok(())
    }
}

/// Category-level configuration overrides, keyed by category tag.
#[derive(Debug, Clone, Default)]
pub struct CategoryOverrides {
    map: HashMap<String, ConfigOverride>,
}

impl CategoryOverrides {
    /// Empty override set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an override for a category, replacing any previous one.
    pub fn insert(&mut self, category: impl Into<String>, overrides: ConfigOverride) {
        self.map.insert(category.into(), overrides);
    }

    /// Look up the override for a category.
    pub fn get(&self, category: &str) -> Option<&ConfigOverride> {
        self.map.get(category)
    }

    /// Build from an iterator of `(category, override)` pairs.
    pub fn from_iter<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, ConfigOverride)>,
        S: Into<String>,
    {
        let mut out = Self::new();
        for (category, overrides) in pairs {
            out.insert(category, overrides);
        }
        out
    }
}

/// Configuration errors. These fail fast: either at global validation before
/// any unit runs, or at per-unit resolution (where the orchestrator downgrades
/// them to a reported `Skipped` entry).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Neither a measured iteration count nor a measured time budget resolved
    /// to a positive value; there is nothing to measure.
    #[error("{scope}: resolved configuration has no measured iterations and no measured time budget")]
    NoMeasurableWork {
        /// Configuration owner ("global" or a unit name).
        scope: String,
    },

    /// Zero launches were requested.
    #[error("{scope}: resolved configuration requests zero launches")]
    ZeroLaunches {
        /// Configuration owner.
        scope: String,
    },

    /// The trim fraction is outside `[0, 0.5)`.
    #[error("{scope}: trim fraction {fraction} outside [0, 0.5)")]
    InvalidTrimFraction {
        /// Configuration owner.
        scope: String,
        /// Offending fraction.
        fraction: f64,
    },

    /// An isolation mode string did not parse.
    #[error("unknown isolation mode '{0}' (expected \"in-process\" or \"process\")")]
    UnknownIsolationMode(String),
}

/// Merge global, category, and per-unit configuration into one effective
/// `RunConfig` for `unit`.
///
/// Overrides are field-level merges, not object replacement: for each field
/// the unit override wins, then the first of the unit's categories (in the
/// unit's own category order) carrying that field, then the global default.
/// Pure and idempotent.
pub fn resolve(
    global: &RunConfig,
    categories: &CategoryOverrides,
    unit: &BenchmarkUnit,
) -> Result<RunConfig, ConfigError> {
    let unit_override = unit.overrides();
    let category_overrides: Vec<&ConfigOverride> = unit
        .categories()
        .iter()
        .filter_map(|c| categories.get(c))
        .collect();

    fn pick<T: Clone>(
        unit_override: Option<&ConfigOverride>,
        category_overrides: &[&ConfigOverride],
        get: impl Fn(&ConfigOverride) -> Option<T>,
        global: T,
    ) -> T {
        if let Some(value) = unit_override.and_then(&get) {
            return value;
        }
        for overrides in category_overrides {
            if let Some(value) = get(overrides) {
                return value;
            }
        }
        global
    }

    let resolved = RunConfig {
        warmup_iterations: pick(
            unit_override,
            &category_overrides,
            |o| o.warmup_iterations,
            global.warmup_iterations,
        ),
        warmup_time_ns: pick(
            unit_override,
            &category_overrides,
            |o| o.warmup_time_ns.map(Some),
            global.warmup_time_ns,
        ),
        measured_iterations: pick(
            unit_override,
            &category_overrides,
            |o| o.measured_iterations,
            global.measured_iterations,
        ),
        measured_time_ns: pick(
            unit_override,
            &category_overrides,
            |o| o.measured_time_ns.map(Some),
            global.measured_time_ns,
        ),
        launches: pick(
            unit_override,
            &category_overrides,
            |o| o.launches,
            global.launches,
        ),
        isolation: pick(
            unit_override,
            &category_overrides,
            |o| o.isolation,
            global.isolation,
        ),
        trim: pick(unit_override, &category_overrides, |o| o.trim, global.trim),
    };

    resolved.validate(unit.name())?;
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(name: &str) -> BenchmarkUnit {
        BenchmarkUnit::new(name, || ())
    }

    #[test]
    fn resolve_falls_back_to_global() {
        let global = RunConfig::default();
        let resolved = resolve(&global, &CategoryOverrides::new(), &unit("plain")).unwrap();
        assert_eq!(resolved, global);
    }

    #[test]
    fn unit_override_beats_category_and_global() {
        let global = RunConfig::default();
        let mut categories = CategoryOverrides::new();
        categories.insert(
            "math",
            ConfigOverride {
                measured_iterations: Some(500),
                launches: Some(3),
                ..Default::default()
            },
        );

        let u = unit("div").category("math").with_overrides(ConfigOverride {
            measured_iterations: Some(25),
            ..Default::default()
        });

        let resolved = resolve(&global, &categories, &u).unwrap();
        // Unit override wins for measured iterations, category fills launches,
        // global fills the rest.
        assert_eq!(resolved.measured_iterations, 25);
        assert_eq!(resolved.launches, 3);
        assert_eq!(resolved.warmup_iterations, global.warmup_iterations);
    }

    #[test]
    fn first_matching_category_wins_per_field() {
        let global = RunConfig::default();
        let mut categories = CategoryOverrides::new();
        categories.insert(
            "a",
            ConfigOverride {
                measured_iterations: Some(10),
                ..Default::default()
            },
        );
        categories.insert(
            "b",
            ConfigOverride {
                measured_iterations: Some(20),
                warmup_iterations: Some(5),
                ..Default::default()
            },
        );

        let u = unit("x").category("a").category("b");
        let resolved = resolve(&global, &categories, &u).unwrap();
        // "a" comes first in the unit's category order and carries the field.
        assert_eq!(resolved.measured_iterations, 10);
        // "a" does not carry warmup, so "b" supplies it.
        assert_eq!(resolved.warmup_iterations, 5);
    }

    #[test]
    fn resolve_is_idempotent() {
        let global = RunConfig {
            measured_time_ns: Some(2_000_000_000),
            ..Default::default()
        };
        let mut categories = CategoryOverrides::new();
        categories.insert(
            "io",
            ConfigOverride {
                launches: Some(5),
                trim: Some(TrimPolicy::Percentile { fraction: 0.05 }),
                ..Default::default()
            },
        );
        let u = unit("read").category("io");

        let first = resolve(&global, &categories, &u).unwrap();
        let second = resolve(&global, &categories, &u).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn no_measurable_work_is_an_error() {
        let global = RunConfig {
            warmup_iterations: 0,
            measured_iterations: 0,
            measured_time_ns: None,
            ..Default::default()
        };
        let err = resolve(&global, &CategoryOverrides::new(), &unit("empty")).unwrap_err();
        assert!(matches!(err, ConfigError::NoMeasurableWork { .. }));
    }

    #[test]
    fn zero_launches_is_an_error() {
        let global = RunConfig {
            launches: 0,
            ..Default::default()
        };
        let err = resolve(&global, &CategoryOverrides::new(), &unit("u")).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroLaunches { .. }));
    }

    #[test]
    fn invalid_trim_fraction_is_an_error() {
        let global = RunConfig {
            trim: TrimPolicy::Percentile { fraction: 0.5 },
            ..Default::default()
        };
        let err = global.validate("global").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTrimFraction { .. }));
    }

    #[test]
    fn isolation_mode_parses() {
        assert_eq!(
            "process".parse::<IsolationMode>().unwrap(),
            IsolationMode::Process
        );
        assert_eq!(
            "in-process".parse::<IsolationMode>().unwrap(),
            IsolationMode::InProcess
        );
        assert!("thread".parse::<IsolationMode>().is_err());
    }
}
