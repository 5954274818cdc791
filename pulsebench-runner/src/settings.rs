//! Settings loading from pulse.toml
//!
//! Harness settings can be specified in a `pulse.toml` file, discovered by
//! walking up from the current directory. Durations are written with a unit
//! suffix ("3s", "500ms") and converted to nanoseconds at load time.

use std::collections::HashMap;
use std::path::Path;

use pulsebench_core::{CategoryOverrides, ConfigOverride, IsolationMode, RunConfig, TrimPolicy};
use serde::{Deserialize, Serialize};

/// Top-level pulse.toml contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Global run defaults.
    #[serde(default)]
    pub run: RunSection,
    /// Per-category overrides, keyed by category tag.
    #[serde(default)]
    pub categories: HashMap<String, OverrideSection>,
    /// Per-unit overrides, keyed by unit name.
    #[serde(default)]
    pub units: HashMap<String, OverrideSection>,
    /// Output configuration.
    #[serde(default)]
    pub output: OutputSettings,
}

/// Global run defaults, all optional; missing fields keep built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSection {
    /// Warmup iteration count.
    pub warmup_iterations: Option<u64>,
    /// Warmup time budget (e.g. "500ms").
    pub warmup_time: Option<String>,
    /// Measured iteration count.
    pub measured_iterations: Option<u64>,
    /// Measured time budget (e.g. "5s").
    pub measured_time: Option<String>,
    /// Independent launches per unit.
    pub launches: Option<u32>,
    /// Isolation mode: "in-process" or "process".
    pub isolation: Option<String>,
    /// Trim fraction per tail, in `[0, 0.5)`. Absent means no trimming.
    pub trim_fraction: Option<f64>,
}

/// One override block, for a category or a unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverrideSection {
    /// Warmup iteration count.
    pub warmup_iterations: Option<u64>,
    /// Warmup time budget.
    pub warmup_time: Option<String>,
    /// Measured iteration count.
    pub measured_iterations: Option<u64>,
    /// Measured time budget.
    pub measured_time: Option<String>,
    /// Independent launches per unit.
    pub launches: Option<u32>,
    /// Isolation mode.
    pub isolation: Option<String>,
    /// Trim fraction per tail.
    pub trim_fraction: Option<f64>,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Default output format: "human" or "json".
    #[serde(default = "default_format")]
    pub format: String,
    /// JSON report path.
    #[serde(default = "default_json_path")]
    pub json_path: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: default_format(),
            json_path: default_json_path(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}
fn default_json_path() -> String {
    "target/pulsebench/report.json".to_string()
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Discover and load settings by walking up from the current directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let path = dir.join("pulse.toml");
            if path.exists() {
                return Self::load(&path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Build the global run configuration from the `[run]` section.
    pub fn global_config(&self) -> anyhow::Result<RunConfig> {
        let defaults = RunConfig::default();
        let run = &self.run;
        Ok(RunConfig {
            warmup_iterations: run.warmup_iterations.unwrap_or(defaults.warmup_iterations),
            warmup_time_ns: parse_opt_duration(run.warmup_time.as_deref())?,
            measured_iterations: run
                .measured_iterations
                .unwrap_or(defaults.measured_iterations),
            measured_time_ns: parse_opt_duration(run.measured_time.as_deref())?,
            launches: run.launches.unwrap_or(defaults.launches),
            isolation: match run.isolation.as_deref() {
                Some(s) => s.parse()?,
                None => defaults.isolation,
            },
            trim: match run.trim_fraction {
                Some(fraction) => TrimPolicy::Percentile { fraction },
                None => defaults.trim,
            },
        })
    }

    /// Build category-level overrides from the `[categories.*]` tables.
    pub fn category_overrides(&self) -> anyhow::Result<CategoryOverrides> {
        let mut out = CategoryOverrides::new();
        for (category, section) in &self.categories {
            out.insert(category.clone(), section.to_override()?);
        }
        Ok(out)
    }

    /// Look up the override block for a unit, converted for resolution.
    pub fn unit_override(&self, unit_name: &str) -> anyhow::Result<Option<ConfigOverride>> {
        self.units
            .get(unit_name)
            .map(|section| section.to_override())
            .transpose()
    }

    /// A commented template pulse.toml.
    pub fn default_toml() -> String {
        r#"# Pulsebench Configuration

[run]
# Warmup invocations before measurement
warmup_iterations = 50
# Warmup time budget (advisory when warmup_iterations is set)
# warmup_time = "500ms"
# Measured invocations per launch
measured_iterations = 100
# Measured time budget, used when measured_iterations = 0
# measured_time = "5s"
# Independent launches per unit
launches = 1
# Isolation mode: "in-process" or "process"
isolation = "in-process"
# Trim fraction per tail for mean/stddev (uncomment to enable)
# trim_fraction = 0.05

# Category-level overrides
# [categories.slow]
# measured_iterations = 10
# launches = 3

# Unit-level overrides
# [units.parse_large_file]
# warmup_iterations = 5

[output]
# Output format: "human" or "json"
format = "human"
# JSON report path
json_path = "target/pulsebench/report.json"
"#
        .to_string()
    }
}

impl OverrideSection {
    /// Convert this block into a field-level override.
    pub fn to_override(&self) -> anyhow::Result<ConfigOverride> {
        Ok(ConfigOverride {
            warmup_iterations: self.warmup_iterations,
            warmup_time_ns: parse_opt_duration(self.warmup_time.as_deref())?,
            measured_iterations: self.measured_iterations,
            measured_time_ns: parse_opt_duration(self.measured_time.as_deref())?,
            launches: self.launches,
            isolation: self
                .isolation
                .as_deref()
                .map(|s| s.parse::<IsolationMode>())
                .transpose()?,
            trim: self
                .trim_fraction
                .map(|fraction| TrimPolicy::Percentile { fraction }),
        })
    }
}

/// Parse a duration string (e.g. "3s", "500ms", "2m") to nanoseconds.
pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    if s.is_empty() {
        return Err(anyhow::anyhow!("empty duration string"));
    }

    let (num_part, unit_part) = s
        .char_indices()
        .find(|(_, c)| c.is_alphabetic())
        .map(|(i, _)| s.split_at(i))
        .unwrap_or((s, "s"));

    let value: f64 = num_part
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration number: {}", num_part))?;

    let multiplier: u64 = match unit_part.to_lowercase().as_str() {
        "ns" => 1,
        "us" | "µs" => 1_000,
        "ms" => 1_000_000,
        "s" | "" => 1_000_000_000,
        "m" | "min" => 60_000_000_000,
        _ => return Err(anyhow::anyhow!("unknown duration unit: {}", unit_part)),
    };

    Ok((value * multiplier as f64) as u64)
}

fn parse_opt_duration(s: Option<&str>) -> anyhow::Result<Option<u64>> {
    s.map(parse_duration).transpose()
}
