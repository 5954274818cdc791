//! Console Output
//!
//! Human-readable terminal rendering with status icons, per-unit timing
//! metrics, and a run summary.

use std::io::Write;

use crate::report::{RunReport, UnitReport, UnitStatus};
use crate::sink::{ReportSink, SinkError};

/// Format a nanosecond duration with a human-friendly unit.
pub fn format_duration(ns: f64) -> String {
    if ns < 1_000.0 {
        format!("{:.2} ns", ns)
    } else if ns < 1_000_000.0 {
        format!("{:.2} µs", ns / 1_000.0)
    } else if ns < 1_000_000_000.0 {
        format!("{:.2} ms", ns / 1_000_000.0)
    } else {
        format!("{:.2} s", ns / 1_000_000_000.0)
    }
}

/// Render a report for terminal display.
pub fn format_human_output(report: &RunReport) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("Pulsebench Results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    for unit in &report.units {
        format_unit(&mut output, unit);
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Total: {}  Completed: {}  Failed: {}  Skipped: {}\n",
        report.summary.total_units,
        report.summary.completed,
        report.summary.failed,
        report.summary.skipped
    ));
    output.push_str(&format!("  Samples: {}\n", report.summary.total_samples));

    output
}

fn format_unit(output: &mut String, unit: &UnitReport) {
    let status_icon = match unit.status {
        UnitStatus::Completed => "✓",
        UnitStatus::Failed => "✗",
        UnitStatus::Skipped => "⊘",
    };

    let categories = if unit.categories.is_empty() {
        String::new()
    } else {
        format!("  [{}]", unit.categories.join(", "))
    };
    output.push_str(&format!("  {} {}{}\n", status_icon, unit.name, categories));

    if let Some(combined) = &unit.combined {
        output.push_str(&format!(
            "      mean: {}  stddev: {}  cv: {:.2}%\n",
            format_duration(combined.mean_ns),
            format_duration(combined.std_dev_ns),
            combined.coefficient_of_variation()
        ));
        output.push_str(&format!(
            "      min: {}  max: {}  samples: {}\n",
            format_duration(combined.min_ns),
            format_duration(combined.max_ns),
            combined.sample_count
        ));
        output.push_str(&format!(
            "      p50: {}  p95: {}  p99: {}\n",
            format_duration(combined.percentiles.p50),
            format_duration(combined.percentiles.p95),
            format_duration(combined.percentiles.p99)
        ));
        if let Some(ops) = combined.ops_per_second {
            output.push_str(&format!("      throughput: {:.2} ops/sec\n", ops));
        }
        if unit.launches.len() > 1 {
            output.push_str(&format!(
                "      launches: {} (combined by median)\n",
                unit.launches.len()
            ));
        }
    }

    if let Some(failure) = &unit.failure {
        output.push_str(&format!("      error: {}\n", failure.message));
    }
    for launch in &unit.launches {
        if let Some(err) = &launch.teardown_error {
            output.push_str(&format!(
                "      teardown (launch {}): {}\n",
                launch.index, err
            ));
        }
    }

    output.push('\n');
}

/// Sink that renders the report to any writer, stdout by default.
pub struct ConsoleSink<W: Write> {
    writer: W,
}

impl ConsoleSink<std::io::Stdout> {
    /// Console sink writing to stdout.
    pub fn stdout() -> Self {
        Self {
            writer: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Console sink writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink and recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for ConsoleSink<W> {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        self.writer
            .write_all(format_human_output(report).as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}
