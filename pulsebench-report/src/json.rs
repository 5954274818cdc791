//! JSON Output

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::report::RunReport;
use crate::sink::{ReportSink, SinkError};

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Sink that writes the report as pretty-printed JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    /// Sink writing to `path`, created or truncated on emit.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Destination path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ReportSink for JsonSink {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        let rendered = generate_json_report(report)?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(rendered.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportMeta, ReportSummary, RunStatus};
    use chrono::Utc;
    use pulsebench_core::RunConfig;

    fn report() -> RunReport {
        let now = Utc::now();
        RunReport {
            meta: ReportMeta {
                schema_version: crate::SCHEMA_VERSION,
                harness_version: env!("CARGO_PKG_VERSION").to_string(),
                started_at: now,
                finished_at: now,
                global_config: RunConfig::default(),
            },
            units: Vec::new(),
            summary: ReportSummary::default(),
            status: RunStatus::AllPassed,
        }
    }

    #[test]
    fn json_sink_writes_parseable_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut sink = JsonSink::new(&path);
        sink.emit(&report()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let back: RunReport = serde_json::from_str(&written).unwrap();
        assert_eq!(back.meta.schema_version, crate::SCHEMA_VERSION);
    }
}
