//! Report Sink Interface
//!
//! A sink consumes a finished, immutable report exactly once, after all
//! units have run. Sinks never observe intermediate state.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::report::RunReport;

/// Errors surfaced by report sinks.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the rendered report failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the report failed.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Consumer of a finished run report.
pub trait ReportSink {
    /// Deliver the finished report. Called exactly once per run.
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError>;
}

/// Sink that retains the report in memory, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    captured: Arc<Mutex<Option<RunReport>>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured report, if a run has emitted one.
    pub fn report(&self) -> Option<RunReport> {
        self.captured.lock().ok().and_then(|slot| slot.clone())
    }
}

impl ReportSink for MemorySink {
    fn emit(&mut self, report: &RunReport) -> Result<(), SinkError> {
        if let Ok(mut slot) = self.captured.lock() {
            *slot = Some(report.clone());
        }
        Ok(())
    }
}
