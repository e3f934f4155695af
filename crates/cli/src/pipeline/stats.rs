//! Pipeline statistics and exit status.

use std::path::PathBuf;

use contracts::RunResult;
use dispatcher::MetricsSnapshot;
use ingestion::StreamMetricsSnapshot;
use observability::DeliveryStatsAggregator;

use crate::output::Console;

/// Process exit status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// No delivery failed
    Success,
    /// At least one delivery failed (or a signature did not verify)
    Failed,
    /// Session/connection/read failure, stream error, or a run cancelled
    /// before any record was processed
    Fatal,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::Fatal => 2,
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Aggregate over all delivery outcomes
    pub result: RunResult,

    /// Records appended to the JSONL file
    pub saved: u64,

    /// JSONL file path, when the file sink was active
    pub file: Option<PathBuf>,

    /// Whether the HTTP sink was active
    pub delivered: bool,

    /// Whether the run was ended by a shutdown request
    pub interrupted: bool,

    /// Per-sink write counters
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Stream reader counters
    pub stream: StreamMetricsSnapshot,

    /// Latency distribution of deliveries
    pub deliveries: DeliveryStatsAggregator,
}

impl PipelineStats {
    /// Whether any record reached a sink
    pub fn has_output(&self) -> bool {
        self.result.records > 0
    }

    /// Map the run to an exit status.
    ///
    /// A cancellation with output falls back to the delivery rule; without
    /// output it is an incomplete run.
    pub fn exit_status(&self) -> ExitStatus {
        if self.result.stream_error.is_some() || (self.interrupted && !self.has_output()) {
            ExitStatus::Fatal
        } else if self.result.failed > 0 {
            ExitStatus::Failed
        } else {
            ExitStatus::Success
        }
    }

    /// Print the end-of-run block
    pub fn print_summary(&self, console: &Console) {
        if let Some(file) = &self.file {
            console.info(&format!("Saved {} payloads to {}", self.saved, file.display()));
        }

        if self.delivered {
            console.summary(&self.result);
        }

        if self.interrupted && self.has_output() {
            console.interrupted();
        }

        tracing::info!(
            records = self.result.records,
            succeeded = self.result.succeeded,
            failed = self.result.failed,
            saved = self.saved,
            events = self.stream.events_parsed,
            decode_failures = self.stream.decode_failures,
            elapsed_secs = self.result.elapsed.as_secs_f64(),
            "Run finished"
        );
        if self.deliveries.total > 0 {
            tracing::debug!(summary = %self.deliveries.summary(), "Delivery latency");
        }
        for (sink, metrics) in &self.sinks {
            tracing::debug!(
                sink = %sink,
                writes = metrics.write_count,
                failures = metrics.failure_count,
                "Sink totals"
            );
        }
    }
}
