//! Dispatcher - sequential fan-out of each record to the active sinks

use std::sync::Arc;

use contracts::{DeliveryOutcome, RecordSink, RelayConfig, RunResult, StreamRecord};
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FileSink, RawSink, WebhookSink};

/// Builder for creating a Dispatcher
#[derive(Default)]
pub struct DispatcherBuilder {
    raw: Option<RawSink>,
    file: Option<FileSink>,
    webhook: Option<WebhookSink>,
}

impl DispatcherBuilder {
    /// Create an empty builder (no sinks)
    pub fn new() -> Self {
        Self::default()
    }

    /// Echo records to a raw sink
    pub fn raw(mut self, sink: RawSink) -> Self {
        self.raw = Some(sink);
        self
    }

    /// Append records to a JSONL file
    pub fn file(mut self, sink: FileSink) -> Self {
        self.file = Some(sink);
        self
    }

    /// Deliver records over HTTP
    pub fn webhook(mut self, sink: WebhookSink) -> Self {
        self.webhook = Some(sink);
        self
    }

    /// Build the dispatcher
    pub fn build(self) -> Dispatcher {
        let metrics = |enabled: bool| enabled.then(|| Arc::new(SinkMetrics::new()));

        Dispatcher {
            raw_metrics: metrics(self.raw.is_some()),
            file_metrics: metrics(self.file.is_some()),
            raw: self.raw,
            file: self.file,
            webhook: self.webhook,
            next_index: 1,
            outcomes: Vec::new(),
            closed: false,
        }
    }
}

/// Result of dispatching one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    /// Sequence index assigned to the record
    pub index: u64,

    /// HTTP delivery outcome, if the HTTP sink is active
    pub outcome: Option<DeliveryOutcome>,

    /// Whether the record was appended to the file sink
    pub saved: bool,
}

/// Fans each record out to raw → file → HTTP, in that order.
///
/// Owns the sequence counter and the outcome ledger; a record is fully
/// processed before `dispatch` returns, so indices are dense and follow
/// arrival order.
pub struct Dispatcher {
    raw: Option<RawSink>,
    file: Option<FileSink>,
    webhook: Option<WebhookSink>,
    raw_metrics: Option<Arc<SinkMetrics>>,
    file_metrics: Option<Arc<SinkMetrics>>,
    next_index: u64,
    outcomes: Vec<DeliveryOutcome>,
    closed: bool,
}

impl Dispatcher {
    /// Start building a dispatcher
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Whether the HTTP sink is active
    pub fn has_webhook(&self) -> bool {
        self.webhook.is_some()
    }

    /// Whether the file sink is active
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Whether the raw sink is active
    pub fn has_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Records dispatched so far
    pub fn records(&self) -> u64 {
        self.next_index - 1
    }

    /// Ordered delivery outcomes
    pub fn outcomes(&self) -> &[DeliveryOutcome] {
        &self.outcomes
    }

    /// Records appended to the file sink
    pub fn saved(&self) -> u64 {
        self.file.as_ref().map_or(0, FileSink::written)
    }

    /// Get metrics for all active sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut metrics = Vec::new();
        if let Some(m) = &self.raw_metrics {
            metrics.push(("raw".to_string(), m.snapshot()));
        }
        if let Some(m) = &self.file_metrics {
            metrics.push(("file".to_string(), m.snapshot()));
        }
        if let Some(sink) = &self.webhook {
            metrics.push((sink.name().to_string(), sink.metrics().snapshot()));
        }
        metrics
    }

    /// Assign the next index and drive every active sink.
    ///
    /// Raw and file failures are logged and never affect the outcome.
    #[instrument(
        name = "dispatcher_dispatch",
        skip(self, record),
        fields(index = self.next_index, event_id = %record.event_id)
    )]
    pub async fn dispatch(&mut self, record: &StreamRecord) -> Dispatched {
        let index = self.next_index;
        self.next_index += 1;
        observability::record_last_index(index);

        let line = match record.to_canonical_json() {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(index, error = %e, "Record could not be serialized");
                None
            }
        };

        if let (Some(sink), Some(line)) = (self.raw.as_mut(), line.as_deref()) {
            let result = sink.write(record, line).await;
            Self::observe(sink.name(), self.raw_metrics.as_deref(), result);
        }

        let mut saved = false;
        if let (Some(sink), Some(line)) = (self.file.as_mut(), line.as_deref()) {
            let result = sink.write(record, line).await;
            saved = result.is_ok();
            Self::observe(sink.name(), self.file_metrics.as_deref(), result);
        }

        let outcome = match (&self.webhook, line) {
            (Some(sink), Some(line)) => Some(sink.deliver_body(record, line, index).await),
            (Some(sink), None) => Some(sink.deliver(record, index).await),
            (None, _) => None,
        };

        if let Some(outcome) = &outcome {
            self.outcomes.push(outcome.clone());
        }

        Dispatched {
            index,
            outcome,
            saved,
        }
    }

    fn observe(
        sink_name: &str,
        metrics: Option<&SinkMetrics>,
        result: Result<(), contracts::ContractError>,
    ) {
        if let Some(metrics) = metrics {
            metrics.record(sink_name, result.is_ok());
        }
        if let Err(e) = result {
            warn!(sink = sink_name, error = %e, "Sink write failed");
        }
    }

    /// Flush and close the raw and file sinks. Runs at most once.
    #[instrument(name = "dispatcher_close", skip(self))]
    pub async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(sink) = self.raw.as_mut() {
            if let Err(e) = sink.close().await {
                warn!(sink = "raw", error = %e, "Sink close failed");
            }
        }
        if let Some(sink) = self.file.as_mut() {
            if let Err(e) = sink.close().await {
                warn!(sink = "file", error = %e, "Sink close failed");
            }
        }

        debug!(records = self.records(), outcomes = self.outcomes.len(), "Dispatcher closed");
    }

    /// Aggregate the ledger into a RunResult
    pub fn result(&self, elapsed: std::time::Duration) -> RunResult {
        RunResult::from_outcomes(&self.outcomes, self.records(), elapsed)
    }
}

/// Create a dispatcher from the relay configuration.
///
/// `secret` is the resolved signing secret (session-issued or user-provided).
#[instrument(name = "dispatcher_create", skip(config, secret))]
pub fn create_dispatcher(config: &RelayConfig, secret: &str) -> Result<Dispatcher, DispatcherError> {
    let mut builder = Dispatcher::builder();

    if config.raw {
        builder = builder.raw(RawSink::stdout());
    }
    if let Some(path) = config.file() {
        builder = builder.file(FileSink::open(path)?);
    }
    if let Some(url) = config.target_url() {
        builder = builder.webhook(WebhookSink::new(url, secret)?);
    }

    let dispatcher = builder.build();
    info!(
        raw = dispatcher.has_raw(),
        file = dispatcher.has_file(),
        http = dispatcher.has_webhook(),
        "Dispatcher created"
    );

    Ok(dispatcher)
}
