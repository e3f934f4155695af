//! Pipeline orchestrator - owns the run lifecycle.
//!
//! `Idle → Connecting → Streaming → Draining → Done`: resolve the stream
//! address (session or direct secret), open the stream, fan every record out
//! through the dispatcher, then close the sinks and aggregate the outcomes.

use std::ops::ControlFlow;
use std::time::Instant;

use contracts::{RelayConfig, ShutdownSignal, StreamMeta, StreamRecord};
use dispatcher::{create_dispatcher, Dispatcher};
use ingestion::{StreamClient, StreamEnd, StreamHandler};
use observability::DeliveryStatsAggregator;
use session::{direct_stream_url, SessionClient};
use tracing::{debug, info, instrument, warn};

use super::PipelineStats;
use crate::error::{CliError, Result};
use crate::output::Console;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated relay configuration
    pub relay: RelayConfig,

    /// Version shown in the banner
    pub version: String,
}

/// Run lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Connecting,
    Streaming,
    Draining,
    Done,
}

/// Resolved stream credentials
struct StreamTarget {
    url: String,
    secret: String,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
    console: Console,
    state: RunState,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig, console: Console) -> Self {
        Self {
            config,
            console,
            state: RunState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!(from = ?self.state, to = ?next, "Run state");
        self.state = next;
    }

    /// Run the pipeline to completion.
    ///
    /// Errors are fatal failures before streaming began (session, file sink,
    /// stream connect). Everything after that is reported in the stats.
    #[instrument(name = "pipeline_run", skip_all)]
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<PipelineStats> {
        let started = Instant::now();
        self.transition(RunState::Connecting);

        let Some(target) = self.resolve_target(&mut shutdown).await? else {
            return Ok(self.cancelled_early(started));
        };

        let relay = self.config.relay.clone();
        let dispatcher = create_dispatcher(&relay, &target.secret)?;
        let mut handler = RelayHandler::new(dispatcher, self.console, relay.show_payload);

        let client = StreamClient::new()?;
        let events = tokio::select! {
            biased;
            _ = shutdown.triggered() => None,
            connected = client.connect(&target.url, &target.secret) => Some(connected),
        };

        let mut events = match events {
            Some(Ok(events)) => events,
            Some(Err(e)) => {
                handler.dispatcher.close().await;
                return Err(e.into());
            }
            None => {
                handler.dispatcher.close().await;
                return Ok(self.cancelled_early(started));
            }
        };

        self.transition(RunState::Streaming);
        let end = events.run(&mut handler, &mut shutdown).await;

        self.transition(RunState::Draining);
        handler.dispatcher.close().await;

        let mut result = handler.dispatcher.result(started.elapsed());
        let interrupted = match end {
            Ok(StreamEnd::Cancelled) => true,
            Ok(StreamEnd::Eof) | Ok(StreamEnd::Stopped) => false,
            Err(e) => {
                warn!(error = %e, "Stream ended with error");
                self.console.error(&format!("stream error: {}", e));
                result = result.with_stream_error(e.to_string());
                false
            }
        };
        if let Some(message) = handler.stream_error.take() {
            result = result.with_stream_error(message);
        }

        let stats = PipelineStats {
            saved: handler.dispatcher.saved(),
            file: relay.file().map(|p| p.to_path_buf()),
            delivered: handler.dispatcher.has_webhook(),
            interrupted,
            sinks: handler.dispatcher.metrics(),
            stream: events.metrics().snapshot(),
            deliveries: handler.deliveries,
            result,
        };

        self.transition(RunState::Done);
        Ok(stats)
    }

    /// Resolve stream address and secret. `None` when shutdown won the race.
    async fn resolve_target(&self, shutdown: &mut ShutdownSignal) -> Result<Option<StreamTarget>> {
        let relay = &self.config.relay;
        let targets = relay.describe_targets();

        let Some(api_key) = relay.api_key() else {
            let secret = relay.secret().unwrap_or_default().to_string();
            let url = direct_stream_url(&relay.api_endpoint, &secret)?;

            self.console
                .banner(&self.config.version, &targets, "Secret", None);
            self.console.connecting();
            self.console.flush();
            return Ok(Some(StreamTarget { url, secret }));
        };

        self.console.connecting();
        self.console.flush();

        let client = SessionClient::new(&relay.api_endpoint)?;
        let session = tokio::select! {
            biased;
            _ = shutdown.triggered() => return Ok(None),
            session = client.create_session(api_key, relay.secret()) => session?,
        };

        info!(
            test_id = %session.test_id,
            stream_duration_seconds = session.stream_duration_seconds,
            "Session created"
        );

        self.console.info(&format!("Signing secret: {}", session.secret));
        self.console.banner(
            &self.config.version,
            &targets,
            "API key",
            Some(session.stream_duration_seconds),
        );

        Ok(Some(StreamTarget {
            url: session.stream_url,
            secret: session.secret,
        }))
    }

    fn cancelled_early(&mut self, started: Instant) -> PipelineStats {
        info!("Cancelled before streaming started");
        self.transition(RunState::Done);

        let mut stats = PipelineStats {
            interrupted: true,
            ..Default::default()
        };
        stats.result.elapsed = started.elapsed();
        stats
    }
}

/// Stream handler: fans records out through the dispatcher and renders
/// progress.
struct RelayHandler {
    dispatcher: Dispatcher,
    console: Console,
    show_payload: bool,
    connected: bool,
    stream_error: Option<String>,
    deliveries: DeliveryStatsAggregator,
}

impl RelayHandler {
    fn new(dispatcher: Dispatcher, console: Console, show_payload: bool) -> Self {
        Self {
            dispatcher,
            console,
            show_payload,
            connected: false,
            stream_error: None,
            deliveries: DeliveryStatsAggregator::new(),
        }
    }

    /// "Connected" fires once, on the first meta or payload
    fn mark_connected(&mut self) {
        if !self.connected {
            self.connected = true;
            self.console.connected();
        }
    }
}

impl StreamHandler for RelayHandler {
    async fn on_meta(&mut self, meta: StreamMeta) -> ControlFlow<()> {
        self.mark_connected();
        info!(
            test_id = %meta.test_id,
            stream_duration_seconds = meta.stream_duration_seconds,
            "Stream meta"
        );
        ControlFlow::Continue(())
    }

    async fn on_payload(&mut self, record: StreamRecord) -> ControlFlow<()> {
        self.mark_connected();
        let dispatched = self.dispatcher.dispatch(&record).await;

        match &dispatched.outcome {
            Some(outcome) => {
                self.deliveries.update(outcome);
                self.console.delivery(outcome);
            }
            None if dispatched.saved => {
                self.console.saved(dispatched.index, record.common_name());
            }
            None => {}
        }

        if self.show_payload {
            self.console.payload(&record);
        }

        ControlFlow::Continue(())
    }

    async fn on_complete(&mut self, message: String) -> ControlFlow<()> {
        info!(message = %message, "Stream complete");
        self.console.info(&format!("Stream complete: {}", message));
        ControlFlow::Continue(())
    }

    async fn on_error(&mut self, message: String) -> ControlFlow<()> {
        warn!(message = %message, "Stream error event");
        self.console.error(&format!("Stream error: {}", message));
        self.stream_error = Some(message);
        ControlFlow::Break(())
    }
}
