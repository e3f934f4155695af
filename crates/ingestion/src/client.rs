//! Stream client
//!
//! Opens the event stream over HTTP and drives parsed events into a
//! [`StreamHandler`] until end of data, a handler stop, or shutdown.

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use contracts::ShutdownSignal;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use reqwest::StatusCode;
use tracing::{debug, info, instrument, warn};

use crate::config::{StreamConfig, StreamMetrics};
use crate::dispatch::{decode, route, StreamHandler};
use crate::error::{IngestionError, Result};
use crate::line_buffer::LineBuffer;
use crate::sse::{RawEvent, SseLineParser};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// How a stream run ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the stream
    Eof,
    /// Shutdown was requested
    Cancelled,
    /// The handler returned `ControlFlow::Break`
    Stopped,
}

/// HTTP client for the event stream
#[derive(Debug, Clone)]
pub struct StreamClient {
    http: reqwest::Client,
    config: StreamConfig,
}

impl StreamClient {
    /// Create a client with the default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(StreamConfig::default())
    }

    /// Create a client with a custom configuration
    pub fn with_config(config: StreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(IngestionError::Client)?;

        Ok(Self { http, config })
    }

    /// Open the stream. Fails before yielding any event on transport
    /// errors or a non-200 status.
    #[instrument(name = "stream_connect", skip(self, url, secret))]
    pub async fn connect(&self, url: &str, secret: &str) -> Result<EventStream> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", secret))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(IngestionError::Connect)?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Stream rejected connection");
            return Err(IngestionError::Status {
                status: status.as_u16(),
            });
        }

        info!("Stream connected");

        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| IngestionError::read(e.to_string())));

        Ok(EventStream::new(chunks, self.config.max_line_bytes))
    }

    /// Connect and run the stream to completion.
    ///
    /// Shutdown during connect returns `StreamEnd::Cancelled` without
    /// touching the handler.
    pub async fn stream<H: StreamHandler>(
        &self,
        url: &str,
        secret: &str,
        handler: &mut H,
        shutdown: &mut ShutdownSignal,
    ) -> Result<StreamEnd> {
        let mut events = tokio::select! {
            biased;
            _ = shutdown.triggered() => return Ok(StreamEnd::Cancelled),
            connected = self.connect(url, secret) => connected?,
        };

        events.run(handler, shutdown).await
    }
}

/// Parsed event stream over an arbitrary byte stream
pub struct EventStream {
    chunks: ByteStream,
    lines: LineBuffer,
    parser: SseLineParser,
    metrics: Arc<StreamMetrics>,
    eof: bool,
}

impl EventStream {
    /// Wrap a byte stream with an explicit line limit
    pub fn new<S>(chunks: S, max_line_bytes: usize) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self {
            chunks: Box::pin(chunks),
            lines: LineBuffer::with_limit(max_line_bytes),
            parser: SseLineParser::new(),
            metrics: Arc::new(StreamMetrics::new()),
            eof: false,
        }
    }

    /// Wrap a byte stream with the default line limit
    pub fn from_byte_stream<S>(chunks: S) -> Self
    where
        S: Stream<Item = Result<Bytes>> + Send + 'static,
    {
        Self::new(chunks, crate::line_buffer::MAX_LINE_BYTES)
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<StreamMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Next (kind, data) pair, `None` at end of stream.
    ///
    /// Cancel-safe: the only suspension point is the chunk read and all
    /// partial state lives in `self`.
    pub async fn next_event(&mut self) -> Result<Option<RawEvent>> {
        loop {
            while let Some(line) = self.lines.next_line()? {
                if let Some(event) = self.feed(&line) {
                    return Ok(Some(event));
                }
            }

            if self.eof {
                return Ok(None);
            }

            match self.chunks.next().await {
                Some(Ok(chunk)) => {
                    self.metrics.record_bytes(chunk.len());
                    self.lines.extend(&chunk);
                }
                Some(Err(e)) => return Err(e),
                None => {
                    self.eof = true;
                    if let Some(line) = self.lines.finish()? {
                        if let Some(event) = self.feed(&line) {
                            return Ok(Some(event));
                        }
                    }
                }
            }
        }
    }

    fn feed(&mut self, line: &str) -> Option<RawEvent> {
        self.metrics.record_line();
        let event = self.parser.feed_line(line)?;
        self.metrics.record_event();
        Some(event)
    }

    /// Drive events into `handler` one at a time.
    ///
    /// Shutdown is observed around every read and between events. A read
    /// error that races with shutdown counts as cancellation.
    #[instrument(name = "stream_run", skip_all)]
    pub async fn run<H: StreamHandler>(
        &mut self,
        handler: &mut H,
        shutdown: &mut ShutdownSignal,
    ) -> Result<StreamEnd> {
        let end = loop {
            if shutdown.is_triggered() {
                break StreamEnd::Cancelled;
            }

            let next = tokio::select! {
                biased;
                _ = shutdown.triggered() => break StreamEnd::Cancelled,
                next = self.next_event() => next,
            };

            let raw = match next {
                Ok(Some(raw)) => raw,
                Ok(None) => break StreamEnd::Eof,
                Err(e) if shutdown.is_triggered() => {
                    debug!(error = %e, "Read error after shutdown request");
                    break StreamEnd::Cancelled;
                }
                Err(e) => return Err(e),
            };

            let Some(event) = decode(raw) else {
                self.metrics.record_decode_failure();
                continue;
            };

            if route(event, handler).await.is_break() {
                break StreamEnd::Stopped;
            }
        };

        let snapshot = self.metrics.snapshot();
        debug!(
            end = ?end,
            bytes_read = snapshot.bytes_read,
            lines_read = snapshot.lines_read,
            events_parsed = snapshot.events_parsed,
            decode_failures = snapshot.decode_failures,
            "Stream finished"
        );

        Ok(end)
    }
}
