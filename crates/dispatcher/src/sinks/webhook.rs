//! WebhookSink - signs and POSTs each record to the user's endpoint

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{DeliveryOutcome, StreamRecord};
use reqwest::header::{CONTENT_TYPE, USER_AGENT as USER_AGENT_HEADER};
use tracing::{debug, instrument, warn};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;
use crate::signer::signature_header;

/// Fixed per-request timeout
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Product token sent as `User-Agent`
pub const USER_AGENT: &str = "CertWatch-Webhook/1.0";

pub const EVENT_ID_HEADER: &str = "X-CertWatch-Event-Id";
pub const TIMESTAMP_HEADER: &str = "X-CertWatch-Timestamp";
pub const SIGNATURE_HEADER: &str = "X-CertWatch-Signature";

/// HTTP delivery client.
///
/// Each call produces exactly one [`DeliveryOutcome`]; failures never
/// escape as errors and are never retried.
pub struct WebhookSink {
    name: String,
    http: reqwest::Client,
    target_url: String,
    secret: String,
    metrics: Arc<SinkMetrics>,
}

impl WebhookSink {
    /// Create a WebhookSink with the fixed delivery timeout
    pub fn new(
        target_url: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self, DispatcherError> {
        Self::with_timeout(target_url, secret, DELIVERY_TIMEOUT)
    }

    /// Create a WebhookSink with a custom timeout
    pub fn with_timeout(
        target_url: impl Into<String>,
        secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DispatcherError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            name: "http".to_string(),
            http,
            target_url: target_url.into(),
            secret: secret.into(),
            metrics: Arc::new(SinkMetrics::new()),
        })
    }

    /// Sink name (used for logging/metrics)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Delivery target
    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// Shared metrics handle
    pub fn metrics(&self) -> Arc<SinkMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Serialize, sign and deliver `record`
    pub async fn deliver(&self, record: &StreamRecord, index: u64) -> DeliveryOutcome {
        match record.to_canonical_json() {
            Ok(body) => self.deliver_body(record, body, index).await,
            Err(e) => {
                let outcome = DeliveryOutcome::no_response(
                    index,
                    record.common_name(),
                    0,
                    format!("failed to serialize payload: {}", e),
                );
                self.finish(outcome)
            }
        }
    }

    /// Deliver an already-serialized record.
    ///
    /// `body` must be the record's canonical JSON; it is signed and sent
    /// byte-for-byte.
    #[instrument(
        name = "webhook_deliver",
        skip(self, record, body),
        fields(event_id = %record.event_id, bytes = body.len())
    )]
    pub async fn deliver_body(
        &self,
        record: &StreamRecord,
        body: Vec<u8>,
        index: u64,
    ) -> DeliveryOutcome {
        let signature = signature_header(&body, &self.secret);

        let request = self
            .http
            .post(&self.target_url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT_HEADER, USER_AGENT)
            .header(EVENT_ID_HEADER, &record.event_id)
            .header(TIMESTAMP_HEADER, &record.timestamp)
            .header(SIGNATURE_HEADER, signature)
            .body(body);

        let started = Instant::now();
        let response = request.send().await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let outcome = match response {
            Ok(response) => {
                let status = response.status();
                DeliveryOutcome::responded(
                    index,
                    record.common_name(),
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    latency_ms,
                )
            }
            Err(e) => DeliveryOutcome::no_response(
                index,
                record.common_name(),
                latency_ms,
                format!("delivery failed: {}", e),
            ),
        };

        self.finish(outcome)
    }

    fn finish(&self, outcome: DeliveryOutcome) -> DeliveryOutcome {
        self.metrics.record(&self.name, outcome.success);
        observability::record_delivery(&outcome);

        if outcome.success {
            debug!(
                index = outcome.index,
                status = outcome.status,
                latency_ms = outcome.latency_ms,
                "Delivered"
            );
        } else {
            warn!(
                index = outcome.index,
                status = outcome.status,
                latency_ms = outcome.latency_ms,
                error = outcome.error.as_deref().unwrap_or_default(),
                "Delivery failed"
            );
        }

        outcome
    }
}
