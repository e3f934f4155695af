//! # Ingestion Pipeline
//!
//! Event-stream ingestion module.
//!
//! Responsibilities:
//! - Open the certificate-transparency event stream (HTTP GET, bearer auth)
//! - Split the byte stream into lines and parse server-sent-event framing
//! - Decode each event by kind and hand it to a `StreamHandler`
//! - Observe cooperative shutdown between lines and around every network read
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{StreamClient, StreamEnd};
//!
//! let client = StreamClient::new()?;
//! let end = client.stream(&url, &secret, &mut handler, shutdown).await?;
//! if end == StreamEnd::Cancelled {
//!     // interrupted before the server closed the stream
//! }
//! ```
//!
//! ## Offline Parsing
//!
//! ```ignore
//! use ingestion::EventStream;
//!
//! let chunks = futures::stream::iter(vec![Ok(bytes::Bytes::from_static(b"data: {}\n"))]);
//! let mut events = EventStream::from_byte_stream(chunks);
//! while let Some(raw) = events.next_event().await? {
//!     // (kind, data) pairs in arrival order
//! }
//! ```

mod client;
mod config;
mod dispatch;
mod error;
mod line_buffer;
mod sse;

// Re-exports
pub use client::{EventStream, StreamClient, StreamEnd};
pub use config::{StreamConfig, StreamMetrics, StreamMetricsSnapshot};
pub use dispatch::{decode, route, LocalStreamHandler, StreamEvent, StreamHandler};
pub use error::{IngestionError, Result};
pub use line_buffer::{LineBuffer, MAX_LINE_BYTES};
pub use sse::{EventKind, RawEvent, SseLineParser};
