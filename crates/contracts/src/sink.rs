//! RecordSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for fire-and-forget sinks.

use crate::{ContractError, StreamRecord};

/// Record output trait
///
/// Implemented by sinks whose failures are logged but never affect the
/// record's processing (raw echo, file append). HTTP delivery is not a
/// `RecordSink`: it produces a `DeliveryOutcome` instead.
#[trait_variant::make(RecordSink: Send)]
pub trait LocalRecordSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one record
    ///
    /// `line` is the record's canonical JSON form.
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, record: &StreamRecord, line: &[u8]) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
