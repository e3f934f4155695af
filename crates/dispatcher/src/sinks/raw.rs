//! RawSink - echoes each record as one compact JSON line

use std::io::Write;

use contracts::{ContractError, RecordSink, StreamRecord};
use tracing::{debug, instrument};

/// Sink that writes canonical JSON lines to a writer (stdout by default)
pub struct RawSink {
    name: String,
    writer: Box<dyn Write + Send>,
}

impl RawSink {
    /// Create a RawSink over any writer
    pub fn new(name: impl Into<String>, writer: Box<dyn Write + Send>) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    /// RawSink on the process's standard output
    pub fn stdout() -> Self {
        Self::new("raw", Box::new(std::io::stdout()))
    }

    fn write_line(&mut self, line: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl RecordSink for RawSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "raw_sink_write",
        skip(self, record, line),
        fields(sink = %self.name, event_id = %record.event_id)
    )]
    async fn write(&mut self, record: &StreamRecord, line: &[u8]) -> Result<(), ContractError> {
        self.write_line(line)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "raw_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))
    }

    #[instrument(name = "raw_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        debug!(sink = %self.name, "RawSink closed");
        Ok(())
    }
}
