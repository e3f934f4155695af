//! FileSink - appends records to a JSON Lines file

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use contracts::{ContractError, RecordSink, StreamRecord};
use tracing::{debug, error, info, instrument};

use crate::error::DispatcherError;

/// Sink that appends one compact JSON record per line.
///
/// Opens in append mode and never truncates existing content. The file
/// handle is released exactly once, on `close`.
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Option<File>,
    written: u64,
}

impl FileSink {
    /// Open (or create) `path` for appending
    #[instrument(name = "file_sink_open", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DispatcherError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                DispatcherError::sink_creation("file", format!("{}: {}", path.display(), e))
            })?;

        info!(path = %path.display(), "FileSink opened");

        Ok(Self {
            name: "file".to_string(),
            path,
            file: Some(file),
            written: 0,
        })
    }

    /// Target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn append(&mut self, line: &[u8]) -> Result<(), ContractError> {
        let Some(file) = self.file.as_mut() else {
            return Err(ContractError::sink_write(&self.name, "sink already closed"));
        };

        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line);
        buf.push(b'\n');

        file.write_all(&buf).map_err(|e| {
            error!(sink = %self.name, path = %self.path.display(), error = %e, "Write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })?;

        self.written += 1;
        Ok(())
    }
}

impl RecordSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record, line),
        fields(sink = %self.name, event_id = %record.event_id)
    )]
    async fn write(&mut self, record: &StreamRecord, line: &[u8]) -> Result<(), ContractError> {
        self.append(line)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        match self.file.as_mut() {
            Some(file) => file
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string())),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        file.flush()
            .and_then(|_| file.sync_all())
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        debug!(sink = %self.name, written = self.written, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = FileSink::open(&path).unwrap();
        let record = StreamRecord::default();
        sink.write(&record, br#"{"n":1}"#).await.unwrap();
        sink.write(&record, br#"{"n":2}"#).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"n\":1}\n{\"n\":2}\n");
        assert_eq!(sink.written(), 2);
    }

    #[tokio::test]
    async fn test_file_sink_never_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        fs::write(&path, "{\"existing\":true}\n").unwrap();

        let mut sink = FileSink::open(&path).unwrap();
        sink.write(&StreamRecord::default(), b"{}").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{\"existing\":true}\n{}\n");
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let dir = tempdir().unwrap();
        let mut sink = FileSink::open(dir.path().join("x.jsonl")).unwrap();

        sink.close().await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.is_closed());
        assert!(sink.write(&StreamRecord::default(), b"{}").await.is_err());
    }

    #[test]
    fn test_open_failure() {
        let dir = tempdir().unwrap();
        let result = FileSink::open(dir.path().join("missing").join("out.jsonl"));
        assert!(matches!(result, Err(DispatcherError::SinkCreation { .. })));
    }
}
