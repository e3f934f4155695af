//! Sink implementations
//!
//! Contains RawSink, FileSink, and WebhookSink.

mod file;
mod raw;
mod webhook;

pub use self::file::FileSink;
pub use self::raw::RawSink;
pub use self::webhook::{
    WebhookSink, DELIVERY_TIMEOUT, EVENT_ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, USER_AGENT,
};
