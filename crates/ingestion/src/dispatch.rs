//! Event dispatch
//!
//! Decodes a raw (kind, data) pair into its kind-specific value and routes it
//! to the matching [`StreamHandler`] method.

use std::ops::ControlFlow;

use contracts::{StreamMeta, StreamRecord};
use tracing::debug;

use crate::sse::{EventKind, RawEvent};

/// A decoded stream event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Meta(StreamMeta),
    Payload(StreamRecord),
    Complete(String),
    Error(String),
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Meta(_) => EventKind::Meta,
            Self::Payload(_) => EventKind::Payload,
            Self::Complete(_) => EventKind::Complete,
            Self::Error(_) => EventKind::Error,
        }
    }
}

/// Stream event handler
///
/// One method per event kind, invoked inline by the reader: the next line is
/// not read until the returned future completes. Returning
/// `ControlFlow::Break(())` stops the reader.
#[trait_variant::make(StreamHandler: Send)]
pub trait LocalStreamHandler {
    async fn on_meta(&mut self, meta: StreamMeta) -> ControlFlow<()>;

    async fn on_payload(&mut self, record: StreamRecord) -> ControlFlow<()>;

    async fn on_complete(&mut self, message: String) -> ControlFlow<()>;

    async fn on_error(&mut self, message: String) -> ControlFlow<()>;
}

/// Decode a raw pair; malformed `meta` or payload bodies yield `None`.
pub fn decode(raw: RawEvent) -> Option<StreamEvent> {
    let kind = raw.kind();
    observability::record_stream_event(kind.as_str());

    let event = match kind {
        EventKind::Complete => StreamEvent::Complete(raw.data),
        EventKind::Error => StreamEvent::Error(raw.data),
        EventKind::Meta => match serde_json::from_str::<StreamMeta>(&raw.data) {
            Ok(meta) => StreamEvent::Meta(meta),
            Err(e) => return dropped(kind, &e),
        },
        EventKind::Payload => match serde_json::from_str::<StreamRecord>(&raw.data) {
            Ok(record) => {
                observability::record_record_received();
                StreamEvent::Payload(record)
            }
            Err(e) => return dropped(kind, &e),
        },
    };

    Some(event)
}

fn dropped(kind: EventKind, error: &serde_json::Error) -> Option<StreamEvent> {
    debug!(event_kind = %kind, error = %error, "Dropping undecodable event");
    observability::record_record_dropped(kind.as_str());
    None
}

/// Route a decoded event to its handler method
pub async fn route<H: StreamHandler>(event: StreamEvent, handler: &mut H) -> ControlFlow<()> {
    match event {
        StreamEvent::Meta(meta) => handler.on_meta(meta).await,
        StreamEvent::Payload(record) => handler.on_payload(record).await,
        StreamEvent::Complete(message) => handler.on_complete(message).await,
        StreamEvent::Error(message) => handler.on_error(message).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        stop_on_error: bool,
    }

    impl StreamHandler for Recorder {
        async fn on_meta(&mut self, meta: StreamMeta) -> ControlFlow<()> {
            self.calls.push(format!("meta:{}", meta.test_id));
            ControlFlow::Continue(())
        }

        async fn on_payload(&mut self, record: StreamRecord) -> ControlFlow<()> {
            self.calls.push(format!("payload:{}", record.event_id));
            ControlFlow::Continue(())
        }

        async fn on_complete(&mut self, message: String) -> ControlFlow<()> {
            self.calls.push(format!("complete:{}", message));
            ControlFlow::Continue(())
        }

        async fn on_error(&mut self, message: String) -> ControlFlow<()> {
            self.calls.push(format!("error:{}", message));
            if self.stop_on_error {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    fn raw(event: Option<&str>, data: &str) -> RawEvent {
        RawEvent {
            event: event.map(str::to_string),
            data: data.to_string(),
        }
    }

    #[tokio::test]
    async fn test_routes_by_kind() {
        let mut handler = Recorder::default();

        let inputs = [
            raw(Some("meta"), r#"{"testId":"t1","streamDurationSeconds":60}"#),
            raw(None, r#"{"event_id":"evt_1"}"#),
            raw(Some("complete"), "stream finished"),
            raw(Some("error"), "quota exceeded"),
        ];
        for input in inputs {
            let event = decode(input).unwrap();
            assert!(route(event, &mut handler).await.is_continue());
        }

        assert_eq!(
            handler.calls,
            vec!["meta:t1", "payload:evt_1", "complete:stream finished", "error:quota exceeded"]
        );
    }

    #[test]
    fn test_malformed_payload_skipped() {
        assert!(decode(raw(None, "{not json")).is_none());
        assert!(decode(raw(Some("payload"), "")).is_none());
    }

    #[test]
    fn test_malformed_meta_skipped() {
        assert!(decode(raw(Some("meta"), "[1,2")).is_none());
    }

    #[test]
    fn test_complete_and_error_pass_raw_text() {
        assert_eq!(
            decode(raw(Some("error"), "{not json")),
            Some(StreamEvent::Error("{not json".to_string()))
        );
    }

    #[tokio::test]
    async fn test_break_propagates() {
        let mut handler = Recorder {
            stop_on_error: true,
            ..Default::default()
        };
        let event = decode(raw(Some("error"), "boom")).unwrap();
        let flow = route(event, &mut handler).await;
        assert!(flow.is_break());
    }
}
