//! # Dispatcher
//!
//! 记录分发模块。
//!
//! 负责：
//! - 为每条记录分配 1 起始、连续递增的序号
//! - 按固定顺序 fan-out：raw stdout → JSONL 文件 → HTTP 投递
//! - HMAC-SHA256 签名与校验
//! - 收集投递结果 (DeliveryOutcome) 供最终汇总

pub mod dispatcher;
pub mod error;
pub mod metrics;
pub mod signer;
pub mod sinks;

pub use contracts::{RecordSink, StreamRecord};
pub use dispatcher::{create_dispatcher, Dispatched, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use signer::{sign, signature_header, verify_signature, SIGNATURE_PREFIX};
pub use sinks::{
    FileSink, RawSink, WebhookSink, DELIVERY_TIMEOUT, EVENT_ID_HEADER, SIGNATURE_HEADER,
    TIMESTAMP_HEADER, USER_AGENT,
};
