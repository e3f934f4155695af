//! # Session
//!
//! Session bootstrap against the CertWatch API.
//!
//! 负责：
//! - 用 API key 换取 stream 地址、签名密钥与 stream 时长
//! - 在 secret 模式下直接拼出 stream 地址

mod client;
mod error;

pub use client::{direct_stream_url, SessionClient, SESSION_PATH, STREAM_PATH};
pub use contracts::Session;
pub use error::{Result, SessionError};
