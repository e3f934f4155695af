//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// HTTP 客户端构建失败
    #[error("failed to build stream client: {0}")]
    Client(#[source] reqwest::Error),

    /// 无法建立 stream 连接
    #[error("failed to connect to stream: {0}")]
    Connect(#[source] reqwest::Error),

    /// 服务端返回非 200 状态
    #[error("stream returned status {status}")]
    Status {
        /// HTTP 状态码
        status: u16,
    },

    /// 连接中途断开或读取失败
    #[error("stream read error: {message}")]
    Read {
        /// 错误消息
        message: String,
    },

    /// 单行超出上限
    #[error("stream read error: line exceeds {limit} bytes")]
    LineTooLong {
        /// 行长度上限
        limit: usize,
    },
}

impl IngestionError {
    /// Create read error
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read {
            message: message.into(),
        }
    }

    /// HTTP status attached to the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            Self::Connect(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
