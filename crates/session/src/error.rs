//! Session error types

use thiserror::Error;

/// Session bootstrap errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Request could not be built or sent
    #[error("failed to create session: {0}")]
    Transport(#[from] reqwest::Error),

    /// API rejected the request with an error body
    #[error("session creation failed ({status}): {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// API rejected the request without a usable error body
    #[error("session creation failed with status {status}")]
    Status { status: u16 },

    /// 2xx response whose envelope reports failure
    #[error("session creation failed: {code} - {message}")]
    Rejected { code: String, message: String },

    /// 2xx response without success flag or data
    #[error("session creation returned unsuccessful response")]
    Unsuccessful,

    /// Response body is not a session envelope
    #[error("failed to decode session response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Stream address could not be derived from the endpoint
    #[error("invalid api endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },
}

/// Session Result 类型别名
pub type Result<T> = std::result::Result<T, SessionError>;
