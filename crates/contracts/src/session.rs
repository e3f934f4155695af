//! Session bundle returned by the API-key exchange
//!
//! Wire envelope: `{success, data?: {...}, error?: {code, message}}`

use serde::{Deserialize, Serialize};

/// Transient credential and endpoint bundle for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Server-side test identifier
    pub test_id: String,

    /// Signing secret for deliveries and stream auth
    pub secret: String,

    /// Event stream address
    pub stream_url: String,

    /// Session expiry
    pub expires_in_seconds: u64,

    /// Advertised stream lifetime
    pub stream_duration_seconds: u64,
}

/// Session creation request body
#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest {
    pub secret: String,
}

/// Session creation response envelope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<SessionData>,
    #[serde(default)]
    pub error: Option<SessionErrorBody>,
}

/// Successful session payload
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionData {
    pub test_id: String,
    pub secret: String,
    pub stream_url: String,
    pub expires_in_seconds: u64,
    pub stream_duration_seconds: u64,
}

/// Error details for a failed session creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionErrorBody {
    pub code: String,
    pub message: String,
}

impl From<SessionData> for Session {
    fn from(data: SessionData) -> Self {
        Self {
            test_id: data.test_id,
            secret: data.secret,
            stream_url: data.stream_url,
            expires_in_seconds: data.expires_in_seconds,
            stream_duration_seconds: data.stream_duration_seconds,
        }
    }
}
