//! Session API client
//!
//! One POST exchange: API key (and optional caller secret) in, `Session` out.

use std::time::Duration;

use contracts::{Session, SessionEnvelope, SessionRequest};
use reqwest::{header, Client, StatusCode, Url};
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SessionError};

/// Session creation path, relative to the API endpoint
pub const SESSION_PATH: &str = "/api/v1/tools/webhook-test/session";

/// Stream path used in direct secret mode
pub const STREAM_PATH: &str = "/api/v1/tools/webhook-test/stream";

const SESSION_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the session bootstrap endpoint
#[derive(Debug, Clone)]
pub struct SessionClient {
    /// API endpoint (scheme + host, no trailing path)
    api_endpoint: String,
    /// Reusable HTTP client
    http: Client,
}

impl SessionClient {
    /// Create a client for the given API endpoint
    pub fn new(api_endpoint: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(SESSION_TIMEOUT).build()?;
        Ok(Self {
            api_endpoint: api_endpoint.into(),
            http,
        })
    }

    /// Exchange an API key for a stream session
    ///
    /// When `user_secret` is given it is forwarded so the returned secret
    /// matches the caller's choice instead of a server-generated one.
    ///
    /// # Errors
    /// Transport failure, non-2xx status, or an envelope without success/data.
    #[instrument(name = "session_create", skip(self, api_key, user_secret), fields(endpoint = %self.api_endpoint))]
    pub async fn create_session(&self, api_key: &str, user_secret: Option<&str>) -> Result<Session> {
        let url = format!("{}{}", self.api_endpoint.trim_end_matches('/'), SESSION_PATH);

        let mut request = self
            .http
            .post(&url)
            .header("X-API-Key", api_key)
            .header(header::ACCEPT, "application/json");

        request = match user_secret.filter(|s| !s.is_empty()) {
            Some(secret) => request.json(&SessionRequest {
                secret: secret.to_string(),
            }),
            None => request.body(Vec::new()),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Session response received");

        if status != StatusCode::OK && status != StatusCode::CREATED {
            return Err(rejection(status, &body));
        }

        let envelope: SessionEnvelope = serde_json::from_slice(&body)?;
        match (envelope.success, envelope.data) {
            (true, Some(data)) => {
                let session = Session::from(data);
                info!(
                    test_id = %session.test_id,
                    stream_duration_secs = session.stream_duration_seconds,
                    "Session created"
                );
                Ok(session)
            }
            _ => Err(match envelope.error {
                Some(err) => SessionError::Rejected {
                    code: err.code,
                    message: err.message,
                },
                None => SessionError::Unsuccessful,
            }),
        }
    }
}

fn rejection(status: StatusCode, body: &[u8]) -> SessionError {
    let status = status.as_u16();
    match serde_json::from_slice::<SessionEnvelope>(body) {
        Ok(SessionEnvelope {
            error: Some(err), ..
        }) => {
            warn!(status, code = %err.code, "Session rejected");
            SessionError::Api {
                status,
                code: err.code,
                message: err.message,
            }
        }
        _ => {
            warn!(status, "Session rejected without error body");
            SessionError::Status { status }
        }
    }
}

/// Stream address for direct secret mode
///
/// `<api_endpoint>/api/v1/tools/webhook-test/stream?secret=<secret>`
pub fn direct_stream_url(api_endpoint: &str, secret: &str) -> Result<String> {
    let base = format!("{}{}", api_endpoint.trim_end_matches('/'), STREAM_PATH);
    let mut url = Url::parse(&base).map_err(|e| SessionError::InvalidEndpoint {
        endpoint: api_endpoint.to_string(),
        message: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("secret", secret);
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn success_body() -> serde_json::Value {
        serde_json::json!({
            "success": true,
            "data": {
                "testId": "test_123",
                "secret": "whsec_server",
                "streamUrl": "https://api.certwatch.app/stream/test_123",
                "expiresInSeconds": 600,
                "streamDurationSeconds": 120
            }
        })
    }

    #[tokio::test]
    async fn test_create_session_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SESSION_PATH))
            .and(header("X-API-Key", "cw_key"))
            .respond_with(ResponseTemplate::new(201).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri()).unwrap();
        let session = client.create_session("cw_key", None).await.unwrap();

        assert_eq!(session.test_id, "test_123");
        assert_eq!(session.secret, "whsec_server");
        assert_eq!(session.stream_duration_seconds, 120);
    }

    #[tokio::test]
    async fn test_user_secret_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SESSION_PATH))
            .and(body_json(serde_json::json!({ "secret": "mine" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri()).unwrap();
        assert!(client.create_session("cw_key", Some("mine")).await.is_ok());
    }

    #[tokio::test]
    async fn test_api_error_body_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "success": false,
                "error": { "code": "INVALID_API_KEY", "message": "API key not recognised" }
            })))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri()).unwrap();
        let err = client.create_session("bad", None).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "session creation failed (401): INVALID_API_KEY - API key not recognised"
        );
    }

    #[tokio::test]
    async fn test_status_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri()).unwrap();
        let err = client.create_session("k", None).await.unwrap_err();
        assert!(matches!(err, SessionError::Status { status: 502 }));
    }

    #[tokio::test]
    async fn test_unsuccessful_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": false })),
            )
            .mount(&server)
            .await;

        let client = SessionClient::new(server.uri()).unwrap();
        let err = client.create_session("k", None).await.unwrap_err();
        assert!(matches!(err, SessionError::Unsuccessful));
    }

    #[test]
    fn test_direct_stream_url_encodes_secret() {
        let url = direct_stream_url("https://api.certwatch.app/", "a b&c").unwrap();
        assert_eq!(
            url,
            "https://api.certwatch.app/api/v1/tools/webhook-test/stream?secret=a+b%26c"
        );
    }

    #[test]
    fn test_direct_stream_url_invalid_endpoint() {
        assert!(direct_stream_url("not a url", "s").is_err());
    }
}
