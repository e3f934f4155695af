//! `preview` command implementation.
//!
//! Builds a realistic sample record and shows the exact request the relay
//! would send for it, so receivers can test their signature checks offline.

use anyhow::Result;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use contracts::{CertificateData, StreamRecord};
use dispatcher::{signature_header, EVENT_ID_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER, USER_AGENT};
use rand::RngCore;
use uuid::Uuid;

use crate::cli::PreviewArgs;
use crate::output::Console;
use crate::pipeline::ExitStatus;

const SAMPLE_VALIDITY_DAYS: i64 = 90;

/// A sample record together with everything needed to reproduce its signature
#[derive(Debug, Clone)]
pub struct SignedPreview {
    pub headers: Vec<(&'static str, String)>,
    /// Compact body, exactly as sent and signed
    pub body: Vec<u8>,
    /// Indented body for display
    pub pretty: String,
    pub secret: String,
    /// `true` when the secret was generated for this preview
    pub generated_secret: bool,
}

impl SignedPreview {
    /// Sign `record` with `secret`
    pub fn new(record: &StreamRecord, secret: String, generated_secret: bool) -> Result<Self> {
        let body = record.to_canonical_json()?;
        let pretty = serde_json::to_string_pretty(record)?;
        let headers = vec![
            ("Content-Type", "application/json".to_string()),
            ("User-Agent", USER_AGENT.to_string()),
            (EVENT_ID_HEADER, record.event_id.clone()),
            (TIMESTAMP_HEADER, record.timestamp.clone()),
            (SIGNATURE_HEADER, signature_header(&body, &secret)),
        ];

        Ok(Self {
            headers,
            body,
            pretty,
            secret,
            generated_secret,
        })
    }

    /// Value of the signature header
    pub fn signature(&self) -> &str {
        self.headers
            .iter()
            .find(|(name, _)| *name == SIGNATURE_HEADER)
            .map(|(_, value)| value.as_str())
            .unwrap_or_default()
    }
}

/// Execute the `preview` command
pub fn run_preview(args: &PreviewArgs) -> Result<ExitStatus> {
    let console = Console::new(!args.no_color, false);

    let (secret, generated) = match args.secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => (secret.to_string(), false),
        None => (hex::encode(random_bytes::<32>()), true),
    };

    let record = sample_record(Utc::now());
    let preview = SignedPreview::new(&record, secret, generated)?;
    console.preview(env!("CARGO_PKG_VERSION"), &preview);

    Ok(ExitStatus::Success)
}

/// A plausible `ct.certificate.new` record issued at `now`
pub fn sample_record(now: DateTime<Utc>) -> StreamRecord {
    let stamp = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Secs, true);

    let serial_number = random_bytes::<16>()
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":");

    StreamRecord {
        event: "ct.certificate.new".to_string(),
        event_id: format!("evt_{}", Uuid::new_v4()),
        timestamp: stamp(now),
        api_version: "2024-01-01".to_string(),
        data: CertificateData {
            fingerprint: format!("sha256:{}", hex::encode(random_bytes::<32>())),
            serial_number,
            common_name: "*.example.com".to_string(),
            domains: vec!["*.example.com".to_string(), "example.com".to_string()],
            issuer_org: "Let's Encrypt".to_string(),
            issuer_cn: "R11".to_string(),
            not_before: stamp(now),
            not_after: stamp(now + Duration::days(SAMPLE_VALIDITY_DAYS)),
            ct_log_sources: vec!["Google Argon 2026".to_string()],
            seen_at: stamp(now),
        },
    }
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    rand::rng().fill_bytes(&mut buf);
    buf
}
