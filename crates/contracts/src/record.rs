//! StreamRecord - Stream output
//!
//! Certificate-transparency records as carried by the event stream and
//! re-delivered, byte-for-byte in canonical form, to every sink.

use serde::{Deserialize, Deserializer, Serialize};

use crate::ContractError;

/// One certificate-transparency event ("webhook payload" on the wire)
///
/// Field order is the canonical serialization order; do not reorder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamRecord {
    /// Event type (e.g. `ct.certificate.new`)
    pub event: String,

    /// Globally unique event identifier
    pub event_id: String,

    /// RFC3339 emission timestamp
    pub timestamp: String,

    /// API version tag
    pub api_version: String,

    /// Certificate details
    pub data: CertificateData,
}

/// Certificate block nested inside a [`StreamRecord`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificateData {
    pub fingerprint: String,
    pub serial_number: String,
    pub common_name: String,
    #[serde(deserialize_with = "nullable_list")]
    pub domains: Vec<String>,
    pub issuer_org: String,
    pub issuer_cn: String,
    pub not_before: String,
    pub not_after: String,
    #[serde(deserialize_with = "nullable_list")]
    pub ct_log_sources: Vec<String>,
    pub seen_at: String,
}

impl StreamRecord {
    /// Canonical compact JSON form.
    ///
    /// These are the exact bytes that get signed and transmitted.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(self)
            .map_err(|e| ContractError::record_serialize(&self.event_id, e.to_string()))
    }

    /// Common name for display purposes
    pub fn common_name(&self) -> &str {
        &self.data.common_name
    }
}

/// Stream metadata, sent at most once near stream start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMeta {
    /// Session identifier
    #[serde(default)]
    pub test_id: String,

    /// Advertised stream lifetime
    #[serde(default)]
    pub stream_duration_seconds: u64,
}

/// The service emits `null` for empty lists.
fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
