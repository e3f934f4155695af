//! RelayConfig - Config Loader output
//!
//! Describes one relay run: authentication, stream source and active sinks.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Default CertWatch API endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.certwatch.app";

/// Relay run configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RelayConfig {
    /// HTTP delivery target (enables the delivery sink)
    #[serde(default)]
    #[validate(url)]
    pub target_url: Option<String>,

    /// Signing secret (direct secret mode, or forwarded to session creation)
    #[serde(default)]
    pub secret: Option<String>,

    /// API key (session mode)
    #[serde(default)]
    pub api_key: Option<String>,

    /// JSONL output file (enables the file sink)
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Echo compact JSON records to stdout
    #[serde(default)]
    pub raw: bool,

    /// Pretty-print each delivered payload
    #[serde(default)]
    pub show_payload: bool,

    /// Disable colored terminal output
    #[serde(default)]
    pub no_color: bool,

    /// CertWatch API endpoint
    #[serde(default = "default_api_endpoint")]
    #[validate(url)]
    pub api_endpoint: String,
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            target_url: None,
            secret: None,
            api_key: None,
            file: None,
            raw: false,
            show_payload: false,
            no_color: false,
            api_endpoint: default_api_endpoint(),
        }
    }
}

impl RelayConfig {
    /// Delivery target, if set and non-empty
    pub fn target_url(&self) -> Option<&str> {
        non_empty(self.target_url.as_deref())
    }

    /// Signing secret, if set and non-empty
    pub fn secret(&self) -> Option<&str> {
        non_empty(self.secret.as_deref())
    }

    /// API key, if set and non-empty
    pub fn api_key(&self) -> Option<&str> {
        non_empty(self.api_key.as_deref())
    }

    /// JSONL file path, if set and non-empty
    pub fn file(&self) -> Option<&std::path::Path> {
        self.file
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Whether at least one sink is active
    pub fn has_sink(&self) -> bool {
        self.target_url().is_some() || self.file().is_some() || self.raw
    }

    /// Human-readable list of active sinks, e.g. `http://x + file: out.jsonl + stdout`
    pub fn describe_targets(&self) -> String {
        let mut targets = Vec::new();
        if let Some(url) = self.target_url() {
            targets.push(url.to_string());
        }
        if let Some(file) = self.file() {
            targets.push(format!("file: {}", file.display()));
        }
        if self.raw {
            targets.push("stdout".to_string());
        }
        targets.join(" + ")
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
