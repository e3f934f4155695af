//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use contracts::RelayConfig;
use std::path::PathBuf;

/// CertWatch Webhook - relay certificate-transparency events to your endpoints
#[derive(Parser, Debug)]
#[command(
    name = "certwatch-webhook",
    author,
    version,
    about = "Relay CertWatch certificate-transparency events to local sinks",
    long_about = "Connects to a CertWatch event stream and relays every certificate record\n\
                  to a webhook endpoint (HMAC-signed), a JSONL file and/or stdout.\n\n\
                  Examples:\n  \
                  certwatch-webhook run --url http://localhost:3000/hook --api-key <key>\n  \
                  certwatch-webhook run --file out.jsonl --secret <secret>\n  \
                  certwatch-webhook run --raw --secret <secret> | jq .\n  \
                  certwatch-webhook preview"
)]
pub struct Cli {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CERTWATCH_VERBOSE")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format (logs go to stderr)
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CERTWATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the stream and relay records
    Run(RunArgs),

    /// Show a sample signed delivery and exit (no network)
    Preview(PreviewArgs),

    /// Verify an `X-CertWatch-Signature` header against a body
    Verify(VerifyArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Target URL to deliver records to
    #[arg(long, env = "CERTWATCH_URL")]
    pub url: Option<String>,

    /// Webhook signing secret (direct secret mode)
    #[arg(long, env = "CERTWATCH_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// CertWatch API key (creates a test session)
    #[arg(long, env = "CERTWATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Append records to a JSONL file
    #[arg(long, env = "CERTWATCH_FILE")]
    pub file: Option<PathBuf>,

    /// Print raw NDJSON to stdout (suppresses all other output)
    #[arg(long)]
    pub raw: bool,

    /// Pretty-print each record after its delivery line
    #[arg(long)]
    pub show_payload: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// CertWatch API endpoint
    #[arg(long, env = "CERTWATCH_API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// Configuration file (TOML or JSON); flags override its values
    #[arg(short, long, env = "CERTWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "CERTWATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

impl RunArgs {
    /// Apply flag values on top of a (file-loaded) configuration
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(url) = &self.url {
            config.target_url = Some(url.clone());
        }
        if let Some(secret) = &self.secret {
            config.secret = Some(secret.clone());
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(file) = &self.file {
            config.file = Some(file.clone());
        }
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        config.raw |= self.raw;
        config.show_payload |= self.show_payload;
        config.no_color |= self.no_color;
    }

    /// Metrics port, `None` when disabled
    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `preview` command
#[derive(Parser, Debug, Clone, Default)]
pub struct PreviewArgs {
    /// Signing secret to preview with (random if omitted)
    #[arg(long, env = "CERTWATCH_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Arguments for the `verify` command
#[derive(Parser, Debug, Clone)]
pub struct VerifyArgs {
    /// Signing secret
    #[arg(long, env = "CERTWATCH_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Signature header value (`sha256=<hex>`)
    #[arg(long)]
    pub signature: String,

    /// File holding the exact request body (stdin if omitted)
    #[arg(long)]
    pub body_file: Option<PathBuf>,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
