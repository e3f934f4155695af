//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{RelayConfig, ShutdownHandle};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::output::Console;
use crate::pipeline::{ExitStatus, Pipeline, PipelineConfig};

/// Load the file configuration (if any), apply flag overrides, validate
pub fn resolve_config(args: &RunArgs) -> Result<RelayConfig> {
    let mut relay = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            ConfigLoader::load_from_path(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
        }
        None => RelayConfig::default(),
    };

    args.apply(&mut relay);
    ConfigLoader::validate(&relay).context("Invalid configuration")?;

    Ok(relay)
}

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<ExitStatus> {
    let relay = resolve_config(args)?;

    info!(
        targets = %relay.describe_targets(),
        mode = if relay.api_key().is_some() { "api_key" } else { "secret" },
        endpoint = %relay.api_endpoint,
        "Configuration loaded"
    );

    let console = Console::new(!relay.no_color, relay.raw);

    // Setup graceful shutdown handler
    let (handle, signal) = ShutdownHandle::new();
    let signal_task = tokio::spawn(async move {
        setup_shutdown_signal().await;
        warn!("Received shutdown signal, draining...");
        handle.trigger();
    });

    let mut pipeline = Pipeline::new(
        PipelineConfig {
            relay,
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        console,
    );

    let outcome = pipeline.run(signal).await;
    signal_task.abort();

    match outcome {
        Ok(stats) => {
            stats.print_summary(&console);
            Ok(stats.exit_status())
        }
        Err(e) => {
            warn!(error = %e, state = ?pipeline.state(), "Run failed");
            console.fatal(&e.to_string());
            Ok(ExitStatus::Fatal)
        }
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
