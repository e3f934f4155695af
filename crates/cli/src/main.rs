//! # CertWatch Webhook CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 日志初始化
//! - 子命令分发
//! - 退出码映射 (0 成功 / 1 投递失败 / 2 致命错误)

use std::process::ExitCode;

use clap::Parser;
use observability::ObservabilityConfig;
use tracing::info;

use certwatch_cli::commands::{run_pipeline, run_preview, run_verify};
use certwatch_cli::{Cli, Commands, ExitStatus};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let metrics_port = match &cli.command {
        Commands::Run(args) => args.metrics_port(),
        _ => None,
    };

    let config = ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port,
        default_log_level: ObservabilityConfig::level_for_verbosity(cli.verbose, cli.quiet)
            .to_string(),
    };
    if let Err(e) = observability::init_with_config(config) {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(ExitStatus::Fatal.code());
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "CertWatch Webhook CLI starting"
    );

    // Execute command
    let result = match &cli.command {
        Commands::Run(args) => run_pipeline(args).await,
        Commands::Preview(args) => run_preview(args),
        Commands::Verify(args) => run_verify(args),
    };

    let status = match result {
        Ok(status) => status,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {:#}", e);
            ExitStatus::Fatal
        }
    };

    ExitCode::from(status.code())
}
