//! # egosync CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 批量重采样与帧对齐
//! - 失败会话以非零退出码报告

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_batch, run_info, run_validate};
use observability::ObservabilityConfig;
use pipeline::BatchMode;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    observability::init_with_config(
        ObservabilityConfig {
            log_format: cli.log_format.into(),
            ..Default::default()
        }
        .with_verbosity(cli.verbose, cli.quiet),
    )?;

    info!(version = env!("CARGO_PKG_VERSION"), "egosync starting");

    let result = match &cli.command {
        Commands::Resample(args) => run_batch(BatchMode::Resample, args).await,
        Commands::Synchronize(args) => run_batch(BatchMode::Synchronize, args).await,
        Commands::Run(args) => run_batch(BatchMode::Run, args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "Command failed");
    }

    result
}
