// Sextant - Event delivery and table checksum tool
// Copyright (c) 2025 Sextant Contributors
// Licensed under the MIT License

use sextant::cli::{Cli, Commands};
use sextant::config::{load_config, LoggingConfig};
use sextant::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging follows the config file when it loads; otherwise console only,
    // and the command itself reports the configuration error.
    let (config_level, logging_config) = match load_config(&cli.config) {
        Ok(config) if !matches!(cli.command, Commands::Init(_)) => {
            (config.application.log_level, config.logging)
        }
        _ => (
            "info".to_string(),
            LoggingConfig {
                local_enabled: false,
                ..Default::default()
            },
        ),
    };
    let log_level = cli.log_level.as_deref().unwrap_or(&config_level);

    let logging_guard = match init_logging(log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Sextant - Event delivery and table checksum tool"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e:#}");
            5
        }
    };

    // process::exit skips destructors
    drop(logging_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Send(args) => args.execute(&cli.config).await,
        Commands::Checksum(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
