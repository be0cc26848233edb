// pbi-export - Power BI export-to-file job driver
// Copyright (c) 2025 pbi-export Contributors
// Licensed under the MIT License

use clap::Parser;
use pbi_export::cli::commands::{EXIT_CONFIG_ERROR, EXIT_FATAL};
use pbi_export::cli::{Cli, Commands};
use pbi_export::config::{load_or_default, ExporterConfig};
use pbi_export::domain::Result;
use pbi_export::logging::init_logging;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let (config_path, explicit) = cli.config_path();
    let loaded = load_or_default(Some(&config_path), explicit);

    // Logging comes up before the config is validated so load errors still get logged
    let logging_config = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let configured_level = loaded
        .as_ref()
        .ok()
        .map(|config| config.application.log_level.as_str());
    let log_level = cli.effective_log_level(configured_level).to_string();

    let _guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_CONFIG_ERROR);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "pbi-export - Power BI export job driver"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install SIGTERM handler");
                    return;
                }
            };

            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                    println!("\n⚠️  Shutdown signal received, aborting in-flight exports...");
                    let _ = shutdown_tx.send(true);
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown...");
                    println!("\n⚠️  Shutdown signal received, aborting in-flight exports...");
                    let _ = shutdown_tx.send(true);
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
                println!("\n⚠️  Shutdown signal received, aborting in-flight exports...");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, loaded, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(_guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(
    cli: &Cli,
    loaded: Result<ExporterConfig>,
    shutdown_signal: watch::Receiver<bool>,
) -> anyhow::Result<i32> {
    let (config_path, _) = cli.config_path();
    match &cli.command {
        Commands::Export(args) => match loaded {
            Ok(config) => args.execute(config, shutdown_signal).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("{e}");
                Ok(EXIT_CONFIG_ERROR)
            }
        },
        Commands::ValidateConfig(args) => {
            args.execute(&config_path.display().to_string(), loaded).await
        }
        Commands::Init(args) => args.execute().await,
    }
}
