//! CLI interface and argument parsing
//!
//! This module provides the command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file, used when present
pub const DEFAULT_CONFIG_FILE: &str = "pbi-export.toml";

/// pbi-export - Power BI export-to-file job driver
#[derive(Parser, Debug)]
#[command(name = "pbi-export")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file [default: pbi-export.toml if present]
    #[arg(short, long, env = "PBI_EXPORT_CONFIG", global = true)]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PBI_EXPORT_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Configuration path and whether it was given explicitly
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// `--verbose` beats `--log-level`, which beats the configured level
    pub fn effective_log_level<'a>(&'a self, configured: Option<&'a str>) -> &'a str {
        if self.verbose {
            return "debug";
        }
        self.log_level
            .as_deref()
            .or(configured)
            .unwrap_or("info")
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run N export jobs against a report
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from(["pbi-export", "export"]);
        assert_eq!(cli.config_path(), (PathBuf::from("pbi-export.toml"), false));
        assert!(matches!(cli.command, Commands::Export(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["pbi-export", "--config", "custom.toml", "export"]);
        assert_eq!(cli.config_path(), (PathBuf::from("custom.toml"), true));
    }

    #[test]
    fn test_cli_parse_export_flags() {
        let cli = Cli::parse_from([
            "pbi-export",
            "export",
            "--cluster",
            "msit",
            "--workspace-id",
            "W1",
            "--report-id",
            "R1",
            "-n",
            "20",
            "-j",
            "4",
            "--skip-download",
        ]);
        let Commands::Export(args) = cli.command else {
            panic!("expected export command");
        };
        assert_eq!(args.workspace_id.as_deref(), Some("W1"));
        assert_eq!(args.num_exports, Some(20));
        assert_eq!(args.concurrency, Some(4));
        assert!(args.skip_download);
    }

    #[test]
    fn test_effective_log_level() {
        let cli = Cli::parse_from(["pbi-export", "validate-config"]);
        assert_eq!(cli.effective_log_level(None), "info");
        assert_eq!(cli.effective_log_level(Some("warn")), "warn");

        let cli = Cli::parse_from(["pbi-export", "--log-level", "trace", "validate-config"]);
        assert_eq!(cli.effective_log_level(Some("warn")), "trace");

        let cli = Cli::parse_from(["pbi-export", "validate-config", "--verbose"]);
        assert_eq!(cli.effective_log_level(Some("warn")), "debug");
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["pbi-export", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn test_cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
