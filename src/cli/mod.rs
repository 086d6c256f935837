//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Sextant using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Sextant - Event delivery and table checksum tool
#[derive(Parser, Debug)]
#[command(name = "sextant")]
#[command(version, about, long_about = None)]
#[command(author = "Sextant Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sextant.toml", env = "SEXTANT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SEXTANT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send events from a file to the warehouse
    Send(commands::send::SendArgs),

    /// Compute the row-set checksum of a table
    Checksum(commands::checksum::ChecksumArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
