//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Sextant configuration file.

use crate::adapters::postgresql::PostgreSQLClient;
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Fail if any warehouse key needed by `send` is missing
    #[arg(long)]
    pub require_warehouse: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config also runs validate()
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);

        let missing = config.warehouse.missing_keys();
        match config.warehouse.require_complete() {
            Ok(target) => println!(
                "  Warehouse Table: {}.{}.{}",
                target.project_id, target.dataset, target.table_name
            ),
            Err(_) => println!("  Warehouse Table: (incomplete)"),
        }
        println!("  Warehouse API: {}", config.warehouse.bigquery_api_url);
        if let Ok(policy) = config.retry_policy() {
            let delays: Vec<String> = policy
                .planned_delays()
                .iter()
                .map(|d| format!("{}s", d.as_secs_f64()))
                .collect();
            println!(
                "  Retries: {} (delays: {})",
                policy.max_retries(),
                if delays.is_empty() { "none".to_string() } else { delays.join(", ") }
            );
        }

        match config.database {
            Some(ref pg_config) => match PostgreSQLClient::new(pg_config.clone()) {
                Ok(client) => {
                    println!("  Checksum Database: {}", client.connection_string_safe());
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
                Err(e) => {
                    println!("❌ Invalid [database] section");
                    println!("   Error: {e}");
                    return Ok(2);
                }
            },
            None => println!("  Checksum Database: (not configured)"),
        }
        println!("  Checksum Algorithm: {}", config.checksum.algorithm);

        if !missing.is_empty() {
            println!();
            println!("⚠️  Missing warehouse keys (needed by `send`):");
            for key in &missing {
                println!("   - {key}");
            }
            if self.require_warehouse {
                println!();
                return Ok(2);
            }
        }

        println!();
        Ok(0)
    }
}
