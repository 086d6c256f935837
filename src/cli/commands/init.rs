//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sextant.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Sextant configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::sample_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your warehouse and database settings", self.output);
                println!("  2. Set GOOGLE_CLOUD_CREDENTIALS and DATABASE_URL (or use a .env file)");
                println!("  3. Validate configuration: sextant validate-config");
                println!("  4. Send events: sextant send --file events.json");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration with every section
    pub fn sample_config() -> &'static str {
        r#"# Sextant Configuration File

[application]
log_level = "info"

[warehouse]
# All of these are required before the first insert
bigquery_project_id = "analytics-prod"
bigquery_dataset = "events"
bigquery_table_name = "events_v2"
# Retries after the first attempt on transport failure
bigquery_retries = 3

# Azure workload identity federated to Google Cloud
azure_client_id = "00000000-0000-0000-0000-000000000000"
azure_token_path = "/var/run/secrets/azure/tokens/azure-identity-token"
azure_scope = "api://AzureADTokenExchange/.default"
gcp_scope = "https://www.googleapis.com/auth/cloud-platform"
# Literal string so the JSON quotes survive substitution
google_cloud_credentials = '''${GOOGLE_CLOUD_CREDENTIALS}'''
# Falls back to AZURE_TENANT_ID when unset
# azure_tenant_id = "00000000-0000-0000-0000-000000000000"

# bigquery_api_url = "https://bigquery.googleapis.com/bigquery/v2"
# request_timeout_seconds = 60

[retry]
initial_delay_ms = 15000
max_delay_ms = 60000
backoff_multiplier = 2.0
max_elapsed_ms = 120000

# Needed by `sextant checksum` only
[database]
connection_string = "${DATABASE_URL}"
max_connections = 4
statement_timeout_seconds = 300
ssl_mode = "prefer"

[checksum]
# md5 or sha256
algorithm = "md5"

[logging]
local_enabled = false
local_path = "/var/log/sextant"
local_rotation = "daily"
"#
    }
}
