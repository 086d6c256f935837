//! Configuration management for Sextant.
//!
//! # Overview
//!
//! Sextant reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SEXTANT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Range and format validation on load
//!
//! The warehouse keys needed for inserts are checked separately, right before
//! the first insert, so that every missing key is reported in one message.
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`WarehouseConfig`] - BigQuery destination and federated credential settings
//! - [`RetryConfig`] - backoff for warehouse transport failures
//! - [`PostgreSQLConfig`] - checksum source database
//! - [`ChecksumConfig`] - digest algorithm
//! - [`LoggingConfig`] - local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [warehouse]
//! bigquery_project_id = "analytics-prod"
//! bigquery_dataset = "events"
//! bigquery_table_name = "events_v2"
//! bigquery_retries = 3
//! azure_client_id = "00000000-0000-0000-0000-000000000000"
//! azure_token_path = "/var/run/secrets/azure/tokens/azure-identity-token"
//! azure_scope = "api://AzureADTokenExchange/.default"
//! gcp_scope = "https://www.googleapis.com/auth/cloud-platform"
//! google_cloud_credentials = "${GOOGLE_CLOUD_CREDENTIALS}"
//!
//! [database]
//! connection_string = "${DATABASE_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, ChecksumAlgorithm, ChecksumConfig, LoggingConfig, PostgreSQLConfig,
    RetryConfig, SextantConfig, WarehouseConfig, WarehouseTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
