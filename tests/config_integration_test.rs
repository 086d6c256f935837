//! Integration tests for configuration loading and validation
//!
//! Tests that touch environment variables hold `ENV_MUTEX`.

use sextant::config::{load_config, ChecksumAlgorithm};
use sextant::domain::SextantError;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

fn cleanup_env_vars() {
    for var in [
        "SEXTANT_APPLICATION_LOG_LEVEL",
        "SEXTANT_WAREHOUSE_BIGQUERY_PROJECT_ID",
        "SEXTANT_WAREHOUSE_BIGQUERY_RETRIES",
        "SEXTANT_WAREHOUSE_AZURE_TENANT_ID",
        "SEXTANT_RETRY_INITIAL_DELAY_MS",
        "SEXTANT_DATABASE_CONNECTION_STRING",
        "AZURE_TENANT_ID",
        "TEST_GCP_CREDENTIALS",
        "TEST_DATABASE_URL",
    ] {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const COMPLETE: &str = r#"
[application]
log_level = "debug"

[warehouse]
bigquery_project_id = "analytics-prod"
bigquery_dataset = "events"
bigquery_table_name = "events_v2"
bigquery_retries = 3
azure_client_id = "11111111-2222-3333-4444-555555555555"
azure_token_path = "/var/run/secrets/azure/tokens/azure-identity-token"
azure_scope = "api://AzureADTokenExchange/.default"
gcp_scope = "https://www.googleapis.com/auth/cloud-platform"
google_cloud_credentials = '''${TEST_GCP_CREDENTIALS}'''

[retry]
initial_delay_ms = 100
max_delay_ms = 400

[database]
connection_string = "${TEST_DATABASE_URL}"
ssl_mode = "disable"

[checksum]
algorithm = "sha256"
"#;

#[test]
fn test_load_complete_config() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var(
        "TEST_GCP_CREDENTIALS",
        r#"{"type":"external_account","audience":"//iam.googleapis.com/projects/1/x","token_url":"https://sts.googleapis.com/v1/token"}"#,
    );
    std::env::set_var("TEST_DATABASE_URL", "postgresql://auditor:pw@replica:5432/app");

    let file = write_config(COMPLETE);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.warehouse.missing_keys().is_empty());
    let target = config.warehouse.require_complete().unwrap();
    assert_eq!(target.table_name, "events_v2");
    assert_eq!(config.retry.initial_delay_ms, 100);
    assert_eq!(config.retry.max_elapsed_ms, 120_000);
    assert_eq!(config.checksum.algorithm, ChecksumAlgorithm::Sha256);

    let db = config.database.as_ref().unwrap();
    assert_eq!(
        db.connection_string.expose_secret().as_ref(),
        "postgresql://auditor:pw@replica:5432/app"
    );
    assert_eq!(db.max_connections, 4);

    let delays: Vec<u128> = config
        .retry_policy()
        .unwrap()
        .planned_delays()
        .iter()
        .map(|d| d.as_millis())
        .collect();
    assert_eq!(delays, vec![100, 200, 400]);

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variables_are_all_reported() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(COMPLETE);
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, SextantError::Configuration(_)));
    let msg = err.to_string();
    assert!(msg.contains("TEST_GCP_CREDENTIALS"));
    assert!(msg.contains("TEST_DATABASE_URL"));
}

#[test]
fn test_partial_config_loads_and_reports_missing_keys_later() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[warehouse]
bigquery_project_id = "analytics-prod"
bigquery_table_name = "events_v2"
"#,
    );
    let config = load_config(file.path()).unwrap();
    let missing = config.warehouse.missing_keys();
    assert_eq!(
        missing,
        vec![
            "bigquery_dataset",
            "bigquery_retries",
            "azure_client_id",
            "azure_token_path",
            "azure_scope",
            "gcp_scope",
            "google_cloud_credentials",
        ]
    );
    assert!(config.database.is_none());
}

#[test]
fn test_env_overrides() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SEXTANT_WAREHOUSE_BIGQUERY_PROJECT_ID", "override-project");
    std::env::set_var("SEXTANT_WAREHOUSE_BIGQUERY_RETRIES", "5");
    std::env::set_var("SEXTANT_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("AZURE_TENANT_ID", "tenant-from-env");

    let file = write_config("[warehouse]\nbigquery_project_id = \"from-file\"\n");
    let config = load_config(file.path()).unwrap();

    assert_eq!(
        config.warehouse.bigquery_project_id.as_deref(),
        Some("override-project")
    );
    assert_eq!(config.warehouse.bigquery_retries, Some(5));
    assert_eq!(config.application.log_level, "warn");
    assert_eq!(
        config.warehouse.azure_tenant_id.as_deref(),
        Some("tenant-from-env")
    );

    cleanup_env_vars();
}

#[test]
fn test_invalid_override_value() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("SEXTANT_WAREHOUSE_BIGQUERY_RETRIES", "three");

    let file = write_config("");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("SEXTANT_WAREHOUSE_BIGQUERY_RETRIES"));

    cleanup_env_vars();
}

#[test]
fn test_validation_errors() {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    for contents in [
        "[application]\nlog_level = \"verbose\"\n",
        "[warehouse]\nbigquery_retries = 50\n",
        "[retry]\nbackoff_multiplier = 0.5\n",
        "[database]\nconnection_string = \"mysql://localhost/app\"\n",
        "[checksum]\nalgorithm = \"crc32\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(contents);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            matches!(err, SextantError::Configuration(_)),
            "{contents}: {err}"
        );
    }
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/sextant.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
    assert_eq!(err.exit_code(), 2);
}
