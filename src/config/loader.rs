//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SextantConfig;
use super::secret::secret_string;
use crate::domain::errors::SextantError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SextantConfig
/// 4. Applies environment variable overrides (SEXTANT_* prefix)
/// 5. Validates value ranges and formats
///
/// Missing warehouse keys are deliberately not an error here so that the
/// `checksum` command works with a database-only file.
///
/// # Examples
///
/// ```no_run
/// use sextant::config::loader::load_config;
///
/// let config = load_config("sextant.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SextantConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SextantError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SextantError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text, applying the same substitution,
/// overrides and validation as [`load_config`]
pub fn parse_config(contents: &str) -> Result<SextantConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SextantConfig = toml::from_str(&contents)
        .map_err(|e| SextantError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        SextantError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every unset variable is reported at once.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SextantError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&cap[0], &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SextantError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            SextantError::Configuration(format!("{name} has an invalid value: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using SEXTANT_* prefix
///
/// Environment variables follow the pattern: SEXTANT_<SECTION>_<KEY>,
/// e.g. SEXTANT_WAREHOUSE_BIGQUERY_PROJECT_ID. `AZURE_TENANT_ID` fills
/// `warehouse.azure_tenant_id` when neither the file nor an override sets it.
fn apply_env_overrides(config: &mut SextantConfig) -> Result<()> {
    if let Some(val) = env_string("SEXTANT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    let wh = &mut config.warehouse;
    for (name, slot) in [
        ("SEXTANT_WAREHOUSE_BIGQUERY_PROJECT_ID", &mut wh.bigquery_project_id),
        ("SEXTANT_WAREHOUSE_BIGQUERY_DATASET", &mut wh.bigquery_dataset),
        ("SEXTANT_WAREHOUSE_BIGQUERY_TABLE_NAME", &mut wh.bigquery_table_name),
        ("SEXTANT_WAREHOUSE_AZURE_CLIENT_ID", &mut wh.azure_client_id),
        ("SEXTANT_WAREHOUSE_AZURE_TOKEN_PATH", &mut wh.azure_token_path),
        ("SEXTANT_WAREHOUSE_AZURE_SCOPE", &mut wh.azure_scope),
        ("SEXTANT_WAREHOUSE_GCP_SCOPE", &mut wh.gcp_scope),
        ("SEXTANT_WAREHOUSE_AZURE_TENANT_ID", &mut wh.azure_tenant_id),
    ] {
        if let Some(val) = env_string(name) {
            *slot = Some(val);
        }
    }
    if let Some(retries) = env_parsed("SEXTANT_WAREHOUSE_BIGQUERY_RETRIES")? {
        wh.bigquery_retries = Some(retries);
    }
    if let Some(val) = env_string("SEXTANT_WAREHOUSE_BIGQUERY_API_URL") {
        wh.bigquery_api_url = val;
    }
    if let Some(val) = env_string("SEXTANT_WAREHOUSE_GOOGLE_CLOUD_CREDENTIALS") {
        wh.google_cloud_credentials = Some(secret_string(val));
    }
    if wh.azure_tenant_id.is_none() {
        wh.azure_tenant_id = env_string("AZURE_TENANT_ID");
    }

    if let Some(val) = env_parsed("SEXTANT_RETRY_INITIAL_DELAY_MS")? {
        config.retry.initial_delay_ms = val;
    }
    if let Some(val) = env_parsed("SEXTANT_RETRY_MAX_DELAY_MS")? {
        config.retry.max_delay_ms = val;
    }
    if let Some(val) = env_parsed("SEXTANT_RETRY_MAX_ELAPSED_MS")? {
        config.retry.max_elapsed_ms = val;
    }

    if let Some(ref mut db) = config.database {
        if let Some(val) = env_string("SEXTANT_DATABASE_CONNECTION_STRING") {
            db.connection_string = secret_string(val);
        }
        if let Some(val) = env_string("SEXTANT_DATABASE_SSL_MODE") {
            db.ssl_mode = val;
        }
    }

    if let Some(val) = env_parsed("SEXTANT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env_string("SEXTANT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
