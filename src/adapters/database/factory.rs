//! Database client factory
//!
//! This module provides the factory function that builds a checksum source
//! from configuration.

use crate::adapters::database::traits::RowIdSource;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::SextantConfig;
use crate::domain::{Result, SextantError};
use std::sync::Arc;

/// Create a checksum source from the `[database]` section
///
/// # Errors
///
/// Returns a configuration error if the section is absent, or any error from
/// building the PostgreSQL client.
pub fn create_row_id_source(config: &SextantConfig) -> Result<Arc<dyn RowIdSource>> {
    let pg_config = config.database.as_ref().ok_or_else(|| {
        SextantError::Configuration(
            "[database] section is required for checksum computation".to_string(),
        )
    })?;

    let client = PostgreSQLClient::new(pg_config.clone())?;
    tracing::info!(
        database = %client.connection_string_safe(),
        max_connections = pg_config.max_connections,
        "Creating PostgreSQL checksum source"
    );

    Ok(Arc::new(PostgreSQLAdapter::new(client)))
}
