//! PostgreSQL client implementation
//!
//! Connection pooling and session setup for the checksum source. Sessions are
//! read-only, run in UTC and carry the configured statement timeout.

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{Result, SextantError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use postgres_native_tls::MakeTlsConnector;
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::NoTls;

fn session_setup(statement_timeout_seconds: u64) -> String {
    format!(
        "SET TIME ZONE 'UTC'; SET statement_timeout = {}; \
         SET default_transaction_read_only = on",
        statement_timeout_seconds * 1000
    )
}

/// PostgreSQL client for Sextant
///
/// Wraps a connection pool. Connections are opened lazily, so constructing a
/// client never touches the network.
pub struct PostgreSQLClient {
    /// Connection pool
    pool: Pool,

    /// Configuration
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string cannot be parsed, the TLS
    /// connector cannot be built, or the pool cannot be created.
    pub fn new(config: PostgreSQLConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                SextantError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            mode => {
                pg_config.ssl_mode(if mode == "require" {
                    SslMode::Require
                } else {
                    SslMode::Prefer
                });
                let connector = native_tls::TlsConnector::new().map_err(|e| {
                    SextantError::Database(format!("Failed to build TLS connector: {e}"))
                })?;
                Manager::from_config(pg_config, MakeTlsConnector::new(connector), manager_config)
            }
        };

        let timeout = Duration::from_secs(config.connection_timeout_seconds);
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| SextantError::Database(format!("Failed to create connection pool: {e}")))?;

        Ok(Self { pool, config })
    }

    /// Test the connection to PostgreSQL
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.get_connection().await?;
        client.query_one("SELECT 1", &[]).await?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Get a session from the pool, prepared for read-only queries
    ///
    /// The time zone is reset to UTC on every checkout so `timestamp` columns
    /// compare against the `timestamptz` cutoff as UTC wall-clock values,
    /// whatever the server or database default is.
    ///
    /// # Errors
    ///
    /// Returns an error if a connection cannot be obtained or the session
    /// settings are rejected.
    pub async fn get_connection(&self) -> Result<deadpool_postgres::Object> {
        let client = self.pool.get().await.map_err(|e| {
            SextantError::Database(format!("Failed to get connection from pool: {e}"))
        })?;

        client
            .batch_execute(&session_setup(self.config.statement_timeout_seconds))
            .await?;

        Ok(client)
    }

    /// Get the connection string (without credentials)
    pub fn connection_string_safe(&self) -> String {
        self.config
            .connection_string
            .expose_secret()
            .as_ref()
            .rsplit('@')
            .next()
            .filter(|host| !host.contains("://"))
            .map(|host| format!("postgresql://***@{host}"))
            .unwrap_or_else(|| "postgresql://***".to_string())
    }

    /// Get the pool statistics
    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}
