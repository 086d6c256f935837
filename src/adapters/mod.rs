//! External system integrations for Sextant.
//!
//! - [`auth`] - Azure workload identity federated to Google Cloud
//! - [`bigquery`] - BigQuery `insertAll` transport
//! - [`database`] - Checksum source abstraction (trait-based)
//! - [`postgresql`] - PostgreSQL checksum source
//!
//! Adapters isolate external dependencies so the core can be tested against
//! in-memory implementations.
//!
//! ```rust,no_run
//! use sextant::adapters::bigquery::WarehouseClient;
//! use sextant::config::WarehouseConfig;
//!
//! # fn example() -> sextant::domain::Result<()> {
//! let client = WarehouseClient::new(&WarehouseConfig::default())?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod bigquery;
pub mod database;
pub mod postgresql;
