//! Core logic for Sextant.
//!
//! # Modules
//!
//! - [`insert`] - Batch delivery to the warehouse
//! - [`retry`] - Exponential backoff for transient transport faults
//! - [`verification`] - Table checksums
//!
//! # Example
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use sextant::adapters::database::create_row_id_source;
//! use sextant::config::load_config;
//! use sextant::core::verification::ChecksumCalculator;
//! use sextant::domain::{ColumnName, TableName};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sextant.toml")?;
//! let calculator = ChecksumCalculator::new(create_row_id_source(&config)?)
//!     .with_algorithm(config.checksum.algorithm);
//!
//! let result = calculator
//!     .compute(
//!         &TableName::new("users")?,
//!         &ColumnName::new("updated_at")?,
//!         Utc::now(),
//!     )
//!     .await?;
//! println!("{} rows, {}", result.row_count, result.digest);
//! # Ok(())
//! # }
//! ```

pub mod insert;
pub mod retry;
pub mod verification;
