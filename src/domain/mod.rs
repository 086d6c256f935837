//! Domain models and types for Sextant.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Events** ([`Event`], [`Batch`]) shipped to the warehouse
//! - **Validated SQL identifiers** ([`TableName`], [`ColumnName`]) for checksum queries
//! - **Error types** ([`SextantError`], [`WarehouseError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SextantError>`]:
//!
//! ```rust
//! use sextant::domain::{Result, TableName, SextantError};
//!
//! fn table(name: &str) -> Result<TableName> {
//!     TableName::new(name).map_err(SextantError::Validation)
//! }
//! ```

pub mod errors;
pub mod event;
pub mod ids;
pub mod result;

pub use errors::{SextantError, WarehouseError};
pub use event::{parse_events, Batch, Event};
pub use ids::{ColumnName, TableName};
pub use result::Result;
