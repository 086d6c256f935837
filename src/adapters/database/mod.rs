//! Database abstraction layer
//!
//! This module provides a trait-based abstraction over checksum sources, so
//! the checksum calculator can run against PostgreSQL or an in-memory table.

pub mod factory;
pub mod traits;

pub use factory::create_row_id_source;
pub use traits::RowIdSource;
