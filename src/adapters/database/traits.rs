//! Database abstraction traits
//!
//! This module defines what a checksum source must provide: the row
//! identifiers of one table, in query order.

use crate::core::verification::ChecksumQuery;
use crate::domain::Result;
use async_trait::async_trait;

/// Source of ordered row identifiers for checksum computation
///
/// Implementations execute the query described by [`ChecksumQuery`] and hand
/// each identifier to `visit` as rows arrive, so the caller can digest a table
/// without holding every identifier in memory.
#[async_trait]
pub trait RowIdSource: Send + Sync {
    /// Run the query and feed every identifier to `visit`, in order
    ///
    /// Returns the number of identifiers visited.
    ///
    /// # Errors
    ///
    /// Errors raised by the query engine are returned unmodified.
    async fn visit_ordered_ids(
        &self,
        query: &ChecksumQuery,
        visit: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<u64>;

    /// Test the database connection
    ///
    /// # Errors
    ///
    /// Returns an error if the connection test fails.
    async fn test_connection(&self) -> Result<()>;

    /// Name of the backend for logging
    fn backend_name(&self) -> &'static str;
}
