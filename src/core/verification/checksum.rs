//! Table checksums
//!
//! A checksum is the digest of the concatenation of a table's row
//! identifiers, ordered by one column. Two replicas holding the same rows
//! produce the same digest, so comparing digests audits a replica without
//! moving row data.
//!
//! When ordering by a temporal column (`created_at` or `updated_at`), only
//! rows strictly before the cutoff are included. Any other column orders the
//! full table and the cutoff is ignored.

use crate::adapters::database::RowIdSource;
use crate::config::ChecksumAlgorithm;
use crate::domain::ids::quote_identifier;
use crate::domain::{ColumnName, Result, TableName};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Identifier column read from every table
pub const ID_COLUMN: &str = "id";

/// The query behind one checksum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumQuery {
    table: TableName,
    order_column: ColumnName,
    cutoff: Option<DateTime<Utc>>,
}

impl ChecksumQuery {
    /// The cutoff is kept only when `order_column` is temporal
    pub fn new(table: TableName, order_column: ColumnName, as_of: DateTime<Utc>) -> Self {
        let cutoff = order_column.is_temporal().then_some(as_of);
        Self {
            table,
            order_column,
            cutoff,
        }
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn order_column(&self) -> &ColumnName {
        &self.order_column
    }

    /// Exclusive upper bound on `order_column`, bound as `$1`
    pub fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.cutoff
    }

    /// SQL text with the cutoff as parameter `$1`
    ///
    /// ```
    /// use chrono::Utc;
    /// use sextant::core::verification::ChecksumQuery;
    /// use sextant::domain::{ColumnName, TableName};
    ///
    /// let query = ChecksumQuery::new(
    ///     TableName::new("users").unwrap(),
    ///     ColumnName::new("updated_at").unwrap(),
    ///     Utc::now(),
    /// );
    /// assert_eq!(
    ///     query.sql(),
    ///     "SELECT \"users\".\"id\"::text FROM \"users\" \
    ///      WHERE \"users\".\"updated_at\" < $1::timestamptz \
    ///      ORDER BY \"users\".\"updated_at\" ASC"
    /// );
    /// ```
    pub fn sql(&self) -> String {
        let table = self.table.quoted();
        let column = format!("{table}.{}", self.order_column.quoted());

        let mut sql = format!(
            "SELECT {table}.{}::text FROM {table}",
            quote_identifier(ID_COLUMN)
        );
        if self.cutoff.is_some() {
            sql.push_str(&format!(" WHERE {column} < $1::timestamptz"));
        }
        sql.push_str(&format!(" ORDER BY {column} ASC"));
        sql
    }
}

/// Row count and digest of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecksumResult {
    pub table: String,
    pub order_column: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub as_of: Option<DateTime<Utc>>,
    pub algorithm: ChecksumAlgorithm,
    pub row_count: u64,
    pub digest: String,
}

enum IdDigest {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl IdDigest {
    fn new(algorithm: ChecksumAlgorithm) -> Self {
        match algorithm {
            ChecksumAlgorithm::Md5 => IdDigest::Md5(md5::Context::new()),
            ChecksumAlgorithm::Sha256 => IdDigest::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, id: &str) {
        match self {
            IdDigest::Md5(ctx) => ctx.consume(id.as_bytes()),
            IdDigest::Sha256(hasher) => hasher.update(id.as_bytes()),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            IdDigest::Md5(ctx) => format!("{:x}", ctx.compute()),
            IdDigest::Sha256(hasher) => format!("{:x}", hasher.finalize()),
        }
    }
}

/// Digest of identifiers concatenated without a separator
///
/// ```
/// use sextant::config::ChecksumAlgorithm;
/// use sextant::core::verification::checksum::digest_ids;
///
/// assert_eq!(
///     digest_ids(ChecksumAlgorithm::Md5, std::iter::empty::<&str>()),
///     "d41d8cd98f00b204e9800998ecf8427e"
/// );
/// ```
pub fn digest_ids<'a>(
    algorithm: ChecksumAlgorithm,
    ids: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut digest = IdDigest::new(algorithm);
    for id in ids {
        digest.update(id);
    }
    digest.finalize_hex()
}

/// Computes table checksums against a [`RowIdSource`]
pub struct ChecksumCalculator {
    source: Arc<dyn RowIdSource>,
    algorithm: ChecksumAlgorithm,
}

impl ChecksumCalculator {
    pub fn new(source: Arc<dyn RowIdSource>) -> Self {
        Self {
            source,
            algorithm: ChecksumAlgorithm::default(),
        }
    }

    pub fn with_algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Count and digest the rows of `entity` ordered by `order_column`
    ///
    /// Read-only. Identifiers are digested as they stream in.
    ///
    /// # Errors
    ///
    /// Query errors from the source are returned unmodified.
    pub async fn compute(
        &self,
        entity: &TableName,
        order_column: &ColumnName,
        as_of: DateTime<Utc>,
    ) -> Result<ChecksumResult> {
        let query = ChecksumQuery::new(entity.clone(), order_column.clone(), as_of);

        let mut digest = IdDigest::new(self.algorithm);
        let row_count = self
            .source
            .visit_ordered_ids(&query, &mut |id: &str| digest.update(id))
            .await?;
        let digest = digest.finalize_hex();

        tracing::info!(
            table = %entity,
            order_column = %order_column,
            cutoff = ?query.cutoff(),
            backend = self.source.backend_name(),
            row_count,
            digest = %digest,
            "Computed table checksum"
        );

        Ok(ChecksumResult {
            table: entity.to_string(),
            order_column: order_column.to_string(),
            as_of: query.cutoff(),
            algorithm: self.algorithm,
            row_count,
            digest,
        })
    }
}
