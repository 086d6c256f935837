//! PostgreSQL adapter implementing the checksum source trait

use crate::adapters::database::traits::RowIdSource;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::core::verification::ChecksumQuery;
use crate::domain::Result;
use async_trait::async_trait;
use futures::{pin_mut, TryStreamExt};
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// PostgreSQL implementation of [`RowIdSource`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }
}

fn slice_iter<'a>(
    params: &'a [&'a (dyn ToSql + Sync)],
) -> impl ExactSizeIterator<Item = &'a dyn ToSql> + 'a {
    params.iter().map(|p| *p as _)
}

#[async_trait]
impl RowIdSource for PostgreSQLAdapter {
    async fn visit_ordered_ids(
        &self,
        query: &ChecksumQuery,
        visit: &mut (dyn for<'a> FnMut(&'a str) + Send),
    ) -> Result<u64> {
        let conn = self.client.get_connection().await?;
        let sql = query.sql();
        let cutoff = query.cutoff();

        let params: Vec<&(dyn ToSql + Sync)> = match cutoff.as_ref() {
            Some(ts) => vec![ts as &(dyn ToSql + Sync)],
            None => Vec::new(),
        };

        tracing::debug!(sql = %sql, cutoff = ?cutoff, "Running checksum query");

        let rows = conn.query_raw(sql.as_str(), slice_iter(&params)).await?;
        pin_mut!(rows);

        let mut visited = 0u64;
        while let Some(row) = rows.try_next().await? {
            let id: Option<String> = row.try_get(0)?;
            visit(id.as_deref().unwrap_or(""));
            visited += 1;
        }

        Ok(visited)
    }

    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await
    }

    fn backend_name(&self) -> &'static str {
        "postgresql"
    }
}
