//! Batch insertion into the events table
//!
//! [`BatchInserter`] owns the warehouse client and builds it on first use.
//! Building it is where the required-key check happens, so a missing key
//! fails the first insert before any network call. A failed build is not
//! cached: the next insert checks again.

use crate::adapters::auth::CredentialProvider;
use crate::adapters::bigquery::{InsertOutcome, RowRejection, WarehouseClient};
use crate::config::{RetryConfig, SextantConfig, WarehouseConfig, WarehouseTarget};
use crate::core::retry::{retry_with_backoff, RetryPolicy};
use crate::domain::{Batch, Result, SextantError};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Resolved client, destination and policy, built once per inserter
struct EventsClient {
    client: WarehouseClient,
    target: WarehouseTarget,
    policy: RetryPolicy,
}

/// Sends event batches to the warehouse
///
/// # Example
///
/// ```rust,no_run
/// use sextant::adapters::auth::StaticCredentialProvider;
/// use sextant::config::load_config;
/// use sextant::core::insert::BatchInserter;
/// use sextant::domain::{Batch, Event};
/// use std::sync::Arc;
///
/// # async fn example() -> sextant::domain::Result<()> {
/// let config = load_config("sextant.toml")?;
/// let credentials = Arc::new(StaticCredentialProvider::new("ya29.token"));
/// let inserter = BatchInserter::from_config(&config, credentials);
///
/// let event = Event::new(serde_json::json!({"event_type": "web_request"}))?;
/// inserter.insert(&Batch::new(vec![event])).await?;
/// # Ok(())
/// # }
/// ```
pub struct BatchInserter {
    config: WarehouseConfig,
    retry: RetryConfig,
    credentials: Arc<dyn CredentialProvider>,
    events_client: OnceCell<EventsClient>,
}

impl BatchInserter {
    pub fn new(
        config: WarehouseConfig,
        retry: RetryConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            retry,
            credentials,
            events_client: OnceCell::new(),
        }
    }

    pub fn from_config(config: &SextantConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::new(config.warehouse.clone(), config.retry.clone(), credentials)
    }

    async fn events_client(&self) -> Result<&EventsClient> {
        self.events_client
            .get_or_try_init(|| async {
                let target = self.config.require_complete()?;
                let max_retries = self.config.bigquery_retries.unwrap_or_default();
                let policy = self.retry.to_policy(max_retries)?;
                let client = WarehouseClient::new(&self.config)?;

                tracing::debug!(
                    project = %target.project_id,
                    dataset = %target.dataset,
                    table = %target.table_name,
                    max_retries,
                    "Warehouse client initialized"
                );
                Ok(EventsClient {
                    client,
                    target,
                    policy,
                })
            })
            .await
    }

    /// Insert one batch as a single request
    ///
    /// A fresh credential is obtained once per call and reused across that
    /// call's retries. An empty batch is accepted without contacting the
    /// warehouse.
    ///
    /// # Errors
    ///
    /// - [`SextantError::Configuration`] naming every missing key
    /// - [`SextantError::Authentication`] if no credential can be obtained
    /// - [`SextantError::Warehouse`] once retries are exhausted, or at once
    ///   for non-transient faults
    /// - [`SextantError::SendEvents`] if the warehouse rejected any row
    pub async fn insert(&self, batch: &Batch) -> Result<()> {
        let events_client = self.events_client().await?;

        if batch.is_empty() {
            tracing::debug!("Empty batch, nothing to insert");
            return Ok(());
        }

        let credential = self.credentials.authorize().await?;

        let outcome = retry_with_backoff(&events_client.policy, "insert_all", || {
            events_client
                .client
                .insert_all(&events_client.target, &credential, batch)
        })
        .await?;

        match outcome {
            InsertOutcome::Accepted => {
                tracing::info!(
                    events = batch.len(),
                    table = %events_client.target.table_name,
                    "Inserted batch"
                );
                Ok(())
            }
            InsertOutcome::Rejected(rejections) => Err(report_rejections(batch, &rejections)),
        }
    }
}

/// Error text for a rejected batch
///
/// One header line with the number of rejected rows, then one line per row
/// with its index and messages.
pub fn rejection_message(rejections: &[RowRejection]) -> String {
    let mut message = format!(
        "BigQuery insert error for {} event(s):",
        rejections.len()
    );
    for rejection in rejections {
        message.push('\n');
        message.push_str(&rejection.to_string());
    }
    message
}

/// Logs every event of the batch, since the warehouse may have dropped any of
/// them, then the aggregated error
fn report_rejections(batch: &Batch, rejections: &[RowRejection]) -> SextantError {
    let total = batch.len();
    for (i, event) in batch.iter().enumerate() {
        crate::log_rejected_event!(i + 1, total, event);
    }

    let message = rejection_message(rejections);
    tracing::error!(rejected = rejections.len(), total, "{}", message);
    SextantError::SendEvents(message)
}
