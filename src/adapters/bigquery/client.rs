//! BigQuery REST client
//!
//! One [`WarehouseClient::insert_all`] call is one HTTP request. Retrying is
//! the caller's job; this module only classifies what went wrong.

use super::models::{InsertAllRequest, InsertAllResponse, InsertOutcome};
use crate::adapters::auth::Credential;
use crate::config::{WarehouseConfig, WarehouseTarget};
use crate::domain::{Batch, Result, SextantError, WarehouseError};
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use url::Url;

/// HTTP client for the BigQuery v2 API
#[derive(Debug, Clone)]
pub struct WarehouseClient {
    http: Client,
    api_base: Url,
}

impl WarehouseClient {
    /// Create a client for the configured API base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: &WarehouseConfig) -> Result<Self> {
        let api_base = Url::parse(&config.bigquery_api_url).map_err(|e| {
            SextantError::Configuration(format!(
                "Invalid bigquery_api_url '{}': {e}",
                config.bigquery_api_url
            ))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(SextantError::Configuration(format!(
                "bigquery_api_url '{}' cannot be used as a base URL",
                config.bigquery_api_url
            )));
        }

        let http = ClientBuilder::new()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SextantError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { http, api_base })
    }

    /// `.../projects/{p}/datasets/{d}/tables/{t}/insertAll`
    pub fn insert_all_url(&self, target: &WarehouseTarget) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "projects",
                target.project_id.as_str(),
                "datasets",
                target.dataset.as_str(),
                "tables",
                target.table_name.as_str(),
                "insertAll",
            ]);
        }
        url
    }

    /// Send one batch in a single `insertAll` request
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] for transport failures and non-success
    /// statuses. Row rejections are not errors here; they come back as
    /// [`InsertOutcome::Rejected`].
    pub async fn insert_all(
        &self,
        target: &WarehouseTarget,
        credential: &Credential,
        batch: &Batch,
    ) -> Result<InsertOutcome> {
        let url = self.insert_all_url(target);
        let body = InsertAllRequest::from_batch(batch);

        tracing::debug!(url = %url, rows = batch.len(), "Sending insertAll request");

        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, credential.bearer())
            .json(&body)
            .send()
            .await
            .map_err(WarehouseError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WarehouseError::from_status(status.as_u16(), message).into());
        }

        let parsed: InsertAllResponse = response
            .json()
            .await
            .map_err(|e| WarehouseError::InvalidResponse(e.to_string()))?;

        Ok(parsed.into())
    }
}
