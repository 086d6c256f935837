//! Azure workload identity federated to Google Cloud
//!
//! Each [`authorize`](CredentialProvider::authorize) call runs the full chain:
//!
//! 1. read the projected Azure workload identity token from disk
//! 2. exchange it at Azure AD for an access token (`client_credentials` grant
//!    with a JWT client assertion)
//! 3. exchange that at Google STS (`token-exchange` grant) for a federated token
//! 4. if the external-account file names a service account, trade the
//!    federated token for a service-account access token
//!
//! Nothing is cached between calls.

use super::{Credential, CredentialProvider};
use crate::config::WarehouseConfig;
use crate::domain::{Result, SextantError};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

const CLIENT_ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";
const TOKEN_EXCHANGE_GRANT: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const ACCESS_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:access_token";
const JWT_TOKEN_TYPE: &str = "urn:ietf:params:oauth:token-type:jwt";

/// The parts of a Google `external_account` credentials file we use
#[derive(Debug, Clone, Deserialize)]
struct ExternalAccount {
    audience: String,
    #[serde(default = "default_subject_token_type")]
    subject_token_type: String,
    token_url: String,
    #[serde(default)]
    service_account_impersonation_url: Option<String>,
}

fn default_subject_token_type() -> String {
    JWT_TOKEN_TYPE.to_string()
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImpersonationResponse {
    access_token: String,
    #[serde(default)]
    expire_time: Option<DateTime<Utc>>,
}

/// Federated Azure-to-Google credential provider
pub struct FederatedCredentialProvider {
    http: Client,
    token_path: PathBuf,
    client_id: String,
    azure_scope: String,
    gcp_scope: String,
    azure_token_url: String,
    account: ExternalAccount,
}

impl FederatedCredentialProvider {
    /// Builds the provider from warehouse settings
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming every missing key, or if the
    /// Google credentials are not a valid external-account document.
    pub fn from_config(config: &WarehouseConfig) -> Result<Self> {
        let missing: Vec<&str> = [
            ("azure_client_id", &config.azure_client_id),
            ("azure_token_path", &config.azure_token_path),
            ("azure_scope", &config.azure_scope),
            ("gcp_scope", &config.gcp_scope),
            ("azure_tenant_id", &config.azure_tenant_id),
        ]
        .into_iter()
        .filter(|(_, v)| v.as_deref().map(str::trim).unwrap_or("").is_empty())
        .map(|(k, _)| k)
        .chain(
            config
                .google_cloud_credentials
                .is_none()
                .then_some("google_cloud_credentials"),
        )
        .collect();
        if !missing.is_empty() {
            return Err(SextantError::Configuration(format!(
                "missing required config values: {}",
                missing.join(", ")
            )));
        }

        let account: ExternalAccount = config
            .google_cloud_credentials
            .as_ref()
            .map(|raw| serde_json::from_str(raw.expose_secret().as_ref()))
            .transpose()
            .map_err(|e| {
                SextantError::Configuration(format!(
                    "google_cloud_credentials is not a valid external account JSON: {e}"
                ))
            })?
            .ok_or_else(|| {
                SextantError::Configuration("google_cloud_credentials is not set".to_string())
            })?;

        let tenant = config.azure_tenant_id.as_deref().unwrap_or_default();
        let azure_token_url = format!(
            "{}/{}/oauth2/v2.0/token",
            config.azure_authority_host.trim_end_matches('/'),
            tenant
        );

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                SextantError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            token_path: PathBuf::from(config.azure_token_path.clone().unwrap_or_default()),
            client_id: config.azure_client_id.clone().unwrap_or_default(),
            azure_scope: config.azure_scope.clone().unwrap_or_default(),
            gcp_scope: config.gcp_scope.clone().unwrap_or_default(),
            azure_token_url,
            account,
        })
    }

    async fn read_identity_token(&self) -> Result<String> {
        let token = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|e| {
                SextantError::Authentication(format!(
                    "Failed to read Azure token file {}: {}",
                    self.token_path.display(),
                    e
                ))
            })?;
        Ok(token.trim().to_string())
    }

    async fn azure_access_token(&self, assertion: &str) -> Result<String> {
        let request = self.http.post(&self.azure_token_url).form(&[
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("scope", self.azure_scope.as_str()),
            ("client_assertion_type", CLIENT_ASSERTION_TYPE),
            ("client_assertion", assertion),
        ]);
        let response: OAuthTokenResponse = send_for_token(request, "Azure AD").await?;
        Ok(response.access_token)
    }

    async fn sts_token(&self, subject_token: &str) -> Result<OAuthTokenResponse> {
        let request = self.http.post(&self.account.token_url).form(&[
            ("grant_type", TOKEN_EXCHANGE_GRANT),
            ("audience", self.account.audience.as_str()),
            ("scope", self.gcp_scope.as_str()),
            ("requested_token_type", ACCESS_TOKEN_TYPE),
            ("subject_token", subject_token),
            ("subject_token_type", self.account.subject_token_type.as_str()),
        ]);
        send_for_token(request, "Google STS").await
    }

    async fn impersonate(&self, url: &str, federated_token: &str) -> Result<Credential> {
        let request = self
            .http
            .post(url)
            .bearer_auth(federated_token)
            .json(&serde_json::json!({ "scope": [self.gcp_scope] }));
        let response: ImpersonationResponse =
            send_for_token(request, "service account impersonation").await?;

        let credential = Credential::new(response.access_token);
        Ok(match response.expire_time {
            Some(expiry) => credential.with_expiry(expiry),
            None => credential,
        })
    }
}

async fn send_for_token<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    stage: &str,
) -> Result<T> {
    let response = request.send().await.map_err(|e| {
        SextantError::Authentication(format!("{stage} token request failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SextantError::Authentication(format!(
            "{stage} token request returned {status}: {body}"
        )));
    }

    response.json::<T>().await.map_err(|e| {
        SextantError::Authentication(format!("{stage} token response could not be parsed: {e}"))
    })
}

#[async_trait]
impl CredentialProvider for FederatedCredentialProvider {
    async fn authorize(&self) -> Result<Credential> {
        let identity_token = self.read_identity_token().await?;
        let azure_token = self.azure_access_token(&identity_token).await?;
        let federated = self.sts_token(&azure_token).await?;

        let credential = match self.account.service_account_impersonation_url.as_deref() {
            Some(url) => self.impersonate(url, &federated.access_token).await?,
            None => {
                let credential = Credential::new(federated.access_token);
                match federated.expires_in {
                    Some(secs) => credential.with_expiry(Utc::now() + ChronoDuration::seconds(secs)),
                    None => credential,
                }
            }
        };

        tracing::debug!(
            expires_at = ?credential.expires_at(),
            impersonated = self.account.service_account_impersonation_url.is_some(),
            "Obtained federated warehouse credential"
        );
        Ok(credential)
    }
}
