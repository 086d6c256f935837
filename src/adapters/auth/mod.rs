//! Warehouse credentials
//!
//! The insert path asks a [`CredentialProvider`] for a fresh [`Credential`] on
//! every call. Tokens are short-lived, so nothing here caches them.

pub mod federated;

pub use federated::FederatedCredentialProvider;

use crate::config::{secret_string, SecretString};
use crate::domain::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;

/// Bearer access token for the warehouse API
#[derive(Debug, Clone)]
pub struct Credential {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Wraps an access token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: secret_string(token.into()),
            expires_at: None,
        }
    }

    /// Sets the expiry reported by the issuer
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Expiry reported by the issuer, if any
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

/// Supplies a credential on demand
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a fresh credential
    ///
    /// # Errors
    ///
    /// Returns an authentication error if no credential can be issued.
    async fn authorize(&self) -> Result<Credential>;
}

/// Provider that hands out the same pre-issued token, e.g. one obtained with
/// `gcloud auth print-access-token`
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            credential: Credential::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn authorize(&self) -> Result<Credential> {
        Ok(self.credential.clone())
    }
}
