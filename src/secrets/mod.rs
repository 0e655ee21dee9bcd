//! Secret resolution: fetch one named secret and decode it into database
//! credentials.
//!
//! Layout:
//! - `credentials.rs`: typed secret payload and `DatabaseCredentials`
//! - `aws_credentials.rs`: AWS access keys from the environment or instance metadata
//! - `sigv4.rs`: AWS Signature Version 4 request signing
//! - `secrets_manager.rs`: the Secrets Manager `GetSecretValue` client

pub mod aws_credentials;
pub mod credentials;
pub mod secrets_manager;
pub mod sigv4;

pub use credentials::DatabaseCredentials;
pub use secrets_manager::SecretsManagerClient;

use crate::error::{BeaconError, SecretStoreError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

/// Identifies which secret to fetch and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretReference {
    pub name: String,
    pub region: String,
}

impl SecretReference {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

/// Boundary to the external secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Return the raw string value of the referenced secret.
    async fn get_secret_string(&self, reference: &SecretReference)
    -> Result<String, SecretStoreError>;
}

/// Fetches and decodes database credentials, collapsing every failure into
/// [`BeaconError::SecretUnavailable`].
#[derive(Clone)]
pub struct SecretResolver {
    store: Arc<dyn SecretStore>,
}

impl SecretResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        reference: &SecretReference,
    ) -> Result<DatabaseCredentials, BeaconError> {
        if reference.name.trim().is_empty() || reference.region.trim().is_empty() {
            error!(
                secret = %reference.name,
                region = %reference.region,
                "secret reference is incomplete"
            );
            return Err(BeaconError::SecretUnavailable);
        }

        let payload = self
            .store
            .get_secret_string(reference)
            .await
            .map_err(|e| {
                error!(
                    secret = %reference.name,
                    region = %reference.region,
                    error = %e,
                    "Error retrieving secret"
                );
                BeaconError::SecretUnavailable
            })?;

        let creds = DatabaseCredentials::from_payload(&payload).map_err(|e| {
            error!(secret = %reference.name, error = %e, "secret payload rejected");
            BeaconError::SecretUnavailable
        })?;
        debug!(secret = %reference.name, host = %creds.host, "database credentials resolved");
        Ok(creds)
    }
}
