pub mod health;

pub use health::{HealthEvaluator, HealthVerdict, Status};
pub use self_test::{SelfTestReport, SelfTestRunner};

use crate::config::Config;
use crate::db::{self, ConnectionFactory, ProbeSession};
use crate::error::BeaconError;
use crate::secrets::aws_credentials::CredentialSource;
use crate::secrets::{SecretReference, SecretResolver, SecretStore, SecretsManagerClient};
use std::sync::Arc;
use tracing::error;

/// Everything a probe needs, built once at startup and handed to each
/// component. Holds no per-request state.
#[derive(Clone)]
pub struct ServiceContext {
    pub config: Arc<Config>,
    pub secrets: SecretResolver,
    pub connector: Arc<dyn ConnectionFactory>,
}

impl ServiceContext {
    pub fn new(
        config: Config,
        store: Arc<dyn SecretStore>,
        connector: Arc<dyn ConnectionFactory>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            secrets: SecretResolver::new(store),
            connector,
        }
    }

    /// Production wiring: AWS Secrets Manager plus the configured driver.
    pub fn from_config(config: Config) -> Result<Self, BeaconError> {
        let store = SecretsManagerClient::new(
            CredentialSource::DefaultChain,
            config.secrets_endpoint.clone(),
        )
        .map_err(|e| {
            error!(error = %e, "failed to build secrets manager client");
            BeaconError::Config(e.to_string())
        })?;
        let connector = db::factory_for(config.database_driver);
        Ok(Self::new(config, Arc::new(store), connector))
    }

    pub fn secret_reference(&self) -> SecretReference {
        SecretReference::new(&self.config.db_secret_name, &self.config.aws_region)
    }

    /// Resolve credentials and open a fresh session.
    pub async fn open_session(&self) -> Result<Box<dyn ProbeSession>, BeaconError> {
        let creds = self.secrets.resolve(&self.secret_reference()).await?;
        self.connector.connect(&creds).await
    }
}
