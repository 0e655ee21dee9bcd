use crate::error::BeaconError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Version reported by every status endpoint.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Which database driver the connection factory speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    #[default]
    Postgres,
    /// Local runs: the secret's `dbname` is a file path, host and port are ignored.
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db_secret_name: String,
    pub aws_region: String,
    pub port: u16,
    pub debug: bool,
    pub loglevel: Option<String>,
    pub project_name: String,
    pub environment: String,
    /// Overrides the regional Secrets Manager endpoint (LocalStack and friends).
    pub secrets_endpoint: Option<Url>,
    pub database_driver: DatabaseDriver,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_secret_name: "8byte-app-dev-db-password".to_string(),
            aws_region: "us-west-2".to_string(),
            port: 8000,
            debug: false,
            loglevel: None,
            project_name: "8byte-app".to_string(),
            environment: "dev".to_string(),
            secrets_endpoint: None,
            database_driver: DatabaseDriver::default(),
        }
    }
}

const ENV_KEYS: &[&str] = &[
    "DB_SECRET_NAME",
    "AWS_REGION",
    "PORT",
    "DEBUG",
    "LOGLEVEL",
    "PROJECT_NAME",
    "ENVIRONMENT",
    "SECRETS_ENDPOINT",
    "DATABASE_DRIVER",
];

impl Config {
    /// Defaults overlaid with the recognized environment variables.
    pub fn from_env() -> Result<Self, BeaconError> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Env::raw().only(ENV_KEYS)),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self, BeaconError> {
        figment
            .extract()
            .map_err(|e| BeaconError::Config(e.to_string()))
    }

    /// Effective tracing filter directive.
    pub fn log_filter(&self) -> String {
        match (&self.loglevel, self.debug) {
            (Some(level), _) => level.clone(),
            (None, true) => "debug".to_string(),
            (None, false) => "info".to_string(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
