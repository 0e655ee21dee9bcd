use super::ServiceContext;
use crate::config::SERVICE_VERSION;
use crate::db;
use crate::error::BeaconError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    Unhealthy,
}

/// Result of one health evaluation. The service reports itself healthy even
/// when its database is not.
#[derive(Debug, Clone, Serialize)]
pub struct HealthVerdict {
    pub status: Status,
    pub database: Status,
    /// Short cause when the database is unhealthy. Logged, never rendered.
    #[serde(skip)]
    pub detail: Option<String>,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe for the database dependency. Never fails outward.
#[derive(Clone)]
pub struct HealthEvaluator {
    ctx: ServiceContext,
}

impl HealthEvaluator {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub async fn evaluate(&self) -> HealthVerdict {
        let (database, detail) = match self.check_database().await {
            Ok(()) => (Status::Healthy, None),
            Err(e) => {
                warn!(error = %e, "database reported unhealthy");
                (Status::Unhealthy, Some(e.to_string()))
            }
        };
        HealthVerdict {
            status: Status::Healthy,
            database,
            detail,
            version: SERVICE_VERSION,
            timestamp: Utc::now(),
        }
    }

    /// Whether a session can be opened at all; no query is run.
    pub async fn is_reachable(&self) -> bool {
        match self.ctx.open_session().await {
            Ok(session) => {
                db::release(session).await;
                true
            }
            Err(_) => false,
        }
    }

    async fn check_database(&self) -> Result<(), BeaconError> {
        let mut session = self.ctx.open_session().await?;
        let outcome = session.ping().await;
        db::release(session).await;

        outcome.map_err(|e| {
            error!(error = %e, "health query failed");
            BeaconError::ConnectionUnavailable
        })?;
        debug!("database health query succeeded");
        Ok(())
    }
}
