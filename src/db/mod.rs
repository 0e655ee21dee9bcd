//! Database module: one-shot sessions used by the status probes.
//!
//! Layout:
//! - `models.rs`: `HealthRecord`, one row of the self-test table
//! - `schema.rs`: SQL for the self-test table, per driver
//! - `postgres.rs`: PostgreSQL connection factory and session
//! - `sqlite.rs`: SQLite connection factory and session, for local runs

pub mod models;
pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use models::HealthRecord;
pub use postgres::PgConnectionFactory;
pub use sqlite::SqliteConnectionFactory;

use crate::config::DatabaseDriver;
use crate::error::BeaconError;
use crate::secrets::DatabaseCredentials;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on establishing a session.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a fresh session per call. No pooling, no retry.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Fails with [`BeaconError::ConnectionUnavailable`] after logging the cause.
    async fn connect(&self, creds: &DatabaseCredentials)
    -> Result<Box<dyn ProbeSession>, BeaconError>;
}

/// A live session owned by exactly one probe.
#[async_trait]
pub trait ProbeSession: Send {
    /// Run a trivial query to prove the session is usable, not merely open.
    async fn ping(&mut self) -> Result<(), sqlx::Error>;

    /// Start the transaction the self-test runs in. Dropping it rolls back.
    async fn begin<'a>(&'a mut self) -> Result<Box<dyn ProbeTransaction + 'a>, sqlx::Error>;

    /// Close the session gracefully.
    async fn close(self: Box<Self>) -> Result<(), sqlx::Error>;
}

/// The self-test's view of an open transaction.
#[async_trait]
pub trait ProbeTransaction: Send {
    /// Create the self-test table if it does not exist.
    async fn ensure_table(&mut self) -> Result<(), sqlx::Error>;

    /// Append one check row and return its id.
    async fn insert_check(&mut self, status: &str) -> Result<i64, sqlx::Error>;

    /// Newest rows first, at most `limit` of them.
    async fn recent_checks(&mut self, limit: i64) -> Result<Vec<HealthRecord>, sqlx::Error>;

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error>;
}

/// Factory for the configured driver.
pub fn factory_for(driver: DatabaseDriver) -> Arc<dyn ConnectionFactory> {
    match driver {
        DatabaseDriver::Postgres => Arc::new(PgConnectionFactory::new()),
        DatabaseDriver::Sqlite => Arc::new(SqliteConnectionFactory::new()),
    }
}

/// Close a session, logging rather than propagating a failed goodbye.
pub async fn release(session: Box<dyn ProbeSession>) {
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "failed to close database session cleanly");
    }
}
