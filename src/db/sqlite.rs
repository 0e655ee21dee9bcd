use super::schema::{SQLITE_CREATE_HEALTH_CHECK, SQLITE_INSERT_CHECK, SQLITE_RECENT_CHECKS};
use super::{CONNECT_TIMEOUT, ConnectionFactory, HealthRecord, ProbeSession, ProbeTransaction};
use crate::error::BeaconError;
use crate::secrets::DatabaseCredentials;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Sqlite, Transaction};
use tracing::{debug, error};

/// Local-run factory: the secret's `dbname` names the database file.
/// Host, port and login are not used by SQLite.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnectionFactory;

impl SqliteConnectionFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn connect_options(creds: &DatabaseCredentials) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&creds.database)
            .create_if_missing(true)
            .busy_timeout(CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl ConnectionFactory for SqliteConnectionFactory {
    async fn connect(
        &self,
        creds: &DatabaseCredentials,
    ) -> Result<Box<dyn ProbeSession>, BeaconError> {
        let opts = Self::connect_options(creds);
        match tokio::time::timeout(CONNECT_TIMEOUT, opts.connect()).await {
            Ok(Ok(conn)) => {
                debug!(database = %creds.database, "sqlite session opened");
                Ok(Box::new(SqliteSession { conn }))
            }
            Ok(Err(e)) => {
                error!(database = %creds.database, error = %e, "Database connection error");
                Err(BeaconError::ConnectionUnavailable)
            }
            Err(_) => {
                error!(database = %creds.database, "Database connection timed out");
                Err(BeaconError::ConnectionUnavailable)
            }
        }
    }
}

pub struct SqliteSession {
    conn: SqliteConnection,
}

#[async_trait]
impl ProbeSession for SqliteSession {
    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn ProbeTransaction + 'a>, sqlx::Error> {
        // Write lock at BEGIN: upgrading a deferred read lock returns
        // SQLITE_BUSY without consulting the busy timeout.
        let tx = self.conn.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Box::new(SqliteProbeTransaction { tx }))
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        let SqliteSession { conn } = *self;
        conn.close().await
    }
}

struct SqliteProbeTransaction<'c> {
    tx: Transaction<'c, Sqlite>,
}

#[async_trait]
impl<'c> ProbeTransaction for SqliteProbeTransaction<'c> {
    async fn ensure_table(&mut self) -> Result<(), sqlx::Error> {
        sqlx::query(SQLITE_CREATE_HEALTH_CHECK)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_check(&mut self, status: &str) -> Result<i64, sqlx::Error> {
        let done = sqlx::query(SQLITE_INSERT_CHECK)
            .bind(status)
            .execute(&mut *self.tx)
            .await?;
        Ok(done.last_insert_rowid())
    }

    async fn recent_checks(&mut self, limit: i64) -> Result<Vec<HealthRecord>, sqlx::Error> {
        sqlx::query_as::<_, HealthRecord>(SQLITE_RECENT_CHECKS)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let SqliteProbeTransaction { tx } = *self;
        tx.commit().await
    }
}
