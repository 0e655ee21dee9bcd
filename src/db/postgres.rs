use super::schema::{
    PG_CREATE_HEALTH_CHECK, PG_HEALTH_CHECK_LOCK_KEY, PG_INSERT_CHECK, PG_LOCK_HEALTH_CHECK,
    PG_RECENT_CHECKS,
};
use super::{CONNECT_TIMEOUT, ConnectionFactory, HealthRecord, ProbeSession, ProbeTransaction};
use crate::error::BeaconError;
use crate::secrets::DatabaseCredentials;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Postgres, Transaction};
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, Default)]
pub struct PgConnectionFactory;

impl PgConnectionFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn connect_options(creds: &DatabaseCredentials) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&creds.host)
            .port(creds.port)
            .database(&creds.database)
            .username(&creds.username)
            .password(&creds.password)
            .application_name("status-beacon")
    }
}

#[async_trait]
impl ConnectionFactory for PgConnectionFactory {
    async fn connect(
        &self,
        creds: &DatabaseCredentials,
    ) -> Result<Box<dyn ProbeSession>, BeaconError> {
        let opts = Self::connect_options(creds);
        match tokio::time::timeout(CONNECT_TIMEOUT, opts.connect()).await {
            Ok(Ok(conn)) => {
                debug!(host = %creds.host, port = creds.port, database = %creds.database, "database session opened");
                Ok(Box::new(PgSession { conn }))
            }
            Ok(Err(e)) => {
                error!(
                    host = %creds.host,
                    port = creds.port,
                    database = %creds.database,
                    error = %e,
                    "Database connection error"
                );
                Err(BeaconError::ConnectionUnavailable)
            }
            Err(_) => {
                error!(
                    host = %creds.host,
                    port = creds.port,
                    database = %creds.database,
                    timeout_secs = CONNECT_TIMEOUT.as_secs(),
                    "Database connection timed out"
                );
                Err(BeaconError::ConnectionUnavailable)
            }
        }
    }
}

pub struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl ProbeSession for PgSession {
    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&mut self.conn).await?;
        Ok(())
    }

    async fn begin<'a>(&'a mut self) -> Result<Box<dyn ProbeTransaction + 'a>, sqlx::Error> {
        let tx = self.conn.begin().await?;
        Ok(Box::new(PgProbeTransaction { tx }))
    }

    async fn close(self: Box<Self>) -> Result<(), sqlx::Error> {
        let PgSession { conn } = *self;
        conn.close().await
    }
}

struct PgProbeTransaction<'c> {
    tx: Transaction<'c, Postgres>,
}

#[async_trait]
impl<'c> ProbeTransaction for PgProbeTransaction<'c> {
    async fn ensure_table(&mut self) -> Result<(), sqlx::Error> {
        // Held until commit or rollback.
        sqlx::query(PG_LOCK_HEALTH_CHECK)
            .bind(PG_HEALTH_CHECK_LOCK_KEY)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query(PG_CREATE_HEALTH_CHECK)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_check(&mut self, status: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(PG_INSERT_CHECK)
            .bind(status)
            .fetch_one(&mut *self.tx)
            .await
    }

    async fn recent_checks(&mut self, limit: i64) -> Result<Vec<HealthRecord>, sqlx::Error> {
        sqlx::query_as::<_, HealthRecord>(PG_RECENT_CHECKS)
            .bind(limit)
            .fetch_all(&mut *self.tx)
            .await
    }

    async fn commit(self: Box<Self>) -> Result<(), sqlx::Error> {
        let PgProbeTransaction { tx } = *self;
        tx.commit().await
    }
}
