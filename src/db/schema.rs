//! SQL for the self-test table.
//!
//! Ordering is by timestamp, newest first; `id` breaks ties so rows written
//! within the same clock tick keep insertion order.

/// PostgreSQL:
/// - `id` SERIAL identity
/// - `timestamp` defaults to the insertion time
/// - `status` short text
pub const PG_CREATE_HEALTH_CHECK: &str = r#"
CREATE TABLE IF NOT EXISTS health_check (
    id SERIAL PRIMARY KEY,
    timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    status VARCHAR(50)
)
"#;

/// Key of the transaction-scoped advisory lock taken before the DDL above.
/// Two first-ever `CREATE TABLE IF NOT EXISTS` in concurrent transactions
/// otherwise collide on the `pg_type` unique index.
pub const PG_HEALTH_CHECK_LOCK_KEY: i64 = 0x6865_616c_7468;

pub const PG_LOCK_HEALTH_CHECK: &str = "SELECT pg_advisory_xact_lock($1)";

pub const PG_INSERT_CHECK: &str =
    "INSERT INTO health_check (status) VALUES ($1) RETURNING id::BIGINT";

// Both columns are nullable here, hence the COALESCE.
pub const PG_RECENT_CHECKS: &str = r#"
SELECT id::BIGINT AS id,
       COALESCE(health_check.timestamp, CURRENT_TIMESTAMP::TIMESTAMP) AS timestamp,
       COALESCE(health_check.status, '') AS status
FROM health_check
ORDER BY health_check.timestamp DESC, health_check.id DESC
LIMIT $1
"#;

/// SQLite flavor of the same table. `CURRENT_TIMESTAMP` has second resolution.
pub const SQLITE_CREATE_HEALTH_CHECK: &str = r#"
CREATE TABLE IF NOT EXISTS health_check (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    status VARCHAR(50) NOT NULL
)
"#;

pub const SQLITE_INSERT_CHECK: &str = "INSERT INTO health_check (status) VALUES (?)";

pub const SQLITE_RECENT_CHECKS: &str = r#"
SELECT id, timestamp, status
FROM health_check
ORDER BY timestamp DESC, id DESC
LIMIT ?
"#;
