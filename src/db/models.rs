use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of the `health_check` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct HealthRecord {
    pub id: i64,
    pub timestamp: NaiveDateTime,
    pub status: String,
}
