use axum::{Json, extract::State};
use tracing::error;

use crate::service::HealthVerdict;
use crate::types::responses::DatabaseTestResponse;
use crate::{BeaconError, router::BeaconState};

/// GET /health -> always 200 while the evaluation completes; the database
/// verdict rides in the body.
///
/// Runs on its own task so a dropped client cannot cut a probe short.
pub async fn health_handler(
    State(state): State<BeaconState>,
) -> Result<Json<HealthVerdict>, BeaconError> {
    let evaluator = state.health.clone();
    tokio::spawn(async move { evaluator.evaluate().await })
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Health check failed");
            BeaconError::EvaluationAborted
        })
}

/// GET /api/database/test -> write-and-read probe; 500 with a short cause on failure.
pub async fn database_test_handler(
    State(state): State<BeaconState>,
) -> Result<Json<DatabaseTestResponse>, BeaconError> {
    let runner = state.self_test.clone();
    let report = tokio::spawn(async move { runner.run().await })
        .await
        .map_err(|e| {
            error!(error = %e, "Database test task failed");
            BeaconError::DatabaseTestFailed("Database test aborted".to_string())
        })??;

    Ok(Json(DatabaseTestResponse {
        status: "success",
        message: "Database connection successful",
        recent_checks: report.records,
    }))
}
