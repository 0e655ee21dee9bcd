use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error as ThisError;

/// Outcomes surfaced by the status core and the HTTP layer around it.
///
/// The core kinds carry no lower-level detail: causes are logged where they
/// happen and only a short phrase travels to the caller.
#[derive(Debug, ThisError)]
pub enum BeaconError {
    #[error("database credentials are unavailable")]
    SecretUnavailable,

    #[error("database connection is unavailable")]
    ConnectionUnavailable,

    #[error("{0}")]
    DatabaseTestFailed(String),

    #[error("health evaluation aborted")]
    EvaluationAborted,

    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures talking to the secret store. Never leaves the secrets module
/// except through a log line.
#[derive(Debug, ThisError)]
pub enum SecretStoreError {
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Secrets Manager error {status} {code}: {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    #[error("no AWS credentials found by any provider")]
    MissingAwsCredentials,

    #[error("{provider} credentials: {message}")]
    CredentialProvider {
        provider: &'static str,
        message: String,
    },

    #[error("secret {0} has no string value")]
    BinarySecret(String),

    #[error("invalid secret payload: {0}")]
    InvalidPayload(String),
}

impl IntoResponse for BeaconError {
    fn into_response(self) -> axum::response::Response {
        match self {
            BeaconError::EvaluationAborted => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthFailureBody {
                    status: "unhealthy",
                    error: self.to_string(),
                    timestamp: Utc::now().to_rfc3339(),
                }),
            )
                .into_response(),
            BeaconError::SecretUnavailable
            | BeaconError::ConnectionUnavailable
            | BeaconError::DatabaseTestFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    status: "error",
                    message: self.to_string(),
                }),
            )
                .into_response(),
            BeaconError::Config(_) => {
                tracing::error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        status: "error",
                        message: "An internal server error occurred.".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Body of every non-health failure response.
#[derive(Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

/// Body returned when the health evaluation itself dies.
#[derive(Serialize)]
pub struct HealthFailureBody {
    pub status: &'static str,
    pub error: String,
    pub timestamp: String,
}
