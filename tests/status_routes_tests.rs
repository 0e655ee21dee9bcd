use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use status_beacon::config::Config;
use status_beacon::db::{ConnectionFactory, SqliteConnectionFactory};
use status_beacon::error::SecretStoreError;
use status_beacon::router::{BeaconState, beacon_router};
use status_beacon::secrets::{SecretReference, SecretStore};
use status_beacon::service::ServiceContext;
use std::{
    fs,
    path::PathBuf,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

enum FakeSecrets {
    Database(String),
    NotFound,
}

#[async_trait]
impl SecretStore for FakeSecrets {
    async fn get_secret_string(
        &self,
        reference: &SecretReference,
    ) -> Result<String, SecretStoreError> {
        match self {
            FakeSecrets::Database(path) => Ok(json!({
                "endpoint": "localhost:5432",
                "port": 5432,
                "dbname": path,
                "username": "u",
                "password": "p"
            })
            .to_string()),
            FakeSecrets::NotFound => Err(SecretStoreError::Service {
                status: 400,
                code: "ResourceNotFoundException".to_string(),
                message: format!("secret {} not found", reference.name),
            }),
        }
    }
}

fn temp_db_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "status-beacon-routes-{tag}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    path
}

fn app(secrets: FakeSecrets) -> Router {
    let connector: Arc<dyn ConnectionFactory> = Arc::new(SqliteConnectionFactory::new());
    let ctx = ServiceContext::new(Config::default(), Arc::new(secrets), connector);
    beacon_router(BeaconState::new(ctx))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let json = serde_json::from_slice(&body).expect("response body was not json");
    (status, json)
}

#[tokio::test]
async fn health_reports_reachable_database() {
    let path = temp_db_path("health-up");
    let app = app(FakeSecrets::Database(path.display().to_string()));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["timestamp"].is_string());

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn health_stays_200_when_secret_is_missing() {
    let app = app(FakeSecrets::NotFound);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "unhealthy");
}

#[tokio::test]
async fn health_stays_200_when_database_is_unreachable() {
    let app = app(FakeSecrets::Database(
        "/nonexistent-dir/status-beacon/db.sqlite".to_string(),
    ));

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "unhealthy");
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn database_test_returns_newest_five_checks() {
    let path = temp_db_path("selftest");
    let app = app(FakeSecrets::Database(path.display().to_string()));

    let mut last = Value::Null;
    for run in 1..=6usize {
        let (status, body) = get(&app, "/api/database/test").await;
        assert_eq!(status, StatusCode::OK, "run {run}: {body}");
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Database connection successful");
        let checks = body["recent_checks"].as_array().expect("recent_checks array");
        assert_eq!(checks.len(), run.min(5));
        last = body;
    }

    let checks = last["recent_checks"].as_array().unwrap();
    let ids: Vec<i64> = checks.iter().map(|c| c["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![6, 5, 4, 3, 2]);
    assert!(checks.iter().all(|c| c["status"] == "healthy"));
    assert!(checks.iter().all(|c| c["timestamp"].is_string()));

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn database_test_fails_with_500_when_secret_is_missing() {
    let app = app(FakeSecrets::NotFound);

    let (status, body) = get(&app, "/api/database/test").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    let message = body["message"].as_str().expect("message string");
    assert!(!message.is_empty());
    assert!(!message.contains("ResourceNotFoundException"));
}

#[tokio::test]
async fn database_test_fails_with_500_when_database_is_unreachable() {
    let app = app(FakeSecrets::Database(
        "/nonexistent-dir/status-beacon/db.sqlite".to_string(),
    ));

    let (status, body) = get(&app, "/api/database/test").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Could not connect to database");
}

#[tokio::test]
async fn informational_endpoints_answer() {
    let path = temp_db_path("info");
    let app = app(FakeSecrets::Database(path.display().to_string()));

    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["project"], "8byte-app");
    assert_eq!(body["environment"], "dev");
    assert_eq!(
        body["message"],
        "Welcome to 8byte Application - Cloud Native DevOps Demo"
    );
    assert_eq!(body["features"].as_array().map(Vec::len), Some(7));
    assert_eq!(body["features"][5], "Secrets Management");

    let (status, body) = get(&app, "/api/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["application"]["name"], "8byte DevOps Demo");
    assert_eq!(body["environment"]["region"], "us-west-2");
    assert_eq!(body["infrastructure"]["platform"], "AWS");
    assert_eq!(body["infrastructure"]["database"], "PostgreSQL RDS");
    assert_eq!(body["infrastructure"]["compute"], "EC2 Auto Scaling");

    let (status, body) = get(&app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metrics"]["requests_total"], 3);
    assert_eq!(body["database"]["status"], "connected");

    let _ = fs::remove_file(&path);
}

#[tokio::test]
async fn metrics_reports_disconnected_database() {
    let app = app(FakeSecrets::NotFound);

    let (status, body) = get(&app, "/api/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "disconnected");
}
