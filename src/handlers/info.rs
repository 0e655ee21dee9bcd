use axum::{Json, extract::State};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::config::SERVICE_VERSION;
use crate::router::BeaconState;
use crate::types::responses::{
    ApplicationInfo, DatabaseConnectivity, EnvironmentInfo, IndexResponse, InfoResponse,
    InfrastructureInfo, MetricsResponse, ServiceMetrics,
};

const WELCOME: &str = "Welcome to 8byte Application - Cloud Native DevOps Demo";

const FEATURES: &[&str] = &[
    "AWS Infrastructure with Terraform",
    "CI/CD with GitHub Actions",
    "CloudWatch Monitoring",
    "Auto Scaling",
    "Load Balancing",
    "Secrets Management",
    "High Availability",
];

pub async fn index_handler(State(state): State<BeaconState>) -> Json<IndexResponse> {
    let cfg = &state.config;
    Json(IndexResponse {
        message: WELCOME,
        project: cfg.project_name.clone(),
        environment: cfg.environment.clone(),
        status: "running",
        version: SERVICE_VERSION,
        timestamp: Utc::now().to_rfc3339(),
        features: FEATURES,
    })
}

pub async fn info_handler(State(state): State<BeaconState>) -> Json<InfoResponse> {
    let cfg = &state.config;
    Json(InfoResponse {
        application: ApplicationInfo {
            name: "8byte DevOps Demo",
            version: SERVICE_VERSION,
            description: "Full-stack DevOps infrastructure demonstration",
        },
        infrastructure: InfrastructureInfo {
            platform: "AWS",
            orchestration: "Terraform",
            deployment: "GitHub Actions",
            monitoring: "CloudWatch",
            database: "PostgreSQL RDS",
            compute: "EC2 Auto Scaling",
        },
        environment: EnvironmentInfo {
            name: cfg.environment.clone(),
            region: cfg.aws_region.clone(),
        },
    })
}

/// GET /api/metrics -> request count, uptime and a connect-only database probe.
pub async fn metrics_handler(State(state): State<BeaconState>) -> Json<MetricsResponse> {
    let connected = state.health.is_reachable().await;
    Json(MetricsResponse {
        metrics: ServiceMetrics {
            requests_total: state.requests.load(Ordering::Relaxed),
            uptime: format_uptime(state.started_at.elapsed()),
            version: SERVICE_VERSION,
            last_updated: Utc::now().to_rfc3339(),
        },
        database: DatabaseConnectivity {
            status: if connected { "connected" } else { "disconnected" },
        },
    })
}

fn format_uptime(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}
