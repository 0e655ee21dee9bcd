use crate::db::HealthRecord;
use serde::Serialize;

/// `GET /api/database/test` success body.
#[derive(Debug, Serialize)]
pub struct DatabaseTestResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub recent_checks: Vec<HealthRecord>,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: &'static str,
    pub project: String,
    pub environment: String,
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
    pub features: &'static [&'static str],
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub application: ApplicationInfo,
    pub infrastructure: InfrastructureInfo,
    pub environment: EnvironmentInfo,
}

#[derive(Debug, Serialize)]
pub struct ApplicationInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct InfrastructureInfo {
    pub platform: &'static str,
    pub orchestration: &'static str,
    pub deployment: &'static str,
    pub monitoring: &'static str,
    pub database: &'static str,
    pub compute: &'static str,
}

#[derive(Debug, Serialize)]
pub struct EnvironmentInfo {
    pub name: String,
    pub region: String,
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: ServiceMetrics,
    pub database: DatabaseConnectivity,
}

#[derive(Debug, Serialize)]
pub struct ServiceMetrics {
    pub requests_total: u64,
    pub uptime: String,
    pub version: &'static str,
    pub last_updated: String,
}

#[derive(Debug, Serialize)]
pub struct DatabaseConnectivity {
    /// "connected" or "disconnected".
    pub status: &'static str,
}
