use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::time::Instant;

use crate::config::Config;
use crate::handlers::info::{index_handler, info_handler, metrics_handler};
use crate::handlers::status::{database_test_handler, health_handler};
use crate::middleware::request_counter::count_requests;
use crate::service::{HealthEvaluator, SelfTestRunner, ServiceContext};

/// Shared state for the HTTP layer. The probes themselves keep nothing
/// between requests; the counter and start instant only feed `/api/metrics`.
#[derive(Clone)]
pub struct BeaconState {
    pub config: Arc<Config>,
    pub health: HealthEvaluator,
    pub self_test: SelfTestRunner,
    pub requests: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl BeaconState {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            config: ctx.config.clone(),
            health: HealthEvaluator::new(ctx.clone()),
            self_test: SelfTestRunner::new(ctx),
            requests: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }
}

pub fn beacon_router(state: BeaconState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .route("/api/metrics", get(metrics_handler))
        .route("/api/database/test", get(database_test_handler))
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}
