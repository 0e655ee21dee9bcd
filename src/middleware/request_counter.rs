use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::atomic::Ordering;
use tracing::debug;

use crate::router::BeaconState;

/// Count every request for `/api/metrics` and emit an access line at debug level.
pub async fn count_requests(
    State(state): State<BeaconState>,
    req: Request,
    next: Next,
) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let resp = next.run(req).await;
    debug!(%method, %path, status = resp.status().as_u16(), "request served");
    resp
}
