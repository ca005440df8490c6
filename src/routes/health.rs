//! Liveness, readiness, and version endpoints

use hyper::{Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use crate::routes::helpers::{json_response, BoxBody};
use crate::server::AppState;

/// GET /health - process liveness
pub async fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "status": "healthy",
            "nodeId": state.args.node_id.to_string(),
            "uptimeSeconds": state.started_at.elapsed().as_secs(),
        }),
    )
}

/// GET /ready - storage reachability
pub async fn readiness_check(state: Arc<AppState>) -> Response<BoxBody> {
    match &state.mongo {
        Some(mongo) => match mongo.ping().await {
            Ok(()) => json_response(StatusCode::OK, &json!({ "ready": true })),
            Err(e) => json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &json!({ "ready": false, "reason": e.to_string() }),
            ),
        },
        None => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            &json!({ "ready": false, "reason": "database not connected" }),
        ),
    }
}

/// GET /version
pub async fn version_info() -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}
