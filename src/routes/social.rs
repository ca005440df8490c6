//! HTTP routes for follow relations
//!
//! - POST   /creators/{handle}/follow - Follow a creator
//! - DELETE /creators/{handle}/follow - Unfollow (charges the fixed fee)

use hyper::{Request, Response, StatusCode};
use serde_json::json;
use std::sync::Arc;

use crate::routes::helpers::{
    authenticate_request, error_response, json_response, require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::services::{FollowService, UNFOLLOW_FEE};

/// POST /creators/{handle}/follow
pub async fn handle_follow(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    handle: &str,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = FollowService::new(mongo.clone());
    match service.follow(&account, handle).await {
        Ok(relation_id) => json_response(
            StatusCode::CREATED,
            &json!({
                "following": handle,
                "relationId": relation_id.to_hex(),
            }),
        ),
        Err(e) => error_response(&e),
    }
}

/// DELETE /creators/{handle}/follow
pub async fn handle_unfollow(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    handle: &str,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = FollowService::new(mongo.clone());
    match service.unfollow(&account, handle).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({
                "unfollowed": handle,
                "feeCharged": UNFOLLOW_FEE,
            }),
        ),
        Err(e) => error_response(&e),
    }
}
