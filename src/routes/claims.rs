//! HTTP routes for the daily claim
//!
//! - GET  /claims/daily - Eligibility status (pure read, never mutates)
//! - POST /claims/daily - Attempt a claim

use hyper::{Request, Response, StatusCode};
use std::sync::Arc;

use crate::routes::helpers::{
    authenticate_request, error_response, json_response, require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::services::DailyClaimService;
use crate::types::CoreError;

/// GET /claims/daily
pub async fn handle_claim_status(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    let account_id = match account._id {
        Some(id) => id,
        None => return error_response(&CoreError::Database("account missing _id".into())),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = DailyClaimService::new(mongo.clone());
    match service.status(account_id).await {
        Ok(status) => json_response(StatusCode::OK, &status),
        Err(e) => error_response(&e),
    }
}

/// POST /claims/daily
pub async fn handle_claim(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };
    let account_id = match account._id {
        Some(id) => id,
        None => return error_response(&CoreError::Database("account missing _id".into())),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = DailyClaimService::new(mongo.clone());
    match service.claim(account_id).await {
        // Cooldown is a 200 with the countdown, not an error
        Ok(outcome) => json_response(StatusCode::OK, &outcome),
        Err(e) => error_response(&e),
    }
}
