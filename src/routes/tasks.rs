//! HTTP routes for tasks, participation, and engagement counters
//!
//! - POST /tasks                        - Publish a task (escrows the budget)
//! - GET  /tasks/trending               - Active tasks ranked by score
//! - POST /tasks/{id}/participate       - Submit a participation
//! - POST /tasks/{id}/claim             - Claim a completed participation's reward
//! - POST /tasks/{id}/like              - Record a like
//! - POST /tasks/{id}/comment           - Record a comment
//! - POST /tasks/{id}/share             - Record a share
//! - POST /participations/{id}/complete - Owner approval (Pending -> Completed)

use chrono::{DateTime, Utc};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use crate::db::schemas::AccountDoc;
use crate::routes::helpers::{
    authenticate_request, error_response, json_response, parse_json_body, parse_object_id,
    require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::services::{
    format_abbreviated, EngagementService, ParticipationService, TaskInput, TrendingService,
};
use crate::types::{CoreError, Result};

const DEFAULT_TRENDING_LIMIT: usize = 20;
const MAX_TRENDING_LIMIT: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub platform: String,
    pub engagement_types: Vec<String>,
    pub reward_points: i64,
    pub max_participants: i64,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipateRequest {
    #[serde(default)]
    pub proof: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub body: String,
}

/// One row in the trending response; counts go out both raw and abbreviated
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    pub task_id: String,
    pub title: String,
    pub platform: String,
    pub reward_points: i64,
    pub participant_count: i64,
    pub max_participants: i64,
    pub likes: i64,
    pub comments: i64,
    pub shares: i64,
    pub score: i64,
    pub likes_display: String,
    pub comments_display: String,
    pub shares_display: String,
}

async fn auth_account(
    req: &Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Result<(AccountDoc, bson::oid::ObjectId)> {
    let account = authenticate_request(state, req).await?;
    let id = account
        ._id
        .ok_or_else(|| CoreError::Database("account missing _id".into()))?;
    Ok((account, id))
}

/// POST /tasks
pub async fn handle_create_task(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };

    let body: CreateTaskRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let input = TaskInput {
        title: body.title,
        description: body.description,
        media_url: body.media_url,
        platform: body.platform,
        engagement_types: body.engagement_types,
        reward_points: body.reward_points,
        max_participants: body.max_participants,
        expires_at: body.expires_at,
    };
    let service = ParticipationService::new(mongo.clone());
    match service.create_task(&account, input).await {
        Ok((task_id, escrow)) => json_response(
            StatusCode::CREATED,
            &json!({
                "taskId": task_id.to_hex(),
                "escrowed": escrow,
            }),
        ),
        Err(e) => error_response(&e),
    }
}

/// GET /tasks/trending
pub async fn handle_trending(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let limit = req
        .uri()
        .query()
        .and_then(|q| {
            q.split('&')
                .find_map(|pair| pair.strip_prefix("limit="))
                .and_then(|v| v.parse::<usize>().ok())
        })
        .unwrap_or(DEFAULT_TRENDING_LIMIT)
        .min(MAX_TRENDING_LIMIT);

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = TrendingService::new(mongo.clone());
    let ranked = match service.trending_tasks(limit).await {
        Ok(r) => r,
        Err(e) => return error_response(&e),
    };

    let entries: Vec<TrendingEntry> = ranked
        .into_iter()
        .filter_map(|t| {
            let id = t.task._id?;
            Some(TrendingEntry {
                task_id: id.to_hex(),
                title: t.task.title,
                platform: t.task.platform,
                reward_points: t.task.reward_points,
                participant_count: t.participation,
                max_participants: t.task.max_participants,
                likes: t.likes,
                comments: t.comments,
                shares: t.shares,
                score: t.score,
                likes_display: format_abbreviated(t.likes),
                comments_display: format_abbreviated(t.comments),
                shares_display: format_abbreviated(t.shares),
            })
        })
        .collect();

    json_response(StatusCode::OK, &json!({ "tasks": entries }))
}

/// POST /tasks/{id}/participate
pub async fn handle_participate(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Response<BoxBody> {
    let task_id = match parse_object_id(task_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (account, _) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let body: ParticipateRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = ParticipationService::new(mongo.clone());
    match service.participate(&account, task_id, body.proof).await {
        Ok(participation_id) => json_response(
            StatusCode::CREATED,
            &json!({
                "participationId": participation_id.to_hex(),
                "status": "pending",
            }),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /participations/{id}/complete
pub async fn handle_mark_completed(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    participation_id: &str,
) -> Response<BoxBody> {
    let participation_id = match parse_object_id(participation_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (account, _) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = ParticipationService::new(mongo.clone());
    match service.mark_completed(&account, participation_id).await {
        Ok(()) => json_response(
            StatusCode::OK,
            &json!({
                "participationId": participation_id.to_hex(),
                "status": "completed",
            }),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /tasks/{id}/claim
pub async fn handle_reward_claim(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Response<BoxBody> {
    let task_id = match parse_object_id(task_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (account, _) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = ParticipationService::new(mongo.clone());
    match service.claim_reward(&account, task_id).await {
        Ok(reward) => json_response(
            StatusCode::OK,
            &json!({
                "taskId": task_id.to_hex(),
                "reward": reward,
                "status": "claimed",
            }),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /tasks/{id}/like
pub async fn handle_like(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Response<BoxBody> {
    let task_id = match parse_object_id(task_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (_, account_id) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = EngagementService::new(mongo.clone());
    match service.like(account_id, task_id).await {
        Ok(_) => json_response(StatusCode::CREATED, &json!({ "liked": task_id.to_hex() })),
        Err(e) => error_response(&e),
    }
}

/// POST /tasks/{id}/comment
pub async fn handle_comment(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Response<BoxBody> {
    let task_id = match parse_object_id(task_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (_, account_id) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let body: CommentRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = EngagementService::new(mongo.clone());
    match service.comment(account_id, task_id, body.body).await {
        Ok(_) => json_response(
            StatusCode::CREATED,
            &json!({ "commented": task_id.to_hex() }),
        ),
        Err(e) => error_response(&e),
    }
}

/// POST /tasks/{id}/share
pub async fn handle_share(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    task_id: &str,
) -> Response<BoxBody> {
    let task_id = match parse_object_id(task_id) {
        Ok(id) => id,
        Err(e) => return error_response(&e),
    };

    let (_, account_id) = match auth_account(&req, &state).await {
        Ok(pair) => pair,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let service = EngagementService::new(mongo.clone());
    match service.share(account_id, task_id).await {
        Ok(_) => json_response(StatusCode::CREATED, &json!({ "shared": task_id.to_hex() })),
        Err(e) => error_response(&e),
    }
}
