//! Shared handler plumbing
//!
//! JSON response shaping, body parsing, and bearer-token authentication.
//! Every handler reports failures as `{ "error": .., "code": .. }` with the
//! status class from `CoreError`.

use bson::doc;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::extract_token_from_header;
use crate::db::schemas::{AccountDoc, ACCOUNT_COLLECTION};
use crate::db::MongoClient;
use crate::server::AppState;
use crate::types::{CoreError, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error body shape shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Build a JSON response with CORS headers
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// Map a core error to its JSON response
pub fn error_response(err: &CoreError) -> Response<BoxBody> {
    json_response(
        err.status(),
        &ErrorResponse {
            error: err.to_string(),
            code: err.code(),
        },
    )
}

/// CORS preflight response
pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

/// Parse a JSON request body (capped at 10 KiB)
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T> {
    let body = req
        .collect()
        .await
        .map_err(|e| CoreError::Http(format!("Failed to read body: {}", e)))?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(CoreError::Http("Request body too large".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| CoreError::Http(format!("Invalid JSON: {}", e)))
}

/// Authorization header value, if present
pub fn get_auth_header<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// The MongoDB client, or an upstream failure when it never connected
pub fn require_mongo(state: &AppState) -> Result<&MongoClient> {
    state
        .mongo
        .as_ref()
        .ok_or_else(|| CoreError::Upstream("database not available".into()))
}

/// Resolve the calling account from the bearer token
///
/// Identity resolution boundary: validates the JWT, then loads the account
/// document for the token's subject.
pub async fn authenticate(state: &AppState, auth_header: Option<&str>) -> Result<AccountDoc> {
    let token = extract_token_from_header(auth_header)
        .ok_or_else(|| CoreError::Unauthenticated("missing bearer token".into()))?;

    let claims = state.jwt.validate(token)?;

    let mongo = require_mongo(state)?;
    let accounts = mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await?;

    accounts
        .find_one(doc! { "subject": &claims.sub })
        .await?
        .ok_or_else(|| CoreError::Unauthenticated("identity invalid".into()))
}

/// Authenticate directly from a request
pub async fn authenticate_request<B>(
    state: &Arc<AppState>,
    req: &Request<B>,
) -> Result<AccountDoc> {
    let header = get_auth_header(req).map(|s| s.to_string());
    authenticate(state, header.as_deref()).await
}

/// Parse a path segment as an ObjectId
pub fn parse_object_id(segment: &str) -> Result<bson::oid::ObjectId> {
    segment
        .parse()
        .map_err(|_| CoreError::BadInput(format!("invalid id '{}'", segment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_id() {
        assert!(parse_object_id("507f1f77bcf86cd799439011").is_ok());
        assert!(matches!(
            parse_object_id("not-an-id"),
            Err(CoreError::BadInput(_))
        ));
    }

    #[test]
    fn test_error_response_status() {
        let resp = error_response(&CoreError::Conflict("already following".into()));
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_cors_preflight_status() {
        assert_eq!(cors_preflight().status(), StatusCode::NO_CONTENT);
    }
}
