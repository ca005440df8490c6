//! HTTP routes for authentication
//!
//! - POST /auth/register - Create an account and get a JWT
//! - POST /auth/login    - Authenticate and get a JWT
//! - GET  /auth/me       - Current account info from the token
//!
//! Registration settles the role-dependent signup grant: the account insert
//! and its signup_bonus ledger entry commit in one transaction.

use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password};
use crate::db::schemas::{
    AccountDoc, LedgerEntryDoc, Role, TxKind, ACCOUNT_COLLECTION, LEDGER_COLLECTION,
};
use crate::routes::helpers::{
    authenticate_request, cors_preflight, error_response, json_response, parse_json_body,
    require_mongo, BoxBody, ErrorResponse,
};
use crate::server::AppState;
use crate::types::CoreError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub identifier: String,
    pub password: String,
    pub handle: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub handle: String,
    pub role: Role,
    pub balance: i64,
    pub expires_at: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub handle: String,
    pub role: Role,
    pub balance: i64,
    pub twitter_linked: bool,
    pub discord_linked: bool,
    pub email_linked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

/// Dispatch /auth/* requests
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();

    match (method, path.as_str()) {
        (Method::OPTIONS, _) => cors_preflight(),
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        (Method::GET, "/auth/me") => handle_me(req, state).await,
        _ => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse {
                error: format!("No route for {}", path),
                code: "NOT_FOUND",
            },
        ),
    }
}

async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    if body.identifier.is_empty() || body.handle.is_empty() {
        return error_response(&CoreError::BadInput(
            "identifier and handle are required".into(),
        ));
    }

    if body.password.len() < 8 {
        return error_response(&CoreError::BadInput(
            "password must be at least 8 characters".into(),
        ));
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let accounts = match mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    // Friendly duplicate checks up front; the unique indexes are the real
    // enforcement
    match accounts
        .find_one(bson::doc! { "subject": &body.identifier })
        .await
    {
        Ok(Some(_)) => {
            return error_response(&CoreError::Conflict(
                "an account with this identifier already exists".into(),
            ))
        }
        Ok(None) => {}
        Err(e) => return error_response(&e),
    }
    match accounts.find_one(bson::doc! { "handle": &body.handle }).await {
        Ok(Some(_)) => {
            return error_response(&CoreError::Conflict("this handle is already taken".into()))
        }
        Ok(None) => {}
        Err(e) => return error_response(&e),
    }

    let password_hash = match hash_password(&body.password) {
        Ok(h) => h,
        Err(e) => return error_response(&e),
    };

    let account = AccountDoc::new(
        body.identifier.clone(),
        body.handle.clone(),
        password_hash,
        body.role,
    );
    let grant = body.role.signup_grant();

    // Account insert + signup_bonus ledger entry, one transaction
    let result = async {
        let ledger = mongo.collection::<LedgerEntryDoc>(LEDGER_COLLECTION).await?;
        let mut session = mongo.start_session().await?;
        session
            .start_transaction()
            .await
            .map_err(|e| CoreError::Database(format!("Failed to start transaction: {}", e)))?;

        let outcome = async {
            let account_id = accounts.insert_one_in(account, &mut session).await?;
            ledger
                .insert_one_in(
                    LedgerEntryDoc::new(account_id, TxKind::SignupBonus, grant),
                    &mut session,
                )
                .await?;
            Ok(account_id)
        }
        .await;

        match outcome {
            Ok(id) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| CoreError::Database(format!("Commit failed: {}", e)))?;
                Ok(id)
            }
            Err(e) => {
                let _ = session.abort_transaction().await;
                Err(e)
            }
        }
    }
    .await;

    if let Err(e) = result {
        warn!(identifier = %body.identifier, error = %e, "registration failed");
        return error_response(&e);
    }

    let (token, expires_at) = match state.jwt.generate_token(&body.identifier, &body.handle) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    info!(handle = %body.handle, role = ?body.role, "account registered");

    json_response(
        StatusCode::CREATED,
        &AuthResponse {
            token,
            handle: body.handle,
            role: body.role,
            balance: grant,
            expires_at,
        },
    )
}

async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response(&e),
    };

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let accounts = match mongo.collection::<AccountDoc>(ACCOUNT_COLLECTION).await {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };

    let account = match accounts
        .find_one(bson::doc! { "subject": &body.identifier })
        .await
    {
        Ok(Some(a)) => a,
        Ok(None) => {
            return error_response(&CoreError::Unauthenticated(
                "invalid identifier or password".into(),
            ))
        }
        Err(e) => return error_response(&e),
    };

    match verify_password(&body.password, &account.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return error_response(&CoreError::Unauthenticated(
                "invalid identifier or password".into(),
            ))
        }
        Err(e) => return error_response(&e),
    }

    let (token, expires_at) = match state.jwt.generate_token(&account.subject, &account.handle) {
        Ok(t) => t,
        Err(e) => return error_response(&e),
    };

    info!(handle = %account.handle, "login succeeded");

    json_response(
        StatusCode::OK,
        &AuthResponse {
            token,
            handle: account.handle,
            role: account.role,
            balance: account.balance,
            expires_at,
        },
    )
}

async fn handle_me(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };

    json_response(
        StatusCode::OK,
        &MeResponse {
            handle: account.handle,
            role: account.role,
            balance: account.balance,
            twitter_linked: account.twitter_linked,
            discord_linked: account.discord_linked,
            email_linked: account.email_linked,
            wallet_address: account.wallet_address,
        },
    )
}
