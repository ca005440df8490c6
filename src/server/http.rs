//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one spawned connection task per accept. All
//! routing happens in `handle_request` as a `(method, path)` match; path
//! parameters are plain prefix/suffix splits, no router crate.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::schemas::{PlatformConfigDoc, PLATFORM_CONFIG_COLLECTION};
use crate::db::MongoClient;
use crate::routes;
use crate::routes::helpers::{cors_preflight, json_response, BoxBody, ErrorResponse};
use crate::services::SolanaBalanceReader;
use crate::types::CoreError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: Option<MongoClient>,
    pub jwt: JwtValidator,
    pub wallet: SolanaBalanceReader,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, mongo: Option<MongoClient>) -> Self {
        let jwt = JwtValidator::new(&args.jwt_secret(), args.jwt_expiry_seconds);
        let wallet = SolanaBalanceReader::new(&args.solana_rpc_url, args.request_timeout_ms);

        Self {
            args,
            mongo,
            jwt,
            wallet,
            started_at: Instant::now(),
        }
    }
}

/// Default platform vocabularies, inserted once on first startup
const DEFAULT_PLATFORMS: &[(&str, &[&str])] = &[
    ("twitter", &["follow", "like", "retweet", "comment"]),
    ("tiktok", &["follow", "like", "comment", "share"]),
    ("youtube", &["subscribe", "like", "comment"]),
    ("instagram", &["follow", "like", "comment", "share"]),
];

/// Seed the platform vocabulary documents that are missing
async fn seed_platform_configs(mongo: &MongoClient) -> crate::types::Result<()> {
    let platforms = mongo
        .collection::<PlatformConfigDoc>(PLATFORM_CONFIG_COLLECTION)
        .await?;

    for (name, types) in DEFAULT_PLATFORMS {
        let existing = platforms.find_one(bson::doc! { "platform": *name }).await?;
        if existing.is_none() {
            let inserted = platforms
                .insert_one(PlatformConfigDoc {
                    platform: (*name).to_string(),
                    engagement_types: types.iter().map(|t| t.to_string()).collect(),
                    version: 1,
                    ..Default::default()
                })
                .await;
            match inserted {
                Ok(_) => info!(platform = name, "platform vocabulary seeded"),
                // Another instance won the insert race
                Err(CoreError::Database(ref msg)) if msg.contains("E11000") => {}
                Err(e) => return Err(e),
            }
        }
    }

    Ok(())
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> crate::types::Result<()> {
    let listener = TcpListener::bind(state.args.listen)
        .await
        .map_err(|e| CoreError::Http(format!("Failed to bind {}: {}", state.args.listen, e)))?;

    info!(
        "CreatorsLab API listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - default JWT secret in use");
    }

    if let Some(ref mongo) = state.mongo {
        seed_platform_configs(mongo).await?;
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("No route for {}", path),
            code: "NOT_FOUND",
        },
    )
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Auth routes dispatch internally on /auth/*
    if path.starts_with("/auth") {
        return Ok(routes::handle_auth_request(req, state).await);
    }

    let response = match (method, path.as_str()) {
        (Method::OPTIONS, _) => cors_preflight(),

        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            routes::health_check(state).await
        }
        (Method::GET, "/ready") | (Method::GET, "/readyz") => {
            routes::readiness_check(state).await
        }
        (Method::GET, "/version") => routes::version_info().await,

        (Method::GET, "/claims/daily") => routes::handle_claim_status(req, state).await,
        (Method::POST, "/claims/daily") => routes::handle_claim(req, state).await,

        (Method::POST, p) if p.starts_with("/creators/") && p.ends_with("/follow") => {
            match path_param(p, "/creators/", "/follow") {
                Some(handle) => routes::handle_follow(req, state, &handle).await,
                None => not_found(p),
            }
        }
        (Method::DELETE, p) if p.starts_with("/creators/") && p.ends_with("/follow") => {
            match path_param(p, "/creators/", "/follow") {
                Some(handle) => routes::handle_unfollow(req, state, &handle).await,
                None => not_found(p),
            }
        }

        (Method::POST, "/tasks") => routes::handle_create_task(req, state).await,
        (Method::GET, "/tasks/trending") => routes::handle_trending(req, state).await,

        (Method::POST, p) if p.starts_with("/tasks/") && p.ends_with("/participate") => {
            match path_param(p, "/tasks/", "/participate") {
                Some(id) => routes::handle_participate(req, state, &id).await,
                None => not_found(p),
            }
        }
        (Method::POST, p) if p.starts_with("/tasks/") && p.ends_with("/claim") => {
            match path_param(p, "/tasks/", "/claim") {
                Some(id) => routes::handle_reward_claim(req, state, &id).await,
                None => not_found(p),
            }
        }
        (Method::POST, p) if p.starts_with("/tasks/") && p.ends_with("/like") => {
            match path_param(p, "/tasks/", "/like") {
                Some(id) => routes::handle_like(req, state, &id).await,
                None => not_found(p),
            }
        }
        (Method::POST, p) if p.starts_with("/tasks/") && p.ends_with("/comment") => {
            match path_param(p, "/tasks/", "/comment") {
                Some(id) => routes::handle_comment(req, state, &id).await,
                None => not_found(p),
            }
        }
        (Method::POST, p) if p.starts_with("/tasks/") && p.ends_with("/share") => {
            match path_param(p, "/tasks/", "/share") {
                Some(id) => routes::handle_share(req, state, &id).await,
                None => not_found(p),
            }
        }

        (Method::POST, p) if p.starts_with("/participations/") && p.ends_with("/complete") => {
            match path_param(p, "/participations/", "/complete") {
                Some(id) => routes::handle_mark_completed(req, state, &id).await,
                None => not_found(p),
            }
        }

        (Method::GET, "/wallet/balance") => routes::handle_wallet_balance(req, state).await,
        (Method::GET, "/points/history") => routes::handle_points_history(req, state).await,
        (Method::POST, "/points/convert") => routes::handle_convert_points(req, state).await,

        (_, p) => not_found(p),
    };

    Ok(response)
}

/// Extract the single path parameter between a prefix and a suffix
///
/// Rejects empty segments and segments containing further slashes, so
/// `/tasks//claim` and `/tasks/a/b/claim` both fall through to 404.
fn path_param(path: &str, prefix: &str, suffix: &str) -> Option<String> {
    let inner = path.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if inner.is_empty() || inner.contains('/') {
        return None;
    }
    Some(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_param_extracts_segment() {
        assert_eq!(
            path_param("/creators/alice/follow", "/creators/", "/follow"),
            Some("alice".to_string())
        );
        assert_eq!(
            path_param("/tasks/507f1f77bcf86cd799439011/claim", "/tasks/", "/claim"),
            Some("507f1f77bcf86cd799439011".to_string())
        );
    }

    #[test]
    fn test_path_param_rejects_malformed() {
        assert_eq!(path_param("/tasks//claim", "/tasks/", "/claim"), None);
        assert_eq!(path_param("/tasks/a/b/claim", "/tasks/", "/claim"), None);
        assert_eq!(path_param("/other/a/claim", "/tasks/", "/claim"), None);
    }
}
