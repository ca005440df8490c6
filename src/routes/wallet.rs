//! HTTP routes for wallet reads and point conversion
//!
//! - GET  /wallet/balance  - Best-effort Solana balance for the linked wallet
//! - GET  /points/history  - Recent ledger entries, newest first
//! - POST /points/convert  - Credit $CLS for the wallet's lamports at the
//!                           configured rate

use chrono::{DateTime, Utc};
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::db::schemas::TxKind;
use crate::routes::helpers::{
    authenticate_request, error_response, json_response, require_mongo, BoxBody,
};
use crate::server::AppState;
use crate::services::LedgerService;
use crate::types::CoreError;

fn query_param<'a, B>(req: &'a Request<B>, key: &str) -> Option<&'a str> {
    req.uri().query().and_then(|q| {
        q.split('&')
            .find_map(|pair| pair.strip_prefix(key).and_then(|r| r.strip_prefix('=')))
    })
}

/// GET /wallet/balance
///
/// Reads the linked wallet by default; `?address=..` overrides for an
/// arbitrary lookup.
pub async fn handle_wallet_balance(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let account = match authenticate_request(&state, &req).await {
        Ok(a) => a,
        Err(e) => return error_response(&e),
    };

    let address = match query_param(&req, "address")
        .map(|s| s.to_string())
        .or(account.wallet_address)
    {
        Some(a) => a,
        None => {
            return error_response(&CoreError::BadInput(
                "no wallet linked to this account".into(),
            ))
        }
    };

    let balance = state.wallet.balance(&address).await;
    json_response(StatusCode::OK, &balance)
}

const HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryEntry {
    kind: TxKind,
    amount: i64,
    currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    at: Option<DateTime<Utc>>,
}

/// GET /points/history
pub async fn handle_points_history(
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

    let ledger = LedgerService::new(mongo.clone());
    let entries = match ledger.history(account_id, HISTORY_LIMIT).await {
        Ok(e) => e,
        Err(e) => return error_response(&e),
    };

    let shaped: Vec<HistoryEntry> = entries
        .into_iter()
        .map(|e| HistoryEntry {
            kind: e.kind,
            amount: e.amount,
            currency: e.currency,
            at: e.metadata.created_at.map(|t| t.to_chrono()),
        })
        .collect();

    json_response(
        StatusCode::OK,
        &json!({ "balance": account.balance, "entries": shaped }),
    )
}

/// POST /points/convert
///
/// Converts the linked wallet's current lamport balance into $CLS at the
/// configured lamports-per-point rate, credited with a `convert_points`
/// ledger entry. The read is best-effort; a zero balance converts to
/// nothing and is reported as such rather than failing.
pub async fn handle_convert_points(
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

    let address = match account.wallet_address {
        Some(a) => a,
        None => {
            return error_response(&CoreError::BadInput(
                "no wallet linked to this account".into(),
            ))
        }
    };

    let balance = state.wallet.balance(&address).await;
    let rate = state.args.convert_lamports_per_point;
    let points = (balance.lamports / rate) as i64;

    if points == 0 {
        return json_response(
            StatusCode::OK,
            &json!({
                "address": address,
                "lamports": balance.lamports,
                "lamportsPerPoint": rate,
                "points": 0,
            }),
        );
    }

    let mongo = match require_mongo(&state) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };

    let ledger = LedgerService::new(mongo.clone());
    if let Err(e) = ledger.record(account_id, TxKind::ConvertPoints, points).await {
        return error_response(&e);
    }

    json_response(
        StatusCode::OK,
        &json!({
            "address": address,
            "lamports": balance.lamports,
            "lamportsPerPoint": rate,
            "points": points,
        }),
    )
}
