use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use common::validate::parse_address;
use common::Error;

use crate::{ApiError, AppState, JsonBody};

pub fn session_router() -> Router<AppState> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/connect", post(connect))
        .route("/api/accounts", get(list_accounts))
        .route("/api/session/disconnect", post(disconnect))
        .route("/api/trade-id", get(get_trade_id).post(new_trade_id))
}

// ─── Session ──────────────────────────────────────────────────────────────────

async fn get_session(State(state): State<AppState>) -> Json<Value> {
    let chain_id = match state.client.chain_id().await {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(error = %e, "Could not read chain id");
            None
        }
    };
    let session = state.session.read().await.clone();

    Json(json!({
        "connected": session.account.is_some(),
        "address": session.account.map(|a| a.to_checksum(None)),
        "chain_id": chain_id,
        "escrow": state.client.escrow_address().to_checksum(None),
        "mode": state.client.mode(),
        "tx": session.tx,
        "busy": session.tx.is_busy(),
        "create_label": session.tx.button_label("Create Trade"),
    }))
}

/// Accounts the wallet offers for connection.
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let accounts: Vec<String> = state
        .client
        .accounts()
        .await?
        .iter()
        .map(|a| a.to_checksum(None))
        .collect();
    Ok(Json(json!({ "accounts": accounts })))
}

/// `{}` connects the wallet's first account.
#[derive(Deserialize)]
struct ConnectBody {
    #[serde(default)]
    address: Option<String>,
}

async fn connect(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ConnectBody>,
) -> Result<Json<Value>, ApiError> {
    let requested = match body.address.filter(|a| !a.trim().is_empty()) {
        Some(raw) => Some(
            parse_address(&raw)
                .map_err(|_| Error::validation("Address must be a valid 0x address."))?,
        ),
        None => None,
    };
    let account = state.connect(requested).await?;
    Ok(Json(json!({ "connected": true, "address": account.to_checksum(None) })))
}

async fn disconnect(State(state): State<AppState>) -> Json<Value> {
    state.disconnect().await;
    Json(json!({ "connected": false }))
}

// ─── Create form trade id ─────────────────────────────────────────────────────

async fn get_trade_id(State(state): State<AppState>) -> Json<Value> {
    let id = state.session.read().await.draft_trade_id;
    Json(json!({ "trade_id": id }))
}

async fn new_trade_id(State(state): State<AppState>) -> Json<Value> {
    let id = state.regenerate_trade_id().await;
    Json(json!({ "trade_id": id }))
}
