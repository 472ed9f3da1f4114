use alloy_primitives::Address;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use common::validate::parse_bytes32;
use common::{DigestKind, Error, Result, SignedAction, TradeAction, TradeId, TxReceipt};
use desk::{CreateTradeForm, ResolveForm, TradeLookup, TradeView};

use crate::state::unix_now;
use crate::{ApiError, AppState, JsonBody};

pub fn trades_router() -> Router<AppState> {
    Router::new()
        .route("/api/create-form", post(check_create_form))
        .route("/api/lookup", get(lookup_panel))
        .route("/api/trades", post(create_trade))
        .route("/api/trades/:id", get(get_trade))
        .route("/api/trades/:id/deposit", post(deposit))
        .route("/api/trades/:id/refund", post(refund))
        .route("/api/trades/:id/dispute", post(open_dispute))
        .route("/api/trades/:id/release", post(release))
        .route("/api/trades/:id/resolve-release", post(resolve_release))
        .route("/api/trades/:id/resolve-refund", post(resolve_refund))
        .route("/api/trades/:id/release-digest", post(release_digest))
        .route("/api/trades/:id/refund-digest", post(refund_digest))
}

type ApiResult = Result<Json<Value>, ApiError>;

/// Lookup panel as the page renders it.
async fn panel(state: &AppState, lookup: &TradeLookup) -> Value {
    let connected = state.account().await.is_some();
    let tx = state.session.read().await.tx.clone();
    let view = match (lookup.trade_id(), lookup.fetched()) {
        (Ok(id), Some(trade)) => Some(TradeView::new(id, trade)),
        _ => None,
    };
    json!({
        "id_status": lookup.id_status(),
        "id_hint": lookup.id_status().hint(),
        "trade": view,
        "can_act": lookup.can_act(connected, &tx),
        "can_resolve": lookup.can_resolve(connected, &tx),
        "resolve_hint": lookup.resolve_hint(),
    })
}

fn receipt_json(receipt: &TxReceipt) -> Value {
    json!({
        "hash": receipt.hash,
        "block_number": receipt.block_number,
        "success": receipt.success,
    })
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateTradeBody {
    #[serde(flatten)]
    form: CreateTradeForm,
    /// Overrides the session's generated id.
    #[serde(default)]
    trade_id: Option<String>,
    /// "Use my address as Seller".
    #[serde(default)]
    use_my_address: bool,
}

impl CreateTradeBody {
    /// The form as typed, carrying the session's draft id unless the body
    /// names one.
    fn into_form(self, draft: Option<TradeId>, wallet: Option<Address>) -> Result<CreateTradeForm> {
        let mut form = self.form;
        form.trade_id = match self.trade_id {
            Some(raw) => Some(
                parse_bytes32(&raw).map_err(|_| Error::validation("Trade ID must be bytes32."))?,
            ),
            None => draft,
        };
        if self.use_my_address {
            form.use_my_address(wallet);
        }
        Ok(form)
    }
}

/// Submit gate and button label for the form as currently typed.
async fn check_create_form(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTradeBody>,
) -> Json<Value> {
    let session = state.session.read().await.clone();
    let form = body.into_form(session.draft_trade_id, session.account);
    let can_submit = form
        .as_ref()
        .is_ok_and(|f| f.can_submit(session.account.is_some(), &session.tx));

    Json(json!({
        "can_submit": can_submit,
        "label": session.tx.button_label("Create Trade"),
        "seller": form.ok().map(|f| f.seller),
    }))
}

async fn create_trade(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateTradeBody>,
) -> ApiResult {
    let from = state.require_account("Connect wallet first.").await?;
    let draft = state.session.read().await.draft_trade_id;
    let form = body.into_form(draft, Some(from))?;

    let call = form.submit(Some(from), unix_now())?;
    let trade_id = call.trade_id();
    let receipt = state.submit(from, call).await?;
    info!(%trade_id, hash = %receipt.hash, "Trade created");

    // The id is spent; offer a fresh one for the next trade.
    let next_trade_id = state.regenerate_trade_id().await;
    Ok(Json(json!({
        "trade_id": trade_id,
        "receipt": receipt_json(&receipt),
        "next_trade_id": next_trade_id,
    })))
}

// ─── Lookup ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LookupQuery {
    #[serde(default)]
    id: String,
}

/// Panel state for whatever is in the trade id box, from the cache only.
/// Never fails: an empty or malformed id is reported through `id_status`.
async fn lookup_panel(State(state): State<AppState>, Query(query): Query<LookupQuery>) -> Json<Value> {
    let lookup = state.lookup(&query.id).await;
    Json(panel(&state, &lookup).await)
}

async fn get_trade(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    state
        .require_account("Connect your wallet to continue.")
        .await?;
    let mut lookup = state.lookup(&id).await;
    let trade_id = lookup.trade_id()?;

    let trade = state.refresh(trade_id).await.map_err(|e| {
        Error::Transaction(format!(
            "Error reading trade. (Often means tradeId doesn't exist yet.) {e}"
        ))
    })?;
    lookup.record_fetch(trade);
    Ok(Json(panel(&state, &lookup).await))
}

// ─── Simple actions ───────────────────────────────────────────────────────────

async fn run_action(state: AppState, id: String, action: TradeAction) -> ApiResult {
    let from = state.require_account("Connect wallet first.").await?;
    let call = state.lookup(&id).await.action(action)?;
    let receipt = state.submit(from, call).await?;

    let lookup = state.lookup(&id).await;
    Ok(Json(json!({
        "receipt": receipt_json(&receipt),
        "panel": panel(&state, &lookup).await,
    })))
}

async fn deposit(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    run_action(state, id, TradeAction::Deposit).await
}

async fn refund(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    run_action(state, id, TradeAction::Refund).await
}

async fn open_dispute(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    run_action(state, id, TradeAction::OpenDispute).await
}

// ─── Backend-signed actions ───────────────────────────────────────────────────

async fn run_signed(
    state: AppState,
    id: String,
    action: SignedAction,
    form: ResolveForm,
) -> ApiResult {
    let from = state.require_account("Connect wallet first.").await?;
    let call = state.lookup(&id).await.signed(action, &form)?;
    let receipt = state.submit(from, call).await?;

    let lookup = state.lookup(&id).await;
    Ok(Json(json!({
        "receipt": receipt_json(&receipt),
        "panel": panel(&state, &lookup).await,
    })))
}

async fn release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResolveForm>,
) -> ApiResult {
    run_signed(state, id, SignedAction::Release, form).await
}

async fn resolve_release(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResolveForm>,
) -> ApiResult {
    run_signed(state, id, SignedAction::ResolveDisputeRelease, form).await
}

async fn resolve_refund(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResolveForm>,
) -> ApiResult {
    run_signed(state, id, SignedAction::ResolveDisputeRefund, form).await
}

// ─── Digests ──────────────────────────────────────────────────────────────────

async fn read_digest(state: AppState, id: String, kind: DigestKind, form: ResolveForm) -> ApiResult {
    let trade_id = TradeLookup::new(id).trade_id()?;
    let (expires_at, nonce) = form.expiry_and_nonce()?;
    let digest = state.client.digest(kind, trade_id, expires_at, nonce).await?;
    Ok(Json(json!({
        "kind": kind,
        "trade_id": trade_id,
        "expires_at": expires_at,
        "nonce": nonce,
        "digest": digest,
    })))
}

async fn release_digest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResolveForm>,
) -> ApiResult {
    read_digest(state, id, DigestKind::Release, form).await
}

async fn refund_digest(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(form): JsonBody<ResolveForm>,
) -> ApiResult {
    read_digest(state, id, DigestKind::Refund, form).await
}
