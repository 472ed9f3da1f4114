use chrono::{DateTime, Utc};
use serde::Serialize;

use common::validate::format_amount;
use common::{Trade, TradeId};

/// Display-ready trade record for the "Trade Info" panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeView {
    pub trade_id: String,
    pub seller: String,
    pub buyer: String,
    /// Raw fixed-point integer, as stored on-chain.
    pub amount: String,
    /// `amount` in whole tokens.
    pub amount_display: String,
    pub lock_deadline: u64,
    pub lock_deadline_utc: String,
    pub fiat_deadline: u64,
    pub fiat_deadline_utc: String,
    pub state: u8,
    pub state_label: String,
}

impl TradeView {
    pub fn new(trade_id: TradeId, trade: &Trade) -> Self {
        Self {
            trade_id: trade_id.to_string(),
            seller: trade.seller.to_checksum(None),
            buyer: trade.buyer.to_checksum(None),
            amount: trade.amount.to_string(),
            amount_display: format_amount(trade.amount),
            lock_deadline: trade.lock_deadline,
            lock_deadline_utc: utc_label(trade.lock_deadline),
            fiat_deadline: trade.fiat_deadline,
            fiat_deadline_utc: utc_label(trade.fiat_deadline),
            state: trade.state,
            state_label: trade.state().to_string(),
        }
    }
}

fn utc_label(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string())
}
