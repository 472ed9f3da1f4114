use alloy_primitives::keccak256;
use chrono::Utc;
use uuid::Uuid;

use common::TradeId;

/// `keccak256("ui-trade-{millis}-{salt}")`.
pub fn trade_id_from_seed(unix_millis: i64, salt: &str) -> TradeId {
    keccak256(format!("ui-trade-{unix_millis}-{salt}").as_bytes())
}

/// A new client-side trade id from the current time and a random salt.
/// The contract does not care how ids are derived; this only has to be
/// unlikely to collide.
pub fn fresh_trade_id() -> TradeId {
    trade_id_from_seed(Utc::now().timestamp_millis(), &Uuid::new_v4().to_string())
}
