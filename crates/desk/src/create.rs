use alloy_primitives::Address;
use serde::Deserialize;
use tracing::debug;

use common::validate::{
    deadline_after, is_address, parse_address, parse_amount, SECONDS_PER_HOUR,
    SECONDS_PER_MINUTE,
};
use common::{CreateTradeRequest, Error, EscrowCall, Result, TradeId};

use crate::status::TxStatus;

/// The "Create Trade" form. Only the backend signer can successfully submit
/// it; anyone else gets the contract's revert.
///
/// Field values are kept exactly as typed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateTradeForm {
    pub seller: String,
    pub buyer: String,
    /// Token amount as a decimal string.
    pub amount: String,
    /// Lock deadline, whole minutes from submission.
    pub lock_mins: String,
    /// Fiat deadline, whole hours from submission.
    pub fiat_hours: String,
    /// Generated once the form is shown; never typed by the user.
    #[serde(skip)]
    pub trade_id: Option<TradeId>,
}

impl Default for CreateTradeForm {
    fn default() -> Self {
        Self {
            seller: String::new(),
            buyer: String::new(),
            amount: "10".to_string(),
            lock_mins: "10".to_string(),
            fiat_hours: "24".to_string(),
            trade_id: None,
        }
    }
}

impl CreateTradeForm {
    /// "Use my address as Seller".
    pub fn use_my_address(&mut self, wallet: Option<Address>) {
        if let Some(addr) = wallet {
            self.seller = addr.to_checksum(None);
        }
    }

    pub fn can_submit(&self, connected: bool, status: &TxStatus) -> bool {
        connected
            && !status.is_busy()
            && !self.seller.trim().is_empty()
            && !self.buyer.trim().is_empty()
            && self.trade_id.is_some()
    }

    /// Validate and convert the form. Deadlines are anchored at `now`
    /// (Unix seconds), the moment of submission.
    pub fn submit(&self, wallet: Option<Address>, now: u64) -> Result<EscrowCall> {
        if wallet.is_none() {
            return Err(Error::validation("Connect wallet first."));
        }
        let trade_id = self
            .trade_id
            .ok_or_else(|| Error::validation("TradeId not ready yet. Refresh page."))?;
        if !is_address(&self.seller) {
            return Err(Error::validation("Seller must be a valid 0x address."));
        }
        if !is_address(&self.buyer) {
            return Err(Error::validation("Buyer must be a valid 0x address."));
        }

        let amount = parse_amount(&self.amount)?;
        let lock_deadline = deadline_after(now, &self.lock_mins, SECONDS_PER_MINUTE)
            .map_err(|_| Error::validation("Lock deadline must be a whole number of minutes."))?;
        let fiat_deadline = deadline_after(now, &self.fiat_hours, SECONDS_PER_HOUR)
            .map_err(|_| Error::validation("Fiat deadline must be a whole number of hours."))?;

        let req = CreateTradeRequest {
            trade_id,
            seller: parse_address(&self.seller)?,
            buyer: parse_address(&self.buyer)?,
            amount,
            lock_deadline,
            fiat_deadline,
        };
        debug!(%trade_id, %amount, lock_deadline, fiat_deadline, "Create trade form accepted");
        Ok(EscrowCall::CreateTrade(req))
    }
}
