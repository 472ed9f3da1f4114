use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use common::validate::{is_bytes32, is_hex, parse_bytes32, parse_hex_bytes, parse_whole_number};
use common::{
    Error, EscrowCall, Result, SignedAction, SignedAuthorization, Trade, TradeAction, TradeId,
    TradeState,
};

use crate::status::TxStatus;

/// Shortest signature string accepted, `0x` prefix included.
const MIN_SIGNATURE_CHARS: usize = 10;

/// Hint shown under the trade id input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStatus {
    Empty,
    Valid,
    Invalid,
}

impl IdStatus {
    pub fn hint(self) -> &'static str {
        match self {
            IdStatus::Empty => "",
            IdStatus::Valid => "valid bytes32",
            IdStatus::Invalid => "not bytes32",
        }
    }
}

/// The "Trade Lookup" panel: a pasted trade id and whatever was last
/// fetched for it.
#[derive(Debug, Clone, Default)]
pub struct TradeLookup {
    input: String,
    fetched: Option<Trade>,
}

impl TradeLookup {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            fetched: None,
        }
    }

    /// Attach a previously fetched record, e.g. from a cache.
    pub fn with_fetched(mut self, trade: Option<Trade>) -> Self {
        self.fetched = trade;
        self
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn id_status(&self) -> IdStatus {
        if self.input.is_empty() {
            IdStatus::Empty
        } else if is_bytes32(&self.input) {
            IdStatus::Valid
        } else {
            IdStatus::Invalid
        }
    }

    pub fn trade_id(&self) -> Result<TradeId> {
        parse_bytes32(&self.input)
            .map_err(|_| Error::validation("Paste a valid tradeId (bytes32)."))
    }

    pub fn record_fetch(&mut self, trade: Trade) {
        self.fetched = Some(trade);
    }

    pub fn fetched(&self) -> Option<&Trade> {
        self.fetched.as_ref()
    }

    pub fn is_dispute(&self) -> bool {
        self.fetched
            .as_ref()
            .is_some_and(|t| t.state() == TradeState::Dispute)
    }

    /// Refresh, deposit, refund and open-dispute share this gate.
    pub fn can_act(&self, connected: bool, status: &TxStatus) -> bool {
        connected && !status.is_busy() && self.id_status() == IdStatus::Valid
    }

    /// Dispute resolution additionally needs a fetched trade in DISPUTE.
    pub fn can_resolve(&self, connected: bool, status: &TxStatus) -> bool {
        self.can_act(connected, status) && self.is_dispute()
    }

    pub fn action(&self, action: TradeAction) -> Result<EscrowCall> {
        Ok(EscrowCall::Action(action, self.trade_id()?))
    }

    /// Build a backend-signed call. Both dispute resolutions are refused
    /// unless the fetched trade is in DISPUTE; the contract enforces its own
    /// preconditions regardless.
    pub fn signed(&self, action: SignedAction, form: &ResolveForm) -> Result<EscrowCall> {
        let trade_id = parse_bytes32(&self.input)
            .map_err(|_| Error::validation("Paste a valid tradeId (bytes32) first."))?;
        if action != SignedAction::Release && !self.is_dispute() {
            return Err(Error::validation("Trade must be in DISPUTE state first."));
        }
        Ok(EscrowCall::Signed(action, form.authorization(trade_id)?))
    }

    /// Explanation shown beside the resolve button when it is disabled.
    pub fn resolve_hint(&self) -> Option<String> {
        match &self.fetched {
            None => Some("Tip: click Refresh Trade first so the desk knows the current state.".into()),
            Some(trade) if trade.state() != TradeState::Dispute => Some(format!(
                "Current state is {}. Resolve is only enabled in DISPUTE.",
                trade.state()
            )),
            Some(_) => None,
        }
    }
}

/// Raw inputs for backend-signed writes, produced by the signer's tooling
/// and pasted in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolveForm {
    /// Unix seconds.
    pub expires_at: String,
    /// bytes32 nonce.
    pub nonce: String,
    /// Backend signature, `0x` hex.
    pub backend_sig: String,
}

impl ResolveForm {
    /// Checks shared with the digest views: expiry and nonce only.
    pub fn expiry_and_nonce(&self) -> Result<(u64, B256)> {
        let expires = self.expires_at.trim();
        if expires.is_empty() {
            return Err(Error::validation("Enter expiresAt (unix seconds)."));
        }
        let expires_at = parse_whole_number(expires)
            .map_err(|_| Error::validation("expiresAt must be a number (unix seconds)."))?;
        let nonce = parse_bytes32(&self.nonce)
            .map_err(|_| Error::validation("nonce must be bytes32 (0x + 64 hex)."))?;
        Ok((expires_at, nonce))
    }

    pub fn authorization(&self, trade_id: TradeId) -> Result<SignedAuthorization> {
        let (expires_at, nonce) = self.expiry_and_nonce()?;
        let sig = self.backend_sig.trim();
        if !is_hex(sig) || sig.len() < MIN_SIGNATURE_CHARS {
            return Err(Error::validation("backendSig must be a 0x... hex string."));
        }
        Ok(SignedAuthorization {
            trade_id,
            expires_at,
            nonce,
            backend_sig: parse_hex_bytes(sig)?,
        })
    }
}
