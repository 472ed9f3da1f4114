use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// 32-byte trade identifier, the key of the contract's `trades` mapping.
pub type TradeId = B256;

/// Transaction hash returned by the wallet.
pub type TxHash = B256;

/// Trade lifecycle state as stored by the contract (`uint8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeState {
    None,
    Created,
    Locked,
    Released,
    Refunded,
    Dispute,
    /// A value outside the known enum range.
    Unknown(u8),
}

impl TradeState {
    pub fn code(self) -> u8 {
        match self {
            TradeState::None => 0,
            TradeState::Created => 1,
            TradeState::Locked => 2,
            TradeState::Released => 3,
            TradeState::Refunded => 4,
            TradeState::Dispute => 5,
            TradeState::Unknown(code) => code,
        }
    }
}

impl From<u8> for TradeState {
    fn from(code: u8) -> Self {
        match code {
            0 => TradeState::None,
            1 => TradeState::Created,
            2 => TradeState::Locked,
            3 => TradeState::Released,
            4 => TradeState::Refunded,
            5 => TradeState::Dispute,
            other => TradeState::Unknown(other),
        }
    }
}

impl std::fmt::Display for TradeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeState::None => write!(f, "NONE"),
            TradeState::Created => write!(f, "CREATED"),
            TradeState::Locked => write!(f, "LOCKED"),
            TradeState::Released => write!(f, "RELEASED"),
            TradeState::Refunded => write!(f, "REFUNDED"),
            TradeState::Dispute => write!(f, "DISPUTE"),
            TradeState::Unknown(code) => write!(f, "UNKNOWN({code})"),
        }
    }
}

/// A trade record exactly as returned by `trades(bytes32)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    pub seller: Address,
    pub buyer: Address,
    /// Fixed-point amount with 6 decimals.
    pub amount: U256,
    pub lock_deadline: u64,
    pub fiat_deadline: u64,
    /// Raw state byte; see [`Trade::state`].
    pub state: u8,
}

impl Trade {
    pub fn state(&self) -> TradeState {
        TradeState::from(self.state)
    }
}

/// Arguments of `createTrade`, already validated and converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTradeRequest {
    pub trade_id: TradeId,
    pub seller: Address,
    pub buyer: Address,
    pub amount: U256,
    pub lock_deadline: u64,
    pub fiat_deadline: u64,
}

/// Backend-signer authorization attached to privileged writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAuthorization {
    pub trade_id: TradeId,
    pub expires_at: u64,
    pub nonce: B256,
    pub backend_sig: Bytes,
}

/// Writes that take only a trade id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Deposit,
    Refund,
    OpenDispute,
}

/// Writes that carry a backend-signer authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedAction {
    Release,
    ResolveDisputeRelease,
    ResolveDisputeRefund,
}

/// Which of the contract's digest views to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestKind {
    Release,
    Refund,
}

/// One state-changing contract call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowCall {
    CreateTrade(CreateTradeRequest),
    Action(TradeAction, TradeId),
    Signed(SignedAction, SignedAuthorization),
}

impl EscrowCall {
    pub fn trade_id(&self) -> TradeId {
        match self {
            EscrowCall::CreateTrade(req) => req.trade_id,
            EscrowCall::Action(_, id) => *id,
            EscrowCall::Signed(_, auth) => auth.trade_id,
        }
    }

    /// Contract function name, as it appears in the ABI.
    pub fn function_name(&self) -> &'static str {
        match self {
            EscrowCall::CreateTrade(_) => "createTrade",
            EscrowCall::Action(TradeAction::Deposit, _) => "deposit",
            EscrowCall::Action(TradeAction::Refund, _) => "refund",
            EscrowCall::Action(TradeAction::OpenDispute, _) => "openDispute",
            EscrowCall::Signed(SignedAction::Release, _) => "release",
            EscrowCall::Signed(SignedAction::ResolveDisputeRelease, _) => "resolveDisputeRelease",
            EscrowCall::Signed(SignedAction::ResolveDisputeRefund, _) => "resolveDisputeRefund",
        }
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Whether the desk talks to a real node or simulates the escrow in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    Live,
    DryRun,
}

impl std::fmt::Display for ClientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientMode::Live => write!(f, "live"),
            ClientMode::DryRun => write!(f, "dryrun"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_labels_match_contract_enum() {
        let labels: Vec<String> = (0u8..=5).map(|c| TradeState::from(c).to_string()).collect();
        assert_eq!(
            labels,
            ["NONE", "CREATED", "LOCKED", "RELEASED", "REFUNDED", "DISPUTE"]
        );
    }

    #[test]
    fn out_of_range_state_is_unknown() {
        let state = TradeState::from(9);
        assert_eq!(state, TradeState::Unknown(9));
        assert_eq!(state.to_string(), "UNKNOWN(9)");
        assert_eq!(state.code(), 9);
    }

    #[test]
    fn call_reports_abi_function_name() {
        let id = B256::repeat_byte(0x11);
        assert_eq!(
            EscrowCall::Action(TradeAction::OpenDispute, id).function_name(),
            "openDispute"
        );
        assert_eq!(EscrowCall::Action(TradeAction::Deposit, id).trade_id(), id);
    }
}
