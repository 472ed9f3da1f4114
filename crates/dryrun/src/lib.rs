use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{address, keccak256, Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use common::{
    ClientMode, DigestKind, Error, EscrowCall, EscrowClient, Result, SignedAction, Trade,
    TradeAction, TradeId, TradeState, TxHash, TxReceipt,
};

/// Anvil's first three default accounts. The first one plays backend signer.
pub const DEFAULT_ACCOUNTS: [Address; 3] = [
    address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
    address!("70997970C51812dc3A010C7d01b50e0d17dc79C8"),
    address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC"),
];

const DRYRUN_CHAIN_ID: u64 = 31_337;

/// In-memory stand-in for the escrow contract and its wallet.
///
/// Calls are mined instantly. The simulated lifecycle is deliberately coarse:
/// it checks callers and states but never verifies backend signatures, so it
/// is only useful for exercising the desk without a node.
pub struct DryRunEscrow {
    address: Address,
    accounts: Vec<Address>,
    trades: Arc<RwLock<HashMap<TradeId, Trade>>>,
    receipts: Arc<RwLock<HashMap<TxHash, TxReceipt>>>,
    used_nonces: Arc<RwLock<HashSet<B256>>>,
    block: AtomicU64,
}

impl DryRunEscrow {
    pub fn new(address: Address, accounts: Vec<Address>) -> Self {
        let accounts = if accounts.is_empty() {
            DEFAULT_ACCOUNTS.to_vec()
        } else {
            accounts
        };
        info!(%address, backend_signer = %accounts[0], "DryRunEscrow initialized");
        Self {
            address,
            accounts,
            trades: Arc::new(RwLock::new(HashMap::new())),
            receipts: Arc::new(RwLock::new(HashMap::new())),
            used_nonces: Arc::new(RwLock::new(HashSet::new())),
            block: AtomicU64::new(1),
        }
    }

    pub fn backend_signer(&self) -> Address {
        self.accounts[0]
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }

    async fn apply(&self, from: Address, call: &EscrowCall) -> Result<()> {
        let mut trades = self.trades.write().await;

        if let EscrowCall::CreateTrade(req) = call {
            if from != self.backend_signer() {
                return Err(revert("only backend"));
            }
            if trades.contains_key(&req.trade_id) {
                return Err(revert("trade exists"));
            }
            if req.seller == Address::ZERO || req.buyer == Address::ZERO {
                return Err(revert("zero address"));
            }
            if req.amount == U256::ZERO {
                return Err(revert("zero amount"));
            }
            trades.insert(
                req.trade_id,
                Trade {
                    seller: req.seller,
                    buyer: req.buyer,
                    amount: req.amount,
                    lock_deadline: req.lock_deadline,
                    fiat_deadline: req.fiat_deadline,
                    state: TradeState::Created.code(),
                },
            );
            return Ok(());
        }

        let trade = trades
            .get_mut(&call.trade_id())
            .ok_or_else(|| revert("no trade"))?;
        let state = trade.state();

        let next = match call {
            EscrowCall::CreateTrade(_) => return Err(revert("trade exists")),

            EscrowCall::Action(TradeAction::Deposit, _) => {
                if from != trade.seller {
                    return Err(revert("only seller"));
                }
                require_state(state, &[TradeState::Created])?;
                TradeState::Locked
            }
            EscrowCall::Action(TradeAction::Refund, _) => {
                if from != trade.seller {
                    return Err(revert("only seller"));
                }
                require_state(state, &[TradeState::Created, TradeState::Locked])?;
                TradeState::Refunded
            }
            EscrowCall::Action(TradeAction::OpenDispute, _) => {
                if from != trade.seller && from != trade.buyer {
                    return Err(revert("only parties"));
                }
                require_state(state, &[TradeState::Locked])?;
                TradeState::Dispute
            }

            EscrowCall::Signed(action, auth) => {
                if from != self.backend_signer() {
                    return Err(revert("only backend"));
                }
                if auth.expires_at < Self::now() {
                    return Err(revert("authorization expired"));
                }
                if auth.backend_sig.is_empty() {
                    return Err(revert("missing signature"));
                }
                let next = match action {
                    SignedAction::Release => {
                        require_state(state, &[TradeState::Locked])?;
                        TradeState::Released
                    }
                    SignedAction::ResolveDisputeRelease => {
                        require_state(state, &[TradeState::Dispute])?;
                        TradeState::Released
                    }
                    SignedAction::ResolveDisputeRefund => {
                        require_state(state, &[TradeState::Dispute])?;
                        TradeState::Refunded
                    }
                };
                if !self.used_nonces.write().await.insert(auth.nonce) {
                    return Err(revert("nonce used"));
                }
                next
            }
        };

        debug!(trade_id = %call.trade_id(), %state, %next, "Dry-run transition");
        trade.state = next.code();
        Ok(())
    }
}

fn revert(reason: &str) -> Error {
    Error::Rpc {
        code: 3,
        message: format!("execution reverted: {reason}"),
    }
}

fn require_state(actual: TradeState, allowed: &[TradeState]) -> Result<()> {
    if allowed.contains(&actual) {
        Ok(())
    } else {
        Err(revert(&format!("bad state {actual}")))
    }
}

#[async_trait]
impl EscrowClient for DryRunEscrow {
    fn mode(&self) -> ClientMode {
        ClientMode::DryRun
    }

    fn escrow_address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(DRYRUN_CHAIN_ID)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn trade(&self, trade_id: TradeId) -> Result<Trade> {
        // Unknown ids read as the zero record, like an unset mapping slot.
        Ok(self
            .trades
            .read()
            .await
            .get(&trade_id)
            .cloned()
            .unwrap_or(Trade {
                seller: Address::ZERO,
                buyer: Address::ZERO,
                amount: U256::ZERO,
                lock_deadline: 0,
                fiat_deadline: 0,
                state: TradeState::None.code(),
            }))
    }

    async fn digest(
        &self,
        kind: DigestKind,
        trade_id: TradeId,
        expires_at: u64,
        nonce: B256,
    ) -> Result<B256> {
        let tag: &[u8] = match kind {
            DigestKind::Release => b"RELEASE",
            DigestKind::Refund => b"REFUND",
        };
        let mut preimage = Vec::with_capacity(tag.len() + 20 + 32 + 8 + 32);
        preimage.extend_from_slice(tag);
        preimage.extend_from_slice(self.address.as_slice());
        preimage.extend_from_slice(trade_id.as_slice());
        preimage.extend_from_slice(&expires_at.to_be_bytes());
        preimage.extend_from_slice(nonce.as_slice());
        Ok(keccak256(&preimage))
    }

    async fn send(&self, from: Address, call: &EscrowCall) -> Result<TxHash> {
        if !self.accounts.contains(&from) {
            return Err(Error::Rpc {
                code: -32000,
                message: format!("unknown account {from}"),
            });
        }
        self.apply(from, call).await?;

        let block = self.block.fetch_add(1, Ordering::Relaxed);
        let mut preimage = block.to_be_bytes().to_vec();
        preimage.extend_from_slice(call.function_name().as_bytes());
        preimage.extend_from_slice(call.trade_id().as_slice());
        let hash = keccak256(&preimage);

        debug!(function = call.function_name(), %hash, block, "Dry-run transaction mined");
        self.receipts.write().await.insert(
            hash,
            TxReceipt {
                hash,
                block_number: Some(block),
                success: true,
            },
        );
        Ok(hash)
    }

    /// Hands the receipt over once; a second wait for the same hash fails.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        self.receipts
            .write()
            .await
            .remove(&hash)
            .ok_or_else(|| Error::Transaction(format!("unknown transaction {hash}")))
    }
}
