use alloy_primitives::{Address, B256};
use async_trait::async_trait;

use crate::{ClientMode, DigestKind, EscrowCall, Result, Trade, TradeId, TxHash, TxReceipt};

/// Abstraction over the escrow contract and the wallet that signs for it.
///
/// `EscrowContract` (crates/chain) implements this against a JSON-RPC node.
/// `DryRunEscrow` (crates/dryrun) implements it in memory.
///
/// The desk never decides trade outcomes itself: every write goes through
/// `send`, and the contract behind it is the sole authority on whether the
/// call is allowed.
#[async_trait]
pub trait EscrowClient: Send + Sync {
    fn mode(&self) -> ClientMode;

    /// Address of the escrow contract.
    fn escrow_address(&self) -> Address;

    /// Chain id reported by the node.
    async fn chain_id(&self) -> Result<u64>;

    /// Accounts the wallet is able to sign for.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Read `trades(tradeId)`.
    async fn trade(&self, trade_id: TradeId) -> Result<Trade>;

    /// Read `releaseDigest` or `refundDigest`.
    async fn digest(
        &self,
        kind: DigestKind,
        trade_id: TradeId,
        expires_at: u64,
        nonce: B256,
    ) -> Result<B256>;

    /// Hand a write to the wallet. Returns once the wallet accepted it.
    async fn send(&self, from: Address, call: &EscrowCall) -> Result<TxHash>;

    /// Block until the transaction is mined. A reverted receipt is an error.
    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt>;
}
