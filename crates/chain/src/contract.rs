use std::time::Duration;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use common::{
    ClientMode, Config, DigestKind, Error, EscrowCall, EscrowClient, Result, Trade, TradeId,
    TxHash, TxReceipt,
};

use crate::abi;
use crate::rpc::RpcClient;

/// The deployed escrow contract, reached through a JSON-RPC node.
pub struct EscrowContract {
    rpc: RpcClient,
    address: Address,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl EscrowContract {
    pub fn new(rpc: RpcClient, address: Address) -> Self {
        Self {
            rpc,
            address,
            receipt_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(500),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let rpc = RpcClient::new(cfg.rpc_url.clone())?;
        Ok(Self::new(rpc, cfg.escrow_address)
            .with_receipt_timing(cfg.receipt_timeout, cfg.receipt_poll_interval))
    }

    pub fn with_receipt_timing(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.receipt_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl EscrowClient for EscrowContract {
    fn mode(&self) -> ClientMode {
        ClientMode::Live
    }

    fn escrow_address(&self) -> Address {
        self.address
    }

    async fn chain_id(&self) -> Result<u64> {
        self.rpc.chain_id().await
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.rpc.accounts().await
    }

    async fn trade(&self, trade_id: TradeId) -> Result<Trade> {
        let data = self
            .rpc
            .call(self.address, &abi::encode_trade_query(trade_id))
            .await?;
        abi::decode_trade(&data)
    }

    async fn digest(
        &self,
        kind: DigestKind,
        trade_id: TradeId,
        expires_at: u64,
        nonce: B256,
    ) -> Result<B256> {
        let query = abi::encode_digest_query(kind, trade_id, expires_at, nonce);
        let data = self.rpc.call(self.address, &query).await?;
        abi::decode_digest(kind, &data)
    }

    async fn send(&self, from: Address, call: &EscrowCall) -> Result<TxHash> {
        let data = abi::encode_call(call);
        debug!(
            function = call.function_name(),
            trade_id = %call.trade_id(),
            %from,
            "Sending escrow transaction"
        );
        let hash = self.rpc.send_transaction(from, self.address, &data).await?;
        info!(function = call.function_name(), %hash, "Transaction accepted by wallet");
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.rpc.transaction_receipt(hash).await? {
                let block_number = receipt.block();
                if !receipt.succeeded() {
                    warn!(%hash, ?block_number, "Transaction reverted");
                    return Err(Error::Transaction(format!(
                        "transaction {hash} reverted"
                    )));
                }
                info!(%hash, ?block_number, "Transaction confirmed");
                return Ok(TxReceipt {
                    hash: receipt.transaction_hash,
                    block_number,
                    success: true,
                });
            }

            if started.elapsed() >= self.receipt_timeout {
                return Err(Error::Transaction(format!(
                    "no receipt for {hash} after {}s",
                    self.receipt_timeout.as_secs()
                )));
            }
            sleep(self.poll_interval).await;
        }
    }
}
