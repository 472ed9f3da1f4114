use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::Address;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use common::{Error, EscrowCall, EscrowClient, Result, Trade, TradeId, TxReceipt};
use desk::{fresh_trade_id, TradeLookup, TxStatus};

/// Per-process UI state: who is connected, what the last write is doing,
/// and the trade id offered by the create form.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub account: Option<Address>,
    pub tx: TxStatus,
    pub draft_trade_id: Option<TradeId>,
}

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn EscrowClient>,
    pub session: Arc<RwLock<Session>>,
    /// Last fetched record per trade id. Action gating reads from here.
    pub cache: Arc<RwLock<HashMap<TradeId, Trade>>>,
}

impl AppState {
    pub fn new(client: Arc<dyn EscrowClient>) -> Self {
        let session = Session {
            draft_trade_id: Some(fresh_trade_id()),
            ..Session::default()
        };
        Self {
            client,
            session: Arc::new(RwLock::new(session)),
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn account(&self) -> Option<Address> {
        self.session.read().await.account
    }

    pub async fn require_account(&self, message: &str) -> Result<Address> {
        self.account()
            .await
            .ok_or_else(|| Error::validation(message))
    }

    /// Connect `requested`, or the wallet's first account when `None`.
    pub async fn connect(&self, requested: Option<Address>) -> Result<Address> {
        let accounts = self.client.accounts().await?;
        let account = match requested {
            Some(addr) if accounts.contains(&addr) => addr,
            Some(addr) => {
                return Err(Error::validation(format!(
                    "Account {addr} is not available in the wallet."
                )))
            }
            None => *accounts
                .first()
                .ok_or_else(|| Error::Transaction("Wallet exposes no accounts.".into()))?,
        };
        self.session.write().await.account = Some(account);
        info!(%account, "Wallet connected");
        Ok(account)
    }

    pub async fn disconnect(&self) {
        let mut session = self.session.write().await;
        if let Some(account) = session.account.take() {
            info!(%account, "Wallet disconnected");
        }
    }

    pub async fn regenerate_trade_id(&self) -> TradeId {
        let id = fresh_trade_id();
        self.session.write().await.draft_trade_id = Some(id);
        id
    }

    /// Lookup panel for `input`, carrying the cached record if there is one.
    pub async fn lookup(&self, input: &str) -> TradeLookup {
        let lookup = TradeLookup::new(input);
        let cached = match lookup.trade_id() {
            Ok(id) => self.cache.read().await.get(&id).cloned(),
            Err(_) => None,
        };
        lookup.with_fetched(cached)
    }

    /// Read the trade from the contract and remember it.
    pub async fn refresh(&self, trade_id: TradeId) -> Result<Trade> {
        let trade = self.client.trade(trade_id).await?;
        self.cache.write().await.insert(trade_id, trade.clone());
        Ok(trade)
    }

    /// Hand `call` to the wallet, wait for it to be mined, then refetch the
    /// trade. Only one write may be in flight at a time.
    ///
    /// The write runs on its own task, so the session leaves the busy state
    /// even when the caller stops waiting.
    pub async fn submit(&self, from: Address, call: EscrowCall) -> Result<TxReceipt> {
        {
            let mut session = self.session.write().await;
            if session.tx.is_busy() {
                return Err(Error::validation("A transaction is already in progress."));
            }
            session.tx = TxStatus::AwaitingWallet;
        }

        let state = self.clone();
        let function = call.function_name();
        match tokio::spawn(async move { state.settle(from, call).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(function, error = %e, "Escrow write task aborted");
                let message = format!("transaction task aborted: {e}");
                self.session.write().await.tx = TxStatus::Failed {
                    message: message.clone(),
                };
                Err(Error::Other(message))
            }
        }
    }

    async fn settle(&self, from: Address, call: EscrowCall) -> Result<TxReceipt> {
        let outcome = self.send_and_confirm(from, &call).await;
        match &outcome {
            Ok(receipt) => {
                self.session.write().await.tx = TxStatus::Confirmed { hash: receipt.hash };
                if let Err(e) = self.refresh(call.trade_id()).await {
                    warn!(trade_id = %call.trade_id(), error = %e, "Refetch after write failed");
                }
            }
            Err(e) => {
                error!(function = call.function_name(), error = %e, "Escrow write failed");
                self.session.write().await.tx = TxStatus::Failed {
                    message: e.to_string(),
                };
            }
        }
        outcome
    }

    async fn send_and_confirm(&self, from: Address, call: &EscrowCall) -> Result<TxReceipt> {
        let hash = self.client.send(from, call).await?;
        self.session.write().await.tx = TxStatus::Confirming { hash };
        self.client.wait_for_receipt(hash).await
    }
}

/// Current Unix time in seconds, the anchor for relative deadlines.
pub(crate) fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use alloy_primitives::B256;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use common::{ClientMode, DigestKind, TradeAction, TxHash};

    use super::*;

    /// Wallet that holds every `send` until the test lets it through.
    struct HeldWallet {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl EscrowClient for HeldWallet {
        fn mode(&self) -> ClientMode {
            ClientMode::DryRun
        }

        fn escrow_address(&self) -> Address {
            Address::repeat_byte(0xee)
        }

        async fn chain_id(&self) -> Result<u64> {
            Ok(31_337)
        }

        async fn accounts(&self) -> Result<Vec<Address>> {
            Ok(vec![Address::repeat_byte(1)])
        }

        async fn trade(&self, _trade_id: TradeId) -> Result<Trade> {
            Err(Error::Other("no reads here".into()))
        }

        async fn digest(
            &self,
            _kind: DigestKind,
            _trade_id: TradeId,
            _expires_at: u64,
            _nonce: B256,
        ) -> Result<B256> {
            Ok(B256::ZERO)
        }

        async fn send(&self, _from: Address, _call: &EscrowCall) -> Result<TxHash> {
            self.release.notified().await;
            Ok(B256::repeat_byte(0xaa))
        }

        async fn wait_for_receipt(&self, hash: TxHash) -> Result<TxReceipt> {
            Ok(TxReceipt {
                hash,
                block_number: Some(1),
                success: true,
            })
        }
    }

    async fn wait_until_idle(state: &AppState) -> TxStatus {
        for _ in 0..200 {
            let tx = state.session.read().await.tx.clone();
            if !tx.is_busy() {
                return tx;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session stayed busy");
    }

    #[tokio::test]
    async fn abandoned_submit_still_settles() {
        let release = Arc::new(Notify::new());
        let state = AppState::new(Arc::new(HeldWallet {
            release: release.clone(),
        }));
        let from = Address::repeat_byte(1);
        let call = EscrowCall::Action(TradeAction::Deposit, B256::repeat_byte(7));

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), state.submit(from, call.clone())).await;
        assert!(abandoned.is_err());
        assert_eq!(state.session.read().await.tx, TxStatus::AwaitingWallet);

        // A second write is refused while the first is still with the wallet.
        let err = state.submit(from, call.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "A transaction is already in progress.");

        release.notify_one();
        assert_eq!(
            wait_until_idle(&state).await,
            TxStatus::Confirmed {
                hash: B256::repeat_byte(0xaa)
            }
        );

        release.notify_one();
        let receipt = state.submit(from, call).await.unwrap();
        assert!(receipt.success);
    }
}
