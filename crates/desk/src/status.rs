use serde::Serialize;

use common::TxHash;

/// Progress of the most recent write submitted from the desk.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TxStatus {
    #[default]
    Idle,
    /// Handed to the wallet, no hash yet.
    AwaitingWallet,
    Confirming { hash: TxHash },
    Confirmed { hash: TxHash },
    Failed { message: String },
}

impl TxStatus {
    /// While busy, every write action is disabled.
    pub fn is_busy(&self) -> bool {
        matches!(self, TxStatus::AwaitingWallet | TxStatus::Confirming { .. })
    }

    /// Label for the submit button; `idle_label` is shown when nothing is in flight.
    pub fn button_label<'a>(&self, idle_label: &'a str) -> &'a str {
        match self {
            TxStatus::AwaitingWallet => "Check wallet...",
            TxStatus::Confirming { .. } => "Confirming...",
            _ => idle_label,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;

    #[test]
    fn busy_while_wallet_or_chain_is_working() {
        let hash = B256::repeat_byte(1);
        assert!(!TxStatus::Idle.is_busy());
        assert!(TxStatus::AwaitingWallet.is_busy());
        assert!(TxStatus::Confirming { hash }.is_busy());
        assert!(!TxStatus::Confirmed { hash }.is_busy());
        assert!(!TxStatus::Failed { message: "x".into() }.is_busy());
    }

    #[test]
    fn button_label_follows_progress() {
        let hash = B256::repeat_byte(1);
        assert_eq!(TxStatus::Idle.button_label("Create Trade"), "Create Trade");
        assert_eq!(TxStatus::AwaitingWallet.button_label("Create Trade"), "Check wallet...");
        assert_eq!(TxStatus::Confirming { hash }.button_label("Create Trade"), "Confirming...");
        assert_eq!(TxStatus::Confirmed { hash }.button_label("Create Trade"), "Create Trade");
    }
}
