use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::AppState;
use chain::EscrowContract;
use common::{ClientMode, Config, EscrowClient};
use dryrun::DryRunEscrow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("Invalid configuration")?;
    info!(mode = %cfg.mode, escrow = %cfg.escrow_address, "Escrow desk starting");

    // ── Escrow client (injected based on ESCROW_MODE) ─────────────────────────
    let client: Arc<dyn EscrowClient> = match cfg.mode {
        ClientMode::Live => {
            info!(rpc = %cfg.rpc_url, "Live mode, using EscrowContract");
            Arc::new(EscrowContract::from_config(&cfg).context("Failed to build RPC client")?)
        }
        ClientMode::DryRun => {
            info!("Dry-run mode, using in-memory DryRunEscrow");
            Arc::new(DryRunEscrow::new(cfg.escrow_address, vec![]))
        }
    };

    match client.chain_id().await {
        Ok(id) if id != cfg.chain_id => {
            warn!(expected = cfg.chain_id, actual = id, "Wallet is on a different chain")
        }
        Ok(id) => info!(chain_id = id, "Chain reachable"),
        Err(e) => warn!(error = %e, "Could not reach the node; reads will fail until it is up"),
    }

    // ── Session ───────────────────────────────────────────────────────────────
    let state = AppState::new(client);
    if let Some(account) = cfg.wallet_account {
        if let Err(e) = state.connect(Some(account)).await {
            warn!(%account, error = %e, "WALLET_ACCOUNT could not be connected");
        }
    }

    // ── Desk server ───────────────────────────────────────────────────────────
    api::serve(state, cfg.desk_port)
        .await
        .context("Desk server error")?;
    Ok(())
}
