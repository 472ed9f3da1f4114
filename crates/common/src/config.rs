use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::Address;
use serde::Deserialize;
use url::Url;

use crate::validate::parse_address;
use crate::{ClientMode, Error, Result};

/// Latest local deployment (output of the contract deploy script).
pub const DEFAULT_ESCROW_ADDRESS: &str = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512";
/// Local anvil node.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CHAIN_ID: u64 = 31_337;

/// All configuration loaded at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Contract
    pub escrow_address: Address,

    // Network transport
    pub rpc_url: Url,
    pub chain_id: u64,
    pub mode: ClientMode,

    // Wallet
    pub wallet_account: Option<Address>,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,

    // Desk server
    pub desk_port: u16,
}

/// Optional TOML file describing a deployment.
///
/// Example `config/escrow.toml`:
/// ```toml
/// escrow_address = "0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"
/// rpc_url = "http://127.0.0.1:8545"
/// chain_id = 31337
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentFile {
    pub escrow_address: Option<String>,
    pub rpc_url: Option<String>,
    pub chain_id: Option<u64>,
}

impl DeploymentFile {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| Error::Config(format!("{path}: {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

impl Config {
    /// Load configuration from the environment, loading `.env` if present.
    /// `ESCROW_DEPLOYMENT_PATH` names an optional deployment file whose
    /// values sit between the built-in defaults and the environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let deployment = match optional_env("ESCROW_DEPLOYMENT_PATH") {
            Some(path) => DeploymentFile::load(&path)?,
            None => DeploymentFile::default(),
        };
        Self::resolve(&deployment, optional_env)
    }

    /// Build a config from a deployment file and a variable lookup.
    pub fn resolve(
        deployment: &DeploymentFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let escrow_address = lookup("ESCROW_ADDRESS")
            .or_else(|| deployment.escrow_address.clone())
            .unwrap_or_else(|| DEFAULT_ESCROW_ADDRESS.to_string());
        let escrow_address = parse_address(&escrow_address)
            .map_err(|_| Error::Config(format!("ESCROW_ADDRESS is not an address: '{escrow_address}'")))?;

        let rpc_url = lookup("RPC_URL")
            .or_else(|| deployment.rpc_url.clone())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_url = Url::parse(&rpc_url)
            .map_err(|e| Error::Config(format!("RPC_URL '{rpc_url}' is invalid: {e}")))?;

        let chain_id = match lookup("CHAIN_ID") {
            Some(v) => parse_var("CHAIN_ID", &v)?,
            None => deployment.chain_id.unwrap_or(DEFAULT_CHAIN_ID),
        };

        let mode = match lookup("ESCROW_MODE").as_deref().map(str::to_lowercase).as_deref() {
            None | Some("live") => ClientMode::Live,
            Some("dryrun") | Some("dry-run") => ClientMode::DryRun,
            Some(other) => {
                return Err(Error::Config(format!(
                    "ESCROW_MODE must be 'live' or 'dryrun', got: '{other}'"
                )))
            }
        };

        let wallet_account = lookup("WALLET_ACCOUNT")
            .map(|v| {
                parse_address(&v)
                    .map_err(|_| Error::Config(format!("WALLET_ACCOUNT is not an address: '{v}'")))
            })
            .transpose()?;

        let receipt_timeout_secs: u64 = lookup("RECEIPT_TIMEOUT_SECS")
            .map(|v| parse_var("RECEIPT_TIMEOUT_SECS", &v))
            .transpose()?
            .unwrap_or(60);
        let receipt_poll_ms: u64 = lookup("RECEIPT_POLL_MS")
            .map(|v| parse_var("RECEIPT_POLL_MS", &v))
            .transpose()?
            .unwrap_or(500);

        Ok(Config {
            escrow_address,
            rpc_url,
            chain_id,
            mode,
            wallet_account,
            receipt_timeout: Duration::from_secs(receipt_timeout_secs),
            receipt_poll_interval: Duration::from_millis(receipt_poll_ms),
            desk_port: lookup("DESK_PORT")
                .map(|v| parse_var("DESK_PORT", &v))
                .transpose()?
                .unwrap_or(3000),
        })
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has an invalid value: '{value}'")))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_local_anvil() {
        let cfg = Config::resolve(&DeploymentFile::default(), lookup(&[])).unwrap();
        assert_eq!(cfg.rpc_url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(cfg.chain_id, 31_337);
        assert_eq!(cfg.mode, ClientMode::Live);
        assert_eq!(cfg.desk_port, 3000);
        assert_eq!(cfg.receipt_timeout, Duration::from_secs(60));
        assert_eq!(cfg.escrow_address, parse_address(DEFAULT_ESCROW_ADDRESS).unwrap());
        assert!(cfg.wallet_account.is_none());
    }

    #[test]
    fn environment_overrides_deployment_file() {
        let file = DeploymentFile::parse(
            r#"
            escrow_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            rpc_url = "http://10.0.0.5:8545"
            chain_id = 42161
            "#,
        )
        .unwrap();

        let cfg = Config::resolve(&file, lookup(&[("CHAIN_ID", "1")])).unwrap();
        assert_eq!(cfg.chain_id, 1);
        assert_eq!(cfg.rpc_url.host_str(), Some("10.0.0.5"));
        assert_eq!(
            cfg.escrow_address,
            parse_address("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap()
        );
    }

    #[test]
    fn malformed_values_are_config_errors() {
        let file = DeploymentFile::default();
        for vars in [
            [("ESCROW_ADDRESS", "0x1234")],
            [("RPC_URL", "not a url")],
            [("ESCROW_MODE", "paper")],
            [("DESK_PORT", "99999")],
            [("WALLET_ACCOUNT", "me")],
        ] {
            let err = Config::resolve(&file, lookup(&vars)).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{vars:?}: {err}");
        }
    }

    #[test]
    fn dryrun_mode_is_case_insensitive() {
        let cfg = Config::resolve(&DeploymentFile::default(), lookup(&[("ESCROW_MODE", "DryRun")]))
            .unwrap();
        assert_eq!(cfg.mode, ClientMode::DryRun);
    }
}
