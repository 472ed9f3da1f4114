use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use common::validate::{parse_bytes32, parse_hex_bytes};
use common::{Error, Result, TxHash};

/// Ethereum JSON-RPC client over HTTP.
///
/// Writes go through `eth_sendTransaction`, so the node's wallet signs for
/// `from`. Nothing here holds a private key.
pub struct RpcClient {
    url: Url,
    http: Client,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(url: Url) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            url,
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, id, "JSON-RPC request");
        let resp = self
            .http
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Http(format!("HTTP {status}: {text}")));
        }
        parse_response(&text)
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        let raw: Vec<Address> = self.request("eth_accounts", json!([])).await?;
        Ok(raw)
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        let raw: String = self
            .request(
                "eth_call",
                json!([{ "to": to, "data": encode_hex(data) }, "latest"]),
            )
            .await?;
        if raw == "0x" {
            return Ok(Vec::new());
        }
        Ok(parse_hex_bytes(&raw)?.to_vec())
    }

    pub async fn send_transaction(&self, from: Address, to: Address, data: &[u8]) -> Result<TxHash> {
        let raw: String = self
            .request(
                "eth_sendTransaction",
                json!([{ "from": from, "to": to, "data": encode_hex(data) }]),
            )
            .await?;
        parse_bytes32(&raw)
    }

    /// `None` while the transaction is still pending.
    pub async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<RawReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }
}

/// The receipt fields the desk cares about.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` reverted. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

impl RawReceipt {
    pub fn succeeded(&self) -> bool {
        !matches!(self.status.as_deref(), Some("0x0"))
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(|b| parse_quantity(b).ok())
    }
}

// ─── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorObject {
    fn into_error(self) -> Error {
        let reason = self.data.as_ref().and_then(revert_reason);
        let message = match reason {
            Some(reason) if !self.message.contains(reason.as_str()) => {
                format!("{}: {reason}", self.message)
            }
            _ => self.message,
        };
        Error::Rpc {
            code: self.code,
            message,
        }
    }
}

/// Decode `Error(string)` / `Panic(uint256)` revert data attached to an error.
/// Nodes put it either directly in `data` or in `data.data`.
fn revert_reason(data: &Value) -> Option<String> {
    let hex = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    let bytes = parse_hex_bytes(hex).ok()?;
    alloy_sol_types::decode_revert_reason(&bytes)
}

pub(crate) fn parse_response<T: DeserializeOwned>(text: &str) -> Result<T> {
    let envelope: RpcResponse = serde_json::from_str(text)?;
    if let Some(err) = envelope.error {
        return Err(err.into_error());
    }
    Ok(serde_json::from_value(envelope.result)?)
}

/// Parse a hex `QUANTITY` such as `0x7a69`.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| Error::Other(format!("quantity '{raw}' lacks 0x prefix")))?;
    u64::from_str_radix(digits, 16).map_err(|e| Error::Other(format!("quantity '{raw}': {e}")))
}

fn encode_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_is_extracted_from_envelope() {
        let id: String = parse_response(r#"{"jsonrpc":"2.0","id":1,"result":"0x7a69"}"#).unwrap();
        assert_eq!(parse_quantity(&id).unwrap(), 31_337);
    }

    #[test]
    fn null_result_means_pending_receipt() {
        let receipt: Option<RawReceipt> =
            parse_response(r#"{"jsonrpc":"2.0","id":1,"result":null}"#).unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn reverted_receipt_is_not_successful() {
        let text = format!(
            r#"{{"jsonrpc":"2.0","id":1,"result":{{"transactionHash":"0x{}","blockNumber":"0x10","status":"0x0"}}}}"#,
            "ab".repeat(32)
        );
        let receipt: Option<RawReceipt> = parse_response(&text).unwrap();
        let receipt = receipt.unwrap();
        assert!(!receipt.succeeded());
        assert_eq!(receipt.block(), Some(16));
    }

    #[test]
    fn error_object_becomes_rpc_error() {
        let err = parse_response::<String>(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"insufficient funds"}}"#,
        )
        .unwrap_err();
        match err {
            Error::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "insufficient funds");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn revert_data_surfaces_decoded_reason() {
        // Error("only backend")
        let data = concat!(
            "0x08c379a0",
            "0000000000000000000000000000000000000000000000000000000000000020",
            "000000000000000000000000000000000000000000000000000000000000000c",
            "6f6e6c79206261636b656e640000000000000000000000000000000000000000"
        );
        let text = format!(
            r#"{{"jsonrpc":"2.0","id":1,"error":{{"code":3,"message":"execution reverted","data":"{data}"}}}}"#
        );
        let err = parse_response::<String>(&text).unwrap_err();
        assert!(err.to_string().contains("only backend"), "{err}");
    }

    #[test]
    fn quantity_requires_prefix() {
        assert!(parse_quantity("7a69").is_err());
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
    }
}
