//! Solana wallet balance reads
//!
//! Thin JSON-RPC client over reqwest. Reads are best-effort: an unreachable
//! RPC or an unknown account logs a warning and reports zero lamports rather
//! than failing the request.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::warn;

use crate::types::{CoreError, Result};

/// Lamports per SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// A wallet's externally-read balance
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub address: String,
    pub lamports: u64,
    pub sol: f64,
}

impl WalletBalance {
    pub fn new(address: String, lamports: u64) -> Self {
        let sol = lamports as f64 / LAMPORTS_PER_SOL as f64;
        Self {
            address,
            lamports,
            sol,
        }
    }

    fn zero(address: String) -> Self {
        Self::new(address, 0)
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<RpcResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RpcResult {
    value: u64,
}

/// Best-effort Solana balance reader
#[derive(Clone)]
pub struct SolanaBalanceReader {
    client: reqwest::Client,
    rpc_url: String,
}

impl SolanaBalanceReader {
    pub fn new(rpc_url: &str, timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .unwrap_or_default();

        Self {
            client,
            rpc_url: rpc_url.to_string(),
        }
    }

    /// Read a wallet balance. Failures degrade to zero, never to an error.
    pub async fn balance(&self, address: &str) -> WalletBalance {
        match self.get_balance(address).await {
            Ok(lamports) => WalletBalance::new(address.to_string(), lamports),
            Err(e) => {
                warn!(address, error = %e, "wallet balance read failed, reporting zero");
                WalletBalance::zero(address.to_string())
            }
        }
    }

    async fn get_balance(&self, address: &str) -> Result<u64> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address],
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Upstream(format!("Solana RPC unreachable: {}", e)))?;

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Upstream(format!("Invalid RPC response: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(CoreError::Upstream(format!("Solana RPC error: {}", err)));
        }

        parsed
            .result
            .map(|r| r.value)
            .ok_or_else(|| CoreError::Upstream("RPC response missing result".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamports_to_sol() {
        let balance = WalletBalance::new("addr".into(), 2_500_000_000);
        assert_eq!(balance.sol, 2.5);
        assert_eq!(balance.lamports, 2_500_000_000);
    }

    #[test]
    fn test_zero_fallback_shape() {
        let balance = WalletBalance::zero("addr".into());
        assert_eq!(balance.lamports, 0);
        assert_eq!(balance.sol, 0.0);
    }

    #[test]
    fn test_unreachable_rpc_degrades_to_zero() {
        // Port 9 (discard) refuses connections immediately
        let reader = SolanaBalanceReader::new("http://127.0.0.1:9", 200);
        let balance =
            tokio_test::block_on(reader.balance("So11111111111111111111111111111111111111112"));
        assert_eq!(balance.lamports, 0);
    }
}
