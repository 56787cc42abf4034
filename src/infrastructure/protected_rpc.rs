// 受保护 RPC 客户端 - 按 (nonce, 签名) 取回节点缓存的原始交易

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use ethers::types::Bytes;

use super::rpc_validator::{validate_hex_bytes, validate_rpc_response};
use crate::{
    config::AntiMevConfig,
    domain::ChainDescriptor,
    error::TransferError,
    service::protected_rpc::ProtectedRpc,
    utils::{hex_preview, to_hex_prefixed},
};

pub struct ProtectedRpcClient {
    http_client: reqwest::Client,
    method: String,
    next_id: AtomicU64,
}

impl ProtectedRpcClient {
    pub fn new(config: &AntiMevConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.rpc_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            method: config.cached_tx_method.clone(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    async fn call(
        &self,
        rpc_url: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, TransferError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": self.method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed)
        });

        let response = self
            .http_client
            .post(rpc_url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() { "timeout" } else { "network error" };
                TransferError::transport(format!("{} {}: {}", self.method, kind, e)).with_source(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TransferError::transport(format!("Failed to read {} response body: {}", self.method, e))
                .with_source(e)
        })?;

        if !status.is_success() {
            return Err(TransferError::transport(format!(
                "{} failed with status {}: {}",
                self.method, status, body
            )));
        }

        let json: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            TransferError::transport(format!("Failed to parse {} response: {}", self.method, e))
                .with_source(e)
        })?;

        validate_rpc_response(&self.method, &json).map(|v| v.clone())
    }
}

#[async_trait]
impl ProtectedRpc for ProtectedRpcClient {
    async fn fetch_cached_transaction(
        &self,
        chain: &ChainDescriptor,
        nonce: u64,
        signature: &Bytes,
    ) -> Result<Bytes, TransferError> {
        let rpc_url = chain.protected_rpc_url()?;
        let params = serde_json::json!([format!("0x{:x}", nonce), to_hex_prefixed(signature)]);

        tracing::debug!(
            endpoint = %rpc_url,
            method = %self.method,
            nonce,
            "Fetching cached transaction"
        );

        let result = self.call(rpc_url, params).await?;
        let raw = validate_hex_bytes(&result)?;

        tracing::debug!(
            endpoint = %rpc_url,
            raw_len = raw.len(),
            raw = %hex_preview(&raw, 16),
            "Cached transaction fetched"
        );
        Ok(raw)
    }
}
