//! 钱包网关接口
//!
//! 一个会话对应一个已连接账户；钱包本身对同一账户的操作串行化。
//! 实现方必须在边界处把原始错误翻译为 `TransferError`。

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256};
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChainDescriptor, NativeCurrency},
    error::TransferError,
};

/// `wallet_addEthereumChain` 请求参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainRequest {
    /// 0x 前缀的十六进制链 ID
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl AddChainRequest {
    /// 受保护模式下携带受保护 RPC 集合，否则携带默认集合
    pub fn from_descriptor(chain: &ChainDescriptor, protected: bool) -> Self {
        Self {
            chain_id: format!("0x{:x}", chain.id),
            chain_name: chain.name.clone(),
            native_currency: chain.native_currency.clone(),
            rpc_urls: chain.rpc_urls_for(protected).to_vec(),
            block_explorer_urls: chain.explorer_url.iter().cloned().collect(),
        }
    }

    /// 解析回数值链 ID
    pub fn numeric_chain_id(&self) -> Result<u64, TransferError> {
        u64::from_str_radix(self.chain_id.trim_start_matches("0x"), 16).map_err(|e| {
            TransferError::configuration(format!("Invalid chain id {}: {}", self.chain_id, e))
        })
    }
}

#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// 切换（必要时添加）当前链，已在目标链上时应为幂等操作
    async fn switch_chain(&self, request: &AddChainRequest) -> Result<(), TransferError>;

    /// 账户当前交易计数（nonce）
    async fn transaction_count(&self, chain_id: u64, account: Address)
        -> Result<u64, TransferError>;

    /// 对任意消息做个人签名（EIP-191）
    async fn sign_message(&self, message: &str) -> Result<Bytes, TransferError>;

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, TransferError>;

    /// 签名并发送交易，返回交易哈希
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<H256, TransferError>;

    /// 等待交易回执，交易被丢弃时返回 `None`
    async fn wait_for_receipt(&self, hash: H256)
        -> Result<Option<TransactionReceipt>, TransferError>;
}
