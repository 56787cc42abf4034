//! 受保护 RPC 端点接口
//!
//! 直发被受保护节点缓存后，凭 (nonce, 签名) 取回原始签名交易。

use async_trait::async_trait;
use ethers::types::Bytes;

use crate::{domain::ChainDescriptor, error::TransferError};

#[async_trait]
pub trait ProtectedRpc: Send + Sync {
    async fn fetch_cached_transaction(
        &self,
        chain: &ChainDescriptor,
        nonce: u64,
        signature: &Bytes,
    ) -> Result<Bytes, TransferError>;
}
