//! 受保护端点缓存交易的解析
//!
//! 原始签名交易（legacy 或 EIP-2718 类型化）解码后取 gas limit，
//! 交易哈希为原始字节的 keccak256。

use ethers::{
    types::{transaction::eip2718::TypedTransaction, Bytes, H256, U256},
    utils::{keccak256, rlp::Rlp},
};

use crate::error::TransferError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedTransaction {
    pub raw: Bytes,
    pub hash: H256,
    pub gas_limit: U256,
    pub nonce: Option<U256>,
}

impl CachedTransaction {
    pub fn parse(raw: Bytes) -> Result<Self, TransferError> {
        if raw.is_empty() {
            return Err(TransferError::invalid_cached_transaction(
                "Cached transaction is empty",
            ));
        }

        let rlp = Rlp::new(raw.as_ref());
        let (tx, _signature) = TypedTransaction::decode_signed(&rlp).map_err(|e| {
            TransferError::invalid_cached_transaction(format!(
                "Cached transaction is not a valid signed transaction: {}",
                e
            ))
            .with_source(e)
        })?;

        let gas_limit = tx.gas().copied().ok_or_else(|| {
            TransferError::invalid_cached_transaction("Cached transaction has no gas limit")
        })?;

        Ok(Self {
            hash: H256::from(keccak256(raw.as_ref())),
            gas_limit,
            nonce: tx.nonce().copied(),
            raw,
        })
    }
}
