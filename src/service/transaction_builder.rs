//! 交易构建器
//!
//! 为原生转账、ERC-20 转账和 AntiMEV 信封提交构建统一的 `TransactionRequest`。
//! 签名与 gas 填充由钱包网关完成。

use ethers::{
    abi::{self, Token},
    types::{Address, Bytes, TransactionRequest, U256},
};

use crate::domain::TransferRequest;

/// `transfer(address,uint256)` 选择器
pub const ERC20_TRANSFER_SELECTOR: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];

/// 统一交易构建器
pub struct TransactionBuilder;

impl TransactionBuilder {
    /// 按请求类型选择原生或 ERC-20 构建
    pub fn transfer(request: &TransferRequest, value: U256, nonce: Option<u64>) -> TransactionRequest {
        match request.token {
            Some(token) => Self::erc20_transfer(request, token, value, nonce),
            None => Self::native_transfer(request, value, nonce),
        }
    }

    /// 原生代币转账：to = 接收方，value = 原始金额
    pub fn native_transfer(
        request: &TransferRequest,
        value: U256,
        nonce: Option<u64>,
    ) -> TransactionRequest {
        let tx = TransactionRequest::new()
            .from(request.account)
            .to(request.to)
            .value(value)
            .chain_id(request.chain_id);
        with_nonce(tx, nonce)
    }

    /// ERC-20 转账：to = 代币合约，data = transfer(接收方, 金额)
    pub fn erc20_transfer(
        request: &TransferRequest,
        token: Address,
        value: U256,
        nonce: Option<u64>,
    ) -> TransactionRequest {
        let tx = TransactionRequest::new()
            .from(request.account)
            .to(token)
            .data(Self::erc20_transfer_calldata(request.to, value))
            .chain_id(request.chain_id);
        with_nonce(tx, nonce)
    }

    pub fn erc20_transfer_calldata(recipient: Address, value: U256) -> Bytes {
        let mut data = ERC20_TRANSFER_SELECTOR.to_vec();
        data.extend(abi::encode(&[Token::Address(recipient), Token::Uint(value)]));
        Bytes::from(data)
    }

    /// 信封提交交易：data 为完整信封字节，不携带 value
    pub fn envelope_submission(
        account: Address,
        target: Address,
        chain_id: u64,
        envelope: Vec<u8>,
        nonce: Option<u64>,
    ) -> TransactionRequest {
        let tx = TransactionRequest::new()
            .from(account)
            .to(target)
            .data(Bytes::from(envelope))
            .chain_id(chain_id);
        with_nonce(tx, nonce)
    }
}

fn with_nonce(tx: TransactionRequest, nonce: Option<u64>) -> TransactionRequest {
    match nonce {
        Some(n) => tx.nonce(n),
        None => tx,
    }
}

#[cfg(test)]
mod tests;
