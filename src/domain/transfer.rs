//! 转账领域模型

use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};

/// 转账请求（每次用户操作创建一次，产出交易哈希或错误后丢弃）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub chain_id: u64,
    /// ERC-20 合约地址，`None` 表示原生代币
    #[serde(default)]
    pub token: Option<Address>,
    /// 发送方账户
    pub account: Address,
    /// 接收方
    pub to: Address,
    /// 十进制金额字符串，例如 "1.5"
    pub amount: String,
    pub decimals: u32,
    /// 是否走 AntiMEV 保护路径
    #[serde(default)]
    pub protected: bool,
}

impl TransferRequest {
    pub fn is_native(&self) -> bool {
        self.token.is_none()
    }
}

/// 回退流程期间持有的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingProtectedState {
    pub nonce: u64,
    /// 对 nonce 十进制字符串的签名
    pub signature: Bytes,
}

impl PendingProtectedState {
    pub fn new(nonce: u64, signature: Bytes) -> Self {
        Self {
            nonce,
            signature,
        }
    }

    /// 签名消息：nonce 的十进制字符串
    pub fn signing_message(nonce: u64) -> String {
        nonce.to_string()
    }
}

/// 共识缩放因子（由门限密码协作方给出的不透明值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaler(pub Vec<u8>);

/// 由共识规模推导的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParameters {
    pub consensus_size: u64,
    pub threshold: u64,
    pub scaler: Scaler,
}

/// 当前密钥轮次资料
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRoundMaterial {
    pub round_number: u64,
    pub aggregated_commitment: Bytes,
}

/// 门限公钥（仅用于加密）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdPublicKey(pub Vec<u8>);

/// 门限加密结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub key_ciphertext: Vec<u8>,
    pub message_ciphertext: Vec<u8>,
}
