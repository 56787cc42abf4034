//! 门限公钥加密（TPKE）协作方接口
//!
//! 密钥推导与配对运算由外部密码学实现提供，这里只定义窄接口。

use crate::{
    domain::{ConsensusParameters, EncryptedPayload, Scaler, ThresholdPublicKey},
    error::TransferError,
};

pub trait ThresholdEncryptionEngine: Send + Sync {
    /// 由共识规模推导门限与缩放因子
    fn consensus_parameters(&self, consensus_size: u64)
        -> Result<ConsensusParameters, TransferError>;

    /// 由聚合承诺和缩放因子确定性地推导门限公钥。
    ///
    /// 承诺长度或结构不合法时返回 `MalformedCommitment`。
    fn derive_key(
        &self,
        commitment: &[u8],
        scaler: &Scaler,
    ) -> Result<ThresholdPublicKey, TransferError>;

    /// 加密任意字节；同一输入多次加密的结果不要求相同
    fn encrypt(
        &self,
        key: &ThresholdPublicKey,
        plaintext: &[u8],
    ) -> Result<EncryptedPayload, TransferError>;

    /// 密钥密文的固定长度，信封解码时用来切分尾部区域
    fn key_ciphertext_len(&self) -> Option<usize> {
        None
    }
}
