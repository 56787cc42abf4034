//! AntiMEV 信封编解码
//!
//! 标准（v2）布局，大端，无内部长度前缀：
//!
//! | 偏移 | 长度 | 字段 |
//! |---|---|---|
//! | 0 | 4 | 标记 `0xFFFFFFFF` |
//! | 4 | 4 | 轮次号 |
//! | 8 | 4 | 原交易 gas limit |
//! | 12 | 32 | 原交易哈希 |
//! | 44 | k | 密钥密文 |
//! | 44+k | m | 消息密文 |
//!
//! 旧版（v1）只有 标记 ‖ 轮次号（小端）‖ 密文，仅用于兼容性测试，不得用于新提交。

use ethers::types::{H256, U256};

use crate::{domain::EncryptedPayload, error::TransferError};

/// 协议标记
pub const ENVELOPE_MARKER: [u8; 4] = [0xff, 0xff, 0xff, 0xff];

/// v2 固定头部长度
pub const ENVELOPE_HEADER_LEN: usize = 44;

/// v1 固定头部长度
pub const LEGACY_ENVELOPE_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeVersion {
    V1Legacy,
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("{field} value {value} does not fit in 4 bytes")]
    FieldOverflow { field: &'static str, value: String },
    #[error("envelope too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("unexpected envelope marker 0x{}", hex::encode(.0))]
    BadMarker([u8; 4]),
    #[error("key ciphertext length is not known for this encryption scheme")]
    UnknownKeyLength,
}

impl From<EnvelopeError> for TransferError {
    fn from(err: EnvelopeError) -> Self {
        TransferError::envelope_encoding(err.to_string()).with_source(err)
    }
}

fn to_u32(field: &'static str, value: U256) -> Result<u32, EnvelopeError> {
    if value > U256::from(u32::MAX) {
        return Err(EnvelopeError::FieldOverflow {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.as_u32())
}

fn check_marker(bytes: &[u8]) -> Result<(), EnvelopeError> {
    let mut marker = [0u8; 4];
    marker.copy_from_slice(&bytes[..4]);
    if marker != ENVELOPE_MARKER {
        return Err(EnvelopeError::BadMarker(marker));
    }
    Ok(())
}

fn read_u32_be(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(buf)
}

/// v2 信封
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub round_number: u32,
    pub gas_limit: u32,
    pub tx_hash: H256,
    pub key_ciphertext: Vec<u8>,
    pub message_ciphertext: Vec<u8>,
}

impl Envelope {
    pub const VERSION: EnvelopeVersion = EnvelopeVersion::V2;

    /// 轮次号和 gas limit 必须能放进 4 字节
    pub fn new(
        round_number: u64,
        gas_limit: U256,
        tx_hash: H256,
        payload: EncryptedPayload,
    ) -> Result<Self, EnvelopeError> {
        Ok(Self {
            round_number: to_u32("round number", U256::from(round_number))?,
            gas_limit: to_u32("gas limit", gas_limit)?,
            tx_hash,
            key_ciphertext: payload.key_ciphertext,
            message_ciphertext: payload.message_ciphertext,
        })
    }

    pub fn encoded_len(&self) -> usize {
        ENVELOPE_HEADER_LEN + self.key_ciphertext.len() + self.message_ciphertext.len()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&ENVELOPE_MARKER);
        out.extend_from_slice(&self.round_number.to_be_bytes());
        out.extend_from_slice(&self.gas_limit.to_be_bytes());
        out.extend_from_slice(self.tx_hash.as_bytes());
        out.extend_from_slice(&self.key_ciphertext);
        out.extend_from_slice(&self.message_ciphertext);
        out
    }

    /// 解码需要带外已知的密钥密文长度来切分尾部
    pub fn decode(bytes: &[u8], key_ciphertext_len: usize) -> Result<Self, EnvelopeError> {
        let expected = ENVELOPE_HEADER_LEN + key_ciphertext_len;
        if bytes.len() < expected {
            return Err(EnvelopeError::TooShort {
                expected,
                actual: bytes.len(),
            });
        }
        check_marker(bytes)?;

        let round_number = read_u32_be(bytes, 4);
        let gas_limit = read_u32_be(bytes, 8);
        let tx_hash = H256::from_slice(&bytes[12..ENVELOPE_HEADER_LEN]);
        let (key, msg) = bytes[ENVELOPE_HEADER_LEN..].split_at(key_ciphertext_len);

        Ok(Self {
            round_number,
            gas_limit,
            tx_hash,
            key_ciphertext: key.to_vec(),
            message_ciphertext: msg.to_vec(),
        })
    }

    /// 通过加密引擎提供的密钥密文长度解码
    pub fn decode_with_len(
        bytes: &[u8],
        key_ciphertext_len: Option<usize>,
    ) -> Result<Self, EnvelopeError> {
        let len = key_ciphertext_len.ok_or(EnvelopeError::UnknownKeyLength)?;
        Self::decode(bytes, len)
    }
}

/// v1 旧版信封，轮次号为小端
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyEnvelope {
    pub round_number: u32,
    pub key_ciphertext: Vec<u8>,
    pub message_ciphertext: Vec<u8>,
}

impl LegacyEnvelope {
    pub const VERSION: EnvelopeVersion = EnvelopeVersion::V1Legacy;

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            LEGACY_ENVELOPE_HEADER_LEN + self.key_ciphertext.len() + self.message_ciphertext.len(),
        );
        out.extend_from_slice(&ENVELOPE_MARKER);
        out.extend_from_slice(&self.round_number.to_le_bytes());
        out.extend_from_slice(&self.key_ciphertext);
        out.extend_from_slice(&self.message_ciphertext);
        out
    }

    pub fn decode(bytes: &[u8], key_ciphertext_len: usize) -> Result<Self, EnvelopeError> {
        let expected = LEGACY_ENVELOPE_HEADER_LEN + key_ciphertext_len;
        if bytes.len() < expected {
            return Err(EnvelopeError::TooShort {
                expected,
                actual: bytes.len(),
            });
        }
        check_marker(bytes)?;

        let mut round = [0u8; 4];
        round.copy_from_slice(&bytes[4..8]);
        let (key, msg) = bytes[LEGACY_ENVELOPE_HEADER_LEN..].split_at(key_ciphertext_len);

        Ok(Self {
            round_number: u32::from_le_bytes(round),
            key_ciphertext: key.to_vec(),
            message_ciphertext: msg.to_vec(),
        })
    }
}
