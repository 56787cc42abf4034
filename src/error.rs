//! 转账流水线错误体系
//!
//! 协作方（钱包、合约读取、受保护RPC、门限加密）在边界处把传输层错误翻译为
//! 固定的 `TransferErrorCode`，状态机只看错误码和原因链，从不解析原始错误。

use std::{error::Error as StdError, fmt};

use ethers::providers::MiddlewareError;

use crate::domain::TransferState;

pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// JSON-RPC 内部错误码（EIP-1474 InternalError）
pub const INTERNAL_RPC_ERROR_CODE: i64 = -32603;

/// EIP-1193 用户拒绝请求
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferErrorCode {
    /// 钱包层取消（用户拒绝签名/发送）
    UserRejected,
    /// 未分类的钱包/RPC 失败
    Transport,
    /// 程序前置条件被破坏（例如进入回退流程时没有 nonce）
    PreconditionViolation,
    /// 受保护节点缓存了交易而没有广播，唯一触发回退的错误
    RecoverableRpcRejection,
    ChainNotSupported,
    ProtectedPathUnavailable,
    InvalidAmount,
    InvalidCachedTransaction,
    MalformedCommitment,
    EncryptionFailed,
    EnvelopeEncoding,
    Configuration,
}

impl TransferErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRejected => "user_rejected",
            Self::Transport => "transport",
            Self::PreconditionViolation => "precondition_violation",
            Self::RecoverableRpcRejection => "recoverable_rpc_rejection",
            Self::ChainNotSupported => "chain_not_supported",
            Self::ProtectedPathUnavailable => "protected_path_unavailable",
            Self::InvalidAmount => "invalid_amount",
            Self::InvalidCachedTransaction => "invalid_cached_transaction",
            Self::MalformedCommitment => "malformed_commitment",
            Self::EncryptionFailed => "encryption_failed",
            Self::EnvelopeEncoding => "envelope_encoding",
            Self::Configuration => "configuration",
        }
    }

    /// 调用方应如何处理该错误
    pub fn disposition(&self) -> ErrorDisposition {
        match self {
            Self::Transport | Self::RecoverableRpcRejection => ErrorDisposition::Retry,
            Self::ProtectedPathUnavailable
            | Self::InvalidCachedTransaction
            | Self::MalformedCommitment
            | Self::EncryptionFailed
            | Self::EnvelopeEncoding => ErrorDisposition::UseDirectPath,
            Self::UserRejected
            | Self::PreconditionViolation
            | Self::ChainNotSupported
            | Self::InvalidAmount
            | Self::Configuration => ErrorDisposition::Stop,
        }
    }
}

impl fmt::Display for TransferErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 面向调用方的处理建议
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// 网络/传输问题，可以整体重试
    Retry,
    /// 用户拒绝或致命前置条件，停止
    Stop,
    /// 受保护路径不可用或失败，改用普通发送
    UseDirectPath,
}

/// 原因链中的“内部RPC拒绝”标记。
///
/// 受保护RPC节点收到交易后只缓存不广播，并以 JSON-RPC `-32603` 拒绝发送请求；
/// 适配器把这种拒绝包装成该标记挂在原因链上。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal RPC rejection (code {code}): {message}")]
pub struct InternalRpcRejection {
    pub code: i64,
    pub message: String,
}

#[derive(Debug)]
pub struct TransferError {
    pub code: TransferErrorCode,
    pub message: String,
    /// 失败发生时流水线所处的状态（只做标注，不改变错误种类）
    pub failed_at: Option<TransferState>,
    source: Option<BoxError>,
}

impl TransferError {
    fn new(code: TransferErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            failed_at: None,
            source: None,
        }
    }

    /// 挂上原始错误作为原因
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 标注失败阶段，已标注过的保持不变
    pub fn at_stage(mut self, state: TransferState) -> Self {
        if self.failed_at.is_none() {
            self.failed_at = Some(state);
        }
        self
    }

    pub fn user_rejected(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::UserRejected, msg)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::Transport, msg)
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::PreconditionViolation, msg)
    }

    pub fn recoverable_rpc_rejection(msg: impl Into<String>, marker: InternalRpcRejection) -> Self {
        Self::new(TransferErrorCode::RecoverableRpcRejection, msg).with_source(marker)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::ChainNotSupported, msg)
    }

    pub fn protected_path_unavailable(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::ProtectedPathUnavailable, msg)
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::InvalidAmount, msg)
    }

    pub fn invalid_cached_transaction(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::InvalidCachedTransaction, msg)
    }

    pub fn malformed_commitment(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::MalformedCommitment, msg)
    }

    pub fn encryption_failed(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::EncryptionFailed, msg)
    }

    pub fn envelope_encoding(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::EnvelopeEncoding, msg)
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(TransferErrorCode::Configuration, msg)
    }

    pub fn disposition(&self) -> ErrorDisposition {
        self.code.disposition()
    }

    /// 原因链中是否带有内部RPC拒绝标记
    pub fn is_fallback_trigger(&self) -> bool {
        chain_contains_rejection(self)
    }

    /// 按 JSON-RPC 错误码/消息分类
    pub fn from_json_rpc(context: &str, code: i64, message: &str) -> Self {
        let lowered = message.to_lowercase();
        if code == USER_REJECTED_CODE
            || lowered.contains("user rejected")
            || lowered.contains("user denied")
        {
            return Self::user_rejected(format!("{}: {}", context, message));
        }
        if code == INTERNAL_RPC_ERROR_CODE {
            return Self::recoverable_rpc_rejection(
                format!("{}: {}", context, message),
                InternalRpcRejection {
                    code,
                    message: message.to_string(),
                },
            );
        }
        Self::transport(format!("{} (RPC error {}): {}", context, code, message))
    }

    /// 翻译 ethers 中间件错误；带 JSON-RPC 错误体的按错误码分类，其余一律视为传输错误
    pub fn from_middleware<E>(context: &str, err: E) -> Self
    where
        E: MiddlewareError + 'static,
    {
        let classified = err
            .as_error_response()
            .map(|rpc| Self::from_json_rpc(context, rpc.code, &rpc.message));
        match classified {
            Some(c) if c.code == TransferErrorCode::RecoverableRpcRejection => c,
            Some(c) => c.with_source(err),
            None => Self::transport(format!("{}: {}", context, err)).with_source(err),
        }
    }
}

impl fmt::Display for TransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl StdError for TransferError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

/// 沿原因链查找 `InternalRpcRejection` 标记
pub fn chain_contains_rejection(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<InternalRpcRejection>() {
            return true;
        }
        current = e.source();
    }
    false
}
