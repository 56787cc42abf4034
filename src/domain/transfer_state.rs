//! 转账流水线状态机
//! 严格的状态转换：直发探测 → （仅在缓存拒绝时）门限加密回退

use serde::{Deserialize, Serialize};

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferState {
    Idle,
    SwitchingChain,
    FetchingNonce,
    AttemptingDirect,
    EnteringFallback,
    AcquiringSignature,
    FetchingCachedTransaction,
    ReadingConsensus,
    ReadingRound,
    ReadingCommitment,
    DerivingKey,
    Encrypting,
    BuildingEnvelope,
    ReswitchingChain,
    SubmittingEnvelope,
    Done,
    Failed,
}

impl TransferState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::SwitchingChain => "switching_chain",
            Self::FetchingNonce => "fetching_nonce",
            Self::AttemptingDirect => "attempting_direct",
            Self::EnteringFallback => "entering_fallback",
            Self::AcquiringSignature => "acquiring_signature",
            Self::FetchingCachedTransaction => "fetching_cached_transaction",
            Self::ReadingConsensus => "reading_consensus",
            Self::ReadingRound => "reading_round",
            Self::ReadingCommitment => "reading_commitment",
            Self::DerivingKey => "deriving_key",
            Self::Encrypting => "encrypting",
            Self::BuildingEnvelope => "building_envelope",
            Self::ReswitchingChain => "reswitching_chain",
            Self::SubmittingEnvelope => "submitting_envelope",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// 是否属于回退（门限加密）阶段
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::EnteringFallback
                | Self::AcquiringSignature
                | Self::FetchingCachedTransaction
                | Self::ReadingConsensus
                | Self::ReadingRound
                | Self::ReadingCommitment
                | Self::DerivingKey
                | Self::Encrypting
                | Self::BuildingEnvelope
                | Self::ReswitchingChain
                | Self::SubmittingEnvelope
        )
    }
}

impl std::fmt::Display for TransferState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 状态转换规则
pub struct TransferStateMachine;

impl TransferStateMachine {
    /// 验证状态转换是否合法
    pub fn can_transition(from: TransferState, to: TransferState) -> bool {
        use TransferState::*;

        // 任何非终态都可以失败
        if to == Failed {
            return !from.is_terminal();
        }

        matches!(
            (from, to),
            // 直发流程
            (Idle, SwitchingChain)
            | (SwitchingChain, FetchingNonce)
            | (SwitchingChain, AttemptingDirect)
            | (FetchingNonce, AttemptingDirect)
            | (AttemptingDirect, Done)
            | (AttemptingDirect, EnteringFallback)

            // 已知交易被缓存时直接恢复回退
            | (Idle, EnteringFallback)

            // 回退流程
            | (EnteringFallback, AcquiringSignature)
            | (AcquiringSignature, FetchingCachedTransaction)
            | (FetchingCachedTransaction, ReadingConsensus)
            | (ReadingConsensus, ReadingRound)
            | (ReadingRound, ReadingCommitment)
            | (ReadingCommitment, DerivingKey)
            | (DerivingKey, Encrypting)
            | (Encrypting, BuildingEnvelope)
            | (BuildingEnvelope, ReswitchingChain)
            | (ReswitchingChain, SubmittingEnvelope)
            | (SubmittingEnvelope, Done)
        )
    }
}
