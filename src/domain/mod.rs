//! Domain 模块
//!
//! 链目录、转账请求与回退流程的领域模型、流水线状态机

pub mod chain_config;
pub mod transfer;
pub mod transfer_state;

// 重新导出常用类型
pub use chain_config::{ChainDescriptor, ChainRegistry, ContractRole, ContractTable, NativeCurrency};
pub use transfer::{
    ConsensusParameters, EncryptedPayload, KeyRoundMaterial, PendingProtectedState, Scaler,
    ThresholdPublicKey, TransferRequest,
};
pub use transfer_state::{TransferState, TransferStateMachine};
