//! AntiMEV - 受 MEV 保护的转账提交
//!
//! 先直发探测；受保护节点缓存交易时，取回缓存交易并以门限公钥加密，
//! 打包为信封提交到治理奖励合约。

pub mod config;
pub mod domain;
pub mod error;
pub mod error_map;
pub mod infrastructure;
pub mod metrics;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use error::{TransferError, TransferErrorCode};
pub use service::TransferOrchestrator;

pub mod prelude {
    pub use crate::{
        config::{AntiMevConfig, Config, SubmissionTarget},
        domain::{ChainDescriptor, ChainRegistry, TransferRequest, TransferState},
        error::{ErrorDisposition, TransferError, TransferErrorCode},
        service::{
            ContractReader, Envelope, ProtectedRpc, ThresholdEncryptionEngine,
            TransferObserver, TransferOrchestrator, WalletGateway,
        },
    };
}
