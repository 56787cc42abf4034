pub mod cached_transaction;
pub mod contract_reader;
pub mod envelope_codec; // AntiMEV 信封 v2/v1
pub mod protected_rpc;
pub mod threshold_engine;
pub mod transaction_builder;
pub mod transfer_observer;
pub mod transfer_orchestrator; // 直发探测 + 加密回退状态机
pub mod wallet_gateway;

pub use cached_transaction::CachedTransaction;
pub use contract_reader::ContractReader;
pub use envelope_codec::{Envelope, EnvelopeError, EnvelopeVersion, LegacyEnvelope};
pub use protected_rpc::ProtectedRpc;
pub use threshold_engine::ThresholdEncryptionEngine;
pub use transaction_builder::TransactionBuilder;
pub use transfer_observer::{RecordingObserver, TracingObserver, TransferObserver, TransitionEvent};
pub use transfer_orchestrator::TransferOrchestrator;
pub use wallet_gateway::{AddChainRequest, WalletGateway};
