pub mod contract_reader;
pub mod ethers_wallet;
pub mod logging;
pub mod protected_rpc;
pub mod rpc_validator;

pub use contract_reader::EthersContractReader;
pub use ethers_wallet::EthersWalletGateway;
pub use logging::{init_default_logging, init_logging};
pub use protected_rpc::ProtectedRpcClient;
