//! 只读合约调用接口：治理合约与密钥管理合约

use async_trait::async_trait;
use ethers::types::Bytes;

use crate::{domain::ChainDescriptor, error::TransferError};

#[async_trait]
pub trait ContractReader: Send + Sync {
    /// governance.consensusSize()
    async fn consensus_size(&self, chain: &ChainDescriptor) -> Result<u64, TransferError>;

    /// keyManagement.roundNumber()
    async fn round_number(&self, chain: &ChainDescriptor) -> Result<u64, TransferError>;

    /// keyManagement.aggregatedCommitments(round)
    async fn aggregated_commitment(
        &self,
        chain: &ChainDescriptor,
        round: u64,
    ) -> Result<Bytes, TransferError>;
}
