// 治理/密钥管理合约只读调用 - eth_call + 手工 ABI 编码

use std::collections::HashMap;

use async_trait::async_trait;
use ethers::{
    abi::{self, ParamType, Token},
    providers::{Http, Middleware, Provider},
    types::{transaction::eip2718::TypedTransaction, Bytes, TransactionRequest, U256},
    utils::id,
};
use tokio::sync::RwLock;

use crate::{
    domain::{ChainDescriptor, ContractRole},
    error::TransferError,
    service::contract_reader::ContractReader,
};

/// 按 RPC 地址缓存 Provider
#[derive(Default)]
pub struct EthersContractReader {
    providers: RwLock<HashMap<String, Provider<Http>>>,
}

impl EthersContractReader {
    pub fn new() -> Self {
        Self::default()
    }

    async fn provider(&self, chain: &ChainDescriptor) -> Result<Provider<Http>, TransferError> {
        let url = chain.default_rpc_url()?;
        if let Some(provider) = self.providers.read().await.get(url) {
            return Ok(provider.clone());
        }

        let provider = Provider::<Http>::try_from(url).map_err(|e| {
            TransferError::configuration(format!("Invalid RPC URL {}: {}", url, e)).with_source(e)
        })?;
        self.providers
            .write()
            .await
            .insert(url.to_string(), provider.clone());
        Ok(provider)
    }

    async fn call(
        &self,
        chain: &ChainDescriptor,
        role: ContractRole,
        signature: &str,
        args: &[Token],
        output: ParamType,
    ) -> Result<Token, TransferError> {
        let contract = chain.contract(role)?;
        let provider = self.provider(chain).await?;

        let tx: TypedTransaction = TransactionRequest::new()
            .to(contract)
            .data(encode_call(signature, args))
            .into();
        let context = format!("{}.{}", role.as_str(), signature);

        let raw = provider
            .call(&tx, None)
            .await
            .map_err(|e| TransferError::from_middleware(&context, e))?;
        tracing::debug!(contract = ?contract, call = %context, len = raw.len(), "eth_call");

        decode_single(&context, output, &raw)
    }
}

pub(crate) fn encode_call(signature: &str, args: &[Token]) -> Bytes {
    let mut data = id(signature).to_vec();
    data.extend(abi::encode(args));
    Bytes::from(data)
}

pub(crate) fn decode_single(
    context: &str,
    output: ParamType,
    raw: &[u8],
) -> Result<Token, TransferError> {
    abi::decode(&[output], raw)
        .map_err(|e| {
            TransferError::transport(format!("{}: undecodable result: {}", context, e)).with_source(e)
        })?
        .into_iter()
        .next()
        .ok_or_else(|| TransferError::transport(format!("{}: empty result", context)))
}

fn token_to_u64(context: &str, token: Token) -> Result<u64, TransferError> {
    match token {
        Token::Uint(v) if v <= U256::from(u64::MAX) => Ok(v.as_u64()),
        other => Err(TransferError::transport(format!(
            "{}: expected uint64-sized value, got {:?}",
            context, other
        ))),
    }
}

#[async_trait]
impl ContractReader for EthersContractReader {
    async fn consensus_size(&self, chain: &ChainDescriptor) -> Result<u64, TransferError> {
        let token = self
            .call(chain, ContractRole::Governance, "consensusSize()", &[], ParamType::Uint(256))
            .await?;
        token_to_u64("consensusSize", token)
    }

    async fn round_number(&self, chain: &ChainDescriptor) -> Result<u64, TransferError> {
        let token = self
            .call(chain, ContractRole::KeyManagement, "roundNumber()", &[], ParamType::Uint(256))
            .await?;
        token_to_u64("roundNumber", token)
    }

    async fn aggregated_commitment(
        &self,
        chain: &ChainDescriptor,
        round: u64,
    ) -> Result<Bytes, TransferError> {
        let token = self
            .call(
                chain,
                ContractRole::KeyManagement,
                "aggregatedCommitments(uint256)",
                &[Token::Uint(U256::from(round))],
                ParamType::Bytes,
            )
            .await?;
        match token {
            Token::Bytes(bytes) => Ok(Bytes::from(bytes)),
            other => Err(TransferError::transport(format!(
                "aggregatedCommitments: expected bytes, got {:?}",
                other
            ))),
        }
    }
}
