// 本地私钥钱包网关 - 基于 ethers SignerMiddleware
//
// 当前链由 switch_chain 决定；切链即按请求中的第一个 RPC 地址重建客户端。

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, PendingTransaction, Provider},
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, BlockNumber, Bytes, TransactionReceipt,
        TransactionRequest, H256, U256,
    },
};
use tokio::sync::RwLock;

use crate::{
    config::WalletConfig,
    error::TransferError,
    service::wallet_gateway::{AddChainRequest, WalletGateway},
};

type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

struct ActiveChain {
    chain_id: u64,
    rpc_url: String,
    client: Arc<SignerClient>,
}

pub struct EthersWalletGateway {
    wallet: LocalWallet,
    poll_interval: Duration,
    active: RwLock<Option<ActiveChain>>,
}

impl EthersWalletGateway {
    pub fn new(wallet: LocalWallet, config: &WalletConfig) -> Self {
        Self {
            wallet,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            active: RwLock::new(None),
        }
    }

    /// 从 `private_key_env` 指定的环境变量读取私钥
    pub fn from_env(config: &WalletConfig) -> Result<Self, TransferError> {
        let key = std::env::var(&config.private_key_env).map_err(|_| {
            TransferError::configuration(format!(
                "Environment variable {} is not set",
                config.private_key_env
            ))
        })?;
        let wallet: LocalWallet = key.trim().trim_start_matches("0x").parse().map_err(|e| {
            TransferError::configuration(format!(
                "Invalid private key in {}: {}",
                config.private_key_env, e
            ))
            .with_source(e)
        })?;
        Ok(Self::new(wallet, config))
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// 只能为本地私钥对应的账户取 nonce、发交易
    fn ensure_signer(&self, account: Address) -> Result<(), TransferError> {
        if account != self.wallet.address() {
            return Err(TransferError::precondition(format!(
                "Account {:?} does not match the local signer {:?}",
                account,
                self.wallet.address()
            )));
        }
        Ok(())
    }

    async fn client(&self) -> Result<(u64, Arc<SignerClient>), TransferError> {
        match self.active.read().await.as_ref() {
            Some(active) => Ok((active.chain_id, active.client.clone())),
            None => Err(TransferError::precondition(
                "No active chain: switch_chain must be called first",
            )),
        }
    }
}

#[async_trait]
impl WalletGateway for EthersWalletGateway {
    async fn switch_chain(&self, request: &AddChainRequest) -> Result<(), TransferError> {
        let chain_id = request.numeric_chain_id()?;
        let rpc_url = request.rpc_urls.first().ok_or_else(|| {
            TransferError::configuration(format!("No RPC URL for chain {}", request.chain_name))
        })?;

        if let Some(active) = self.active.read().await.as_ref() {
            if active.chain_id == chain_id && &active.rpc_url == rpc_url {
                tracing::debug!(chain_id, rpc_url = %rpc_url, "Chain already active");
                return Ok(());
            }
        }

        let provider = Provider::<Http>::try_from(rpc_url.as_str())
            .map_err(|e| {
                TransferError::configuration(format!("Invalid RPC URL {}: {}", rpc_url, e))
                    .with_source(e)
            })?
            .interval(self.poll_interval);

        let remote_chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| TransferError::from_middleware("eth_chainId", e))?;
        if remote_chain_id != U256::from(chain_id) {
            return Err(TransferError::configuration(format!(
                "RPC {} serves chain {}, expected {}",
                rpc_url, remote_chain_id, chain_id
            )));
        }

        let signer = self.wallet.clone().with_chain_id(chain_id);
        let client = Arc::new(SignerMiddleware::new(provider, signer));
        *self.active.write().await = Some(ActiveChain {
            chain_id,
            rpc_url: rpc_url.clone(),
            client,
        });

        tracing::info!(chain_id, chain = %request.chain_name, rpc_url = %rpc_url, "Switched chain");
        Ok(())
    }

    async fn transaction_count(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<u64, TransferError> {
        self.ensure_signer(account)?;
        let (active_chain, client) = self.client().await?;
        if active_chain != chain_id {
            return Err(TransferError::precondition(format!(
                "Active chain is {}, nonce requested for {}",
                active_chain, chain_id
            )));
        }

        let nonce = client
            .get_transaction_count(account, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| TransferError::from_middleware("eth_getTransactionCount", e))?;
        Ok(nonce.as_u64())
    }

    async fn sign_message(&self, message: &str) -> Result<Bytes, TransferError> {
        let signature = self.wallet.sign_message(message).await.map_err(|e| {
            TransferError::transport(format!("personal_sign failed: {}", e)).with_source(e)
        })?;
        Ok(Bytes::from(signature.to_vec()))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, TransferError> {
        let (_, client) = self.client().await?;
        let typed: TypedTransaction = tx.clone().into();
        client
            .estimate_gas(&typed, None)
            .await
            .map_err(|e| TransferError::from_middleware("eth_estimateGas", e))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<H256, TransferError> {
        // from 不匹配时 SignerMiddleware 会退化为未签名的 eth_sendTransaction
        if let Some(from) = tx.from {
            self.ensure_signer(from)?;
        }
        let (chain_id, client) = self.client().await?;
        let pending = client
            .send_transaction(tx, None)
            .await
            .map_err(|e| TransferError::from_middleware("eth_sendRawTransaction", e))?;

        let hash = pending.tx_hash();
        tracing::info!(chain_id, tx_hash = ?hash, "Transaction sent");
        Ok(hash)
    }

    async fn wait_for_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, TransferError> {
        let (_, client) = self.client().await?;
        PendingTransaction::new(hash, client.provider())
            .interval(self.poll_interval)
            .await
            .map_err(|e| TransferError::from_middleware("eth_getTransactionReceipt", e))
    }
}
