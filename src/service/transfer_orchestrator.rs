//! 转账编排器
//!
//! 驱动受保护转账状态机：
//! 1. 切换链（受保护模式下使用受保护 RPC 集合）
//! 2. 受保护模式先取 nonce，再用该 nonce 直发
//! 3. 直发成功即返回；仅当原因链带有内部 RPC 拒绝标记时进入回退
//! 4. 回退：签名 nonce → 取缓存交易 → 读共识规模/轮次/聚合承诺 →
//!    推导门限公钥 → 加密 → 打包信封 → 再次切链 → 向奖励合约提交信封
//!
//! 回退内部的错误原样向上传播，不存在嵌套回退。

use std::sync::Arc;

use chrono::Utc;
use ethers::types::{TransactionReceipt, TransactionRequest, H256, U256};
use tracing::Instrument;
use uuid::Uuid;

use super::{
    cached_transaction::CachedTransaction,
    contract_reader::ContractReader,
    envelope_codec::Envelope,
    protected_rpc::ProtectedRpc,
    threshold_engine::ThresholdEncryptionEngine,
    transaction_builder::TransactionBuilder,
    transfer_observer::{TransferObserver, TransitionEvent},
    wallet_gateway::{AddChainRequest, WalletGateway},
};
use crate::{
    config::AntiMevConfig,
    domain::{
        ChainDescriptor, ChainRegistry, KeyRoundMaterial, PendingProtectedState, TransferRequest,
        TransferState, TransferStateMachine,
    },
    error::{ErrorDisposition, TransferError, TransferErrorCode},
    metrics,
    utils::amount_to_raw,
};

/// 单次转账的状态跟踪
struct TransferRun<'a> {
    id: Uuid,
    state: TransferState,
    observer: Option<&'a dyn TransferObserver>,
}

impl<'a> TransferRun<'a> {
    fn new(observer: Option<&'a dyn TransferObserver>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: TransferState::Idle,
            observer,
        }
    }

    fn advance(&mut self, to: TransferState) -> Result<(), TransferError> {
        if !TransferStateMachine::can_transition(self.state, to) {
            return Err(TransferError::precondition(format!(
                "Illegal transfer transition: {} -> {}",
                self.state, to
            )));
        }

        let from = std::mem::replace(&mut self.state, to);
        tracing::trace!(from = from.as_str(), to = to.as_str(), "transition");

        if let Some(observer) = self.observer {
            observer.on_transition(&TransitionEvent {
                transfer_id: self.id,
                from,
                to,
                at: Utc::now(),
            });
        }
        Ok(())
    }

    /// 标注失败阶段并进入 Failed
    fn fail(&mut self, err: TransferError) -> TransferError {
        let err = err.at_stage(self.state);
        if !self.state.is_terminal() {
            let _ = self.advance(TransferState::Failed);
        }
        metrics::count_failure(err.code);

        let failed_at = err.failed_at.map(|s| s.as_str()).unwrap_or("unknown");
        match err.disposition() {
            ErrorDisposition::Stop if err.code == TransferErrorCode::UserRejected => {
                tracing::warn!(code = %err.code, failed_at, "transfer rejected by user");
            }
            disposition => {
                tracing::error!(
                    code = %err.code,
                    failed_at,
                    disposition = ?disposition,
                    error = %err,
                    "transfer failed"
                );
            }
        }
        err
    }
}

pub struct TransferOrchestrator {
    registry: Arc<ChainRegistry>,
    wallet: Arc<dyn WalletGateway>,
    contracts: Arc<dyn ContractReader>,
    protected_rpc: Arc<dyn ProtectedRpc>,
    engine: Arc<dyn ThresholdEncryptionEngine>,
    observer: Option<Arc<dyn TransferObserver>>,
    config: AntiMevConfig,
}

impl TransferOrchestrator {
    pub fn new(
        registry: Arc<ChainRegistry>,
        wallet: Arc<dyn WalletGateway>,
        contracts: Arc<dyn ContractReader>,
        protected_rpc: Arc<dyn ProtectedRpc>,
        engine: Arc<dyn ThresholdEncryptionEngine>,
        config: AntiMevConfig,
    ) -> Self {
        Self {
            registry,
            wallet,
            contracts,
            protected_rpc,
            engine,
            observer: None,
            config,
        }
    }

    /// 挂载状态迁移观察者；不挂载时行为完全相同
    pub fn with_observer(mut self, observer: Arc<dyn TransferObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// 提交转账，返回最终上链交易（直发或信封）的哈希
    pub async fn submit(&self, request: &TransferRequest) -> Result<H256, TransferError> {
        let mut run = TransferRun::new(self.observer.as_deref());
        let span = tracing::info_span!(
            "transfer",
            transfer_id = %run.id,
            chain_id = request.chain_id,
            protected = request.protected
        );

        async {
            metrics::count_transfer_started(request.protected);
            match self.drive(&mut run, request).await {
                Ok(hash) => Ok(hash),
                Err(err) => Err(run.fail(err)),
            }
        }
        .instrument(span)
        .await
    }

    /// 提交并等待回执
    pub async fn submit_and_confirm(
        &self,
        request: &TransferRequest,
    ) -> Result<TransactionReceipt, TransferError> {
        let hash = self.submit(request).await?;
        match self.wallet.wait_for_receipt(hash).await? {
            Some(receipt) => {
                tracing::info!(tx_hash = ?hash, block = ?receipt.block_number, "transfer confirmed");
                Ok(receipt)
            }
            None => Err(TransferError::transport(format!(
                "Transaction {:?} was dropped before confirmation",
                hash
            ))),
        }
    }

    /// 调用方已确认直发交易被缓存时，直接从回退流程开始
    ///
    /// `nonce` 必须是直发时使用的 nonce；缺失时不发起任何网络调用。
    pub async fn resume_protected(
        &self,
        request: &TransferRequest,
        nonce: Option<u64>,
    ) -> Result<H256, TransferError> {
        let mut run = TransferRun::new(self.observer.as_deref());
        let span = tracing::info_span!(
            "transfer",
            transfer_id = %run.id,
            chain_id = request.chain_id,
            protected = true,
            resumed = true
        );

        async {
            metrics::count_transfer_started(true);
            match self.resume(&mut run, request, nonce).await {
                Ok(hash) => Ok(hash),
                Err(err) => Err(run.fail(err)),
            }
        }
        .instrument(span)
        .await
    }

    /// 信封解码所用的密钥密文长度：配置优先，其次加密引擎
    pub fn envelope_key_len(&self) -> Option<usize> {
        self.config
            .key_ciphertext_len
            .or_else(|| self.engine.key_ciphertext_len())
    }

    /// 解码本方案产出的信封
    pub fn decode_envelope(&self, bytes: &[u8]) -> Result<Envelope, TransferError> {
        Ok(Envelope::decode_with_len(bytes, self.envelope_key_len())?)
    }

    async fn drive(
        &self,
        run: &mut TransferRun<'_>,
        request: &TransferRequest,
    ) -> Result<H256, TransferError> {
        let chain = self.registry.require(request.chain_id)?;
        if request.protected {
            chain.protected_rpc_url()?;
        }
        let value = amount_to_raw(&request.amount, request.decimals)?;

        run.advance(TransferState::SwitchingChain)?;
        self.wallet
            .switch_chain(&AddChainRequest::from_descriptor(chain, request.protected))
            .await?;

        // 受保护模式必须在直发前拿到 nonce，回退时复用同一 nonce 槽位
        let nonce = if request.protected {
            run.advance(TransferState::FetchingNonce)?;
            let nonce = self
                .wallet
                .transaction_count(chain.id, request.account)
                .await?;
            tracing::debug!(nonce, "fetched nonce");
            Some(nonce)
        } else {
            None
        };

        run.advance(TransferState::AttemptingDirect)?;
        match self.send_direct(request, value, nonce).await {
            Ok(hash) => {
                run.advance(TransferState::Done)?;
                metrics::count_direct_success();
                tracing::info!(tx_hash = ?hash, "direct transfer submitted");
                Ok(hash)
            }
            Err(err) if request.protected && err.is_fallback_trigger() => {
                tracing::warn!(error = %err, "direct send cached by protected node, entering fallback");
                run.advance(TransferState::EnteringFallback)?;
                self.fallback(run, request, chain, nonce).await
            }
            Err(err) => Err(err),
        }
    }

    async fn resume(
        &self,
        run: &mut TransferRun<'_>,
        request: &TransferRequest,
        nonce: Option<u64>,
    ) -> Result<H256, TransferError> {
        let chain = self.registry.require(request.chain_id)?;
        chain.protected_rpc_url()?;
        run.advance(TransferState::EnteringFallback)?;
        self.fallback(run, request, chain, nonce).await
    }

    async fn send_direct(
        &self,
        request: &TransferRequest,
        value: U256,
        nonce: Option<u64>,
    ) -> Result<H256, TransferError> {
        let tx: TransactionRequest = TransactionBuilder::transfer(request, value, nonce);

        // ERC-20 显式估算 gas，避免钱包侧估算失败
        let tx = if request.is_native() {
            tx
        } else {
            let gas = self.wallet.estimate_gas(&tx).await?;
            tracing::debug!(gas = %gas, "estimated token transfer gas");
            tx.gas(gas)
        };

        self.wallet.send_transaction(tx).await
    }

    async fn fallback(
        &self,
        run: &mut TransferRun<'_>,
        request: &TransferRequest,
        chain: &ChainDescriptor,
        nonce: Option<u64>,
    ) -> Result<H256, TransferError> {
        let nonce = nonce.ok_or_else(|| {
            TransferError::precondition("Entered protected fallback without a fetched nonce")
        })?;
        let target = chain.contract(self.config.submission_target.role())?;
        metrics::count_fallback_entered();

        run.advance(TransferState::AcquiringSignature)?;
        let signature = self
            .wallet
            .sign_message(&PendingProtectedState::signing_message(nonce))
            .await?;
        let pending = PendingProtectedState::new(nonce, signature);

        run.advance(TransferState::FetchingCachedTransaction)?;
        let raw = self
            .protected_rpc
            .fetch_cached_transaction(chain, pending.nonce, &pending.signature)
            .await?;
        let cached = CachedTransaction::parse(raw)?;
        if let Some(cached_nonce) = cached.nonce {
            if cached_nonce != U256::from(nonce) {
                tracing::warn!(
                    expected = nonce,
                    actual = %cached_nonce,
                    "cached transaction nonce differs from the direct attempt"
                );
            }
        }
        tracing::debug!(
            cached_hash = ?cached.hash,
            gas_limit = %cached.gas_limit,
            "fetched cached transaction"
        );

        run.advance(TransferState::ReadingConsensus)?;
        let consensus_size = self.contracts.consensus_size(chain).await?;
        let params = self.engine.consensus_parameters(consensus_size)?;

        run.advance(TransferState::ReadingRound)?;
        let round_number = self.contracts.round_number(chain).await?;

        run.advance(TransferState::ReadingCommitment)?;
        let material = KeyRoundMaterial {
            round_number,
            aggregated_commitment: self
                .contracts
                .aggregated_commitment(chain, round_number)
                .await?,
        };
        tracing::debug!(
            consensus_size,
            threshold = params.threshold,
            round_number,
            commitment_len = material.aggregated_commitment.len(),
            "read key round material"
        );

        run.advance(TransferState::DerivingKey)?;
        let key = self
            .engine
            .derive_key(&material.aggregated_commitment, &params.scaler)?;

        run.advance(TransferState::Encrypting)?;
        let payload = self.engine.encrypt(&key, &cached.raw)?;

        run.advance(TransferState::BuildingEnvelope)?;
        let envelope =
            Envelope::new(material.round_number, cached.gas_limit, cached.hash, payload)?.encode();
        let envelope_len = envelope.len();

        run.advance(TransferState::ReswitchingChain)?;
        self.wallet
            .switch_chain(&AddChainRequest::from_descriptor(chain, true))
            .await?;

        run.advance(TransferState::SubmittingEnvelope)?;
        let tx = TransactionBuilder::envelope_submission(
            request.account,
            target,
            chain.id,
            envelope,
            Some(nonce),
        );
        let hash = self.wallet.send_transaction(tx).await?;

        run.advance(TransferState::Done)?;
        metrics::count_envelope_submitted(envelope_len);
        tracing::info!(
            tx_hash = ?hash,
            target = ?target,
            envelope_len,
            round_number = material.round_number,
            "protected envelope submitted"
        );
        Ok(hash)
    }
}
