//! 测试辅助模块
//! 提供记录调用的协作方替身和夹具

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use antimev::{
    config::{AntiMevConfig, SubmissionTarget},
    domain::{
        ChainDescriptor, ChainRegistry, ConsensusParameters, EncryptedPayload, Scaler,
        ThresholdPublicKey, TransferRequest,
    },
    error::TransferError,
    service::{
        AddChainRequest, ContractReader, ProtectedRpc, RecordingObserver,
        ThresholdEncryptionEngine, TransferOrchestrator, WalletGateway,
    },
};
use async_trait::async_trait;
use ethers::{
    signers::{LocalWallet, Signer},
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt,
        TransactionRequest, H256, U256, U64,
    },
};

pub const NEOX_CHAIN_ID: u64 = 12227332;
pub const TEST_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const FAKE_KEY_CIPHERTEXT_LEN: usize = 96;
pub const FAKE_TAG_LEN: usize = 16;
pub const COMMITMENT_LEN: usize = 48;

/// 跨协作方的调用日志，用于断言调用顺序
pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

pub fn account() -> Address {
    let wallet: LocalWallet = TEST_KEY.parse().unwrap();
    wallet.address()
}

pub fn recipient() -> Address {
    "0x742d35cc6634c0532925a3b844bc9e7595f0beb6".parse().unwrap()
}

pub fn token() -> Address {
    "0x00000000000000000000000000000000000000aa".parse().unwrap()
}

pub fn reward_contract() -> Address {
    "0x1212000000000000000000000000000000000003".parse().unwrap()
}

pub fn native_request(chain_id: u64, amount: &str, protected: bool) -> TransferRequest {
    TransferRequest {
        chain_id,
        token: None,
        account: account(),
        to: recipient(),
        amount: amount.to_string(),
        decimals: 18,
        protected,
    }
}

pub fn erc20_request(chain_id: u64, amount: &str, decimals: u32, protected: bool) -> TransferRequest {
    TransferRequest {
        chain_id,
        token: Some(token()),
        account: account(),
        to: recipient(),
        amount: amount.to_string(),
        decimals,
        protected,
    }
}

/// 受保护节点缓存的已签名交易
pub fn signed_cached_transaction(nonce: u64, gas: u64) -> (Bytes, H256) {
    let wallet: LocalWallet = TEST_KEY.parse().unwrap();
    let wallet = wallet.with_chain_id(NEOX_CHAIN_ID);
    let tx: TypedTransaction = TransactionRequest::new()
        .from(wallet.address())
        .to(token())
        .data(Bytes::from(vec![0xa9, 0x05, 0x9c, 0xbb]))
        .gas(gas)
        .gas_price(40_000_000_000u64)
        .nonce(nonce)
        .chain_id(NEOX_CHAIN_ID)
        .into();
    let signature = wallet.sign_transaction_sync(&tx).unwrap();
    (tx.rlp_signed(&signature), tx.hash(&signature))
}

// ============ 钱包替身 ============

#[derive(Debug, Clone)]
pub enum WalletCall {
    SwitchChain(AddChainRequest),
    TransactionCount { chain_id: u64, account: Address },
    SignMessage(String),
    EstimateGas(TransactionRequest),
    SendTransaction(TransactionRequest),
    WaitForReceipt(H256),
}

/// 预设的发送结果
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Ok(H256),
    /// 受保护节点缓存交易（JSON-RPC -32603）
    CachedRejection,
    /// 标记藏在更深的原因链里
    WrappedCachedRejection,
    UserRejected,
    Transport(String),
}

impl SendOutcome {
    fn into_result(self) -> Result<H256, TransferError> {
        match self {
            SendOutcome::Ok(hash) => Ok(hash),
            SendOutcome::CachedRejection => Err(TransferError::from_json_rpc(
                "eth_sendRawTransaction",
                -32603,
                "transaction cached for anti-MEV processing",
            )),
            SendOutcome::WrappedCachedRejection => {
                let inner = TransferError::from_json_rpc(
                    "eth_sendRawTransaction",
                    -32603,
                    "internal error",
                );
                Err(TransferError::transport("wallet provider error").with_source(inner))
            }
            SendOutcome::UserRejected => Err(TransferError::from_json_rpc(
                "eth_sendTransaction",
                4001,
                "MetaMask Tx Signature: User denied transaction signature.",
            )),
            SendOutcome::Transport(msg) => Err(TransferError::transport(msg)),
        }
    }
}

pub struct MockWallet {
    journal: Journal,
    calls: Mutex<Vec<WalletCall>>,
    send_outcomes: Mutex<VecDeque<SendOutcome>>,
    nonce: u64,
    gas: U256,
    receipt: Mutex<Option<TransactionReceipt>>,
}

impl MockWallet {
    pub fn new(journal: Journal, nonce: u64) -> Self {
        Self {
            journal,
            calls: Mutex::new(Vec::new()),
            send_outcomes: Mutex::new(VecDeque::new()),
            nonce,
            gas: U256::from(65_000u64),
            receipt: Mutex::new(None),
        }
    }

    pub fn push_send(&self, outcome: SendOutcome) {
        self.send_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn set_receipt(&self, receipt: Option<TransactionReceipt>) {
        *self.receipt.lock().unwrap() = receipt;
    }

    pub fn calls(&self) -> Vec<WalletCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn switches(&self) -> Vec<AddChainRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WalletCall::SwitchChain(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn sends(&self) -> Vec<TransactionRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                WalletCall::SendTransaction(tx) => Some(tx),
                _ => None,
            })
            .collect()
    }

    fn push_call(&self, call: WalletCall, entry: &str) {
        record(&self.journal, entry);
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WalletGateway for MockWallet {
    async fn switch_chain(&self, request: &AddChainRequest) -> Result<(), TransferError> {
        self.push_call(WalletCall::SwitchChain(request.clone()), "wallet.switch_chain");
        Ok(())
    }

    async fn transaction_count(
        &self,
        chain_id: u64,
        account: Address,
    ) -> Result<u64, TransferError> {
        self.push_call(
            WalletCall::TransactionCount { chain_id, account },
            "wallet.transaction_count",
        );
        Ok(self.nonce)
    }

    async fn sign_message(&self, message: &str) -> Result<Bytes, TransferError> {
        self.push_call(WalletCall::SignMessage(message.to_string()), "wallet.sign_message");
        let wallet: LocalWallet = TEST_KEY.parse().unwrap();
        let signature = wallet.sign_message(message).await.unwrap();
        Ok(Bytes::from(signature.to_vec()))
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<U256, TransferError> {
        self.push_call(WalletCall::EstimateGas(tx.clone()), "wallet.estimate_gas");
        Ok(self.gas)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<H256, TransferError> {
        self.push_call(WalletCall::SendTransaction(tx), "wallet.send_transaction");
        let outcome = self
            .send_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SendOutcome::Ok(H256::repeat_byte(0x01)));
        outcome.into_result()
    }

    async fn wait_for_receipt(
        &self,
        hash: H256,
    ) -> Result<Option<TransactionReceipt>, TransferError> {
        self.push_call(WalletCall::WaitForReceipt(hash), "wallet.wait_for_receipt");
        Ok(self.receipt.lock().unwrap().clone())
    }
}

pub fn receipt_for(hash: H256) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: hash,
        block_number: Some(U64::from(100u64)),
        status: Some(U64::from(1u64)),
        ..Default::default()
    }
}

// ============ 合约读取替身 ============

pub struct MockContracts {
    journal: Journal,
    pub consensus_size: u64,
    pub round_number: u64,
    pub commitment: Bytes,
    pub fail_consensus: bool,
    rounds_requested: Mutex<Vec<u64>>,
}

impl MockContracts {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            consensus_size: 7,
            round_number: 3,
            commitment: Bytes::from(vec![0x5a; COMMITMENT_LEN]),
            fail_consensus: false,
            rounds_requested: Mutex::new(Vec::new()),
        }
    }

    pub fn rounds_requested(&self) -> Vec<u64> {
        self.rounds_requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractReader for MockContracts {
    async fn consensus_size(&self, _chain: &ChainDescriptor) -> Result<u64, TransferError> {
        record(&self.journal, "contracts.consensus_size");
        if self.fail_consensus {
            return Err(TransferError::transport(
                "governance.consensusSize(): network error",
            ));
        }
        Ok(self.consensus_size)
    }

    async fn round_number(&self, _chain: &ChainDescriptor) -> Result<u64, TransferError> {
        record(&self.journal, "contracts.round_number");
        Ok(self.round_number)
    }

    async fn aggregated_commitment(
        &self,
        _chain: &ChainDescriptor,
        round: u64,
    ) -> Result<Bytes, TransferError> {
        record(&self.journal, "contracts.aggregated_commitment");
        self.rounds_requested.lock().unwrap().push(round);
        Ok(self.commitment.clone())
    }
}

// ============ 受保护 RPC 替身 ============

pub struct MockProtectedRpc {
    journal: Journal,
    raw: Bytes,
    requests: Mutex<Vec<(u64, Bytes)>>,
}

impl MockProtectedRpc {
    pub fn new(journal: Journal, raw: Bytes) -> Self {
        Self {
            journal,
            raw,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(u64, Bytes)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProtectedRpc for MockProtectedRpc {
    async fn fetch_cached_transaction(
        &self,
        chain: &ChainDescriptor,
        nonce: u64,
        signature: &Bytes,
    ) -> Result<Bytes, TransferError> {
        chain.protected_rpc_url()?;
        record(&self.journal, "rpc.fetch_cached_transaction");
        self.requests.lock().unwrap().push((nonce, signature.clone()));
        Ok(self.raw.clone())
    }
}

// ============ 门限加密替身 ============

/// 结构上可检验的假加密：密钥密文定长，消息密文 = 明文 ‖ 标签
pub struct FakeEngine {
    journal: Journal,
}

impl FakeEngine {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl ThresholdEncryptionEngine for FakeEngine {
    fn consensus_parameters(
        &self,
        consensus_size: u64,
    ) -> Result<ConsensusParameters, TransferError> {
        record(&self.journal, "engine.consensus_parameters");
        let threshold = consensus_size / 2 + 1;
        Ok(ConsensusParameters {
            consensus_size,
            threshold,
            scaler: Scaler(threshold.to_be_bytes().to_vec()),
        })
    }

    fn derive_key(
        &self,
        commitment: &[u8],
        scaler: &Scaler,
    ) -> Result<ThresholdPublicKey, TransferError> {
        record(&self.journal, "engine.derive_key");
        if commitment.len() != COMMITMENT_LEN {
            return Err(TransferError::malformed_commitment(format!(
                "commitment must be {} bytes, got {}",
                COMMITMENT_LEN,
                commitment.len()
            )));
        }
        let mut key = commitment.to_vec();
        key.extend_from_slice(&scaler.0);
        Ok(ThresholdPublicKey(key))
    }

    fn encrypt(
        &self,
        key: &ThresholdPublicKey,
        plaintext: &[u8],
    ) -> Result<EncryptedPayload, TransferError> {
        record(&self.journal, "engine.encrypt");
        let mut message_ciphertext = plaintext.to_vec();
        message_ciphertext.extend_from_slice(&[0xee; FAKE_TAG_LEN]);
        Ok(EncryptedPayload {
            key_ciphertext: key.0.iter().cycle().take(FAKE_KEY_CIPHERTEXT_LEN).copied().collect(),
            message_ciphertext,
        })
    }

    fn key_ciphertext_len(&self) -> Option<usize> {
        Some(FAKE_KEY_CIPHERTEXT_LEN)
    }
}

// ============ 夹具 ============

pub struct Harness {
    pub journal: Journal,
    pub wallet: Arc<MockWallet>,
    pub contracts: Arc<MockContracts>,
    pub rpc: Arc<MockProtectedRpc>,
    pub engine: Arc<FakeEngine>,
    pub observer: Arc<RecordingObserver>,
    pub cached_raw: Bytes,
    pub cached_hash: H256,
}

pub const CACHED_NONCE: u64 = 26;
pub const CACHED_GAS: u64 = 65_000;

impl Harness {
    pub fn new() -> Self {
        Self::with_contracts(|_| {})
    }

    pub fn with_contracts(configure: impl FnOnce(&mut MockContracts)) -> Self {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let (cached_raw, cached_hash) = signed_cached_transaction(CACHED_NONCE, CACHED_GAS);
        let mut contracts = MockContracts::new(journal.clone());
        configure(&mut contracts);

        Self {
            wallet: Arc::new(MockWallet::new(journal.clone(), CACHED_NONCE)),
            contracts: Arc::new(contracts),
            rpc: Arc::new(MockProtectedRpc::new(journal.clone(), cached_raw.clone())),
            engine: Arc::new(FakeEngine::new(journal.clone())),
            observer: Arc::new(RecordingObserver::new()),
            journal,
            cached_raw,
            cached_hash,
        }
    }

    pub fn orchestrator(&self) -> TransferOrchestrator {
        self.orchestrator_with(default_antimev_config())
    }

    pub fn orchestrator_with(&self, config: AntiMevConfig) -> TransferOrchestrator {
        TransferOrchestrator::new(
            Arc::new(ChainRegistry::new()),
            self.wallet.clone(),
            self.contracts.clone(),
            self.rpc.clone(),
            self.engine.clone(),
            config,
        )
        .with_observer(self.observer.clone())
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    /// 非钱包协作方（读合约、受保护 RPC、加密引擎）的调用
    pub fn protected_path_calls(&self) -> Vec<String> {
        self.journal()
            .into_iter()
            .filter(|e| !e.starts_with("wallet."))
            .collect()
    }
}

pub fn default_antimev_config() -> AntiMevConfig {
    AntiMevConfig {
        cached_tx_method: "eth_getCachedTransaction".into(),
        submission_target: SubmissionTarget::GovernanceReward,
        key_ciphertext_len: None,
        rpc_timeout_secs: 30,
    }
}
