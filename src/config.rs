//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ContractRole;

/// 默认的缓存交易查询方法
pub const DEFAULT_CACHED_TX_METHOD: &str = "eth_getCachedTransaction";

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub antimev: AntiMevConfig,
    /// 额外的链配置文件（`[[chains]]`），覆盖内置目录中同 ID 的链
    #[serde(default)]
    pub chains_file: Option<String>,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 本地钱包配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// 存放私钥的环境变量名，私钥本身不写入配置文件
    pub private_key_env: String,
    /// 等待回执时的轮询间隔
    pub poll_interval_ms: u64,
}

/// 信封提交目标合约
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubmissionTarget {
    GovernanceReward,
    AntiMev,
}

impl SubmissionTarget {
    pub fn role(&self) -> ContractRole {
        match self {
            SubmissionTarget::GovernanceReward => ContractRole::GovernanceReward,
            SubmissionTarget::AntiMev => ContractRole::AntiMev,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "governancereward" | "governance_reward" => Some(SubmissionTarget::GovernanceReward),
            "antimev" | "anti_mev" => Some(SubmissionTarget::AntiMev),
            _ => None,
        }
    }
}

/// AntiMEV 保护路径配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiMevConfig {
    /// 受保护 RPC 方法名，不同部署分别为 eth_getCachedTransaction / eth_getEncryptedTransaction
    pub cached_tx_method: String,
    pub submission_target: SubmissionTarget,
    /// 密钥密文长度，仅信封解码需要；未配置时由加密引擎提供
    #[serde(default)]
    pub key_ciphertext_len: Option<usize>,
    pub rpc_timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: std::env::var("WALLET_PRIVATE_KEY_ENV")
                .unwrap_or_else(|_| "WALLET_PRIVATE_KEY".into()),
            poll_interval_ms: std::env::var("WALLET_POLL_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2000),
        }
    }
}

impl Default for AntiMevConfig {
    fn default() -> Self {
        Self {
            cached_tx_method: std::env::var("ANTIMEV_CACHED_TX_METHOD")
                .unwrap_or_else(|_| DEFAULT_CACHED_TX_METHOD.into()),
            submission_target: std::env::var("ANTIMEV_SUBMISSION_TARGET")
                .ok()
                .and_then(|s| SubmissionTarget::parse(&s))
                .unwrap_or(SubmissionTarget::GovernanceReward),
            key_ciphertext_len: std::env::var("ANTIMEV_KEY_CIPHERTEXT_LEN")
                .ok()
                .and_then(|s| s.parse().ok()),
            rpc_timeout_secs: std::env::var("ANTIMEV_RPC_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Config {
    /// 从环境变量加载配置（先读取 .env）
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            logging: LoggingConfig::default(),
            wallet: WalletConfig::default(),
            antimev: AntiMevConfig::default(),
            chains_file: std::env::var("CHAINS_FILE").ok(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.wallet.private_key_env.trim().is_empty() {
            anyhow::bail!("wallet.private_key_env must not be empty");
        }

        if self.wallet.poll_interval_ms == 0 {
            anyhow::bail!("wallet.poll_interval_ms must be greater than 0");
        }

        let method = &self.antimev.cached_tx_method;
        if method.is_empty() || !method.starts_with("eth_") {
            anyhow::bail!("antimev.cached_tx_method must be an eth_* method, got '{}'", method);
        }

        if self.antimev.rpc_timeout_secs == 0 {
            anyhow::bail!("antimev.rpc_timeout_secs must be greater than 0");
        }

        if self.antimev.key_ciphertext_len == Some(0) {
            anyhow::bail!("antimev.key_ciphertext_len must be greater than 0 when set");
        }

        Ok(())
    }
}
