//! 多链配置模块
//!
//! 定义支持的 EVM 链、RPC 端点集合（含受保护 RPC）以及按逻辑角色索引的合约地址。
//! 注册表在启动时加载一次，之后只读。

use std::{collections::HashMap, path::Path};

use anyhow::Context;
use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::error::TransferError;

#[cfg(test)]
mod tests;

/// 原生代币信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

/// 合约逻辑角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContractRole {
    /// 治理合约 (consensusSize)
    Governance,
    /// 治理奖励合约，信封交易的默认目标
    GovernanceReward,
    /// 密钥管理合约 (roundNumber, aggregatedCommitments)
    KeyManagement,
    /// 个别部署使用的独立 AntiMEV 入口
    AntiMev,
}

impl ContractRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Governance => "governance",
            Self::GovernanceReward => "governanceReward",
            Self::KeyManagement => "keyManagement",
            Self::AntiMev => "antiMev",
        }
    }
}

/// 合约地址表
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance_reward: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_management: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anti_mev: Option<Address>,
}

impl ContractTable {
    pub fn get(&self, role: ContractRole) -> Option<Address> {
        match role {
            ContractRole::Governance => self.governance,
            ContractRole::GovernanceReward => self.governance_reward,
            ContractRole::KeyManagement => self.key_management,
            ContractRole::AntiMev => self.anti_mev,
        }
    }
}

/// 链描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// EIP-155 链 ID
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    /// 默认 RPC 端点
    pub rpc_urls: Vec<String>,
    /// 受保护（AntiMEV）RPC 端点，未配置表示该链不支持保护模式
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected_rpc_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_url: Option<String>,
    #[serde(default)]
    pub contracts: ContractTable,
    #[serde(default)]
    pub testnet: bool,
}

impl ChainDescriptor {
    pub fn supports_protected(&self) -> bool {
        self.protected_rpc_urls
            .as_ref()
            .map(|urls| !urls.is_empty())
            .unwrap_or(false)
    }

    /// 受保护模式使用受保护端点集合，否则使用默认集合
    pub fn rpc_urls_for(&self, protected: bool) -> &[String] {
        match (&self.protected_rpc_urls, protected) {
            (Some(urls), true) if !urls.is_empty() => urls,
            _ => &self.rpc_urls,
        }
    }

    pub fn default_rpc_url(&self) -> Result<&str, TransferError> {
        self.rpc_urls.first().map(String::as_str).ok_or_else(|| {
            TransferError::configuration(format!("Chain {} has no RPC endpoint", self.id))
        })
    }

    pub fn protected_rpc_url(&self) -> Result<&str, TransferError> {
        self.protected_rpc_urls
            .as_ref()
            .and_then(|urls| urls.first())
            .map(String::as_str)
            .ok_or_else(|| {
                TransferError::protected_path_unavailable(format!(
                    "Chain {} ({}) has no protected RPC endpoint",
                    self.name, self.id
                ))
            })
    }

    /// 按角色取合约地址，缺失视为配置错误
    pub fn contract(&self, role: ContractRole) -> Result<Address, TransferError> {
        self.contracts.get(role).ok_or_else(|| {
            TransferError::configuration(format!(
                "Chain {} ({}) has no {} contract address",
                self.name,
                self.id,
                role.as_str()
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChainsFile {
    #[serde(default)]
    chains: Vec<ChainDescriptor>,
}

/// 链配置注册表（只读）
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    configs: HashMap<u64, ChainDescriptor>,
}

fn address(hex_str: &str) -> Option<Address> {
    hex_str.parse().ok()
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        Self::from_descriptors(Self::default_chains())
    }

    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ChainDescriptor>) -> Self {
        let configs = descriptors.into_iter().map(|c| (c.id, c)).collect();
        Self { configs }
    }

    /// 从 TOML 文件加载（`[[chains]]` 数组）
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read chains file: {:?}", path.as_ref()))?;
        let file: ChainsFile =
            toml::from_str(&content).with_context(|| "Failed to parse chains file as TOML")?;
        Ok(Self::from_descriptors(file.chains))
    }

    /// 内置链 + 可选文件覆盖（同 ID 以文件为准）
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> anyhow::Result<Self> {
        let mut descriptors: HashMap<u64, ChainDescriptor> = Self::default_chains()
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        if let Some(path) = path {
            let overrides = Self::from_toml_file(path)?;
            for (id, config) in overrides.configs {
                descriptors.insert(id, config);
            }
        }

        let registry = Self {
            configs: descriptors,
        };
        if let Err(errors) = registry.validate_configs() {
            anyhow::bail!("Invalid chain configuration: {}", errors.join("; "));
        }
        Ok(registry)
    }

    fn default_chains() -> Vec<ChainDescriptor> {
        let eth = NativeCurrency {
            name: "Ether".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        };

        vec![
            // Ethereum Mainnet
            ChainDescriptor {
                id: 1,
                name: "Ethereum".to_string(),
                native_currency: eth.clone(),
                rpc_urls: vec!["https://ethereum-rpc.publicnode.com".to_string()],
                protected_rpc_urls: None,
                explorer_url: Some("https://etherscan.io".to_string()),
                contracts: ContractTable::default(),
                testnet: false,
            },
            // Arbitrum One
            ChainDescriptor {
                id: 42161,
                name: "Arbitrum One".to_string(),
                native_currency: eth.clone(),
                rpc_urls: vec!["https://arb1.arbitrum.io/rpc".to_string()],
                protected_rpc_urls: None,
                explorer_url: Some("https://arbiscan.io".to_string()),
                contracts: ContractTable::default(),
                testnet: false,
            },
            // Ethereum Sepolia Testnet
            ChainDescriptor {
                id: 11155111,
                name: "Sepolia".to_string(),
                native_currency: NativeCurrency {
                    name: "Sepolia Ether".to_string(),
                    symbol: "ETH".to_string(),
                    decimals: 18,
                },
                rpc_urls: vec!["https://ethereum-sepolia-rpc.publicnode.com".to_string()],
                protected_rpc_urls: None,
                explorer_url: Some("https://sepolia.etherscan.io".to_string()),
                contracts: ContractTable::default(),
                testnet: true,
            },
            // Arbitrum Sepolia
            ChainDescriptor {
                id: 421614,
                name: "Arbitrum Sepolia".to_string(),
                native_currency: eth,
                rpc_urls: vec!["https://sepolia-rollup.arbitrum.io/rpc".to_string()],
                protected_rpc_urls: None,
                explorer_url: Some("https://sepolia.arbiscan.io".to_string()),
                contracts: ContractTable::default(),
                testnet: true,
            },
            // Neo X T4（唯一带 AntiMEV 端点的内置链）
            ChainDescriptor {
                id: 12227332,
                name: "Neo X T4".to_string(),
                native_currency: NativeCurrency {
                    name: "GAS".to_string(),
                    symbol: "GAS".to_string(),
                    decimals: 18,
                },
                rpc_urls: vec!["https://neoxt4seed1.ngd.network".to_string()],
                protected_rpc_urls: Some(vec!["https://neoxt4seed1.ngd.network:8555".to_string()]),
                explorer_url: Some("https://neoxt4scan.ngd.network".to_string()),
                contracts: ContractTable {
                    governance: address("0x1212000000000000000000000000000000000001"),
                    governance_reward: address("0x1212000000000000000000000000000000000003"),
                    key_management: address("0x1212000000000000000000000000000000000008"),
                    anti_mev: None,
                },
                testnet: true,
            },
        ]
    }

    /// 通过 chain_id 获取配置
    pub fn get(&self, chain_id: u64) -> Option<&ChainDescriptor> {
        self.configs.get(&chain_id)
    }

    pub fn require(&self, chain_id: u64) -> Result<&ChainDescriptor, TransferError> {
        self.get(chain_id).ok_or_else(|| {
            TransferError::chain_not_supported(format!("Chain {} is not supported", chain_id))
        })
    }

    /// 列出所有支持的链（按 ID 排序）
    pub fn list_all(&self) -> Vec<&ChainDescriptor> {
        let mut chains: Vec<_> = self.configs.values().collect();
        chains.sort_by_key(|c| c.id);
        chains
    }

    /// 支持保护模式的链
    pub fn protected_chains(&self) -> Vec<&ChainDescriptor> {
        self.list_all()
            .into_iter()
            .filter(|c| c.supports_protected())
            .collect()
    }

    /// 验证链配置完整性
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for chain in self.list_all() {
            if chain.name.is_empty() {
                errors.push(format!("Chain {} has empty name", chain.id));
            }
            if chain.rpc_urls.is_empty() {
                errors.push(format!("Chain {} has no default RPC endpoint", chain.name));
            }
            // U256 最多 78 位十进制
            if chain.native_currency.decimals > 77 {
                errors.push(format!(
                    "Chain {} has invalid native decimals: {}",
                    chain.name, chain.native_currency.decimals
                ));
            }

            if chain.supports_protected() {
                for role in [ContractRole::Governance, ContractRole::KeyManagement] {
                    if chain.contracts.get(role).is_none() {
                        errors.push(format!(
                            "Chain {} supports protected mode but has no {} contract",
                            chain.name,
                            role.as_str()
                        ));
                    }
                }
                if chain.contracts.governance_reward.is_none() && chain.contracts.anti_mev.is_none()
                {
                    errors.push(format!(
                        "Chain {} supports protected mode but has no envelope target contract",
                        chain.name
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
