//! 链注册表测试
//!
//! 验证内置链目录、文件覆盖和配置校验

use std::io::Write;

use tempfile::NamedTempFile;

use super::*;

#[test]
fn test_chain_registry() {
    let registry = ChainRegistry::new();

    let eth = registry.get(1).unwrap();
    assert_eq!(eth.name, "Ethereum");
    assert_eq!(eth.native_currency.decimals, 18);
    assert!(!eth.supports_protected());

    let neox = registry.get(12227332).unwrap();
    assert!(neox.supports_protected());
    assert_eq!(
        neox.contract(ContractRole::GovernanceReward).unwrap(),
        "0x1212000000000000000000000000000000000003"
            .parse::<Address>()
            .unwrap()
    );
    assert!(neox.contract(ContractRole::AntiMev).is_err());

    assert!(registry.validate_configs().is_ok());
}

#[test]
fn test_rpc_url_selection() {
    let registry = ChainRegistry::new();
    let neox = registry.get(12227332).unwrap();

    assert_eq!(
        neox.rpc_urls_for(true),
        &["https://neoxt4seed1.ngd.network:8555".to_string()]
    );
    assert_eq!(
        neox.rpc_urls_for(false),
        &["https://neoxt4seed1.ngd.network".to_string()]
    );

    // 没有受保护端点的链回落到默认集合
    let eth = registry.get(1).unwrap();
    assert_eq!(eth.rpc_urls_for(true), eth.rpc_urls.as_slice());
    assert!(eth.protected_rpc_url().is_err());
}

#[test]
fn test_require_unknown_chain() {
    let registry = ChainRegistry::new();
    let err = registry.require(999).unwrap_err();
    assert_eq!(err.code, crate::error::TransferErrorCode::ChainNotSupported);
}

#[test]
fn test_protected_chains() {
    let registry = ChainRegistry::new();
    let ids: Vec<u64> = registry.protected_chains().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![12227332]);
}

#[test]
fn test_load_with_file_override() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[[chains]]
id = 47763
name = "Neo X"
rpc_urls = ["https://mainnet-1.rpc.banelabs.org"]
protected_rpc_urls = ["https://mainnet-5.rpc.banelabs.org"]
explorer_url = "https://xexplorer.neo.org"

[chains.native_currency]
name = "GAS"
symbol = "GAS"
decimals = 18

[chains.contracts]
governance = "0x1212000000000000000000000000000000000001"
keyManagement = "0x1212000000000000000000000000000000000008"
antiMev = "0x1212000000000000000000000000000000000009"
"#
    )
    .unwrap();

    let registry = ChainRegistry::load(Some(file.path())).unwrap();
    let neox = registry.get(47763).unwrap();
    assert!(neox.supports_protected());
    assert!(neox.contract(ContractRole::AntiMev).is_ok());
    assert!(neox.contracts.governance_reward.is_none());
    // 内置链仍然存在
    assert!(registry.get(1).is_some());
}

#[test]
fn test_validation_rejects_incomplete_protected_chain() {
    let registry = ChainRegistry::from_descriptors(vec![ChainDescriptor {
        id: 7,
        name: "Broken".to_string(),
        native_currency: NativeCurrency {
            name: "Test".to_string(),
            symbol: "TST".to_string(),
            decimals: 18,
        },
        rpc_urls: vec![],
        protected_rpc_urls: Some(vec!["https://protected.example".to_string()]),
        explorer_url: None,
        contracts: ContractTable::default(),
        testnet: true,
    }]);

    let errors = registry.validate_configs().unwrap_err();
    assert!(errors.iter().any(|e| e.contains("no default RPC endpoint")));
    assert!(errors.iter().any(|e| e.contains("governance contract")));
    assert!(errors.iter().any(|e| e.contains("keyManagement contract")));
    assert!(errors.iter().any(|e| e.contains("envelope target")));
}
