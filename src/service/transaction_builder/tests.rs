//! 交易构建测试

use ethers::types::{Address, NameOrAddress, U256, U64};

use super::*;

fn request(token: Option<Address>) -> TransferRequest {
    TransferRequest {
        chain_id: 12227332,
        token,
        account: Address::repeat_byte(0xaa),
        to: Address::repeat_byte(0xbb),
        amount: "1.5".to_string(),
        decimals: 18,
        protected: false,
    }
}

#[test]
fn test_native_transfer() {
    let value = U256::from(1_500_000_000_000_000_000u64);
    let tx = TransactionBuilder::transfer(&request(None), value, None);

    assert_eq!(tx.from, Some(Address::repeat_byte(0xaa)));
    assert_eq!(tx.to, Some(NameOrAddress::Address(Address::repeat_byte(0xbb))));
    assert_eq!(tx.value, Some(value));
    assert_eq!(tx.chain_id, Some(U64::from(12227332u64)));
    assert!(tx.data.is_none());
    assert!(tx.nonce.is_none());
}

#[test]
fn test_erc20_transfer_calldata() {
    let token = Address::repeat_byte(0xcc);
    let tx = TransactionBuilder::transfer(&request(Some(token)), U256::from(1_000_000u64), Some(7));

    assert_eq!(tx.to, Some(NameOrAddress::Address(token)));
    assert!(tx.value.is_none());
    assert_eq!(tx.nonce, Some(U256::from(7u64)));

    let data = tx.data.unwrap();
    assert_eq!(data.len(), 4 + 32 + 32);
    assert_eq!(&data[..4], &ERC20_TRANSFER_SELECTOR);
    // 地址左填充到 32 字节
    assert_eq!(&data[4..16], &[0u8; 12]);
    assert_eq!(&data[16..36], Address::repeat_byte(0xbb).as_bytes());
    assert_eq!(U256::from_big_endian(&data[36..68]), U256::from(1_000_000u64));
}

#[test]
fn test_selector_matches_signature() {
    assert_eq!(ethers::utils::id("transfer(address,uint256)"), ERC20_TRANSFER_SELECTOR);
}

#[test]
fn test_envelope_submission() {
    let target = "0x1212000000000000000000000000000000000003"
        .parse::<Address>()
        .unwrap();
    let envelope = vec![0xff, 0xff, 0xff, 0xff, 0, 0, 0, 3];
    let tx = TransactionBuilder::envelope_submission(
        Address::repeat_byte(0xaa),
        target,
        12227332,
        envelope.clone(),
        Some(5),
    );

    assert_eq!(tx.to, Some(NameOrAddress::Address(target)));
    assert_eq!(tx.data.unwrap().to_vec(), envelope);
    assert_eq!(tx.nonce, Some(U256::from(5u64)));
    assert!(tx.value.is_none());
}
