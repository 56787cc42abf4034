//! 金额换算
//!
//! 十进制金额字符串与链上整数单位（按代币精度定点缩放）之间的转换

use ethers::{
    types::U256,
    utils::{format_units, parse_units},
};

use crate::{error::TransferError, utils::string_utils::is_blank};

/// 十进制字符串 → 原始整数单位，例如 ("1.5", 18) → 1500000000000000000
pub fn amount_to_raw(amount: &str, decimals: u32) -> Result<U256, TransferError> {
    let amount = amount.trim();
    if is_blank(amount) {
        return Err(TransferError::invalid_amount("Amount is empty"));
    }
    if amount.starts_with('-') || amount.starts_with('+') {
        return Err(TransferError::invalid_amount(format!(
            "Amount must be an unsigned decimal: {}",
            amount
        )));
    }
    if decimals > 77 {
        return Err(TransferError::invalid_amount(format!(
            "Unsupported decimals: {}",
            decimals
        )));
    }

    // parse_units 会截断超出精度的小数位，这里直接拒绝
    if let Some((_, fraction)) = amount.split_once('.') {
        if fraction.len() > decimals as usize {
            return Err(TransferError::invalid_amount(format!(
                "Amount {} has more than {} fractional digits",
                amount, decimals
            )));
        }
    }

    let parsed = parse_units(amount, decimals).map_err(|e| {
        TransferError::invalid_amount(format!("Invalid amount {:?}: {}", amount, e)).with_source(e)
    })?;
    Ok(parsed.into())
}

/// 原始整数单位 → 十进制字符串
pub fn raw_to_amount(raw: U256, decimals: u32) -> Result<String, TransferError> {
    let formatted = format_units(raw, decimals).map_err(|e| {
        TransferError::invalid_amount(format!("Cannot format {} with {} decimals", raw, decimals))
            .with_source(e)
    })?;
    // format_units 总是补足小数位，去掉多余的 0
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        formatted.as_str()
    };
    Ok(trimmed.to_string())
}
