// RPC响应校验模块 - 防止畸形的节点响应进入流水线

use ethers::types::Bytes;
use serde_json::Value;

use crate::error::TransferError;

/// 缓存交易的合理上限（128 KiB），超出视为异常响应
pub const MAX_RAW_TRANSACTION_LEN: usize = 128 * 1024;

/// 校验 JSON-RPC 响应并取出 result
///
/// error 字段按错误码分类（-32603 携带内部拒绝标记，4001 为用户拒绝）。
pub fn validate_rpc_response<'a>(context: &str, json: &'a Value) -> Result<&'a Value, TransferError> {
    if let Some(version) = json.get("jsonrpc") {
        if version.as_str() != Some("2.0") {
            return Err(TransferError::transport(format!(
                "{}: unsupported JSON-RPC version {}",
                context, version
            )));
        }
    }

    if let Some(error) = json.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        return Err(TransferError::from_json_rpc(context, code, message));
    }

    match json.get("result") {
        Some(result) if !result.is_null() => Ok(result),
        _ => Err(TransferError::transport(format!(
            "{}: missing result field in RPC response",
            context
        ))),
    }
}

/// 校验十六进制字节串（缓存交易原文）
pub fn validate_hex_bytes(value: &Value) -> Result<Bytes, TransferError> {
    let s = value.as_str().ok_or_else(|| {
        TransferError::invalid_cached_transaction("Cached transaction is not a hex string")
    })?;
    let hex_body = s.strip_prefix("0x").ok_or_else(|| {
        TransferError::invalid_cached_transaction("Cached transaction is missing 0x prefix")
    })?;

    if hex_body.len() / 2 > MAX_RAW_TRANSACTION_LEN {
        return Err(TransferError::invalid_cached_transaction(format!(
            "Cached transaction too large: {} bytes",
            hex_body.len() / 2
        )));
    }

    let bytes = hex::decode(hex_body).map_err(|e| {
        TransferError::invalid_cached_transaction(format!("Invalid hex in cached transaction: {}", e))
            .with_source(e)
    })?;
    Ok(Bytes::from(bytes))
}
