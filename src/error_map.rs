use std::collections::HashMap;

use crate::error::{TransferError, TransferErrorCode};

pub fn error_map() -> HashMap<&'static str, &'static str> {
    // 错误消息子串到友好提示的映射，顺序无关
    HashMap::from([
        ("cache unavailable", "受保护节点暂不可用，请改用普通转账"),
        ("encrypted transaction not found", "受保护节点未缓存该交易，请改用普通转账"),
        ("timeout", "请求超时，请稍后重试"),
        ("timed out", "请求超时，请稍后重试"),
        ("network", "网络异常，请检查连接"),
        ("insufficient funds", "余额不足以支付金额和手续费"),
        ("nonce too low", "交易序号已被使用，请刷新后重试"),
    ])
}

/// 给出面向用户的提示文案；只读，不改变结构化错误本身
pub fn user_hint(err: &TransferError) -> Option<&'static str> {
    match err.code {
        TransferErrorCode::UserRejected => return Some("已在钱包中取消"),
        TransferErrorCode::ChainNotSupported => return Some("当前网络不受支持"),
        TransferErrorCode::ProtectedPathUnavailable => {
            return Some("当前网络不支持 AntiMEV 保护，请改用普通转账")
        }
        _ => {}
    }

    let message = err.message.to_lowercase();
    let map = error_map();
    // 更长的子串优先，避免 "network" 抢先匹配更具体的提示
    let mut keys: Vec<_> = map.keys().copied().collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    keys.into_iter()
        .find(|k| message.contains(k))
        .and_then(|k| map.get(k).copied())
}
