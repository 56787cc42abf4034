//! 字符串工具模块
//! 提供字符串处理相关的工具函数

/// 截断字符串到指定长度
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// 检查字符串是否为空或只包含空白字符
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// 0x 前缀的十六进制
pub fn to_hex_prefixed(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// 日志用的十六进制预览，避免把整段密文写进日志
pub fn hex_preview(bytes: &[u8], max_len: usize) -> String {
    truncate(&to_hex_prefixed(bytes), max_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("0x0123456789", 8), "0x012...");
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex_prefixed(&[0xff, 0x01]), "0xff01");
        assert_eq!(hex_preview(&[0u8; 32], 10), "0x00000...");
        assert!(is_blank("  \t"));
        assert!(!is_blank(" 1 "));
    }
}
