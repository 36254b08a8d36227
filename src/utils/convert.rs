use crate::errors::error::AppError;
use ethers_core::types::{U256, U512};

/// 规范化：None、"" 与 "0x" 一律视为"未指定"
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("0x"))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// 十六进制字符串 → U256（允许省略 0x 前缀，空载荷视为 0）
pub fn parse_hex_u256(s: &str) -> Result<U256, AppError> {
    let digits = strip_hex_prefix(s.trim());
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidNumber(format!("非法十六进制: {}", s)));
    }
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return Ok(U256::zero());
    }
    if significant.len() > 64 {
        return Err(AppError::InvalidNumber(format!("超出 U256 范围: {}", s)));
    }
    U256::from_str_radix(significant, 16)
        .map_err(|e| AppError::InvalidNumber(format!("非法十六进制 {}: {}", s, e)))
}

/// U256 → 0x 前缀的小写十六进制，无前导零（0 输出 0x0）
pub fn u256_to_hex(value: U256) -> String {
    format!("{:#x}", value)
}

/// 精确整数分数缩放：value * numerator / denominator（截断）
///
/// 中间结果用 512 位承载，避免大区块上限乘法溢出；
/// 商超出 U256 时饱和为 U256::MAX，分母为 0 同样返回 U256::MAX。
pub fn mul_div(value: U256, numerator: u64, denominator: u64) -> U256 {
    if denominator == 0 {
        return U256::MAX;
    }
    let product: U512 = value.full_mul(U256::from(numerator));
    let quotient = product / U512::from(denominator);
    U256::try_from(quotient).unwrap_or(U256::MAX)
}

/// 十六进制是否携带实际载荷（data 字段）
pub fn has_payload(data: Option<&str>) -> bool {
    present(data).is_some()
}
