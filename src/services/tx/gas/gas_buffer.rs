// services/tx/gas/gas_buffer.rs

use crate::errors::error::AppError;
use crate::utils::convert::{mul_div, parse_hex_u256, u256_to_hex};
use ethers_core::types::U256;

/// 安全上限：区块 gas 上限的 90%
const UPPER_NUMERATOR: u64 = 9;
const UPPER_DENOMINATOR: u64 = 10;
/// 缓冲倍率 1.5
const BUFFER_NUMERATOR: u64 = 3;
const BUFFER_DENOMINATOR: u64 = 2;

/// 为估算出的 gas 增加缓冲（纯整数运算，无浮点风险）
///
/// - `initial` 已超过安全上限：原样返回，不缩小已确定的值
/// - `initial × 1.5` 小于上限：返回缓冲值
/// - 否则返回上限
pub fn add_gas_buffer(initial: U256, block_gas_limit: U256) -> U256 {
    let upper = mul_div(block_gas_limit, UPPER_NUMERATOR, UPPER_DENOMINATOR);
    if initial > upper {
        return initial;
    }
    let buffered = mul_div(initial, BUFFER_NUMERATOR, BUFFER_DENOMINATOR);
    if buffered < upper { buffered } else { upper }
}

/// 十六进制边界版本
pub fn add_gas_buffer_hex(initial_hex: &str, block_gas_limit_hex: &str) -> Result<String, AppError> {
    let initial = parse_hex_u256(initial_hex)?;
    let block_gas_limit = parse_hex_u256(block_gas_limit_hex)?;
    Ok(u256_to_hex(add_gas_buffer(initial, block_gas_limit)))
}
