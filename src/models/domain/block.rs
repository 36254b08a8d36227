use crate::errors::error::AppError;
use crate::utils::convert::parse_hex_u256;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// 区块查询标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
}

/// 最新区块的只读快照，仅在单次估算期间借用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockLimits {
    /// Conflux 节点返回 height，兼容以太坊风格的 number
    #[serde(alias = "height")]
    pub number: String,
    pub gas_limit: String,
}

impl BlockLimits {
    pub fn gas_limit_u256(&self) -> Result<U256, AppError> {
        parse_hex_u256(&self.gas_limit)
    }
}

/// estimateGas 的返回
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasAndCollateral {
    pub gas_used: String,
    pub storage_collateralized: String,
    /// 部分节点额外给出的推荐 gasLimit，估算逻辑不使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
}
