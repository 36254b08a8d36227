use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// 简单转账固定 gas：0x5208（21000）
pub const SIMPLE_GAS_COST: &str = "0x5208";
/// 同一数值的 U256 形式，估算结果使用
pub const SIMPLE_GAS_UNITS: U256 = U256([21_000, 0, 0, 0]);
/// 简单转账存储抵押：0
pub const SIMPLE_STORAGE_COST: &str = "0x0";

/// 发往节点的交易参数（边界上全部为十六进制字符串）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// 为空表示合约创建
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_limit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epoch_height: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

/// 交易意图分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionCategory {
    #[serde(rename = "sentEther")]
    SentEther,
    #[serde(rename = "contractInteraction")]
    ContractInteraction,
    #[serde(rename = "contractDeployment")]
    DeployContract,
    #[serde(rename = "transfer")]
    TokenMethodTransfer,
    #[serde(rename = "approve")]
    TokenMethodApprove,
    #[serde(rename = "transferfrom")]
    TokenMethodTransferFrom,
}

impl TransactionCategory {
    /// 是否为可识别的原生币简单转账
    pub fn is_simple_send(&self) -> bool {
        matches!(self, TransactionCategory::SentEther)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationDebug {
    pub block_number: String,
    pub block_gas_limit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_code_response: Option<String>,
}

/// 估算失败记录，仅在失败路径上写入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationFails {
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_key: Option<String>,
    pub debug: SimulationDebug,
}

/// 交易元数据：TxParams + 估算簿记
///
/// 所有权归交易控制器；估算器每次调用期间独占 `&mut` 借用，不保留引用。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxMeta {
    pub id: u64,
    pub tx_params: TxParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_category: Option<TransactionCategory>,
    #[serde(default)]
    pub gas_limit_specified: bool,
    #[serde(default)]
    pub storage_limit_specified: bool,
    #[serde(default)]
    pub simple_send: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_storage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_fails: Option<SimulationFails>,
    #[serde(default)]
    pub loading_defaults: bool,
}

impl TxMeta {
    pub fn new(id: u64, tx_params: TxParams) -> Self {
        Self {
            id,
            tx_params,
            ..Default::default()
        }
    }
}
