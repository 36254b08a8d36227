use ethers_providers::{ProviderError, RpcError};
use thiserror::Error;

/// 不可恢复的非合约调用错误键（供上层做本地化提示）
pub const TRANSACTION_NO_CONTRACT_ERROR_KEY: &str = "transactionErrorNoContract";
/// 调用方传入的 gas / storageLimit 不是合法十六进制
pub const INVALID_PARAMS_ERROR_KEY: &str = "invalidParams";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("无效的数字: {0}")]
    InvalidNumber(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    /// 节点返回的 JSON-RPC 错误响应（如执行回滚），重试无意义
    #[error("RPC错误 (code {code}): {message}")]
    Rpc { code: i64, message: String },

    /// 传输层错误（连接失败、超时等），可重试
    #[error("无效的provider: {0}")]
    ProviderError(String),

    #[error("请求超时: {0}")]
    Timeout(String),

    /// 内部不可预期错误（兜底）
    #[error("内部错误: {0}")]
    Internal(String),
}

impl AppError {
    /// 是否属于网络/节点层的临时故障
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ProviderError(_) | AppError::Timeout(_))
    }

    /// 适配器提供的错误键：RPC 错误码原样透传
    pub fn error_key(&self) -> Option<String> {
        match self {
            AppError::Rpc { code, .. } => Some(code.to_string()),
            _ => None,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        match err.as_error_response() {
            Some(resp) => AppError::Rpc {
                code: resp.code,
                message: resp.message.clone(),
            },
            None => AppError::ProviderError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Gas / 存储抵押估算过程中的错误分类
///
/// `BlockFetch` 之外的分支都会被估算器就地转成 `simulationFails`，
/// 不会向调用方传播。
#[derive(Error, Debug)]
pub enum GasEstimationError {
    /// 携带 data 的"简单转账"，但接收方不是合约地址
    #[error("TxGasUtil - Trying to call a function on a non-contract address")]
    NonContractCall { get_code_response: Option<String> },

    /// 节点 estimateGas 失败，消息与错误键原样保留
    #[error("{message}")]
    Estimation { message: String, key: Option<String> },

    #[error("Invalid {field}: {value}")]
    InvalidParam { field: &'static str, value: String },

    #[error("Failed to fetch latest block: {message}")]
    BlockFetch { message: String },
}

impl GasEstimationError {
    pub fn error_key(&self) -> Option<String> {
        match self {
            GasEstimationError::NonContractCall { .. } => {
                Some(TRANSACTION_NO_CONTRACT_ERROR_KEY.to_string())
            }
            GasEstimationError::Estimation { key, .. } => key.clone(),
            GasEstimationError::InvalidParam { .. } => Some(INVALID_PARAMS_ERROR_KEY.to_string()),
            GasEstimationError::BlockFetch { .. } => None,
        }
    }

    /// 仅非合约调用错误携带 code 查询结果
    pub fn get_code_response(&self) -> Option<&str> {
        match self {
            GasEstimationError::NonContractCall { get_code_response } => {
                get_code_response.as_deref()
            }
            _ => None,
        }
    }
}

impl From<AppError> for GasEstimationError {
    fn from(err: AppError) -> Self {
        let key = err.error_key();
        let message = match err {
            AppError::Rpc { message, .. } => message,
            other => other.to_string(),
        };
        GasEstimationError::Estimation { message, key }
    }
}

impl From<GasEstimationError> for AppError {
    fn from(err: GasEstimationError) -> Self {
        match err {
            GasEstimationError::BlockFetch { .. } => AppError::ProviderError(err.to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}
