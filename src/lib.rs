//! 交易 gas 与存储抵押上限估算
//!
//! 根据交易参数与最新区块的 gas 上限，判断简单转账 / 合约调用，
//! 查询或回退网络估算，并把带缓冲的 gas 与 storageLimit 写回交易元数据。

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

pub use errors::error::{AppError, GasEstimationError};
pub use models::domain::{TxMeta, TxParams};
pub use services::TxService;
pub use services::tx::gas::gas_service::TxGasService;
