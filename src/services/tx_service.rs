// services/tx_service.rs
use crate::errors::error::AppError;
use crate::infrastructure::provider::ProviderTrait;
use crate::log_info;
use crate::models::domain::TxMeta;
use crate::services::tx::category::{CategoryResult, determine_transaction_category};
use crate::services::tx::gas::gas_service::TxGasService;
use crate::utils::convert::present;
use std::sync::Arc;

/// 交易默认值填充：分类 → gasPrice → gas / storageLimit 估算
pub struct TxService {
    pub gas_svc: Arc<TxGasService>,
    pub provider: Arc<dyn ProviderTrait>,
}

impl TxService {
    pub fn new(gas_svc: Arc<TxGasService>, provider: Arc<dyn ProviderTrait>) -> Self {
        Self { gas_svc, provider }
    }

    /// 为新提交的交易补齐 gas 相关默认值
    ///
    /// 估算失败记录在 `tx_meta.simulation_fails`；只有获取区块或 gasPrice
    /// 失败时返回 `Err`。
    pub async fn add_tx_gas_defaults(&self, tx_meta: &mut TxMeta) -> Result<(), AppError> {
        let CategoryResult {
            transaction_category,
            get_code_response,
        } = determine_transaction_category(&*self.provider, &tx_meta.tx_params).await;
        if tx_meta.transaction_category.is_none() {
            tx_meta.transaction_category = Some(transaction_category);
        }

        if present(tx_meta.tx_params.gas_price.as_deref()).is_none() {
            tx_meta.tx_params.gas_price = Some(self.provider.gas_price().await?);
        }

        tx_meta.loading_defaults = true;
        let result = self
            .gas_svc
            .analyze_gas_usage(tx_meta, get_code_response)
            .await;
        tx_meta.loading_defaults = false;
        result?;

        log_info!(
            "交易 {} 默认值已填充: 类别 {:?}, gas {:?}, storageLimit {:?}",
            tx_meta.id,
            tx_meta.transaction_category,
            tx_meta.tx_params.gas,
            tx_meta.tx_params.storage_limit
        );
        Ok(())
    }
}
