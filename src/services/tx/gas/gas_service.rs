// services/tx/gas/gas_service.rs

use crate::errors::error::GasEstimationError;
use crate::infrastructure::provider::ProviderTrait;
use crate::models::domain::{
    BlockTag, SIMPLE_GAS_UNITS, SIMPLE_STORAGE_COST, SimulationDebug, SimulationFails, TxMeta,
};
use crate::services::tx::gas::gas_buffer::add_gas_buffer;
use crate::utils::address::is_contract_address;
use crate::utils::convert::{has_payload, mul_div, parse_hex_u256, present, u256_to_hex};
use crate::{log_debug, log_warn};
use ethers_core::types::U256;
use std::sync::Arc;

/// 回退上限：区块 gas 上限的 95%
const FALLBACK_NUMERATOR: u64 = 19;
const FALLBACK_DENOMINATOR: u64 = 20;

/// 估算原始结果（未加缓冲）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasEstimate {
    pub gas: U256,
    pub storage: U256,
}

/// Gas / 存储抵押估算服务
///
/// 每次调用独占借用一条 `TxMeta`；同一条记录不允许并发估算，由调用方保证。
/// 适配器无状态，可在多条记录之间共享。
#[derive(Clone)]
pub struct TxGasService {
    provider: Arc<dyn ProviderTrait>,
}

impl TxGasService {
    pub fn new(provider: Arc<dyn ProviderTrait>) -> Self {
        Self { provider }
    }

    /// 估算入口：成功时写回 gas / storageLimit，失败时写入 `simulation_fails`
    ///
    /// 只有获取最新区块失败才返回 `Err`，其余失败都记录在元数据里。
    pub async fn analyze_gas_usage(
        &self,
        tx_meta: &mut TxMeta,
        get_code_response: Option<String>,
    ) -> Result<(), GasEstimationError> {
        let block = self
            .provider
            .get_block_by_number(BlockTag::Latest, false)
            .await
            .map_err(|e| GasEstimationError::BlockFetch {
                message: e.to_string(),
            })?;
        let block_gas_limit =
            block
                .gas_limit_u256()
                .map_err(|e| GasEstimationError::BlockFetch {
                    message: e.to_string(),
                })?;

        match self
            .estimate_tx_gas_and_collateral(tx_meta, block_gas_limit, get_code_response.as_deref())
            .await
        {
            Ok(estimate) => {
                set_tx_gas(tx_meta, block_gas_limit, estimate);
                tx_meta.simulation_fails = None;
                log_debug!(
                    "交易 {} 估算完成: gas={:?}, storageLimit={:?}",
                    tx_meta.id,
                    tx_meta.tx_params.gas,
                    tx_meta.tx_params.storage_limit
                );
            }
            Err(err) => {
                log_warn!("交易 {} 估算失败: {}", tx_meta.id, err);
                tx_meta.simulation_fails = Some(SimulationFails {
                    reason: err.to_string(),
                    error_key: err.error_key(),
                    debug: SimulationDebug {
                        block_number: block.number.clone(),
                        block_gas_limit: block.gas_limit.clone(),
                        get_code_response: err.get_code_response().map(str::to_string),
                    },
                });
            }
        }
        Ok(())
    }

    /// 分类并估算：调用方已指定、简单转账、或交给节点 estimateGas
    pub async fn estimate_tx_gas_and_collateral(
        &self,
        tx_meta: &mut TxMeta,
        block_gas_limit: U256,
        get_code_response: Option<&str>,
    ) -> Result<GasEstimate, GasEstimationError> {
        let has_recipient = match present(tx_meta.tx_params.to.as_deref()) {
            Some(to) => {
                if !is_contract_address(to) {
                    tx_meta.simple_send = true;
                }
                true
            }
            None => false,
        };

        tx_meta.gas_limit_specified = present(tx_meta.tx_params.gas.as_deref()).is_some();
        // 未指定的存储上限先按零成本补齐，补齐后同样视为已指定
        if present(tx_meta.tx_params.storage_limit.as_deref()).is_none() {
            tx_meta.tx_params.storage_limit = Some(SIMPLE_STORAGE_COST.to_string());
        }
        tx_meta.storage_limit_specified = true;

        if tx_meta.gas_limit_specified && tx_meta.storage_limit_specified {
            let gas = parse_param("gas", tx_meta.tx_params.gas.as_deref())?;
            let storage = parse_param("storageLimit", tx_meta.tx_params.storage_limit.as_deref())?;
            log_debug!("交易 {} 已指定 gas 与 storageLimit，跳过估算", tx_meta.id);
            return Ok(GasEstimate { gas, storage });
        }

        let simple_transfer = tx_meta
            .transaction_category
            .is_some_and(|c| c.is_simple_send());
        if has_recipient && simple_transfer {
            if has_payload(tx_meta.tx_params.data.as_deref()) {
                return Err(GasEstimationError::NonContractCall {
                    get_code_response: get_code_response.map(str::to_string),
                });
            }
            tx_meta.tx_params.gas = Some(u256_to_hex(SIMPLE_GAS_UNITS));
            tx_meta.simple_send = true;
            return Ok(GasEstimate {
                gas: SIMPLE_GAS_UNITS,
                storage: U256::zero(),
            });
        }

        // 合约调用或合约创建：先以 95% 区块上限作为临时 gas，再交给节点估算
        let fallback = mul_div(block_gas_limit, FALLBACK_NUMERATOR, FALLBACK_DENOMINATOR);
        tx_meta.tx_params.gas = Some(u256_to_hex(fallback));

        let result = self.provider.estimate_gas(&tx_meta.tx_params).await?;
        let gas = parse_hex_u256(&result.gas_used).map_err(|e| GasEstimationError::Estimation {
            message: format!("节点返回的 gasUsed 无效: {}", e),
            key: None,
        })?;
        let storage = parse_hex_u256(&result.storage_collateralized).map_err(|e| {
            GasEstimationError::Estimation {
                message: format!("节点返回的 storageCollateralized 无效: {}", e),
                key: None,
            }
        })?;
        Ok(GasEstimate { gas, storage })
    }
}

fn parse_param(field: &'static str, value: Option<&str>) -> Result<U256, GasEstimationError> {
    let raw = value.unwrap_or_default();
    parse_hex_u256(raw).map_err(|_| GasEstimationError::InvalidParam {
        field,
        value: raw.to_string(),
    })
}

/// 把估算结果写回交易元数据
///
/// 调用方指定的值优先；只有 gas 未指定时才加缓冲。
pub fn set_tx_gas(tx_meta: &mut TxMeta, block_gas_limit: U256, estimate: GasEstimate) {
    if tx_meta.simple_send {
        tx_meta.estimated_gas = tx_meta.tx_params.gas.clone();
        tx_meta.estimated_storage = if tx_meta.storage_limit_specified {
            tx_meta.tx_params.storage_limit.clone()
        } else {
            Some(SIMPLE_STORAGE_COST.to_string())
        };
        return;
    }

    tx_meta.estimated_gas = Some(u256_to_hex(estimate.gas));
    tx_meta.estimated_storage = Some(u256_to_hex(estimate.storage));

    if tx_meta.storage_limit_specified {
        tx_meta.estimated_storage = tx_meta.tx_params.storage_limit.clone();
    }

    if tx_meta.gas_limit_specified {
        tx_meta.estimated_gas = tx_meta.tx_params.gas.clone();
        return;
    }

    let buffered = add_gas_buffer(estimate.gas, block_gas_limit);
    tx_meta.tx_params.gas = Some(u256_to_hex(buffered));
    if !tx_meta.storage_limit_specified {
        tx_meta.tx_params.storage_limit = tx_meta.estimated_storage.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::error::{AppError, TRANSACTION_NO_CONTRACT_ERROR_KEY};
    use crate::infrastructure::provider::MockProviderTrait;
    use crate::models::domain::{
        BlockLimits, GasAndCollateral, SIMPLE_GAS_COST, TransactionCategory, TxParams,
    };

    const USER: &str = "0x1b0a9e5ad3f2f5bc3d3ad9b1c2e6f5b3a8a7c6d1";
    const CONTRACT: &str = "0x8a3f8a9c6b2b2a54bbd3ba4fb9e3fa1d04fd5f0e";
    // 100000
    const BLOCK_GAS_LIMIT: &str = "0x0186A0";

    /// 每次估算都会先取一次最新区块
    fn provider_with_block(gas_limit: &'static str, fetches: usize) -> MockProviderTrait {
        let mut mock = MockProviderTrait::new();
        mock.expect_get_block_by_number()
            .withf(|tag, full_tx| *tag == BlockTag::Latest && !*full_tx)
            .times(fetches)
            .returning(move |_, _| {
                Ok(BlockLimits {
                    number: "0x4a1".into(),
                    gas_limit: gas_limit.into(),
                })
            });
        mock
    }

    fn estimate(gas_used: &str, storage: &str) -> GasAndCollateral {
        GasAndCollateral {
            gas_used: gas_used.into(),
            storage_collateralized: storage.into(),
            gas_limit: None,
        }
    }

    fn service(mock: MockProviderTrait) -> TxGasService {
        TxGasService::new(Arc::new(mock))
    }

    fn meta(params: TxParams, category: TransactionCategory) -> TxMeta {
        let mut meta = TxMeta::new(1, params);
        meta.transaction_category = Some(category);
        meta
    }

    fn send_to(to: &str) -> TxParams {
        TxParams {
            from: Some(USER.into()),
            to: Some(to.into()),
            value: Some("0xde0b6b3a7640000".into()),
            ..Default::default()
        }
    }

    fn contract_call() -> TxMeta {
        let mut params = send_to(CONTRACT);
        params.data = Some("0xd0e30db0".into());
        meta(params, TransactionCategory::ContractInteraction)
    }

    #[tokio::test]
    async fn caller_specified_limits_skip_estimation() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().never();
        let mut tx = contract_call();
        tx.tx_params.gas = Some("0x7530".into());
        tx.tx_params.storage_limit = Some("0x40".into());

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x7530"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x40"));
        assert_eq!(tx.estimated_gas.as_deref(), Some("0x7530"));
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x40"));
        assert!(tx.gas_limit_specified && tx.storage_limit_specified);
        assert!(tx.simulation_fails.is_none());
    }

    #[tokio::test]
    async fn simple_transfer_uses_fixed_cost() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().never();
        let mut params = send_to(USER);
        params.data = Some("0x".into());
        let mut tx = meta(params, TransactionCategory::SentEther);

        service(mock)
            .analyze_gas_usage(&mut tx, Some("0x".into()))
            .await
            .unwrap();

        assert!(tx.simple_send);
        assert_eq!(tx.tx_params.gas.as_deref(), Some(SIMPLE_GAS_COST));
        assert_eq!(tx.estimated_gas.as_deref(), Some("0x5208"));
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x0"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x0"));
    }

    #[tokio::test]
    async fn simple_send_keeps_caller_storage() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().never();
        let mut params = send_to(USER);
        params.storage_limit = Some("0x40".into());
        let mut tx = meta(params, TransactionCategory::SentEther);

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert!(tx.simple_send);
        assert!(!tx.gas_limit_specified);
        assert_eq!(tx.estimated_gas.as_deref(), Some("0x5208"));
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x40"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x40"));
        assert!(tx.simulation_fails.is_none());
    }

    #[tokio::test]
    async fn simple_transfer_with_payload_is_rejected() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().never();
        let mut params = send_to(USER);
        params.data = Some("0xa9059cbb00".into());
        let mut tx = meta(params, TransactionCategory::SentEther);

        service(mock)
            .analyze_gas_usage(&mut tx, Some("0x".into()))
            .await
            .unwrap();

        let fails = tx.simulation_fails.expect("failure recorded");
        assert_eq!(fails.error_key.as_deref(), Some(TRANSACTION_NO_CONTRACT_ERROR_KEY));
        assert_eq!(
            fails.reason,
            "TxGasUtil - Trying to call a function on a non-contract address"
        );
        assert_eq!(fails.debug.get_code_response.as_deref(), Some("0x"));
        assert_eq!(fails.debug.block_number, "0x4a1");
        assert_eq!(fails.debug.block_gas_limit, BLOCK_GAS_LIMIT);
        assert_eq!(tx.tx_params.gas, None);
        assert_eq!(tx.estimated_gas, None);
        assert_eq!(tx.estimated_storage, None);
    }

    #[tokio::test]
    async fn contract_call_is_estimated_and_buffered() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        // 临时 gas 为区块上限的 95%
        mock.expect_estimate_gas()
            .withf(|p| {
                p.gas.as_deref() == Some("0x17318") && p.storage_limit.as_deref() == Some("0x0")
            })
            .times(1)
            .returning(|_| Ok(estimate("0x2710", "0x80")));
        let mut tx = contract_call();

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert!(!tx.simple_send);
        assert_eq!(tx.estimated_gas.as_deref(), Some("0x2710"));
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x3a98"));
        // 未指定的 storageLimit 已补齐为 0，并优先于节点的估算
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x0"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x0"));
    }

    #[tokio::test]
    async fn caller_storage_wins_over_network() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas()
            .withf(|p| p.storage_limit.as_deref() == Some("0x40"))
            .times(1)
            .returning(|_| Ok(estimate("0x2710", "0x200")));
        let mut tx = contract_call();
        tx.tx_params.storage_limit = Some("0x40".into());

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert_eq!(tx.estimated_storage.as_deref(), Some("0x40"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x40"));
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x3a98"));
    }

    #[tokio::test]
    async fn large_estimate_is_not_shrunk() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas()
            .times(1)
            .returning(|_| Ok(estimate("0x0F4240", "0x0")));
        let mut tx = contract_call();

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert_eq!(tx.estimated_gas.as_deref(), Some("0xf4240"));
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0xf4240"));
    }

    #[tokio::test]
    async fn contract_creation_goes_to_network() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas()
            .withf(|p| p.to.is_none() && p.data.as_deref() == Some("0x6080604052"))
            .times(1)
            .returning(|_| Ok(estimate("0xc350", "0x100")));
        let params = TxParams {
            from: Some(USER.into()),
            data: Some("0x6080604052".into()),
            ..Default::default()
        };
        let mut tx = meta(params, TransactionCategory::DeployContract);

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert!(!tx.simple_send);
        // 50000 × 1.5 = 75000 < 90000
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x124f8"));
        assert_eq!(tx.estimated_gas.as_deref(), Some("0xc350"));
    }

    #[tokio::test]
    async fn estimation_error_is_recorded_not_raised() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().times(1).returning(|_| {
            Err(AppError::Rpc {
                code: -32015,
                message: "Estimation isn't accurate: transaction is reverted".into(),
            })
        });
        let mut tx = contract_call();

        service(mock)
            .analyze_gas_usage(&mut tx, Some("0x6080".into()))
            .await
            .unwrap();

        let fails = tx.simulation_fails.expect("failure recorded");
        assert_eq!(
            fails.reason,
            "Estimation isn't accurate: transaction is reverted"
        );
        assert_eq!(fails.error_key.as_deref(), Some("-32015"));
        assert_eq!(fails.debug.get_code_response, None);
        assert_eq!(tx.estimated_gas, None);
        assert_eq!(tx.estimated_storage, None);
    }

    #[tokio::test]
    async fn block_fetch_failure_propagates() {
        let mut mock = MockProviderTrait::new();
        mock.expect_get_block_by_number()
            .times(1)
            .returning(|_, _| Err(AppError::ProviderError("node down".into())));
        mock.expect_estimate_gas().never();
        let mut tx = meta(send_to(USER), TransactionCategory::SentEther);

        let err = service(mock)
            .analyze_gas_usage(&mut tx, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GasEstimationError::BlockFetch { .. }));
        assert!(tx.simulation_fails.is_none());
        assert_eq!(tx.tx_params.gas, None);
        assert_eq!(tx.estimated_gas, None);
    }

    #[tokio::test]
    async fn malformed_block_gas_limit_propagates() {
        let mut tx = meta(send_to(USER), TransactionCategory::SentEther);

        let err = service(provider_with_block("0xnothex", 1))
            .analyze_gas_usage(&mut tx, None)
            .await
            .unwrap_err();

        assert!(matches!(err, GasEstimationError::BlockFetch { .. }));
        assert_eq!(tx.tx_params.gas, None);
    }

    #[tokio::test]
    async fn invalid_caller_gas_is_recorded() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas().never();
        let mut params = send_to(USER);
        params.gas = Some("lots".into());
        let mut tx = meta(params, TransactionCategory::SentEther);

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        let fails = tx.simulation_fails.expect("failure recorded");
        assert_eq!(fails.error_key.as_deref(), Some("invalidParams"));
        assert_eq!(tx.estimated_gas, None);
    }

    #[tokio::test]
    async fn malformed_network_estimate_is_recorded() {
        let mut mock = provider_with_block(BLOCK_GAS_LIMIT, 1);
        mock.expect_estimate_gas()
            .times(1)
            .returning(|_| Ok(estimate("0xgg", "0x0")));
        let mut tx = contract_call();

        service(mock).analyze_gas_usage(&mut tx, None).await.unwrap();

        assert!(tx.simulation_fails.is_some());
        assert_eq!(tx.estimated_gas, None);
    }

    #[tokio::test]
    async fn empty_strings_count_as_unspecified() {
        let mut params = send_to(USER);
        params.gas = Some(String::new());
        params.storage_limit = Some(String::new());
        let mut tx = meta(params, TransactionCategory::SentEther);

        service(provider_with_block(BLOCK_GAS_LIMIT, 1))
            .analyze_gas_usage(&mut tx, None)
            .await
            .unwrap();

        assert!(!tx.gas_limit_specified);
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x5208"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x0"));
    }

    #[tokio::test]
    async fn success_clears_previous_failure() {
        let svc = service(provider_with_block(BLOCK_GAS_LIMIT, 2));
        let mut tx = meta(send_to(USER), TransactionCategory::SentEther);
        tx.tx_params.data = Some("0x01".into());
        svc.analyze_gas_usage(&mut tx, None).await.unwrap();
        assert!(tx.simulation_fails.is_some());

        tx.tx_params.data = None;
        svc.analyze_gas_usage(&mut tx, None).await.unwrap();
        assert!(tx.simulation_fails.is_none());
        assert_eq!(tx.estimated_gas.as_deref(), Some("0x5208"));
    }

    #[test]
    fn writer_keeps_specified_gas_without_buffer() {
        let mut tx = meta(send_to(CONTRACT), TransactionCategory::ContractInteraction);
        tx.tx_params.gas = Some("0x7530".into());
        tx.tx_params.storage_limit = Some("0x0".into());
        tx.gas_limit_specified = true;
        tx.storage_limit_specified = false;

        set_tx_gas(
            &mut tx,
            U256::from(100_000u64),
            GasEstimate {
                gas: U256::from(10_000u64),
                storage: U256::from(64u64),
            },
        );

        assert_eq!(tx.estimated_gas.as_deref(), Some("0x7530"));
        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x7530"));
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x40"));
    }

    #[test]
    fn writer_copies_network_storage_when_unspecified() {
        let mut tx = meta(send_to(CONTRACT), TransactionCategory::ContractInteraction);

        set_tx_gas(
            &mut tx,
            U256::from(100_000u64),
            GasEstimate {
                gas: U256::from(10_000u64),
                storage: U256::from(64u64),
            },
        );

        assert_eq!(tx.tx_params.gas.as_deref(), Some("0x3a98"));
        assert_eq!(tx.estimated_storage.as_deref(), Some("0x40"));
        assert_eq!(tx.tx_params.storage_limit.as_deref(), Some("0x40"));
    }
}
