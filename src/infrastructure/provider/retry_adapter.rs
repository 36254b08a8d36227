use super::conflux_provider::ProviderTrait;
use crate::errors::error::AppError;
use crate::log_warn;
use crate::models::domain::{BlockLimits, BlockTag, GasAndCollateral, TxParams};
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// 为任意适配器增加传输层重试
///
/// 只重试 `AppError::is_retryable` 的错误；节点返回的 RPC 错误
/// （例如 estimateGas 执行回滚）直接返回。
pub struct RetryAdapter {
    provider: Arc<dyn ProviderTrait>,
    max_retries: usize,
    base_delay: Duration,
}

impl RetryAdapter {
    pub fn new(provider: Arc<dyn ProviderTrait>, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            provider,
            // 至少执行一次
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        // 指数倍数上限 2^10
        let exponent = (attempt - 1).min(10) as u32;
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << exponent);

        // 0~10% 随机抖动，避免多个任务同时打到节点
        let jitter = rand::thread_rng().gen_range(0..=(delay_ms / 10 + 1));
        Duration::from_millis(delay_ms.saturating_add(jitter))
    }

    async fn retry_call<T, Fut, F>(&self, method: &str, mut f: F) -> Result<T, AppError>
    where
        F: FnMut(Arc<dyn ProviderTrait>) -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                log_warn!(
                    "{} 调用失败，正在进行第 {} 次重试，等待 {:?}...",
                    method,
                    attempt + 1,
                    delay
                );
                sleep(delay).await;
            }
            match f(self.provider.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_retries => {
                    log_warn!("{} 调用失败 (第 {} 次): {}", method, attempt + 1, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl ProviderTrait for RetryAdapter {
    async fn get_block_by_number(
        &self,
        tag: BlockTag,
        full_tx: bool,
    ) -> Result<BlockLimits, AppError> {
        self.retry_call("get_block_by_number", move |p| async move {
            p.get_block_by_number(tag, full_tx).await
        })
        .await
    }

    async fn get_code(&self, address: &str) -> Result<String, AppError> {
        self.retry_call("get_code", move |p| async move { p.get_code(address).await })
            .await
    }

    async fn estimate_gas(&self, params: &TxParams) -> Result<GasAndCollateral, AppError> {
        self.retry_call("estimate_gas", move |p| async move {
            p.estimate_gas(params).await
        })
        .await
    }

    async fn gas_price(&self) -> Result<String, AppError> {
        self.retry_call("gas_price", |p| async move { p.gas_price().await })
            .await
    }
}
