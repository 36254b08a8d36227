use crate::config::ConfluxConfig;
use crate::errors::error::AppError;
use crate::log_info;
use crate::models::domain::{BlockLimits, BlockTag, GasAndCollateral, TxParams};
use async_trait::async_trait;
use ethers_providers::{Http, Provider};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// 网络查询适配器：估算核心只依赖这几个远程调用
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderTrait: Send + Sync {
    async fn get_block_by_number(
        &self,
        tag: BlockTag,
        full_tx: bool,
    ) -> Result<BlockLimits, AppError>;
    async fn get_code(&self, address: &str) -> Result<String, AppError>;
    async fn estimate_gas(&self, params: &TxParams) -> Result<GasAndCollateral, AppError>;
    async fn gas_price(&self) -> Result<String, AppError>;
}

/// 基于 JSON-RPC 的 Conflux 节点适配器，多节点轮询
pub struct ConfluxProvider {
    providers: Vec<Arc<Provider<Http>>>,
    index: AtomicUsize,
    epoch_tag: String,
    request_timeout: Duration,
}

impl ConfluxProvider {
    pub fn new(config: &ConfluxConfig) -> Result<Self, AppError> {
        let providers = config
            .rpc_urls
            .split(',')
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(|raw| {
                let url = Url::parse(raw)
                    .map_err(|e| AppError::InvalidUrl(format!("{}: {}", raw, e)))?;
                Ok(Arc::new(Provider::new(Http::new(url))))
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        if providers.is_empty() {
            return Err(AppError::InvalidUrl("未配置任何 RPC 节点".to_string()));
        }
        log_info!("成功初始化 {} 个RPC Provider", providers.len());

        Ok(Self {
            providers,
            index: AtomicUsize::new(0),
            epoch_tag: config.epoch_tag.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    pub fn get_provider(&self) -> Arc<Provider<Http>> {
        let i = self.index.fetch_add(1, Ordering::Relaxed);
        self.providers[i % self.providers.len()].clone()
    }

    fn epoch(&self, tag: BlockTag) -> &str {
        match tag {
            BlockTag::Latest => &self.epoch_tag,
        }
    }

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R, AppError>
    where
        T: Debug + Serialize + Send + Sync,
        R: Serialize + DeserializeOwned + Debug + Send,
    {
        // 持有 Arc，保证 await 期间底层 Http Client 不被释放
        let provider = self.get_provider();
        timeout(self.request_timeout, provider.request(method, params))
            .await
            .map_err(|_| AppError::Timeout(method.to_string()))?
            .map_err(AppError::from)
    }
}

#[async_trait]
impl ProviderTrait for ConfluxProvider {
    async fn get_block_by_number(
        &self,
        tag: BlockTag,
        full_tx: bool,
    ) -> Result<BlockLimits, AppError> {
        let block: Option<BlockLimits> = self
            .request("cfx_getBlockByEpochNumber", (self.epoch(tag), full_tx))
            .await?;
        block.ok_or_else(|| AppError::ProviderError(format!("区块 {:?} 不存在", tag)))
    }

    async fn get_code(&self, address: &str) -> Result<String, AppError> {
        self.request("cfx_getCode", (address, self.epoch(BlockTag::Latest)))
            .await
    }

    async fn estimate_gas(&self, params: &TxParams) -> Result<GasAndCollateral, AppError> {
        self.request(
            "cfx_estimateGasAndCollateral",
            (params, self.epoch(BlockTag::Latest)),
        )
        .await
    }

    async fn gas_price(&self) -> Result<String, AppError> {
        self.request("cfx_gasPrice", ()).await
    }
}
