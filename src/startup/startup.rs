use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::config::Config;
use crate::errors::error::AppError;
use crate::infrastructure::provider::{ConfluxProvider, ProviderTrait, RetryAdapter};
use crate::models::domain::{TxMeta, TxParams};
use crate::services::TxService;
use crate::services::tx::gas::gas_service::TxGasService;
use crate::{log_error, log_info};

pub type Result<T> = std::result::Result<T, AppError>;

/// 应用程序装配：Provider → 重试适配器 → 估算服务
pub struct Application {
    pub tx_service: Arc<TxService>,
}

impl Application {
    pub fn build(config: Config) -> Result<Self> {
        let conflux_provider = Arc::new(ConfluxProvider::new(&config.conflux)?);
        let provider = Arc::new(RetryAdapter::new(
            conflux_provider,
            config.conflux.max_retries,
            Duration::from_millis(config.conflux.base_delay_millis),
        )) as Arc<dyn ProviderTrait>;

        let gas_svc = Arc::new(TxGasService::new(provider.clone()));
        let tx_service = Arc::new(TxService::new(gas_svc, provider));
        Ok(Self { tx_service })
    }

    /// 读取一个交易参数 JSON 文件并估算
    pub async fn estimate_file(&self, id: u64, path: &Path) -> Result<TxMeta> {
        let content = tokio::fs::read_to_string(path).await?;
        let params: TxParams = serde_json::from_str(&content)?;
        let mut tx_meta = TxMeta::new(id, params);
        self.tx_service.add_tx_gas_defaults(&mut tx_meta).await?;
        Ok(tx_meta)
    }

    /// 并发估算多笔交易，每条记录只属于一个任务，互不影响
    pub async fn run(self, paths: Vec<PathBuf>) -> anyhow::Result<()> {
        log_info!("开始估算 {} 笔交易", paths.len());

        let tasks = paths
            .iter()
            .enumerate()
            .map(|(i, path)| self.estimate_file(i as u64 + 1, path));
        let results = join_all(tasks).await;

        let mut failed = 0usize;
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(tx_meta) => {
                    println!("{}", serde_json::to_string_pretty(&tx_meta)?);
                }
                Err(e) => {
                    failed += 1;
                    log_error!("估算 {} 失败: {}", path.display(), e);
                }
            }
        }

        if failed > 0 {
            anyhow::bail!("{} 笔交易估算失败", failed);
        }
        Ok(())
    }
}
