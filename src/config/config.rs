use ::config::{ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub conflux: ConfluxConfig,
}

/// 节点连接配置
#[derive(Debug, Deserialize, Clone)]
pub struct ConfluxConfig {
    /// 多个节点用逗号分隔
    pub rpc_urls: String,
    #[serde(default = "default_epoch_tag")]
    pub epoch_tag: String,
    pub request_timeout_secs: u64,
    pub max_retries: usize,
    pub base_delay_millis: u64,
}

fn default_epoch_tag() -> String {
    "latest_state".to_string()
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        Self::load_from("config", &environment)
    }

    /// 加载顺序：default → {environment} → APP__ 前缀的环境变量
    pub fn load_from(dir: &str, environment: &str) -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .add_source(File::with_name(&format!("{}/default", dir)))
            .add_source(File::with_name(&format!("{}/{}", dir, environment)).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
