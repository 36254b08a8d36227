use anyhow::Context;
use cfx_tx_gas::config::Config;
use cfx_tx_gas::startup::Application;
use cfx_tx_gas::utils::logger::init_logger;
use cfx_tx_gas::log_info;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 可选
    dotenvy::dotenv().ok();
    init_logger();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        anyhow::bail!("用法: cfx-tx-gas <tx.json>...");
    }

    log_info!("Starting application initialization...");

    // 1. 加载配置
    let config = Config::load().context("Failed to load application configuration")?;

    // 2. 构建应用实例
    let application = Application::build(config).context("Application building failed")?;

    // 3. 估算并输出
    application
        .run(paths)
        .await
        .context("Gas estimation run failed")?;

    Ok(())
}
