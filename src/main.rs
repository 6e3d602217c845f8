use anyhow::Result;
use mcq_extractor::utils::logging;
use mcq_extractor::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run().await?;

    if stats.failed > 0 {
        tracing::warn!("⚠️ 有 {} 个文档处理失败", stats.failed);
    }

    Ok(())
}
