use receipt_matcher::api::{self, AppState};
use receipt_matcher::{AppConfig, MatcherService};
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置（matcher.toml + MATCHER_* 环境变量）
    let config = AppConfig::from_env()?;
    info!("Starting server with config: {:?}", config);

    // 按默认匹配参数创建对账服务
    let service = MatcherService::new(config.matching.clone())?;
    let app = api::build_router(AppState::new(service));

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /health      - 健康检查");
    info!("  GET  /api/config  - 默认匹配参数");
    info!("  POST /api/match   - 收据与银行流水对账");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
