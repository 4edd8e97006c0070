use profit_dashboard::{
    api::{self, AppState},
    db::run_migrations,
    service::{AdSpendAggregator, ShopifyClient},
    create_pool, AppConfig, DashboardService, MemoryRepository, PgRepository, Repository,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 本地时间格式, RUST_LOG 可覆盖级别
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置 (令牌不打印)
    let config = AppConfig::load()?;
    info!(
        "Starting server: {}:{}, shopify api {}, ads timeout {}s",
        config.server.host, config.server.port, config.shopify.api_version, config.ads.timeout_secs
    );

    let repo: Arc<dyn Repository> = if config.database.is_memory() {
        let repo = MemoryRepository::new();
        match (&config.shopify.dev_shop, &config.shopify.dev_access_token) {
            (Some(shop), Some(token)) => {
                repo.install_shop(shop, token);
                info!("内存仓储已预置店铺 {}", shop);
            }
            _ => warn!("内存仓储未预置店铺, 所有店铺请求将返回 404"),
        }
        Arc::new(repo)
    } else {
        let pool = create_pool(&config.database).await?;
        info!("Database pool created");
        run_migrations(&pool).await?;
        info!("Database migrations applied");
        Arc::new(PgRepository::new(pool))
    };

    let shopify = Arc::new(ShopifyClient::from_config(&config.shopify)?);
    let ads = AdSpendAggregator::from_config(&config.ads)?;
    info!("Ad platforms registered: {:?}", ads.platforms());

    let dashboard = Arc::new(DashboardService::new(repo, shopify, ads, config.shopify.timeout()));
    let app = api::router(
        AppState::new(dashboard),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  GET  /api/dashboard              - 完整仪表盘");
    info!("  GET  /api/dashboard/orders       - 订单指标");
    info!("  GET  /api/dashboard/ad-spend     - 广告花费");
    info!("  GET  /api/settings | PUT          - COGS 设置");
    info!("  POST /api/settings/cogs-csv      - COGS CSV 导入");
    info!("  GET  /api/ad-accounts | POST      - 广告账户");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
