use boq_billing::{create_pool, create_router, AppConfig, AppState};
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

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池 (含迁移)
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");

    let app = create_router(AppState::new(pool), config.server.max_upload_bytes);

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/v1/invoices/stage            - stage spreadsheet rows (JSON)");
    info!("  POST /api/v1/invoices/upload           - stage spreadsheet rows (CSV)");
    info!("  PUT  /api/v1/invoices/:id/staging      - bulk edit staging rows");
    info!("  POST /api/v1/invoices/:id/approve      - approve invoice");
    info!("  GET  /api/v1/reports/schedule/:project - monthly schedule report");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
