//! Session Booking Service 入口
//!
//! 加载配置、初始化运行时，创建连接池并应用数据库迁移

use learnhub_adapter_postgres::check_connection;
use learnhub_bootstrap::{init_runtime, Infrastructure, RuntimeConfig};
use learnhub_config::AppConfig;
use learnhub_errors::AppError;
use tracing::{error, info};

use session_booking::infrastructure::persistence::run_migrations;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 本地开发时从 .env 补充环境变量
    dotenvy::dotenv().ok();

    let runtime = RuntimeConfig::default();
    let config = AppConfig::load(&runtime.config_dir)?;
    init_runtime(&config);

    let infra = Infrastructure::from_config(config).await?;
    let pool = infra.postgres_pool();

    let result = run_migrations(&pool).await?;
    if !result.is_success() {
        for e in &result.errors {
            error!(version = e.version, name = %e.name, error = %e.error, "Migration failed");
        }
        return Err(AppError::internal("Database migration failed").into());
    }
    info!(
        applied = result.applied_count(),
        skipped = result.skipped.len(),
        "Migrations completed"
    );

    check_connection(&pool).await?;

    info!(app_name = %infra.config().app_name, "Session booking schema ready");

    Ok(())
}
