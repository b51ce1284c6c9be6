//! 基础设施资源管理

use learnhub_adapter_postgres::{PostgresConfig, create_pool};
use learnhub_config::AppConfig;
use learnhub_errors::{AppError, AppResult};
use learnhub_telemetry::init_metrics;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use crate::retry::{RetryConfig, with_retry};

/// 基础设施资源容器
pub struct Infrastructure {
    /// 应用配置
    config: AppConfig,
    /// PostgreSQL 连接池
    postgres_pool: PgPool,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（带重试）
    pub async fn from_config(config: AppConfig) -> AppResult<Self> {
        Self::from_config_with_retry(config, &RetryConfig::default()).await
    }

    pub async fn from_config_with_retry(
        config: AppConfig,
        retry_config: &RetryConfig,
    ) -> AppResult<Self> {
        let pg_config = PostgresConfig::new(config.database.url.expose_secret())
            .with_max_connections(config.database.max_connections);
        let postgres_pool = with_retry(retry_config, "PostgreSQL connection", || {
            let cfg = pg_config.clone();
            async move { create_pool(&cfg).await }
        })
        .await?;
        info!(
            max_connections = config.database.max_connections,
            "PostgreSQL connection pool created"
        );

        // 全局安装记录器，指标的导出由外层传输负责
        if config.telemetry.metrics_enabled {
            init_metrics().map_err(|e| AppError::internal(e.to_string()))?;
            info!("Prometheus recorder installed");
        }

        Ok(Self {
            config,
            postgres_pool,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }
}
