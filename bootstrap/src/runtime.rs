//! 服务运行时

use learnhub_config::AppConfig;
use learnhub_telemetry::{init_tracing, init_tracing_json};
use tracing::info;

/// 服务运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: std::env::var("LEARNHUB_CONFIG_DIR").unwrap_or_else(|_| "config".to_string()),
        }
    }
}

/// 初始化服务运行时
pub fn init_runtime(config: &AppConfig) {
    // 生产环境输出 JSON 日志
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );
}
