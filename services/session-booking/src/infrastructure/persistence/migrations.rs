//! 数据库迁移

use learnhub_adapter_postgres::{Migration, MigrationManager, MigrationResult};
use learnhub_errors::AppResult;
use sqlx::PgPool;

/// 本服务的迁移记录表
pub const MIGRATION_TABLE: &str = "_session_booking_migrations";

/// 随服务发布的全部迁移，按版本排列
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "session_booking",
        include_str!("../../../migrations/0001_session_booking.sql"),
    )]
}

/// 应用待处理的迁移
pub async fn run_migrations(pool: &PgPool) -> AppResult<MigrationResult> {
    MigrationManager::new(pool.clone())
        .with_table_name(MIGRATION_TABLE)
        .migrate(&migrations())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered() {
        let all = migrations();
        assert!(!all.is_empty());
        assert!(all.windows(2).all(|w| w[0].version < w[1].version));
    }

    #[test]
    fn test_schema_declares_business_constraints() {
        let sql = &migrations()[0].up_sql;
        for name in [
            crate::infrastructure::persistence::error_mapper::CONFIRMED_BOOKING_UNIQUE,
            crate::infrastructure::persistence::error_mapper::SESSION_CAPACITY_CHECK,
            crate::infrastructure::persistence::error_mapper::PROFILE_POINTS_CHECK,
        ] {
            assert!(sql.contains(name), "schema is missing {}", name);
        }
    }
}
