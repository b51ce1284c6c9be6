//! PostgreSQL 迁移管理模块
//!
//! 按版本顺序应用随服务发布的 SQL 迁移，并用校验和防止已应用的迁移被修改

use learnhub_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::{info, warn};

/// 迁移记录
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MigrationRecord {
    /// 迁移版本
    pub version: i64,
    /// 迁移名称
    pub name: String,
    /// 应用时间
    pub applied_at: chrono::DateTime<chrono::Utc>,
    /// 校验和
    pub checksum: String,
}

/// 迁移定义
#[derive(Debug, Clone)]
pub struct Migration {
    /// 版本号
    pub version: i64,
    /// 名称
    pub name: String,
    /// 升级 SQL（可包含多条语句）
    pub up_sql: String,
    /// 校验和
    pub checksum: String,
}

impl Migration {
    /// 创建新的迁移
    pub fn new(version: i64, name: impl Into<String>, up_sql: impl Into<String>) -> Self {
        let up_sql = up_sql.into();
        let checksum = Self::calculate_checksum(&up_sql);
        Self {
            version,
            name: name.into(),
            up_sql,
            checksum,
        }
    }

    /// 计算校验和（FNV-1a，跨编译器版本稳定）
    fn calculate_checksum(sql: &str) -> String {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in sql.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        format!("{:016x}", hash)
    }
}

/// 迁移管理器
pub struct MigrationManager {
    pool: PgPool,
    table_name: String,
}

impl MigrationManager {
    /// 创建新的迁移管理器
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table_name: "_migrations".to_string(),
        }
    }

    /// 设置迁移表名（多个服务共享数据库时使用）
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// 初始化迁移表
    pub async fn init(&self) -> AppResult<()> {
        let create_sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                version BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                checksum VARCHAR(64) NOT NULL
            )
            "#,
            self.table_name
        );

        sqlx::query(&create_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to create migration table: {}", e)))?;

        Ok(())
    }

    /// 获取已应用的迁移
    pub async fn applied_migrations(&self) -> AppResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT version, name, applied_at, checksum FROM {} ORDER BY version ASC",
            self.table_name
        );

        sqlx::query_as::<_, MigrationRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get migrations: {}", e)))
    }

    /// 在单个事务中应用一个迁移并记录
    async fn apply(&self, migration: &Migration) -> AppResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::raw_sql(&migration.up_sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::database(format!(
                    "Failed to apply migration {}: {}",
                    migration.version, e
                ))
            })?;

        let insert_sql = format!(
            "INSERT INTO {} (version, name, checksum) VALUES ($1, $2, $3)",
            self.table_name
        );
        sqlx::query(&insert_sql)
            .bind(migration.version)
            .bind(&migration.name)
            .bind(&migration.checksum)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to record migration: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit migration: {}", e)))?;

        info!(
            version = migration.version,
            name = %migration.name,
            "Migration applied"
        );

        Ok(())
    }

    /// 应用所有待处理的迁移
    ///
    /// 遇到第一个失败的迁移即停止；校验和不一致的迁移记为错误但不阻断后续版本。
    pub async fn migrate(&self, migrations: &[Migration]) -> AppResult<MigrationResult> {
        self.init().await?;

        let applied = self.applied_migrations().await?;
        let mut result = MigrationResult::default();

        let mut sorted: Vec<_> = migrations.iter().collect();
        sorted.sort_by_key(|m| m.version);

        for migration in sorted {
            match plan(&applied, migration) {
                Plan::Skip => result.skipped.push(migration.version),
                Plan::ChecksumMismatch => {
                    warn!(
                        version = migration.version,
                        name = %migration.name,
                        "Applied migration has been modified"
                    );
                    result.errors.push(MigrationError {
                        version: migration.version,
                        name: migration.name.clone(),
                        error: "Checksum mismatch - migration has been modified".to_string(),
                    });
                }
                Plan::Apply => match self.apply(migration).await {
                    Ok(()) => result.applied.push(migration.version),
                    Err(e) => {
                        result.errors.push(MigrationError {
                            version: migration.version,
                            name: migration.name.clone(),
                            error: e.to_string(),
                        });
                        break;
                    }
                },
            }
        }

        Ok(result)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Plan {
    Apply,
    Skip,
    ChecksumMismatch,
}

fn plan(applied: &[MigrationRecord], migration: &Migration) -> Plan {
    match applied.iter().find(|r| r.version == migration.version) {
        None => Plan::Apply,
        Some(record) if record.checksum == migration.checksum => Plan::Skip,
        Some(_) => Plan::ChecksumMismatch,
    }
}

/// 迁移结果
#[derive(Debug, Clone, Default)]
pub struct MigrationResult {
    /// 已应用的迁移版本
    pub applied: Vec<i64>,
    /// 跳过的迁移版本
    pub skipped: Vec<i64>,
    /// 错误
    pub errors: Vec<MigrationError>,
}

impl MigrationResult {
    /// 是否成功
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// 应用的迁移数量
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// 迁移错误
#[derive(Debug, Clone)]
pub struct MigrationError {
    /// 版本
    pub version: i64,
    /// 名称
    pub name: String,
    /// 错误信息
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(version: i64, checksum: &str) -> MigrationRecord {
        MigrationRecord {
            version,
            name: format!("m{}", version),
            applied_at: chrono::Utc::now(),
            checksum: checksum.to_string(),
        }
    }

    #[test]
    fn test_checksum_consistency() {
        let sql = "CREATE TABLE test (id INT)";
        let m1 = Migration::new(1, "test", sql);
        let m2 = Migration::new(1, "test", sql);

        assert_eq!(m1.checksum, m2.checksum);
        assert_eq!(m1.checksum.len(), 16);
    }

    #[test]
    fn test_checksum_difference() {
        let m1 = Migration::new(1, "test", "CREATE TABLE test1 (id INT)");
        let m2 = Migration::new(1, "test", "CREATE TABLE test2 (id INT)");

        assert_ne!(m1.checksum, m2.checksum);
    }

    #[test]
    fn test_plan() {
        let m = Migration::new(2, "bookings", "CREATE TABLE bookings (id UUID)");
        assert_eq!(plan(&[], &m), Plan::Apply);
        assert_eq!(plan(&[record(2, &m.checksum)], &m), Plan::Skip);
        assert_eq!(plan(&[record(2, "deadbeef")], &m), Plan::ChecksumMismatch);
        assert_eq!(plan(&[record(1, &m.checksum)], &m), Plan::Apply);
    }

    #[test]
    fn test_migration_result() {
        let result = MigrationResult {
            applied: vec![1, 2, 3],
            ..Default::default()
        };

        assert!(result.is_success());
        assert_eq!(result.applied_count(), 3);
    }
}
