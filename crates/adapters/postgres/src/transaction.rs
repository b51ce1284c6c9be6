//! PostgreSQL 事务管理模块
//!
//! 提供带隔离级别的事务开启，以及事务内的行级/咨询锁辅助

use learnhub_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

/// 事务隔离级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IsolationLevel {
    /// 读已提交（PostgreSQL 默认）
    #[default]
    ReadCommitted,
    /// 可重复读
    RepeatableRead,
    /// 可串行化
    Serializable,
}

impl IsolationLevel {
    /// 转换为 SQL 字符串
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// 事务选项
#[derive(Debug, Clone, Default)]
pub struct TransactionOptions {
    /// 隔离级别
    pub isolation_level: IsolationLevel,
    /// 语句超时（毫秒），仅作用于当前事务
    pub statement_timeout_ms: Option<u64>,
}

impl TransactionOptions {
    /// 创建新的事务选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置隔离级别
    pub fn with_isolation_level(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = level;
        self
    }

    /// 设置语句超时
    pub fn with_statement_timeout_ms(mut self, ms: u64) -> Self {
        self.statement_timeout_ms = Some(ms);
        self
    }

    /// 生成 SET TRANSACTION 语句
    pub fn to_sql(&self) -> String {
        format!(
            "SET TRANSACTION ISOLATION LEVEL {}",
            self.isolation_level.as_sql()
        )
    }

    /// 生成 SET LOCAL statement_timeout 语句
    fn timeout_sql(&self) -> Option<String> {
        self.statement_timeout_ms
            .map(|ms| format!("SET LOCAL statement_timeout = {}", ms))
    }
}

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    /// 创建新的事务管理器
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 开始带选项的事务
    pub async fn begin_with_options(
        &self,
        options: &TransactionOptions,
    ) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        sqlx::query(&options.to_sql())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to set transaction options: {}", e)))?;

        if let Some(sql) = options.timeout_sql() {
            sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::database(format!("Failed to set statement timeout: {}", e))
                })?;
        }

        debug!(
            isolation = options.isolation_level.as_sql(),
            statement_timeout_ms = options.statement_timeout_ms,
            "Transaction started"
        );

        Ok(tx)
    }

    /// 提交事务
    pub async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    /// 回滚事务
    pub async fn rollback(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}

/// 获取事务级咨询锁，事务结束时自动释放
///
/// 同一 `(namespace, key)` 上的并发事务在此串行化。
pub async fn advisory_xact_lock(
    tx: &mut Transaction<'static, Postgres>,
    namespace: &str,
    key: &str,
) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
        .bind(namespace)
        .bind(key)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to acquire advisory lock: {}", e)))?;

    debug!(namespace, key, "Advisory lock acquired");
    Ok(())
}
