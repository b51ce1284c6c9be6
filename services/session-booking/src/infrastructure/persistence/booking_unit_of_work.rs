//! PostgreSQL Unit of Work 实现

use async_trait::async_trait;
use learnhub_adapter_postgres::{IsolationLevel, TransactionManager, TransactionOptions};
use learnhub_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error_mapper::{map_json_error, map_sqlx_error};
use super::tx_repositories::{
    SharedTx, TxBookingRepository, TxPointsRepository, TxSessionRepository,
};
use crate::domain::booking::BookingRepository;
use crate::domain::events::BookingEvent;
use crate::domain::session::SessionRepository;
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::wallet::PointsRepository;

/// 预约事务默认的语句超时（毫秒），超时视为失败并回滚
const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;

/// Postgres Unit of Work 工厂
///
/// 使用 READ COMMITTED；正确性依赖条件 UPDATE、行锁与用户级咨询锁，而不是更高的隔离级别。
pub struct PostgresUnitOfWorkFactory {
    tx_manager: TransactionManager,
    options: TransactionOptions,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool),
            options: TransactionOptions::new()
                .with_isolation_level(IsolationLevel::ReadCommitted)
                .with_statement_timeout_ms(DEFAULT_STATEMENT_TIMEOUT_MS),
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.tx_manager.begin_with_options(&self.options).await?;
        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    session_repo: TxSessionRepository,
    booking_repo: TxBookingRepository,
    points_repo: TxPointsRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx = Arc::new(Mutex::new(Some(tx)));

        Self {
            tx: tx.clone(),
            session_repo: TxSessionRepository::new(tx.clone()),
            booking_repo: TxBookingRepository::new(tx.clone()),
            points_repo: TxPointsRepository::new(tx),
        }
    }

    async fn take_tx(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn sessions(&self) -> &dyn SessionRepository {
        &self.session_repo
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.booking_repo
    }

    fn points(&self) -> &dyn PointsRepository {
        &self.points_repo
    }

    async fn save_event(&self, event: &BookingEvent) -> AppResult<Uuid> {
        let payload = serde_json::to_value(event).map_err(map_json_error)?;

        let mut guard = self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO outbox (id, aggregate_type, aggregate_id, event_type, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(event.aggregate_type())
        .bind(event.aggregate_id())
        .bind(event.event_type())
        .bind(payload)
        .bind(chrono::Utc::now())
        .execute(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(id)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        TransactionManager::commit(tx).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self.take_tx().await?;
        TransactionManager::rollback(tx).await
    }
}
