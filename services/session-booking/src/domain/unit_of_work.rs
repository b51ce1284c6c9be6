//! Unit of Work 模式
//!
//! 一次预约、取消或系列创建涉及的场次、预约、积分写入在同一事务中完成，要么全部生效要么全部丢弃。

use async_trait::async_trait;
use learnhub_errors::AppResult;
use tracing::warn;
use uuid::Uuid;

use super::booking::BookingRepository;
use super::events::BookingEvent;
use super::session::SessionRepository;
use super::wallet::PointsRepository;

/// Unit of Work trait
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 获取场次 Repository
    fn sessions(&self) -> &dyn SessionRepository;

    /// 获取预约 Repository
    fn bookings(&self) -> &dyn BookingRepository;

    /// 获取积分 Repository
    fn points(&self) -> &dyn PointsRepository;

    /// 在当前事务中保存 Outbox 事件
    async fn save_event(&self, event: &BookingEvent) -> AppResult<Uuid>;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

/// 按结果结束事务：成功则提交，失败则回滚并返回原错误
pub async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AppResult<T>) -> AppResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Failed to rollback unit of work");
            }
            Err(e)
        }
    }
}
