//! 预约仓储接口

use async_trait::async_trait;
use learnhub_common::UserId;
use learnhub_errors::AppResult;

use super::booking::{Booking, BookingId, BookingStatus};

/// 预约仓储接口
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// 串行化同一用户的预约决策，锁随事务结束释放
    async fn lock_user(&self, user_id: &UserId) -> AppResult<()>;

    /// 创建预约
    async fn create(&self, booking: &Booking) -> AppResult<()>;

    /// 根据 ID 查找预约，并在事务内锁定该行
    async fn find_by_id(&self, id: &BookingId) -> AppResult<Option<Booking>>;

    /// 列出用户所有 CONFIRMED 预约，按创建时间排序
    async fn find_active_by_user(&self, user_id: &UserId) -> AppResult<Vec<Booking>>;

    /// 条件更新状态
    ///
    /// 仅当当前状态仍为 `expected` 时写入 `booking` 的状态与审计信息，返回是否命中。
    async fn update_status(&self, booking: &Booking, expected: BookingStatus) -> AppResult<bool>;
}
